use clap::{Parser, Subcommand};
use gs2::{
    diagnostics,
    driver::{self, ProgramError, RunOptions},
    tools,
};
use std::{
    fs,
    io::{self, IsTerminal, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gs2", version, about = "Run, assemble and disassemble gs2 programs")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a bytecode program with stdin as its input
    Run {
        file: PathBuf,
        /// Seed for the random opcodes
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Assemble mnemonic source (FILE or stdin) into bytecode on stdout
    Asm { file: Option<PathBuf> },
    /// Print a bytecode program's block tree as mnemonics
    Disasm { file: PathBuf },
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_file(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            diagnostics::report_io_error(path, &err);
            None
        }
    }
}

/// Whole of stdin, or nothing when it is an interactive terminal.
fn read_input() -> io::Result<Vec<u8>> {
    let mut input = Vec::new();
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        stdin.lock().read_to_end(&mut input)?;
    }
    Ok(input)
}

fn write_output(bytes: &[u8]) -> ExitCode {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(bytes).and_then(|_| stdout.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Failed to write output: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(file: &Path, seed: Option<u64>) -> ExitCode {
    let Some(program) = read_file(file) else {
        return ExitCode::FAILURE;
    };
    let input = match read_input() {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Failed to read stdin: {err}");
            return ExitCode::FAILURE;
        }
    };
    let name = file.display().to_string();
    let output = driver::run_or_echo(&program, &input, &RunOptions { seed }, |err| {
        diagnostics::report_program_error(&name, &program, err)
    });
    write_output(&output)
}

fn assemble(file: Option<&Path>) -> ExitCode {
    let (name, source) = match file {
        Some(path) => {
            let Some(bytes) = read_file(path) else {
                return ExitCode::FAILURE;
            };
            (path.display().to_string(), String::from_utf8_lossy(&bytes).into_owned())
        }
        None => {
            let mut source = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut source) {
                eprintln!("Failed to read stdin: {err}");
                return ExitCode::FAILURE;
            }
            ("<stdin>".to_string(), source)
        }
    };
    match tools::assemble(&source) {
        Ok(bytes) => write_output(&bytes),
        Err(err) => {
            diagnostics::emit_assemble_error(&name, &source, &err);
            ExitCode::FAILURE
        }
    }
}

fn disassemble(file: &Path) -> ExitCode {
    let Some(program) = read_file(file) else {
        return ExitCode::FAILURE;
    };
    match tools::disassemble(&program) {
        Ok(listing) => write_output(format!("{listing}\n").as_bytes()),
        Err(err) => {
            let name = file.display().to_string();
            diagnostics::report_program_error(&name, &program, &ProgramError::Syntax(err));
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match &cli.command {
        Command::Run { file, seed } => run(file, *seed),
        Command::Asm { file } => assemble(file.as_deref()),
        Command::Disasm { file } => disassemble(file),
    }
}
