use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

fn bin_path() -> &'static str {
    env!("CARGO_BIN_EXE_gs2")
}

fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gs2-cli-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("write scratch file");
    path
}

fn run_with_stdin(args: &[&str], stdin: &[u8]) -> std::process::Output {
    let mut child = Command::new(bin_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn gs2");
    child
        .stdin
        .as_mut()
        .expect("child stdin missing")
        .write_all(stdin)
        .expect("write stdin");
    child.wait_with_output().expect("gs2 did not finish")
}

#[test]
fn run_reads_program_file_and_stdin() {
    let program = scratch_file("reverse.gs2", &[0x20]);
    let output = run_with_stdin(&["run", program.to_str().unwrap()], b"hello");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"olleh");
}

#[test]
fn failing_program_is_echoed_with_a_diagnostic() {
    let program = scratch_file("underflow.gs2", &[0x50, 0x50]);
    let output = run_with_stdin(&["run", program.to_str().unwrap()], b"");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x50, 0x50]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Stack underflow"));
}

#[test]
fn asm_then_disasm() {
    let output = run_with_stdin(&["asm"], b"# add one to each\n{ 1 + } map\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x08, 0x11, 0x30, 0x09, 0x34]);

    let program = scratch_file("listing.gs2", &output.stdout);
    let listing = Command::new(bin_path())
        .args(["disasm", program.to_str().unwrap()])
        .output()
        .expect("failed to run disasm");
    assert!(listing.status.success());
    assert_eq!(String::from_utf8_lossy(&listing.stdout).trim(), "{ 1 + } %");
}

#[test]
fn asm_rejects_unknown_symbols() {
    let output = run_with_stdin(&["asm"], b"dup frobnicate");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("frobnicate"));
}
