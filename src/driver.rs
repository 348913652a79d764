//! End-to-end execution of one program over one input.

use crate::language::{errors::SyntaxError, parser::parse};
use crate::runtime::{error::RuntimeError, Interpreter};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Fixes the random source; `None` seeds from the OS.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Tokenizes, builds and evaluates `program` with `input` on the stack and
/// returns the rendered final stack.
pub fn run(program: &[u8], input: &[u8], options: &RunOptions) -> Result<Vec<u8>, ProgramError> {
    let root = parse(program)?;
    debug!(
        program_len = program.len(),
        input_len = input.len(),
        "running program"
    );
    let mut interpreter = Interpreter::new(Rc::from(program), input, options.seed);
    let output = interpreter.run(&root)?;
    Ok(output)
}

/// Like [`run`], but a failing program outputs its own bytes. The error is
/// passed to `report` first.
pub fn run_or_echo(
    program: &[u8],
    input: &[u8],
    options: &RunOptions,
    report: impl FnOnce(&ProgramError),
) -> Vec<u8> {
    match run(program, input, options) {
        Ok(output) => output,
        Err(err) => {
            warn!(error = %err, "program failed, echoing its source");
            report(&err);
            program.to_vec()
        }
    }
}
