pub mod assembler;

use crate::language::{errors::SyntaxError, parser::parse};

pub use assembler::{assemble, AssembleError};

/// Mnemonic listing of a program's block tree, sugar expanded.
pub fn disassemble(program: &[u8]) -> Result<String, SyntaxError> {
    Ok(parse(program)?.to_mnemonics())
}
