use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Stack underflow in `{opcode}`")]
    StackUnderflow { opcode: &'static str },
    #[error("Invalid operands for `{opcode}`: found {found}")]
    InvalidOperand { opcode: &'static str, found: String },
    #[error("Unknown opcode 0x{byte:02x}")]
    UnknownOpcode { byte: u8 },
    #[error("Division by zero in `{opcode}`")]
    DivisionByZero { opcode: &'static str },
    #[error("Index {index} out of range for length {len} in `{opcode}`")]
    IndexOutOfRange {
        opcode: &'static str,
        index: String,
        len: usize,
    },
    #[error("`{opcode}` needs a non-empty list")]
    EmptyList { opcode: &'static str },
    #[error("Number out of range in `{opcode}`: {message}")]
    OutOfRange {
        opcode: &'static str,
        message: String,
    },
    #[error("Cannot render {code} as a character")]
    InvalidCharacter { code: String },
    #[error("Bad regular expression in `{opcode}`: {message}")]
    Regex {
        opcode: &'static str,
        message: String,
    },
    #[error("Format error in `{opcode}`: {message}")]
    Format {
        opcode: &'static str,
        message: String,
    },
}
