pub mod error;
pub mod interpreter;
pub mod listops;
pub mod sieve;
pub mod text;
pub mod value;

pub use interpreter::Interpreter;
