pub mod diagnostics;
pub mod driver;
pub mod language;
pub mod runtime;
pub mod tools;

#[cfg(test)]
mod tests;
