use crate::{
    driver::ProgramError, language::errors::SyntaxError, runtime::error::RuntimeError,
    tools::AssembleError,
};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl SyntaxDiagnostic {
    /// Bytecode is shown as a hex listing, so the span is rescaled to
    /// three columns per byte.
    pub fn from_error(name: &str, program: &[u8], err: &SyntaxError) -> Self {
        let start = err.span.start * 3;
        let len = (err.span.len() * 3).saturating_sub(1).max(1);
        Self {
            src: NamedSource::new(name, hex_listing(program)),
            span: (start, len).into(),
            help: err.help.clone(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct AssembleDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl AssembleDiagnostic {
    pub fn from_error(name: &str, source: &str, err: &AssembleError) -> Self {
        Self {
            src: NamedSource::new(name, source.to_string()),
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
        }
    }
}

/// `04 68 69 05`, one line.
pub fn hex_listing(program: &[u8]) -> String {
    program
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn report_program_error(name: &str, program: &[u8], error: &ProgramError) {
    match error {
        ProgramError::Syntax(err) => {
            let diagnostic = SyntaxDiagnostic::from_error(name, program, err);
            eprintln!("{:?}", Report::new(diagnostic));
        }
        ProgramError::Runtime(err) => report_runtime_error(err),
    }
}

pub fn report_runtime_error(error: &RuntimeError) {
    eprintln!("Runtime error: {}", error);
}

pub fn emit_assemble_error(name: &str, source: &str, error: &AssembleError) {
    let diagnostic = AssembleDiagnostic::from_error(name, source, error);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::span::Span;

    #[test]
    fn syntax_spans_map_onto_the_hex_listing() {
        let err = SyntaxError::new("Unterminated string literal", Span::new(1, 3));
        let diagnostic = SyntaxDiagnostic::from_error("prog.gs2", &[0x10, 0x04, 0x41], &err);
        assert_eq!(diagnostic.span, SourceSpan::from((3, 5)));
        assert_eq!(hex_listing(&[0x10, 0x04, 0x41]), "10 04 41");
    }
}
