//! Mnemonic assembler: turns whitespace-separated words, numbers and quoted
//! strings into gs2 bytecode.

use crate::language::{
    lexer::needs_implicit_string_open,
    opcode::{self, MODE_MNEMONICS},
    span::Span,
    token::StringKind,
};
use miette::SourceSpan;
use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, take_till1},
    character::complete::{anychar, char},
    combinator::{opt, recognize},
    sequence::delimited,
    IResult,
};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssembleError {
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl AssembleError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            help: None,
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn to_source_span(&self) -> SourceSpan {
        (self.span.start, self.span.len()).into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Word<'a> {
    text: &'a str,
    span: Span,
}

/// `"…"`, where `\"` does not end the string.
fn quoted(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        opt(escaped(is_not("\\\""), '\\', anychar)),
        char('"'),
    ))(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

/// Splits source into words. Lines whose first column is `#` are comments.
fn lex(source: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut line_start = 0;
    for line in source.split_inclusive('\n') {
        let offset = line_start;
        line_start += line.len();
        if line.starts_with('#') {
            continue;
        }
        let mut rest = line;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let start = offset + line.len() - rest.len();
            let Ok((remaining, text)) = alt((quoted, bare))(rest) else {
                break;
            };
            words.push(Word {
                text,
                span: Span::new(start, start + text.len()),
            });
            rest = remaining;
        }
    }
    words
}

/// Shortest literal encoding of an integer.
pub fn compile_num(value: i64) -> Option<Vec<u8>> {
    let encoded = match value {
        0..=10 => vec![0x10 + value as u8],
        100 => vec![0x1b],
        1000 => vec![0x1c],
        16 => vec![0x1d],
        64 => vec![0x1e],
        256 => vec![0x1f],
        0..=0xff => vec![opcode::BYTE_LITERAL, value as u8],
        _ => {
            if let Ok(short) = i16::try_from(value) {
                let mut out = vec![opcode::SHORT_LITERAL];
                out.extend_from_slice(&short.to_le_bytes());
                out
            } else {
                let long = i32::try_from(value).ok()?;
                let mut out = vec![opcode::LONG_LITERAL];
                out.extend_from_slice(&long.to_le_bytes());
                out
            }
        }
    };
    Some(encoded)
}

fn is_numeric(text: &str) -> bool {
    let digits = text
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decodes `\n \t \r \\ \" \0 \xHH` inside a quoted word.
fn unescape(body: &str, span: Span) -> Result<Vec<u8>, AssembleError> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let byte = bytes[idx];
        idx += 1;
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        match bytes.get(idx) {
            Some(b'n') => out.push(b'\n'),
            Some(b't') => out.push(b'\t'),
            Some(b'r') => out.push(b'\r'),
            Some(b'0') => out.push(0),
            Some(b'\\') => out.push(b'\\'),
            Some(b'"') => out.push(b'"'),
            Some(b'x') => {
                let hex = bytes
                    .get(idx + 1..idx + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| {
                        AssembleError::new("Invalid \\x escape", span)
                            .with_help("`\\x` takes exactly two hex digits")
                    })?;
                out.push(hex);
                idx += 2;
            }
            _ => {
                out.push(b'\\');
                continue;
            }
        }
        idx += 1;
    }
    Ok(out)
}

fn string_body<'a>(word: &Word<'a>) -> Result<Option<&'a str>, AssembleError> {
    if !word.text.starts_with('"') {
        return Ok(None);
    }
    if word.text.len() < 2 || !word.text.ends_with('"') {
        return Err(AssembleError::new("Unterminated string", word.span)
            .with_help("close the string with `\"` before the next whitespace"));
    }
    Ok(Some(&word.text[1..word.text.len() - 1]))
}

fn group_kind(text: &str) -> Option<StringKind> {
    [
        StringKind::Plain,
        StringKind::Array,
        StringKind::Printf,
        StringKind::RegexMatch,
        StringKind::RegexSub,
        StringKind::RegexFind,
        StringKind::RegexSplit,
    ]
    .into_iter()
    .find(|kind| kind.group_opener() == text)
}

/// `block1`..`block6`, `map1`.., `filter1`.., `both1`.. spelt out.
fn long_quick_name(word: &str) -> Option<u8> {
    let families = [
        ("block", opcode::QUICK_BLOCK),
        ("map", opcode::QUICK_MAP),
        ("filter", opcode::QUICK_FILTER),
        ("both", opcode::QUICK_BOTH),
    ];
    families.into_iter().find_map(|(prefix, base)| {
        let count: u8 = word.strip_prefix(prefix)?.parse().ok()?;
        (1..=6).contains(&count).then(|| base + count - 1)
    })
}

/// Resolves a mnemonic, case-insensitively.
pub fn lookup(word: &str) -> Option<u8> {
    let word = word.to_ascii_lowercase();
    if word == "'" {
        return Some(opcode::QUICK_BLOCK);
    }
    if let Some((_, op)) = MODE_MNEMONICS.iter().find(|(name, _)| *name == word) {
        return Some(*op);
    }
    if let Some(op) = long_quick_name(&word) {
        return Some(op);
    }
    (0..=u8::MAX)
        .filter(|op| !matches!(op, 0x01..=0x07 | 0x10..=0x1f))
        .find(|op| {
            opcode::name(*op)
                .split_whitespace()
                .any(|alias| alias != "unknown" && alias == word)
        })
}

struct Group {
    kind: StringKind,
    parts: Vec<Vec<u8>>,
    opened_at: Span,
}

impl Group {
    fn emit(self, out: &mut Vec<u8>) {
        if let [part] = self.parts.as_slice() {
            if part.len() == 1 && self.kind == StringKind::Plain {
                out.push(opcode::CHAR_LITERAL);
                out.push(part[0]);
                return;
            }
        }
        out.push(opcode::STRING_OPEN);
        for (idx, part) in self.parts.iter().enumerate() {
            if idx > 0 {
                out.push(opcode::STRING_SEPARATOR);
            }
            out.extend_from_slice(part);
        }
        out.push(self.kind.terminator());
    }
}

pub fn assemble(source: &str) -> Result<Vec<u8>, AssembleError> {
    let words = lex(source);
    let mut out = Vec::new();
    let mut origins: Vec<(usize, Span)> = Vec::new();
    let mut group: Option<Group> = None;

    for word in &words {
        origins.push((out.len(), word.span));
        if let Some(open) = group.as_mut() {
            if word.text == ")" {
                if let Some(done) = group.take() {
                    done.emit(&mut out);
                }
                continue;
            }
            let part = match string_body(word)? {
                Some(body) => unescape(body, word.span)?,
                None => word.text.as_bytes().to_vec(),
            };
            open.parts.push(part);
            continue;
        }

        if is_numeric(word.text) {
            let encoded = word
                .text
                .parse::<i64>()
                .ok()
                .and_then(compile_num)
                .ok_or_else(|| {
                    AssembleError::new(format!("Couldn't compile number {}", word.text), word.span)
                        .with_help("integer literals must fit in 32 bits")
                })?;
            out.extend(encoded);
            continue;
        }
        if let Some(body) = string_body(word)? {
            out.push(opcode::STRING_OPEN);
            out.extend(unescape(body, word.span)?);
            out.push(opcode::STRING_PLAIN);
            continue;
        }
        if let Some(kind) = group_kind(word.text) {
            group = Some(Group {
                kind,
                parts: Vec::new(),
                opened_at: word.span,
            });
            continue;
        }
        if let Some(quoted_char) = word.text.strip_prefix('\'').and_then(|rest| rest.chars().next()) {
            let encoded = compile_num(quoted_char as i64).ok_or_else(|| {
                AssembleError::new("Character does not fit a literal", word.span)
            })?;
            out.extend(encoded);
            continue;
        }
        let op = lookup(word.text).ok_or_else(|| {
            AssembleError::new(format!("Unknown symbol `{}`", word.text), word.span)
                .with_help("mnemonics are listed by `gs2 disasm` output and the opcode table")
        })?;
        out.push(op);
    }

    if let Some(open) = group {
        return Err(AssembleError::new("String group is never closed", open.opened_at)
            .with_help("end the group with `)`"));
    }

    if out.first() == Some(&opcode::STRING_OPEN) {
        if needs_implicit_string_open(&out[1..]) {
            out.remove(0);
        }
    } else if needs_implicit_string_open(&out) {
        let at = out
            .iter()
            .position(|byte| opcode::is_string_terminator(*byte))
            .unwrap_or_default();
        let span = origins
            .iter()
            .rev()
            .find(|(start, _)| *start <= at)
            .map(|(_, span)| *span)
            .unwrap_or_default();
        return Err(AssembleError::new(
            "Literal operand would be read as a string terminator",
            span,
        )
        .with_help("put a string before it, or build the value from other literals"));
    }
    debug!(words = words.len(), bytes = out.len(), "assembled program");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{run, RunOptions};
    use crate::language::{ast::Item, parser::parse, token::Token};

    #[test]
    fn numbers_use_the_shortest_encoding() {
        assert_eq!(compile_num(7), Some(vec![0x17]));
        assert_eq!(compile_num(64), Some(vec![0x1e]));
        assert_eq!(compile_num(200), Some(vec![0x01, 200]));
        assert_eq!(compile_num(-2), Some(vec![0x02, 0xfe, 0xff]));
        assert_eq!(compile_num(70_000), Some(vec![0x03, 0x70, 0x11, 0x01, 0x00]));
        assert_eq!(compile_num(1 << 40), None);
    }

    #[test]
    fn mnemonics_resolve_case_insensitively() {
        assert_eq!(lookup("DUP"), Some(0x40));
        assert_eq!(lookup("map"), Some(0x34));
        assert_eq!(lookup("+"), Some(0x30));
        assert_eq!(lookup("@15"), Some(0xaf));
        assert_eq!(lookup("tuck-c"), Some(0xda));
        assert_eq!(lookup("map3"), Some(0xea));
        assert_eq!(lookup("b1"), Some(0xe0));
        assert_eq!(lookup("m:"), Some(0xfe));
        assert_eq!(lookup("line-mode"), Some(0x30));
        assert_eq!(lookup("push-number"), None);
        assert_eq!(lookup("unknown"), None);
    }

    #[test]
    fn strings_groups_and_chars() {
        assert_eq!(assemble("5 \"hi\\n\" dup").unwrap(), vec![0x15, 0x04, b'h', b'i', b'\n', 0x05, 0x40]);
        assert_eq!(assemble("w( a \"b c\" )").unwrap(), b"a\x07b c\x06".to_vec());
        assert_eq!(assemble("1 ( x )").unwrap(), vec![0x11, 0x07, b'x']);
        assert_eq!(assemble("'A").unwrap(), vec![0x01, 65]);
    }

    #[test]
    fn comments_and_leading_string_opener_are_dropped() {
        let source = "# greeting\n\"hi\" 2 *\n";
        assert_eq!(assemble(source).unwrap(), b"hi\x05\x12\x32".to_vec());
    }

    #[test]
    fn errors_carry_spans() {
        let err = assemble("dup frobnicate").unwrap_err();
        assert_eq!(err.span, Span::new(4, 14));
        assert!(assemble("( a").is_err());
        assert!(assemble("\"open").is_err());
        assert!(assemble("99999999999").is_err());
    }

    #[test]
    fn escaped_quotes_stay_inside_the_string() {
        assert_eq!(
            assemble(r#""say \"hi\"" 2"#).unwrap(),
            b"say \"hi\"\x05\x12".to_vec()
        );
        assert_eq!(assemble(r#""" dup"#).unwrap(), vec![0x05, 0x40]);
    }

    #[test]
    fn stripped_opener_is_restored_by_the_tokenizer() {
        let empty_part = assemble("w( a \"\" )").unwrap();
        assert_eq!(empty_part, b"a\x07\x06".to_vec());
        assert_eq!(
            parse(&empty_part).unwrap().items,
            vec![Item::Token(Token::Str {
                parts: vec![b"a".to_vec(), Vec::new()],
                kind: StringKind::Array,
            })]
        );

        let low_byte = assemble("\"\\x01\" length").unwrap();
        assert_eq!(low_byte, vec![0x01, 0x05, 0x2e]);
        assert_eq!(run(&low_byte, b"", &RunOptions::default()).unwrap(), b"1");

        let substituted = assemble("\"a-b\" s( - + )").unwrap();
        assert_eq!(substituted, b"a-b\x05\x04-\x07+\x9d".to_vec());
        assert_eq!(run(&substituted, b"", &RunOptions::default()).unwrap(), b"a+b");
    }

    #[test]
    fn opener_is_kept_when_the_tokenizer_could_not_restore_it() {
        let bytes = assemble("\"\\x04a\"").unwrap();
        assert_eq!(bytes, vec![0x04, 0x04, b'a', 0x05]);
        assert_eq!(
            parse(&bytes).unwrap().items,
            vec![Item::Token(Token::Str {
                parts: vec![vec![0x04, b'a']],
                kind: StringKind::Plain,
            })]
        );
    }

    #[test]
    fn terminator_in_a_literal_operand_is_rejected() {
        let err = assemble("dup 261").unwrap_err();
        assert_eq!(err.span, Span::new(4, 7));
        assert_eq!(assemble("\"x\" 261").unwrap(), vec![b'x', 0x05, 0x02, 0x05, 0x01]);
    }

    #[test]
    fn assembled_programs_parse_back() {
        let bytes = assemble("{ 1 + } m: 3 dup").unwrap();
        let block = parse(&bytes).unwrap();
        assert_eq!(block.to_mnemonics(), "{ 1 + } { 3 dup } %");
    }
}
