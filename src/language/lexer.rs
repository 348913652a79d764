use crate::language::{
    errors::SyntaxError,
    opcode::{self, is_string_terminator},
    span::Span,
    token::{LexToken, StringKind, Token},
};
use nom::{
    branch::alt,
    bytes::complete::take_till,
    combinator::{cut, map, verify},
    number::complete::{le_i16, le_i32, le_u8},
    sequence::{pair, preceded},
    IResult,
};
use std::borrow::Cow;
use tracing::debug;

/// Program wrapper selected by an optional leading byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Lines,
    Words,
    LinesSkipFirst,
}

impl Mode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            opcode::MODE_LINES => Some(Mode::Lines),
            opcode::MODE_WORDS => Some(Mode::Words),
            opcode::MODE_LINES_SKIP_FIRST => Some(Mode::LinesSkipFirst),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    pub mode: Option<Mode>,
    pub tokens: Vec<LexToken>,
}

fn opcode_byte(op: u8) -> impl Fn(&[u8]) -> IResult<&[u8], u8> {
    move |input| verify(le_u8, |byte: &u8| *byte == op)(input)
}

fn string_literal(input: &[u8]) -> IResult<&[u8], Token> {
    let (input, (body, terminator)) = preceded(
        opcode_byte(opcode::STRING_OPEN),
        cut(pair(take_till(is_string_terminator), le_u8)),
    )(input)?;
    let parts = body
        .split(|byte| *byte == opcode::STRING_SEPARATOR)
        .map(<[u8]>::to_vec)
        .collect();
    // take_till stops on a terminator, so the kind always resolves.
    let kind = StringKind::from_terminator(terminator).unwrap_or(StringKind::Plain);
    Ok((input, Token::Str { parts, kind }))
}

fn byte_literal(input: &[u8]) -> IResult<&[u8], Token> {
    map(
        preceded(opcode_byte(opcode::BYTE_LITERAL), cut(le_u8)),
        Token::Byte,
    )(input)
}

fn short_literal(input: &[u8]) -> IResult<&[u8], Token> {
    map(
        preceded(opcode_byte(opcode::SHORT_LITERAL), cut(le_i16)),
        Token::Short,
    )(input)
}

fn long_literal(input: &[u8]) -> IResult<&[u8], Token> {
    map(
        preceded(opcode_byte(opcode::LONG_LITERAL), cut(le_i32)),
        Token::Long,
    )(input)
}

fn char_literal(input: &[u8]) -> IResult<&[u8], Token> {
    map(
        preceded(opcode_byte(opcode::CHAR_LITERAL), cut(le_u8)),
        Token::Char,
    )(input)
}

fn single_op(input: &[u8]) -> IResult<&[u8], Token> {
    map(le_u8, Token::Op)(input)
}

fn next_token(input: &[u8]) -> IResult<&[u8], Token> {
    alt((
        string_literal,
        byte_literal,
        short_literal,
        long_literal,
        char_literal,
        single_op,
    ))(input)
}

/// True when a string terminator byte shows up before any string opener.
/// The scan is byte-wise: literal operands count too.
pub fn needs_implicit_string_open(stream: &[u8]) -> bool {
    stream
        .iter()
        .find(|byte| **byte == opcode::STRING_OPEN || is_string_terminator(**byte))
        .is_some_and(|byte| *byte != opcode::STRING_OPEN)
}

fn truncated_message(op: u8) -> &'static str {
    match op {
        opcode::STRING_OPEN => "Unterminated string literal",
        opcode::BYTE_LITERAL => "Byte literal is missing its operand",
        opcode::SHORT_LITERAL => "Short literal is missing its operand bytes",
        opcode::LONG_LITERAL => "Long literal is missing its operand bytes",
        opcode::CHAR_LITERAL => "Character literal is missing its character",
        _ => "Truncated token",
    }
}

/// Splits raw bytecode into tokens, recognising the leading mode byte and
/// reading a leading run of plain text as one string literal.
pub fn classify(program: &[u8]) -> Result<Classified, SyntaxError> {
    let mode = program.first().copied().and_then(Mode::from_byte);
    let body = if mode.is_some() {
        &program[1..]
    } else {
        program
    };

    let hacked = needs_implicit_string_open(body);
    let stream: Cow<[u8]> = if hacked {
        let mut prefixed = Vec::with_capacity(body.len() + 1);
        prefixed.push(opcode::STRING_OPEN);
        prefixed.extend_from_slice(body);
        Cow::Owned(prefixed)
    } else {
        Cow::Borrowed(body)
    };
    let origin = program.len() - body.len();
    let to_offset = |pos: usize| (origin + pos).saturating_sub(hacked as usize);

    let mut tokens = Vec::new();
    let mut remaining: &[u8] = &stream;
    while !remaining.is_empty() {
        let start = stream.len() - remaining.len();
        match next_token(remaining) {
            Ok((rest, token)) => {
                let end = stream.len() - rest.len();
                tokens.push(LexToken {
                    token,
                    span: Span::new(to_offset(start), to_offset(end)),
                });
                remaining = rest;
            }
            Err(_) => {
                let op = remaining[0];
                return Err(SyntaxError::new(
                    truncated_message(op),
                    Span::new(to_offset(start), program.len()),
                )
                .with_help(format!(
                    "`{}` needs its operand bytes before the end of the program",
                    opcode::name(op)
                )));
            }
        }
    }

    debug!(
        tokens = tokens.len(),
        mode = ?mode,
        implicit_string = hacked,
        "classified program"
    );
    Ok(Classified { mode, tokens })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(program: &[u8]) -> Vec<Token> {
        classify(program)
            .expect("classify")
            .tokens
            .into_iter()
            .map(|lex| lex.token)
            .collect()
    }

    #[test]
    fn numeric_literals_read_little_endian_operands() {
        assert_eq!(
            kinds(&[0x01, 0xff, 0x02, 0x00, 0x80, 0x03, 0x01, 0x00, 0x00, 0x00]),
            vec![Token::Byte(255), Token::Short(-32768), Token::Long(1)]
        );
    }

    #[test]
    fn string_terminator_selects_kind_and_separator_splits_parts() {
        assert_eq!(
            kinds(b"\x04ab\x07c\x06\x40"),
            vec![
                Token::Str {
                    parts: vec![b"ab".to_vec(), b"c".to_vec()],
                    kind: StringKind::Array,
                },
                Token::Op(0x40),
            ]
        );
        assert_eq!(
            kinds(b"\x04x+\x9d"),
            vec![Token::Str {
                parts: vec![b"x+".to_vec()],
                kind: StringKind::RegexSub,
            }]
        );
    }

    #[test]
    fn plain_text_prefix_becomes_one_string() {
        let classified = classify(b"hello\x05").expect("classify");
        assert_eq!(
            classified.tokens[0].token,
            Token::Str {
                parts: vec![b"hello".to_vec()],
                kind: StringKind::Plain,
            }
        );
        assert_eq!(classified.tokens[0].span, Span::new(0, 6));
    }

    #[test]
    fn terminator_bytes_trigger_the_string_hack_anywhere() {
        assert_eq!(
            kinds(&[0x01, 0x05, 0x2e]),
            vec![
                Token::Str {
                    parts: vec![vec![0x01]],
                    kind: StringKind::Plain,
                },
                Token::Op(0x2e),
            ]
        );
        assert_eq!(
            kinds(b"a\x07\x06"),
            vec![Token::Str {
                parts: vec![b"a".to_vec(), Vec::new()],
                kind: StringKind::Array,
            }]
        );
        assert_eq!(
            kinds(&[0x01, 0x40, 0x04, 0x05]),
            vec![
                Token::Byte(0x40),
                Token::Str {
                    parts: vec![Vec::new()],
                    kind: StringKind::Plain,
                },
            ]
        );
    }

    #[test]
    fn leading_mode_byte_is_stripped() {
        let classified = classify(&[0x30, 0x20]).expect("classify");
        assert_eq!(classified.mode, Some(Mode::Lines));
        assert_eq!(classified.tokens[0].token, Token::Op(0x20));
        assert_eq!(classified.tokens[0].span, Span::new(1, 2));
    }

    #[test]
    fn truncated_literals_are_malformed() {
        let err = classify(&[0x40, 0x02, 0x01]).expect_err("truncated short");
        assert_eq!(err.span.start, 1);
        assert!(err.message.contains("Short literal"));
        assert!(classify(&[0x04, b'a']).is_err());
        assert!(classify(&[0x07]).is_err());
    }
}
