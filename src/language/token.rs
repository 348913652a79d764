use crate::language::{opcode, span::Span};

/// What a string literal does once evaluated, selected by its terminator byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StringKind {
    Plain,
    Array,
    Printf,
    RegexMatch,
    RegexSub,
    RegexFind,
    RegexSplit,
}

impl StringKind {
    pub fn from_terminator(byte: u8) -> Option<Self> {
        Some(match byte {
            opcode::STRING_PLAIN => StringKind::Plain,
            opcode::STRING_ARRAY => StringKind::Array,
            opcode::STRING_PRINTF => StringKind::Printf,
            opcode::STRING_REGEX_MATCH => StringKind::RegexMatch,
            opcode::STRING_REGEX_SUB => StringKind::RegexSub,
            opcode::STRING_REGEX_FIND => StringKind::RegexFind,
            opcode::STRING_REGEX_SPLIT => StringKind::RegexSplit,
            _ => return None,
        })
    }

    pub fn terminator(self) -> u8 {
        match self {
            StringKind::Plain => opcode::STRING_PLAIN,
            StringKind::Array => opcode::STRING_ARRAY,
            StringKind::Printf => opcode::STRING_PRINTF,
            StringKind::RegexMatch => opcode::STRING_REGEX_MATCH,
            StringKind::RegexSub => opcode::STRING_REGEX_SUB,
            StringKind::RegexFind => opcode::STRING_REGEX_FIND,
            StringKind::RegexSplit => opcode::STRING_REGEX_SPLIT,
        }
    }

    /// Opening word of the assembler group producing this kind.
    pub fn group_opener(self) -> &'static str {
        match self {
            StringKind::Plain => "(",
            StringKind::Array => "w(",
            StringKind::Printf => "p(",
            StringKind::RegexMatch => "m(",
            StringKind::RegexSub => "s(",
            StringKind::RegexFind => "f(",
            StringKind::RegexSplit => "v(",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    Op(u8),
    Byte(u8),
    Short(i16),
    Long(i32),
    Str { parts: Vec<Vec<u8>>, kind: StringKind },
    Char(u8),
}

impl Token {
    /// Appends the exact bytes this token was classified from.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Token::Op(op) => out.push(*op),
            Token::Byte(value) => {
                out.push(opcode::BYTE_LITERAL);
                out.push(*value);
            }
            Token::Short(value) => {
                out.push(opcode::SHORT_LITERAL);
                out.extend_from_slice(&value.to_le_bytes());
            }
            Token::Long(value) => {
                out.push(opcode::LONG_LITERAL);
                out.extend_from_slice(&value.to_le_bytes());
            }
            Token::Str { parts, kind } => {
                out.push(opcode::STRING_OPEN);
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        out.push(opcode::STRING_SEPARATOR);
                    }
                    out.extend_from_slice(part);
                }
                out.push(kind.terminator());
            }
            Token::Char(byte) => {
                out.push(opcode::CHAR_LITERAL);
                out.push(*byte);
            }
        }
    }

    pub fn opcode(&self) -> Option<u8> {
        match self {
            Token::Op(op) => Some(*op),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexToken {
    pub token: Token,
    pub span: Span,
}
