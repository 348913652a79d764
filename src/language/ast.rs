use crate::language::{lexer::Mode, opcode, token::Token};
use std::rc::Rc;

/// An executable unit: tokens and nested blocks, in program order.
///
/// Blocks are never mutated after the builder hands them out; operations that
/// combine blocks build new ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block {
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    Token(Token),
    Block(Rc<Block>),
}

impl Item {
    pub fn op(op: u8) -> Self {
        Item::Token(Token::Op(op))
    }
}

impl Block {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Concatenation of two blocks' items.
    pub fn join(&self, other: &Block) -> Block {
        let mut items = self.items.clone();
        items.extend(other.items.iter().cloned());
        Block { items }
    }

    /// Writes the tree back to bytecode, nested blocks as explicit
    /// open/close markers.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        for item in &self.items {
            match item {
                Item::Token(token) => token.encode(out),
                Item::Block(inner) => {
                    out.push(opcode::BLOCK_OPEN);
                    inner.encode_into(out);
                    out.push(opcode::BLOCK_CLOSE);
                }
            }
        }
    }

    /// Wraps the whole program in the scaffold selected by the mode byte.
    pub fn wrap_in_mode(self, mode: Mode) -> Block {
        let program = Item::Block(Rc::new(self));
        let items = match mode {
            Mode::Lines => vec![
                Item::op(opcode::DOUBLE_LINES),
                program,
                Item::op(opcode::MAP),
                Item::op(opcode::SHOW_LINES),
            ],
            Mode::Words => vec![
                Item::op(opcode::SQUARE_WORDS),
                program,
                Item::op(opcode::MAP),
                Item::op(opcode::SHOW_WORDS),
            ],
            Mode::LinesSkipFirst => vec![
                Item::op(opcode::DOUBLE_LINES),
                Item::op(opcode::NOT_TAIL),
                program,
                Item::op(opcode::MAP),
                Item::op(opcode::SHOW_LINES),
            ],
        };
        Block { items }
    }

    /// Mnemonic rendering, one word per item, nested blocks in braces.
    pub fn to_mnemonics(&self) -> String {
        let mut words = Vec::new();
        self.collect_mnemonics(&mut words);
        words.join(" ")
    }

    fn collect_mnemonics(&self, words: &mut Vec<String>) {
        for item in &self.items {
            match item {
                Item::Block(inner) => {
                    words.push("{".into());
                    inner.collect_mnemonics(words);
                    words.push("}".into());
                }
                Item::Token(token) => words.push(token_mnemonic(token)),
            }
        }
    }
}

fn token_mnemonic(token: &Token) -> String {
    match token {
        Token::Op(op @ 0x10..=0x1a) => (op - 0x10).to_string(),
        Token::Op(0x1b) => "100".into(),
        Token::Op(0x1c) => "1000".into(),
        Token::Op(0x1d) => "16".into(),
        Token::Op(0x1e) => "64".into(),
        Token::Op(0x1f) => "256".into(),
        Token::Op(op) => opcode::primary_name(*op).to_string(),
        Token::Byte(value) => value.to_string(),
        Token::Short(value) => value.to_string(),
        Token::Long(value) => value.to_string(),
        Token::Char(byte) => format!("( {} )", quote(&[*byte])),
        Token::Str { parts, kind } => {
            let mut text = String::from(kind.group_opener());
            for part in parts {
                text.push(' ');
                text.push_str(&quote(part));
            }
            text.push_str(" )");
            text
        }
    }
}

fn quote(bytes: &[u8]) -> String {
    let mut text = String::from("\"");
    for &byte in bytes {
        match byte {
            b'\n' => text.push_str("\\n"),
            b'\t' => text.push_str("\\t"),
            b'\r' => text.push_str("\\r"),
            b'\\' => text.push_str("\\\\"),
            b'"' => text.push_str("\\x22"),
            0x20..=0x7e => text.push(byte as char),
            _ => text.push_str(&format!("\\x{byte:02x}")),
        }
    }
    text.push('"');
    text
}
