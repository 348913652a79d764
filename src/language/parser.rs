use crate::language::{
    ast::{Block, Item},
    errors::SyntaxError,
    lexer::classify,
    opcode,
    span::Span,
    token::{LexToken, Token},
};
use std::rc::Rc;
use tracing::debug;

/// Tokenizes and builds the root block, applying the mode wrapper last.
pub fn parse(program: &[u8]) -> Result<Block, SyntaxError> {
    let classified = classify(program)?;
    let root = build(&classified.tokens)?;
    Ok(match classified.mode {
        Some(mode) => root.wrap_in_mode(mode),
        None => root,
    })
}

/// Folds a token stream into a block tree, expanding every sugar form.
pub fn build(tokens: &[LexToken]) -> Result<Block, SyntaxError> {
    let mut builder = BlockBuilder::new();
    for lex in tokens {
        builder.feed(lex)?;
    }
    builder.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trailer {
    Root,
    /// `{ ... }`; its nop placeholder has no effect and is not emitted.
    Explicit,
    /// Rest-of-program block closed by end of stream, followed by this opcode.
    Rest(u8),
}

struct Frame {
    items: Vec<Item>,
    trailer: Trailer,
    opened_at: Span,
}

struct BlockBuilder {
    frames: Vec<Frame>,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            frames: vec![Frame {
                items: Vec::new(),
                trailer: Trailer::Root,
                opened_at: Span::at(0),
            }],
        }
    }

    fn current(&mut self) -> &mut Vec<Item> {
        let last = self.frames.len() - 1;
        &mut self.frames[last].items
    }

    fn open(&mut self, trailer: Trailer, span: Span) {
        self.frames.push(Frame {
            items: Vec::new(),
            trailer,
            opened_at: span,
        });
    }

    fn close(&mut self, frame: Frame) {
        let target = self.current();
        target.push(Item::Block(Rc::new(Block::new(frame.items))));
        if let Trailer::Rest(op) = frame.trailer {
            target.push(Item::op(op));
        }
    }

    /// Moves up to `count` trailing items of the current block into a new
    /// nested block.
    fn wrap_last(&mut self, count: usize) {
        let items = self.current();
        let split_at = items.len().saturating_sub(count);
        let wrapped = items.split_off(split_at);
        items.push(Item::Block(Rc::new(Block::new(wrapped))));
    }

    fn feed(&mut self, lex: &LexToken) -> Result<(), SyntaxError> {
        let op = match &lex.token {
            Token::Op(op) => *op,
            other => {
                self.current().push(Item::Token(other.clone()));
                return Ok(());
            }
        };

        match op {
            opcode::BLOCK_OPEN => self.open(Trailer::Explicit, lex.span),
            opcode::BLOCK_CLOSE => {
                if self.frames.len() == 1 {
                    return Err(SyntaxError::new("Unbalanced block close", lex.span)
                        .with_help("Every `}` (0x09) needs a matching `{` (0x08) before it"));
                }
                if let Some(frame) = self.frames.pop() {
                    self.close(frame);
                }
            }
            opcode::ZIPWITH1 | opcode::ZIPWITH2 => {
                self.wrap_last((op - opcode::ZIPWITH1 + 1) as usize);
                self.current().push(Item::op(opcode::ZIPWITH));
            }
            opcode::DUMP_MAP | opcode::DUMP_FILTER => {
                let Some(last) = self.current().pop() else {
                    return Err(SyntaxError::new(
                        "Dump sugar has no preceding item to wrap",
                        lex.span,
                    ));
                };
                let combinator = if op == opcode::DUMP_MAP {
                    opcode::MAP
                } else {
                    opcode::FILTER
                };
                let items = self.current();
                items.push(Item::Block(Rc::new(Block::new(vec![
                    Item::op(opcode::DUMP),
                    last,
                ]))));
                items.push(Item::op(combinator));
            }
            opcode::MAP_REST => self.open(Trailer::Rest(opcode::MAP), lex.span),
            opcode::FILTER_REST => self.open(Trailer::Rest(opcode::FILTER), lex.span),
            _ => match opcode::quick_block(op) {
                Some((count, combinator)) => {
                    self.wrap_last(count);
                    if let Some(combinator) = combinator.opcode() {
                        self.current().push(Item::op(combinator));
                    }
                }
                None => self.current().push(Item::op(op)),
            },
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Block, SyntaxError> {
        while self.frames.len() > 1 {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            match frame.trailer {
                Trailer::Rest(_) => self.close(frame),
                Trailer::Explicit | Trailer::Root => {
                    return Err(SyntaxError::new("Unclosed block", frame.opened_at)
                        .with_help("Close the block with `}` (0x09)"));
                }
            }
        }
        let root = self.frames.pop().map(|frame| frame.items).unwrap_or_default();
        debug!(items = root.len(), "built root block");
        Ok(Block::new(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(items: Vec<Item>) -> Item {
        Item::Block(Rc::new(Block::new(items)))
    }

    #[test]
    fn quick_map_matches_explicit_block_and_map() {
        let sugared = parse(&[0x27, 0xe8]).expect("sugar");
        let explicit = parse(&[0x08, 0x27, 0x09, 0x34]).expect("explicit");
        assert_eq!(sugared, explicit);
        assert_eq!(sugared.items, vec![block(vec![Item::op(0x27)]), Item::op(0x34)]);
    }

    #[test]
    fn quick_block_takes_last_items_only() {
        let parsed = parse(&[0x10, 0x11, 0x12, 0xf9]).expect("parse");
        assert_eq!(
            parsed.items,
            vec![
                Item::op(0x10),
                block(vec![Item::op(0x11), Item::op(0x12)]),
                Item::op(0x38),
            ]
        );
    }

    #[test]
    fn zipwith_and_dump_sugar_expand() {
        let parsed = parse(&[0x10, 0x30, 0xee]).expect("zipwith");
        assert_eq!(
            parsed.items,
            vec![Item::op(0x10), block(vec![Item::op(0x30)]), Item::op(0xb1)]
        );

        let parsed = parse(&[0x20, 0xf7]).expect("dump filter");
        assert_eq!(
            parsed.items,
            vec![block(vec![Item::op(0x90), Item::op(0x20)]), Item::op(0x35)]
        );
    }

    #[test]
    fn rest_of_program_blocks_close_in_lifo_order() {
        let parsed = parse(&[0x2a, 0xfe, 0x20, 0xff, 0x21]).expect("parse");
        assert_eq!(
            parsed.items,
            vec![
                Item::op(0x2a),
                block(vec![
                    Item::op(0x20),
                    block(vec![Item::op(0x21)]),
                    Item::op(0x35),
                ]),
                Item::op(0x34),
            ]
        );
    }

    #[test]
    fn unbalanced_markers_are_malformed() {
        let err = parse(&[0x40, 0x09]).expect_err("stray close");
        assert_eq!(err.span, Span::new(1, 2));
        let err = parse(&[0x08, 0x40]).expect_err("unclosed");
        assert_eq!(err.span, Span::new(0, 1));
        assert!(parse(&[0xf6]).is_err());
    }

    #[test]
    fn canonical_programs_encode_back_to_their_bytes() {
        let program = [0x01, 0x20, 0x08, 0x40, 0x08, 0x30, 0x09, 0x09, 0x34, 0x04, b'a', 0x05];
        assert_eq!(parse(&program).expect("parse").encode(), program.to_vec());
    }
}
