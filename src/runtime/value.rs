use crate::language::{ast::Block, opcode};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::rc::Rc;

/// A runtime value. Variant order gives the cross-kind ordering used by
/// sorting and comparison: integers first, then blocks, then lists.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Int(BigInt),
    Block(Rc<Block>),
    List(Vec<Value>),
}

impl Value {
    pub fn int(value: impl Into<BigInt>) -> Self {
        Value::Int(value.into())
    }

    pub fn bool(flag: bool) -> Self {
        Value::int(flag as u8)
    }

    /// Text is a list of character codes.
    pub fn text(bytes: &[u8]) -> Self {
        Value::List(bytes.iter().map(|b| Value::int(*b)).collect())
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => !n.is_zero(),
            Value::List(_) | Value::Block(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::List(_) => "list",
            Value::Block(_) => "block",
        }
    }

    /// Copies every list and block rather than sharing them.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Int(n) => Value::Int(n.clone()),
            Value::List(items) => Value::List(items.iter().map(Value::deep_copy).collect()),
            Value::Block(block) => Value::Block(Rc::new(Block::clone(block))),
        }
    }

    /// Renders at top level: integers as decimal text.
    pub fn show(&self) -> RuntimeResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_shown(&mut out, false)?;
        Ok(out)
    }

    /// Text payload of a value: a list's elements rendered as characters.
    pub fn show_nested(&self) -> RuntimeResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_shown(&mut out, true)?;
        Ok(out)
    }

    fn write_shown(&self, out: &mut Vec<u8>, nested: bool) -> RuntimeResult<()> {
        match self {
            Value::Int(n) if nested => push_char(out, n),
            Value::Int(n) => {
                out.extend_from_slice(n.to_string().as_bytes());
                Ok(())
            }
            Value::List(items) => {
                for item in items {
                    item.write_shown(out, true)?;
                }
                Ok(())
            }
            Value::Block(block) => {
                out.extend(block.encode());
                Ok(())
            }
        }
    }

    /// Debug rendering: `[1, [2, 3]]`, blocks as `{mnemonics}`.
    pub fn inspect(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Block(block) => format!("{{{}}}", block.to_mnemonics()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}

fn push_char(out: &mut Vec<u8>, code: &BigInt) -> RuntimeResult<()> {
    let invalid = || RuntimeError::InvalidCharacter {
        code: code.to_string(),
    };
    let code = code.to_u32().ok_or_else(invalid)?;
    if code <= 0xff {
        out.push(code as u8);
        return Ok(());
    }
    let ch = char::from_u32(code).ok_or_else(invalid)?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    Ok(())
}

/// Output of a finished run: each stack entry rendered at top level.
pub fn render_stack(stack: &[Value]) -> RuntimeResult<Vec<u8>> {
    let mut out = Vec::new();
    for value in stack {
        out.extend(value.show()?);
    }
    Ok(out)
}

/// Operand pattern used when reordering a popped pair before dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Int,
    List,
    Block,
    NotList,
}

impl Shape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Int => matches!(value, Value::Int(_)),
            Shape::List => matches!(value, Value::List(_)),
            Shape::Block => matches!(value, Value::Block(_)),
            Shape::NotList => !matches!(value, Value::List(_)),
        }
    }
}

/// Applies each `(left, right)` swap rule in turn: when `x` matches `left`
/// and `y` matches `right` the pair is exchanged.
pub fn canonicalize(x: Value, y: Value, swaps: &[(Shape, Shape)]) -> (Value, Value) {
    let (mut x, mut y) = (x, y);
    for (left, right) in swaps {
        if left.matches(&x) && right.matches(&y) {
            std::mem::swap(&mut x, &mut y);
        }
    }
    (x, y)
}

pub fn to_i64(n: &BigInt, op: u8) -> RuntimeResult<i64> {
    n.to_i64().ok_or_else(|| RuntimeError::OutOfRange {
        opcode: opcode::name(op),
        message: format!("{n} does not fit in 64 bits"),
    })
}

/// Non-negative count or size operand.
pub fn to_count(n: &BigInt, op: u8) -> RuntimeResult<usize> {
    n.to_usize().ok_or_else(|| RuntimeError::OutOfRange {
        opcode: opcode::name(op),
        message: format!("{n} is not a valid count"),
    })
}

pub fn to_u32(n: &BigInt, op: u8) -> RuntimeResult<u32> {
    n.to_u32().ok_or_else(|| RuntimeError::OutOfRange {
        opcode: opcode::name(op),
        message: format!("{n} is not a valid exponent"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::ast::Item;

    fn list(values: &[i64]) -> Value {
        Value::List(values.iter().map(|v| Value::int(*v)).collect())
    }

    #[test]
    fn lists_render_nested_integers_as_characters() {
        let value = Value::List(vec![Value::text(b"hi"), Value::int(33), list(&[0x263a])]);
        assert_eq!(value.show().unwrap(), "hi!\u{263a}".as_bytes());
        assert_eq!(Value::int(-42).show().unwrap(), b"-42");
    }

    #[test]
    fn invalid_code_points_fail_to_render() {
        assert!(matches!(
            list(&[-1]).show(),
            Err(RuntimeError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn empty_list_is_truthy_and_zero_is_not() {
        assert!(Value::List(Vec::new()).is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(Value::int(-3).is_truthy());
    }

    #[test]
    fn ordering_ranks_kinds_then_contents() {
        let block = Value::Block(Rc::new(Block::new(vec![Item::op(0x40)])));
        assert!(Value::int(1_000_000) < list(&[]));
        assert!(Value::int(1_000_000) < block);
        assert!(list(&[1, 2]) < list(&[1, 3]));
        assert!(block < list(&[]));

        let mut mixed = vec![list(&[9]), block.clone(), Value::int(4)];
        mixed.sort();
        assert_eq!(mixed, vec![Value::int(4), block, list(&[9])]);
    }

    #[test]
    fn canonicalize_applies_rules_in_sequence() {
        let (x, y) = canonicalize(
            Value::int(2),
            list(&[1]),
            &[(Shape::NotList, Shape::List)],
        );
        assert_eq!((x, y), (list(&[1]), Value::int(2)));
    }

    #[test]
    fn inspect_nests_brackets() {
        let value = Value::List(vec![Value::int(1), list(&[2, 3])]);
        assert_eq!(value.inspect(), "[1, [2, 3]]");
    }
}
