use super::{int_range, Interpreter};
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    listops,
    value::Value,
};
use num_bigint::{BigInt, RandBigInt};
use num_integer::Integer;
use num_traits::{Signed, Zero};
use rand::seq::SliceRandom;

impl Interpreter {
    /// `0x20..=0x2f`: one operand, meaning chosen by its kind.
    pub(super) fn unary(&mut self, op: u8) -> RuntimeResult<()> {
        match self.pop()? {
            Value::Int(n) => {
                let result = self.unary_int(op, n)?;
                self.push(result);
                Ok(())
            }
            Value::List(items) => self.unary_list(op, items),
            Value::Block(block) => match op {
                0x20 => self.evaluate(&block),
                0x2f => {
                    let items = self.pop_list()?;
                    self.sort_by_block(&block, items)
                }
                _ => Err(self.invalid(&[&Value::Block(block)])),
            },
        }
    }

    fn unary_int(&mut self, op: u8, n: BigInt) -> RuntimeResult<Value> {
        let value = match op {
            0x20 => Value::Int(-n),
            0x21 => Value::Int(!n),
            0x22 => Value::bool(n.is_zero()),
            0x23 => Value::Int(n.abs()),
            0x24 => Value::List(
                n.abs()
                    .to_string()
                    .bytes()
                    .map(|digit| Value::int(digit - b'0'))
                    .collect(),
            ),
            0x25 => {
                if !n.is_positive() {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: format!("cannot draw from an empty range [0, {n})"),
                    });
                }
                Value::Int(self.rng.gen_bigint_range(&BigInt::zero(), &n))
            }
            0x26 => Value::Int(n - 1),
            0x27 => Value::Int(n + 1),
            0x28 => Value::Int(n.signum()),
            0x29 => Value::Int(n * 1000),
            0x2a => Value::Int(n * 2),
            0x2b => Value::Int(n.div_floor(&BigInt::from(2))),
            0x2c => Value::Int(&n * &n),
            0x2d => {
                if n.is_negative() {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: format!("square root of negative {n}"),
                    });
                }
                Value::Int(n.sqrt())
            }
            0x2e => Value::List(int_range(&BigInt::zero(), &n)),
            _ => Value::List(int_range(&BigInt::from(1), &(n + 1))),
        };
        Ok(value)
    }

    fn unary_list(&mut self, op: u8, mut items: Vec<Value>) -> RuntimeResult<()> {
        let newline = [Value::int(b'\n')];
        let space = [Value::int(b' ')];
        let result = match op {
            0x20 => {
                items.reverse();
                Value::List(items)
            }
            0x21 => items.into_iter().next().ok_or_else(|| self.empty_list())?,
            0x22 => Value::List(items.into_iter().skip(1).collect()),
            0x23 => {
                items.pop();
                Value::List(items)
            }
            0x24 => items.pop().ok_or_else(|| self.empty_list())?,
            0x25 => items
                .choose(&mut self.rng)
                .cloned()
                .ok_or_else(|| self.empty_list())?,
            0x26 => {
                if items.is_empty() {
                    return Err(self.empty_list());
                }
                let head = items.remove(0);
                self.push(Value::List(items));
                head
            }
            0x27 => {
                let last = items.pop().ok_or_else(|| self.empty_list())?;
                self.push(Value::List(items));
                last
            }
            0x28 => items.into_iter().min().ok_or_else(|| self.empty_list())?,
            0x29 => items.into_iter().max().ok_or_else(|| self.empty_list())?,
            0x2a => Value::List(listops::split(&items, &newline, false)),
            0x2b => Value::List(listops::join(&items, &newline)),
            0x2c => Value::List(listops::split(&items, &space, false)),
            0x2d => Value::List(listops::join(&items, &space)),
            0x2e => Value::int(items.len()),
            _ => {
                items.sort();
                Value::List(items)
            }
        };
        self.push(result);
        Ok(())
    }
}
