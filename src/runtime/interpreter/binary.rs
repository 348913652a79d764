use super::Interpreter;
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    listops,
    value::{canonicalize, to_count, to_i64, to_u32, Shape, Value},
};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use std::cmp::{max, min};

const MUL_SWAPS: &[(Shape, Shape)] = &[
    (Shape::Int, Shape::Block),
    (Shape::Int, Shape::List),
    (Shape::Block, Shape::List),
];
const LIST_FIRST: &[(Shape, Shape)] = &[(Shape::NotList, Shape::List)];
const AND_SWAPS: &[(Shape, Shape)] = &[
    (Shape::Block, Shape::Int),
    (Shape::Int, Shape::List),
    (Shape::Block, Shape::List),
];
const BLOCK_LAST: &[(Shape, Shape)] = &[(Shape::Block, Shape::Int)];
const LIST_BEFORE_BLOCK: &[(Shape, Shape)] = &[(Shape::Block, Shape::List)];
const LIST_BEFORE_INT: &[(Shape, Shape)] = &[(Shape::Int, Shape::List)];

impl Interpreter {
    /// `0x30..=0x3f`: arithmetic that doubles as list and block combinators.
    pub(super) fn binary(&mut self, op: u8) -> RuntimeResult<()> {
        match op {
            0x38 => return self.smallest_or_both(),
            0x3a => return self.clamp(),
            _ => {}
        }
        let (x, y) = self.pop2()?;
        match op {
            0x30 => self.add(x, y),
            0x31 => self.subtract(x, y),
            0x32 => {
                let (x, y) = canonicalize(x, y, MUL_SWAPS);
                self.multiply(x, y)
            }
            0x33 => {
                let (x, y) = canonicalize(x, y, LIST_FIRST);
                self.divide(x, y)
            }
            0x34 => {
                let (x, y) = canonicalize(x, y, LIST_FIRST);
                self.modulo(x, y)
            }
            0x35 => {
                let (x, y) = canonicalize(x, y, AND_SWAPS);
                self.and(x, y)
            }
            0x36 => {
                let (x, y) = canonicalize(x, y, BLOCK_LAST);
                self.or(x, y)
            }
            0x37 => {
                let (x, y) = canonicalize(x, y, LIST_BEFORE_BLOCK);
                self.xor(x, y)
            }
            0x39 => {
                self.push(max(x, y));
                Ok(())
            }
            _ => {
                let (x, y) = canonicalize(x, y, LIST_BEFORE_INT);
                self.number_or_slice(op, x, y)
            }
        }
    }

    fn add(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        let result = match (x, y) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Value::List(a)
            }
            (Value::Block(a), Value::Block(b)) => Value::Block(a.join(&b).into()),
            (Value::List(mut a), value) => {
                a.push(value);
                Value::List(a)
            }
            (value, Value::List(mut b)) => {
                b.insert(0, value);
                Value::List(b)
            }
            (x, y) => return Err(self.invalid(&[&x, &y])),
        };
        self.push(result);
        Ok(())
    }

    fn subtract(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        let result = match (x, y) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a - b),
            (Value::List(a), Value::List(b)) => Value::List(listops::set_diff(&a, &b)),
            (Value::List(a), value) | (value, Value::List(a)) => {
                Value::List(listops::set_diff(&a, &[value]))
            }
            (x, y) => return Err(self.invalid(&[&x, &y])),
        };
        self.push(result);
        Ok(())
    }

    fn multiply(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => self.push(Value::Int(a * b)),
            (Value::List(a), Value::List(b)) => self.push(Value::List(listops::join(&a, &b))),
            (Value::List(a), Value::Int(n)) => {
                let count = self.repeat_count(&n)?;
                let repeated = a.iter().cycle().take(a.len() * count).cloned().collect();
                self.push(Value::List(repeated));
            }
            (Value::Block(block), Value::Int(n)) => {
                for _ in 0..self.repeat_count(&n)? {
                    if self.halted {
                        break;
                    }
                    self.evaluate(&block)?;
                }
            }
            (Value::List(items), Value::Block(block)) => self.eval_fold(&block, items)?,
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn divide(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => {
                if b.is_zero() {
                    return Err(RuntimeError::DivisionByZero { opcode: self.name() });
                }
                self.push(Value::Int(a.div_floor(&b)));
            }
            (Value::List(items), Value::Int(n)) => {
                if !n.is_positive() {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: format!("chunk size {n} must be positive"),
                    });
                }
                let size = to_count(&n, self.op)?;
                self.push(Value::List(listops::chunks(&items, size)));
            }
            (Value::List(items), Value::List(separator)) => {
                self.push(Value::List(listops::split(&items, &separator, false)));
            }
            (Value::List(items), Value::Block(block)) => self.eval_each(&block, items)?,
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn modulo(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => {
                if b.is_zero() {
                    return Err(RuntimeError::DivisionByZero { opcode: self.name() });
                }
                self.push(Value::Int(a.mod_floor(&b)));
            }
            (Value::List(items), Value::Int(step)) => {
                if step.is_zero() {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: "step cannot be zero".into(),
                    });
                }
                let step = to_i64(&step, self.op)?;
                self.push(Value::List(listops::stride(&items, step)));
            }
            (Value::List(items), Value::List(separator)) => {
                self.push(Value::List(listops::split(&items, &separator, true)));
            }
            (Value::List(items), Value::Block(block)) => self.eval_map(&block, items)?,
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn and(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => self.push(Value::Int(a & b)),
            (Value::List(a), Value::List(b)) => self.push(Value::List(listops::set_and(&a, &b))),
            (Value::List(items), Value::Int(index)) => {
                let resolved = listops::resolve_index(items.len(), &index)
                    .ok_or_else(|| self.index_error(&index, items.len()))?;
                self.push(items[resolved].clone());
            }
            (Value::Int(flag), Value::Block(block)) => {
                if !flag.is_zero() {
                    self.evaluate(&block)?;
                }
            }
            (Value::List(items), Value::Block(block)) => self.eval_filter(&block, items)?,
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn or(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => self.push(Value::Int(a | b)),
            (Value::List(a), Value::List(b)) => self.push(Value::List(listops::set_or(&a, &b))),
            (Value::Int(flag), Value::Block(block)) => {
                if flag.is_zero() {
                    self.evaluate(&block)?;
                }
            }
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn xor(&mut self, x: Value, y: Value) -> RuntimeResult<()> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => self.push(Value::Int(a ^ b)),
            (Value::List(a), Value::List(b)) => self.push(Value::List(listops::set_xor(&a, &b))),
            (Value::List(items), Value::Block(block)) => self.eval_concat_map(&block, items)?,
            (x, y) => return Err(self.invalid(&[&x, &y])),
        }
        Ok(())
    }

    fn smallest_or_both(&mut self) -> RuntimeResult<()> {
        if let Value::Block(_) = self.peek()? {
            let Value::Block(block) = self.pop()? else {
                return Err(self.underflow());
            };
            let (a, b) = self.pop2()?;
            self.push(a);
            self.evaluate(&block)?;
            self.push(b);
            return self.evaluate(&block);
        }
        let (x, y) = self.pop2()?;
        self.push(min(x, y));
        Ok(())
    }

    fn clamp(&mut self) -> RuntimeResult<()> {
        let upper = self.pop()?;
        let (x, lower) = self.pop2()?;
        self.push(min(max(x, lower), upper));
        Ok(())
    }

    /// gcd/take, lcm/drop, pow/index and log/member.
    fn number_or_slice(&mut self, op: u8, x: Value, y: Value) -> RuntimeResult<()> {
        let result = match (op, x, y) {
            (0x3c, Value::Int(a), Value::Int(b)) => Value::Int(a.gcd(&b)),
            (0x3c, Value::List(items), Value::Int(n)) => {
                let end = listops::slice_bound(items.len(), &n);
                Value::List(items[..end].to_vec())
            }
            (0x3d, Value::Int(a), Value::Int(b)) => {
                if a.is_zero() || b.is_zero() {
                    Value::Int(BigInt::zero())
                } else {
                    Value::Int(a.lcm(&b))
                }
            }
            (0x3d, Value::List(items), Value::Int(n)) => {
                let start = listops::slice_bound(items.len(), &n);
                Value::List(items[start..].to_vec())
            }
            (0x3e, Value::Int(a), Value::Int(b)) => {
                if b.is_negative() {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: format!("negative exponent {b}"),
                    });
                }
                Value::Int(a.pow(to_u32(&b, op)?))
            }
            (0x3e, Value::List(items), needle) => Value::int(
                items
                    .iter()
                    .position(|item| *item == needle)
                    .map_or(-1, |idx| idx as i64),
            ),
            (0x3f, Value::Int(a), Value::Int(b)) => Value::Int(self.floor_log(&a, &b)?),
            (0x3f, Value::List(items), needle) => Value::bool(items.contains(&needle)),
            (_, x, y) => return Err(self.invalid(&[&x, &y])),
        };
        self.push(result);
        Ok(())
    }

    fn floor_log(&self, value: &BigInt, base: &BigInt) -> RuntimeResult<BigInt> {
        if !value.is_positive() || base < &BigInt::from(2) {
            return Err(RuntimeError::OutOfRange {
                opcode: self.name(),
                message: format!("log of {value} in base {base}"),
            });
        }
        let mut exponent = BigInt::zero();
        let mut power = base.clone();
        while &power <= value {
            exponent += 1;
            power *= base;
        }
        Ok(exponent)
    }
}
