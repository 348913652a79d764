use super::Interpreter;
use crate::language::ast::Block;
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    listops,
    text::{self, PRINTABLE},
    value::{to_count, to_u32, Value},
};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::rc::Rc;

const HELLO: &[u8] = b"Hello, World!";

impl Interpreter {
    /// `0x60..=0x9a` plus zip and zipwith.
    pub(super) fn extended(&mut self, op: u8) -> RuntimeResult<()> {
        let result = match op {
            0x60 | 0x61 => {
                let (x, y) = self.pop2()?;
                if x.is_truthy() == (op == 0x61) {
                    x
                } else {
                    y
                }
            }
            0x62 => match self.pop2()? {
                (Value::Int(x), Value::Int(y)) => {
                    if y.is_zero() {
                        return Err(RuntimeError::DivisionByZero { opcode: self.name() });
                    }
                    Value::bool(x.mod_floor(&y).is_zero())
                }
                (value, Value::List(mut items)) => {
                    items.insert(0, value);
                    Value::List(items)
                }
                (x, y) => return Err(self.invalid(&[&x, &y])),
            },
            0x63 => return self.divmod_or_group(),
            0x64 | 0x65 => match self.pop()? {
                Value::Int(n) => Value::bool(n.is_even() == (op == 0x64)),
                Value::List(items) => Value::Int(self.reduce_ints(op, &items)?),
                other => return Err(self.invalid(&[&other])),
            },
            0x66 => Value::text(&text::fizzbuzz()),
            0x67 => {
                let n = self.pop_int()?;
                Value::int(n.magnitude().count_ones())
            }
            0x68 => Value::text(HELLO),
            0x69 | 0x6a => {
                let base = if op == 0x69 {
                    self.pop_int()?
                } else {
                    BigInt::from(2)
                };
                if base < BigInt::from(2) {
                    return Err(RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: format!("base {base} must be at least 2"),
                    });
                }
                match self.pop()? {
                    Value::Int(n) => Value::List(to_digits(&n, &base)),
                    Value::List(digits) => Value::Int(self.from_digits(&digits, &base)?),
                    other => return Err(self.invalid(&[&other])),
                }
            }
            0x6b => {
                let n = self.pop_int()?;
                let prime = match n.to_u64() {
                    Some(n) => self.sieve.is_prime(n),
                    None if n.is_negative() => false,
                    None => return Err(self.too_large(&n)),
                };
                Value::bool(prime)
            }
            0x6c => {
                let n = self.pop_int()?;
                let limit = if n.is_negative() {
                    0
                } else {
                    n.to_u64().ok_or_else(|| self.too_large(&n))?
                };
                Value::List(self.sieve.primes_below(limit).into_iter().map(Value::int).collect())
            }
            0x6d => {
                let block = self.pop_block()?;
                let items = self.pop_list()?;
                return self.eval_scan(&block, items);
            }
            0x6e | 0x6f => {
                let n = self.pop_int()?;
                let n = if n.is_negative() {
                    0
                } else {
                    n.to_u64().ok_or_else(|| self.too_large(&n))?
                };
                if op == 0x6e {
                    Value::List(self.sieve.factorize(n).into_iter().map(Value::int).collect())
                } else {
                    Value::int(self.sieve.totient(n))
                }
            }
            0x70..=0x75 => {
                let (x, y) = self.pop2()?;
                Value::bool(match op {
                    0x70 => x < y,
                    0x71 => x == y,
                    0x72 => x > y,
                    0x73 => x >= y,
                    0x74 => x != y,
                    _ => x <= y,
                })
            }
            0x76 => {
                let (x, y) = self.pop2()?;
                Value::int(x.cmp(&y) as i8)
            }
            0x77 => {
                let items = self.pop_list()?;
                Value::bool(items.windows(2).all(|pair| pair[0] <= pair[1]))
            }
            0x78..=0x7b => return self.shift_or_sublists(op),
            0x7c..=0x7f => {
                let n = self.pop_int()?;
                let exponent = to_u32(&n, op)?;
                let base = if op & 1 == 0 { 2 } else { 10 };
                let power = BigInt::from(base).pow(exponent);
                if op >= 0x7e {
                    Value::Int(power - 1)
                } else {
                    Value::Int(power)
                }
            }
            0x80 => {
                let (x, y) = self.pop2()?;
                Value::List(vec![x, y])
            }
            0x81 => {
                let n = self.pop_int()?;
                let value = self.pop()?;
                Value::List(vec![value; self.repeat_count(&n)?])
            }
            0x82 => {
                let n = self.pop_int()?;
                let items = self.pop_list()?;
                let count = self.repeat_count(&n)?.min(items.len());
                Value::List(items[items.len() - count..].to_vec())
            }
            0x83 => {
                let y = self.pop_list()?;
                let x = self.pop_list()?;
                Value::List(listops::product(&[x, y]))
            }
            0x84 => Value::text(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
            0x85 => Value::text(b"abcdefghijklmnopqrstuvwxyz"),
            0x86 => Value::text(b"0123456789"),
            0x87 => Value::text(PRINTABLE),
            0x88..=0x8f => {
                let class = op - 0x88;
                let matched = match self.pop()? {
                    Value::Int(code) => text::char_class(class, &code),
                    Value::List(items) => {
                        !items.is_empty()
                            && items.iter().all(|item| match item {
                                Value::Int(code) => text::char_class(class, code),
                                _ => false,
                            })
                    }
                    other => return Err(self.invalid(&[&other])),
                };
                Value::bool(matched)
            }
            0x90 => {
                for item in self.pop_list()? {
                    self.push(item);
                }
                return Ok(());
            }
            0x91 => {
                let mask = self.pop_list()?;
                let items = self.pop_list()?;
                Value::List(
                    items
                        .into_iter()
                        .zip(mask)
                        .filter(|(_, keep)| keep.is_truthy())
                        .map(|(item, _)| item)
                        .collect(),
                )
            }
            0x92 => {
                let indices = self.pop_list()?;
                let items = self.pop_list()?;
                let mut selected = Vec::with_capacity(indices.len());
                for index in &indices {
                    let Value::Int(index) = index else {
                        return Err(self.invalid(&[index]));
                    };
                    let resolved = listops::resolve_index(items.len(), index)
                        .ok_or_else(|| self.index_error(index, items.len()))?;
                    selected.push(items[resolved].clone());
                }
                Value::List(selected)
            }
            0x93 => {
                let (items, k) = self.pop_list_and_size()?;
                let k = k.unwrap_or(items.len());
                Value::List(listops::permutations(&items, k))
            }
            0x94 => {
                let lists = self.pop_list()?;
                let lists = self.lists_of(lists)?;
                Value::List(listops::product(&lists))
            }
            0x95 => {
                let n = self.pop_int()?;
                let items = self.pop_list()?;
                let copies = vec![items; self.repeat_count(&n)?];
                Value::List(listops::product(&copies))
            }
            0x96 | 0x97 => {
                let n = self.pop_int()?;
                let items = self.pop_list()?;
                let k = to_count(&n, op)?;
                Value::List(listops::combinations(&items, k, op == 0x97))
            }
            0x98 => {
                let items = self.pop_list()?;
                Value::List(
                    items
                        .windows(2)
                        .map(|pair| Value::List(pair.to_vec()))
                        .collect(),
                )
            }
            0x99 => {
                let items = self.pop_list()?;
                let mut flat = Vec::new();
                listops::flatten(&items, &mut flat);
                Value::List(flat)
            }
            0x9a => {
                let rows = self.pop_list()?;
                let rows = self.lists_of(rows)?;
                Value::List(listops::transpose(&rows))
            }
            0xb0 => {
                let y = self.pop_list()?;
                let x = self.pop_list()?;
                Value::List(
                    x.into_iter()
                        .zip(y)
                        .map(|(a, b)| Value::List(vec![a, b]))
                        .collect(),
                )
            }
            _ => {
                let block = self.pop_block()?;
                let y = self.pop_list()?;
                let x = self.pop_list()?;
                return self.eval_zip_with(&block, x, y);
            }
        };
        self.push(result);
        Ok(())
    }

    fn pop_block(&mut self) -> RuntimeResult<Rc<Block>> {
        match self.pop()? {
            Value::Block(block) => Ok(block),
            other => Err(self.invalid(&[&other])),
        }
    }

    /// A list with an optional size on top of it.
    fn pop_list_and_size(&mut self) -> RuntimeResult<(Vec<Value>, Option<usize>)> {
        match self.pop()? {
            Value::List(items) => Ok((items, None)),
            Value::Int(n) => {
                let size = to_count(&n, self.op)?;
                Ok((self.pop_list()?, Some(size)))
            }
            other => Err(self.invalid(&[&other])),
        }
    }

    fn lists_of(&self, values: Vec<Value>) -> RuntimeResult<Vec<Vec<Value>>> {
        values
            .into_iter()
            .map(|value| match value {
                Value::List(items) => Ok(items),
                other => Err(self.invalid(&[&other])),
            })
            .collect()
    }

    fn too_large(&self, n: &BigInt) -> RuntimeError {
        RuntimeError::OutOfRange {
            opcode: self.name(),
            message: format!("{n} is too large"),
        }
    }

    /// Sum (`0x64`) or product (`0x65`) of a list of integers.
    fn reduce_ints(&self, op: u8, items: &[Value]) -> RuntimeResult<BigInt> {
        let mut total = if op == 0x64 { BigInt::zero() } else { BigInt::one() };
        for item in items {
            match item {
                Value::Int(n) if op == 0x64 => total += n,
                Value::Int(n) => total *= n,
                other => return Err(self.invalid(&[other])),
            }
        }
        Ok(total)
    }

    fn from_digits(&self, digits: &[Value], base: &BigInt) -> RuntimeResult<BigInt> {
        let mut total = BigInt::zero();
        for digit in digits {
            let Value::Int(digit) = digit else {
                return Err(self.invalid(&[digit]));
            };
            total = total * base + digit;
        }
        Ok(total)
    }

    fn divmod_or_group(&mut self) -> RuntimeResult<()> {
        if let Value::List(_) = self.peek()? {
            let items = self.pop_list()?;
            self.push(Value::List(listops::group_runs(&items)));
            return Ok(());
        }
        match self.pop2()? {
            (Value::Int(x), Value::Int(y)) => {
                if y.is_zero() {
                    return Err(RuntimeError::DivisionByZero { opcode: self.name() });
                }
                let (quotient, remainder) = x.div_mod_floor(&y);
                self.push(Value::Int(quotient));
                self.push(Value::Int(remainder));
                Ok(())
            }
            (x, y) => Err(self.invalid(&[&x, &y])),
        }
    }

    /// Bit shifts and decimal scaling on integers; prefixes, suffixes and
    /// enumeration on lists.
    fn shift_or_sublists(&mut self, op: u8) -> RuntimeResult<()> {
        if let (Value::List(_), 0x78..=0x7a) = (self.peek()?, op) {
            let items = self.pop_list()?;
            let result = match op {
                0x78 => listops::inits(&items),
                0x79 => listops::tails(&items),
                _ => items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| Value::List(vec![Value::int(idx), item]))
                    .collect(),
            };
            self.push(Value::List(result));
            return Ok(());
        }
        let (x, y) = match self.pop2()? {
            (Value::Int(x), Value::Int(y)) => (x, y),
            (x, y) => return Err(self.invalid(&[&x, &y])),
        };
        let amount = to_count(&y.abs(), op)?;
        let result = match op {
            0x78 | 0x79 => {
                if (op == 0x78) != y.is_negative() {
                    x << amount
                } else {
                    x >> amount
                }
            }
            _ => {
                let scale = BigInt::from(10).pow(to_u32(&y.abs(), op)?);
                if (op == 0x7a) != y.is_negative() {
                    x * scale
                } else {
                    x.div_floor(&scale)
                }
            }
        };
        self.push(Value::Int(result));
        Ok(())
    }
}

/// Digits of `|n|` in `base`, most significant first.
fn to_digits(n: &BigInt, base: &BigInt) -> Vec<Value> {
    let mut n = n.abs();
    if n.is_zero() {
        return vec![Value::int(0)];
    }
    let mut digits = Vec::new();
    while !n.is_zero() {
        let (quotient, remainder) = n.div_rem(base);
        digits.push(Value::Int(remainder));
        n = quotient;
    }
    digits.reverse();
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_most_significant_first() {
        let base = BigInt::from(10);
        assert_eq!(
            to_digits(&BigInt::from(-305), &base),
            vec![Value::int(3), Value::int(0), Value::int(5)]
        );
        assert_eq!(to_digits(&BigInt::from(6), &BigInt::from(2)).len(), 3);
        assert_eq!(to_digits(&BigInt::zero(), &base), vec![Value::int(0)]);
    }
}
