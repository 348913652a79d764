use crate::language::{
    ast::{Block, Item},
    opcode,
    token::Token,
};
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    listops::resolve_index,
    sieve::PrimeSieve,
    value::{render_stack, to_count, Value},
};
use num_bigint::BigInt;
use num_traits::{One, Signed};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::rc::Rc;
use tracing::trace;

mod binary;
mod extended;
mod format;
mod unary;

pub const REGISTER_COUNT: usize = 4;

/// Stack machine state for one evaluation: the stack, the junk history of
/// popped values, registers A-D and the counter.
pub struct Interpreter {
    program: Rc<[u8]>,
    stack: Vec<Value>,
    junk: Vec<Value>,
    registers: [Value; REGISTER_COUNT],
    counter: BigInt,
    sieve: PrimeSieve,
    rng: StdRng,
    halted: bool,
    op: u8,
}

impl Interpreter {
    /// Seeds the stack with the input and registers with the input, its
    /// length, the program bytes and a random number in `0..=2`.
    pub fn new(program: Rc<[u8]>, input: &[u8], seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let registers = [
            Value::text(input),
            Value::int(input.len()),
            Value::text(&program),
            Value::int(rng.gen_range(0..=2u8)),
        ];
        Self {
            program,
            stack: vec![Value::text(input)],
            junk: Vec::new(),
            registers,
            counter: BigInt::one(),
            sieve: PrimeSieve::new(),
            rng,
            halted: false,
            op: opcode::NOP,
        }
    }

    /// Replaces the stack, for callers that seed their own state.
    pub fn with_stack(mut self, stack: Vec<Value>) -> Self {
        self.stack = stack;
        self
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn into_stack(self) -> Vec<Value> {
        self.stack
    }

    pub fn junk(&self) -> &[Value] {
        &self.junk
    }

    pub fn register(&self, index: usize) -> Option<&Value> {
        self.registers.get(index)
    }

    pub fn counter(&self) -> &BigInt {
        &self.counter
    }

    pub fn sieve(&self) -> &PrimeSieve {
        &self.sieve
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Evaluates the root block and renders the final stack.
    pub fn run(&mut self, block: &Block) -> RuntimeResult<Vec<u8>> {
        self.evaluate(block)?;
        render_stack(&self.stack)
    }

    /// Independent evaluator over a copy of this stack. Only the program
    /// bytes are shared; registers, junk and counter start fresh.
    fn spawn_child(&mut self) -> Interpreter {
        let seed = self.rng.gen();
        Interpreter::new(Rc::clone(&self.program), &[], Some(seed))
            .with_stack(self.stack.clone())
    }

    pub fn evaluate(&mut self, block: &Block) -> RuntimeResult<()> {
        for item in &block.items {
            if self.halted {
                break;
            }
            match item {
                Item::Block(inner) => self.push(Value::Block(Rc::clone(inner))),
                Item::Token(token) => self.execute(token)?,
            }
        }
        Ok(())
    }

    fn execute(&mut self, token: &Token) -> RuntimeResult<()> {
        match token {
            Token::Op(op) => {
                self.op = *op;
                trace!(
                    op = opcode::primary_name(*op),
                    depth = self.stack.len(),
                    "dispatch"
                );
                self.dispatch(*op)
            }
            Token::Byte(value) => {
                self.push(Value::int(*value));
                Ok(())
            }
            Token::Short(value) => {
                self.push(Value::int(*value));
                Ok(())
            }
            Token::Long(value) => {
                self.push(Value::int(*value));
                Ok(())
            }
            Token::Char(byte) => {
                self.push(Value::text(&[*byte]));
                Ok(())
            }
            Token::Str { parts, kind } => {
                self.op = opcode::STRING_OPEN;
                self.string_literal(parts, *kind)
            }
        }
    }

    fn dispatch(&mut self, op: u8) -> RuntimeResult<()> {
        match op {
            opcode::NOP => Ok(()),
            0x0a => {
                self.push(Value::text(b"\n"));
                Ok(())
            }
            0x0b => {
                self.push(Value::List(Vec::new()));
                Ok(())
            }
            0x0c => {
                self.push(Value::Block(Rc::new(Block::default())));
                Ok(())
            }
            0x0d => {
                self.push(Value::text(b" "));
                Ok(())
            }
            0x0e => self.make_array(),
            0x0f => {
                self.halted = true;
                Ok(())
            }
            0x10..=0x1a => {
                self.push(Value::int(op - 0x10));
                Ok(())
            }
            0x1b..=0x1f => {
                let value: u16 = match op {
                    0x1b => 100,
                    0x1c => 1000,
                    0x1d => 16,
                    0x1e => 64,
                    _ => 256,
                };
                self.push(Value::int(value));
                Ok(())
            }
            0x20..=0x2f => self.unary(op),
            0x30..=0x3a | 0x3c..=0x3f => self.binary(op),
            0x40..=0x51 => self.shuffle(op),
            0x52..=0x5f => self.format(op),
            0x60..=0x9a | opcode::ZIP | opcode::ZIPWITH => self.extended(op),
            0xa0..=0xaf => self.recall_junk((op - opcode::JUNK_BASE) as usize),
            opcode::COUNTER => {
                self.push(Value::Int(self.counter.clone()));
                self.counter += 1;
                Ok(())
            }
            0xc8..=0xdf => self.register_op(op),
            byte => Err(RuntimeError::UnknownOpcode { byte }),
        }
    }

    // Stack primitives.

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn underflow(&self) -> RuntimeError {
        RuntimeError::StackUnderflow {
            opcode: opcode::name(self.op),
        }
    }

    fn invalid(&self, operands: &[&Value]) -> RuntimeError {
        let found: Vec<&str> = operands.iter().map(|value| value.type_name()).collect();
        RuntimeError::InvalidOperand {
            opcode: opcode::name(self.op),
            found: found.join(", "),
        }
    }

    fn name(&self) -> &'static str {
        opcode::name(self.op)
    }

    /// Removes the top value, recording it in the junk buffer.
    pub(crate) fn pop(&mut self) -> RuntimeResult<Value> {
        let value = self.stack.pop().ok_or_else(|| self.underflow())?;
        self.junk.push(value.clone());
        Ok(value)
    }

    /// Pops `y` then `x`, returning them in stack order.
    fn pop2(&mut self) -> RuntimeResult<(Value, Value)> {
        let y = self.pop()?;
        let x = self.pop()?;
        Ok((x, y))
    }

    fn peek(&self) -> RuntimeResult<&Value> {
        self.stack.last().ok_or_else(|| self.underflow())
    }

    /// Index of the value `depth` places below the top.
    fn slot(&self, depth: usize) -> RuntimeResult<usize> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .ok_or_else(|| self.underflow())
    }

    fn remove_at(&mut self, index: usize) -> Value {
        let value = self.stack.remove(index);
        self.junk.push(value.clone());
        value
    }

    fn pop_int(&mut self) -> RuntimeResult<BigInt> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(self.invalid(&[&other])),
        }
    }

    fn pop_list(&mut self) -> RuntimeResult<Vec<Value>> {
        match self.pop()? {
            Value::List(items) => Ok(items),
            other => Err(self.invalid(&[&other])),
        }
    }

    /// Repetition count: negative counts behave like zero.
    fn repeat_count(&self, n: &BigInt) -> RuntimeResult<usize> {
        if n.is_negative() {
            Ok(0)
        } else {
            to_count(n, self.op)
        }
    }

    fn empty_list(&self) -> RuntimeError {
        RuntimeError::EmptyList {
            opcode: self.name(),
        }
    }

    fn index_error(&self, index: &BigInt, len: usize) -> RuntimeError {
        RuntimeError::IndexOutOfRange {
            opcode: self.name(),
            index: index.to_string(),
            len,
        }
    }

    // Block protocols.

    /// Moves everything above `depth` into one list on top of the stack.
    fn collect_above(&mut self, depth: usize) {
        let start = depth.min(self.stack.len());
        let collected = self.stack.split_off(start);
        self.push(Value::List(collected));
    }

    /// Runs `block` once per item and gathers everything it pushed.
    pub fn eval_map(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let depth = self.stack.len();
        for item in items {
            if self.halted {
                break;
            }
            self.push(item);
            self.evaluate(block)?;
        }
        self.collect_above(depth);
        Ok(())
    }

    /// Runs `block` per item and keeps the item when the value it leaves on
    /// top is truthy.
    pub fn eval_filter(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let depth = self.stack.len();
        for item in items {
            if self.halted {
                break;
            }
            self.push(item.clone());
            self.evaluate(block)?;
            if self.pop()?.is_truthy() {
                self.push(item);
            }
        }
        self.collect_above(depth);
        Ok(())
    }

    fn eval_fold(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let mut items = items.into_iter();
        let seed = items.next().ok_or_else(|| self.empty_list())?;
        self.push(seed);
        for item in items {
            if self.halted {
                break;
            }
            self.push(item);
            self.evaluate(block)?;
        }
        Ok(())
    }

    fn eval_scan(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let mut items = items.into_iter();
        let Some(mut acc) = items.next() else {
            self.push(Value::List(Vec::new()));
            return Ok(());
        };
        let mut results = vec![acc.clone()];
        for item in items {
            if self.halted {
                break;
            }
            self.push(acc);
            self.push(item);
            self.evaluate(block)?;
            acc = self.pop()?;
            results.push(acc.clone());
        }
        self.push(Value::List(results));
        Ok(())
    }

    fn eval_zip_with(&mut self, block: &Block, left: Vec<Value>, right: Vec<Value>) -> RuntimeResult<()> {
        let depth = self.stack.len();
        for (a, b) in left.into_iter().zip(right) {
            if self.halted {
                break;
            }
            self.push(a);
            self.push(b);
            self.evaluate(block)?;
        }
        self.collect_above(depth);
        Ok(())
    }

    fn eval_each(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        for item in items {
            if self.halted {
                break;
            }
            self.push(item);
            self.evaluate(block)?;
        }
        Ok(())
    }

    fn eval_concat_map(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let mut results = Vec::new();
        for item in items {
            if self.halted {
                break;
            }
            self.push(item);
            self.evaluate(block)?;
            match self.pop()? {
                Value::List(inner) => results.extend(inner),
                other => results.push(other),
            }
        }
        self.push(Value::List(results));
        Ok(())
    }

    /// Stable sort keyed by what `block` leaves for each item.
    fn sort_by_block(&mut self, block: &Block, items: Vec<Value>) -> RuntimeResult<()> {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            self.push(item.clone());
            self.evaluate(block)?;
            keyed.push((self.pop()?, item));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        self.push(Value::List(keyed.into_iter().map(|(_, item)| item).collect()));
        Ok(())
    }

    /// Runs `block` against a child copy of the stack and pushes, as one
    /// list, whatever it left above the current depth.
    fn capture(&mut self, block: &Block) -> RuntimeResult<()> {
        let mut child = self.spawn_child();
        child.evaluate(block)?;
        let depth = self.stack.len();
        let mut produced = child.into_stack();
        let extra = produced.split_off(depth.min(produced.len()));
        self.push(Value::List(extra));
        Ok(())
    }

    fn make_array(&mut self) -> RuntimeResult<()> {
        match self.pop()? {
            Value::Int(n) => {
                let size = to_count(&n, self.op)?;
                if size > self.stack.len() {
                    return Err(self.underflow());
                }
                let start = self.stack.len() - size;
                let items = self.stack.split_off(start);
                self.push(Value::List(items));
                Ok(())
            }
            Value::Block(block) => self.capture(&block),
            other => Err(self.invalid(&[&other])),
        }
    }

    // Stack shuffling.

    fn shuffle(&mut self, op: u8) -> RuntimeResult<()> {
        match op {
            0x40 => {
                let top = self.peek()?.clone();
                self.push(top);
            }
            0x41 => {
                let top = self.peek()?.clone();
                self.push(top.clone());
                self.push(top);
            }
            0x42 => {
                let below = self.slot(1)?;
                self.stack.swap(below, below + 1);
            }
            0x43 => {
                let third = self.slot(2)?;
                let value = self.stack.remove(third);
                self.push(value);
            }
            0x44 => {
                let third = self.slot(2)?;
                let top = self.stack.remove(third + 2);
                self.stack.insert(third, top);
            }
            0x45 => {
                let below = self.slot(1)?;
                self.push(self.stack[below].clone());
            }
            0x46 => {
                let below = self.slot(1)?;
                self.remove_at(below);
            }
            0x47 => {
                let below = self.slot(1)?;
                let top = self.stack[below + 1].clone();
                self.stack.insert(below, top);
            }
            0x48 => {
                let below = self.slot(1)?;
                self.push(self.stack[below].clone());
                self.push(self.stack[below + 1].clone());
            }
            0x49 => {
                let n = self.pop_int()?;
                let index = resolve_index(self.stack.len(), &-&n)
                    .ok_or_else(|| self.index_error(&n, self.stack.len()))?;
                self.push(self.stack[index].clone());
            }
            0x4a => {
                let n = self.pop_int()?;
                let index = resolve_index(self.stack.len(), &-&n)
                    .ok_or_else(|| self.index_error(&n, self.stack.len()))?;
                let value = self.stack.remove(index);
                self.push(value);
            }
            0x4b => {
                let snapshot = self.stack.iter().map(Value::deep_copy).collect();
                self.push(Value::List(snapshot));
            }
            0x4c => {
                let top = self.stack.pop().ok_or_else(|| self.underflow())?;
                let rest = std::mem::take(&mut self.stack);
                self.junk.extend(rest);
                self.push(top);
            }
            0x4d => {
                let value = self.pop()?;
                self.push(Value::List(vec![value]));
            }
            0x4e => {
                let n = self.pop_int()?;
                let mut items = int_range(&BigInt::default(), &n);
                items.reverse();
                self.push(Value::List(items));
            }
            0x4f => match self.pop2()? {
                (Value::Int(start), Value::Int(end)) => {
                    self.push(Value::List(int_range(&start, &end)));
                }
                (x, y) => return Err(self.invalid(&[&x, &y])),
            },
            0x50 => {
                self.pop()?;
            }
            _ => {
                self.pop2()?;
            }
        }
        Ok(())
    }

    // Junk, registers.

    fn recall_junk(&mut self, offset: usize) -> RuntimeResult<()> {
        let len = self.junk.len();
        let value = len
            .checked_sub(offset + 1)
            .map(|index| self.junk[index].clone())
            .ok_or_else(|| self.index_error(&BigInt::from(offset), len))?;
        self.push(value);
        Ok(())
    }

    fn register_op(&mut self, op: u8) -> RuntimeResult<()> {
        let index = (op & 3) as usize;
        match op & !3 {
            opcode::REGISTER_SAVE => {
                self.registers[index] = self.peek()?.clone();
            }
            opcode::REGISTER_POP => {
                self.registers[index] = self.pop()?;
            }
            opcode::REGISTER_PUSH => {
                self.push(self.registers[index].clone());
            }
            opcode::REGISTER_NIP => {
                let below = self.slot(1)?;
                self.registers[index] = self.remove_at(below);
            }
            opcode::REGISTER_TUCK => {
                let top = self.slot(0)?;
                self.stack.insert(top, self.registers[index].clone());
            }
            _ => {
                let shown = self.registers[index].show()?;
                self.push(Value::text(&shown));
            }
        }
        Ok(())
    }
}

/// `[start, end)` as integer values; empty when `end <= start`.
fn int_range(start: &BigInt, end: &BigInt) -> Vec<Value> {
    let mut items = Vec::new();
    let mut current = start.clone();
    while &current < end {
        items.push(Value::Int(current.clone()));
        current += 1;
    }
    items
}

#[cfg(test)]
mod tests;
