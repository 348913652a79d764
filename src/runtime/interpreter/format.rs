use super::Interpreter;
use crate::language::token::StringKind;
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    text::{self, Justify},
    value::Value,
};

impl Interpreter {
    /// Pops a value and renders it to bytes.
    fn pop_text(&mut self) -> RuntimeResult<Vec<u8>> {
        self.pop()?.show()
    }

    fn regex_error(&self, message: String) -> RuntimeError {
        RuntimeError::Regex {
            opcode: self.name(),
            message,
        }
    }

    pub(super) fn string_literal(&mut self, parts: &[Vec<u8>], kind: StringKind) -> RuntimeResult<()> {
        match kind {
            StringKind::Plain => {
                for part in parts {
                    self.push(Value::text(part));
                }
            }
            StringKind::Array => {
                let items = parts.iter().map(|part| Value::text(part)).collect();
                self.push(Value::List(items));
            }
            StringKind::Printf => {
                let (format, leading): (&[u8], &[Vec<u8>]) = match parts.split_last() {
                    Some((last, rest)) => (last, rest),
                    None => (&[], &[]),
                };
                for part in leading {
                    self.push(Value::text(part));
                }
                let format_error = |message: String| RuntimeError::Format {
                    opcode: "printf",
                    message,
                };
                let count = text::conversion_count(format).map_err(format_error)?;
                let mut args = Vec::with_capacity(count);
                for _ in 0..count {
                    args.push(self.pop()?);
                }
                args.reverse();
                let rendered = text::printf(format, &args).map_err(format_error)?;
                self.push(Value::text(&rendered));
            }
            StringKind::RegexMatch => {
                let regex = self.compile(parts)?;
                let subject = self.pop_text()?;
                let matched = regex.find(&subject).is_some_and(|m| m.start() == 0);
                self.push(Value::bool(matched));
            }
            StringKind::RegexSub => {
                let regex = self.compile(parts)?;
                let replacement = parts
                    .get(1)
                    .map(|part| text::translate_replacement(part))
                    .unwrap_or_default();
                let subject = self.pop_text()?;
                let replaced = regex.replace_all(&subject, replacement.as_slice());
                self.push(Value::text(&replaced));
            }
            StringKind::RegexFind => {
                let regex = self.compile(parts)?;
                let subject = self.pop_text()?;
                let found = regex
                    .find_iter(&subject)
                    .map(|m| Value::text(m.as_bytes()))
                    .collect();
                self.push(Value::List(found));
            }
            StringKind::RegexSplit => {
                let regex = self.compile(parts)?;
                let subject = self.pop_text()?;
                let pieces = regex.split(&subject).map(Value::text).collect();
                self.push(Value::List(pieces));
            }
        }
        Ok(())
    }

    fn compile(&self, parts: &[Vec<u8>]) -> RuntimeResult<regex::bytes::Regex> {
        let pattern = parts.first().map(Vec::as_slice).unwrap_or_default();
        text::compile_regex(pattern).map_err(|message| self.regex_error(message))
    }

    /// `0x52..=0x5f`: rendering values to text.
    pub(super) fn format(&mut self, op: u8) -> RuntimeResult<()> {
        let result = match op {
            0x52 => Value::text(&self.pop_text()?),
            0x53 => {
                let items = self.pop_list()?;
                let shown = items
                    .iter()
                    .map(|item| item.show().map(|bytes| Value::text(&bytes)))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Value::List(shown)
            }
            0x54 => Value::text(&self.show_joined(b"\n")?),
            0x55 => Value::text(&self.show_joined(b" ")?),
            0x56 => {
                let subject = self.pop_text()?;
                let numbers = text::read_numbers(&subject).map_err(|err| self.regex_error(err))?;
                let first = numbers.into_iter().next().ok_or_else(|| {
                    RuntimeError::OutOfRange {
                        opcode: self.name(),
                        message: "no number in text".into(),
                    }
                })?;
                Value::Int(first)
            }
            0x57 => {
                let subject = self.pop_text()?;
                let numbers = text::read_numbers(&subject).map_err(|err| self.regex_error(err))?;
                Value::List(numbers.into_iter().map(Value::Int).collect())
            }
            0x58 => {
                let mut shown = self.pop_text()?;
                shown.push(b'\n');
                Value::text(&shown)
            }
            0x59 => {
                let mut shown = self.pop_text()?;
                shown.push(b' ');
                Value::text(&shown)
            }
            0x5a => Value::text(&self.show_joined(b", ")?),
            0x5b => {
                let mut shown = vec![b'['];
                shown.extend(self.show_joined(b", ")?);
                shown.push(b']');
                Value::text(&shown)
            }
            0x5c..=0x5e => {
                let width = self.pop_int()?;
                let items = self.pop_list()?;
                let width = self.repeat_count(&width)?;
                let how = match op {
                    0x5c => Justify::Left,
                    0x5d => Justify::Center,
                    _ => Justify::Right,
                };
                Value::List(text::justify(&items, width, how))
            }
            _ => Value::text(self.pop()?.inspect().as_bytes()),
        };
        self.push(result);
        Ok(())
    }

    /// Pops a list and joins its rendered elements with `separator`.
    fn show_joined(&mut self, separator: &[u8]) -> RuntimeResult<Vec<u8>> {
        let items = self.pop_list()?;
        let mut out = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                out.extend_from_slice(separator);
            }
            out.extend(item.show()?);
        }
        Ok(out)
    }
}
