//! Text-level helpers: printf formatting, regular expressions over byte
//! strings, number extraction, justification and character classes.

use crate::runtime::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use regex::bytes::{Regex, RegexBuilder};

/// Printable ASCII: digits, letters, punctuation, then whitespace.
pub const PRINTABLE: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

pub const FIZZBUZZ_LIMIT: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Directive {
    align: Align,
    zero: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
    conversion: u8,
}

enum Piece {
    Literal(Vec<u8>),
    Conversion(Directive),
}

fn parse_format(format: &[u8]) -> Result<Vec<Piece>, String> {
    let mut pieces = Vec::new();
    let mut literal = Vec::new();
    let mut idx = 0;
    while idx < format.len() {
        let byte = format[idx];
        idx += 1;
        if byte != b'%' {
            literal.push(byte);
            continue;
        }
        if format.get(idx) == Some(&b'%') {
            literal.push(b'%');
            idx += 1;
            continue;
        }
        let mut directive = Directive {
            align: Align::Right,
            zero: false,
            plus: false,
            width: 0,
            precision: None,
            conversion: b's',
        };
        while let Some(flag) = format.get(idx) {
            match flag {
                b'-' => directive.align = Align::Left,
                b'0' => directive.zero = true,
                b'+' => directive.plus = true,
                b' ' | b'#' => {}
                _ => break,
            }
            idx += 1;
        }
        while let Some(digit) = format.get(idx).filter(|b| b.is_ascii_digit()) {
            directive.width = directive.width * 10 + (digit - b'0') as usize;
            idx += 1;
        }
        if format.get(idx) == Some(&b'.') {
            idx += 1;
            let mut precision = 0;
            while let Some(digit) = format.get(idx).filter(|b| b.is_ascii_digit()) {
                precision = precision * 10 + (digit - b'0') as usize;
                idx += 1;
            }
            directive.precision = Some(precision);
        }
        match format.get(idx) {
            Some(conv @ (b's' | b'd' | b'i' | b'c' | b'x' | b'X' | b'o' | b'r')) => {
                directive.conversion = *conv;
                idx += 1;
            }
            Some(other) => return Err(format!("unsupported conversion '%{}'", *other as char)),
            None => return Err("incomplete format".into()),
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Conversion(directive));
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

/// Number of values a format string consumes.
pub fn conversion_count(format: &[u8]) -> Result<usize, String> {
    Ok(parse_format(format)?
        .iter()
        .filter(|piece| matches!(piece, Piece::Conversion(_)))
        .count())
}

fn int_arg(value: &Value, conversion: u8) -> Result<&BigInt, String> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(format!(
            "%{} needs an int, found {}",
            conversion as char,
            other.type_name()
        )),
    }
}

fn render_conversion(directive: &Directive, value: &Value) -> Result<Vec<u8>, String> {
    let mut body = match directive.conversion {
        b's' => {
            let mut shown = value.show().map_err(|err| err.to_string())?;
            if let Some(precision) = directive.precision {
                shown.truncate(precision);
            }
            shown
        }
        b'r' => value.inspect().into_bytes(),
        b'c' => match value {
            Value::Int(_) => Value::List(vec![value.clone()])
                .show()
                .map_err(|err| err.to_string())?,
            Value::List(_) => value.show().map_err(|err| err.to_string())?,
            Value::Block(_) => return Err("%c needs an int or a string".into()),
        },
        conversion => {
            let n = int_arg(value, conversion)?;
            let digits = match conversion {
                b'x' => n.abs().to_str_radix(16),
                b'X' => n.abs().to_str_radix(16).to_uppercase(),
                b'o' => n.abs().to_str_radix(8),
                _ => n.abs().to_string(),
            };
            let sign = if n.is_negative() {
                "-"
            } else if directive.plus {
                "+"
            } else {
                ""
            };
            if directive.zero && directive.align == Align::Right {
                let pad = directive.width.saturating_sub(sign.len() + digits.len());
                format!("{sign}{}{digits}", "0".repeat(pad)).into_bytes()
            } else {
                format!("{sign}{digits}").into_bytes()
            }
        }
    };
    if body.len() < directive.width {
        let pad = vec![b' '; directive.width - body.len()];
        body = match directive.align {
            Align::Left => [body, pad].concat(),
            Align::Right => [pad, body].concat(),
        };
    }
    Ok(body)
}

/// printf-style `%` formatting of `args` into `format`.
pub fn printf(format: &[u8], args: &[Value]) -> Result<Vec<u8>, String> {
    let pieces = parse_format(format)?;
    let mut args = args.iter();
    let mut out = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Literal(bytes) => out.extend(bytes),
            Piece::Conversion(directive) => {
                let value = args
                    .next()
                    .ok_or_else(|| "not enough arguments for format string".to_string())?;
                out.extend(render_conversion(&directive, value)?);
            }
        }
    }
    Ok(out)
}

pub fn compile_regex(pattern: &[u8]) -> Result<Regex, String> {
    let pattern = std::str::from_utf8(pattern).map_err(|err| err.to_string())?;
    RegexBuilder::new(pattern)
        .unicode(false)
        .build()
        .map_err(|err| err.to_string())
}

/// Translates backslash replacement syntax (`\1`, `\g<name>`) to the regex
/// crate's `${1}` form.
pub fn translate_replacement(replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut idx = 0;
    while idx < replacement.len() {
        let byte = replacement[idx];
        match byte {
            b'$' => out.extend_from_slice(b"$$"),
            b'\\' => match replacement.get(idx + 1) {
                Some(digit) if digit.is_ascii_digit() => {
                    out.extend_from_slice(b"${");
                    out.push(*digit);
                    out.push(b'}');
                    idx += 1;
                }
                Some(b'g') if replacement.get(idx + 2) == Some(&b'<') => {
                    let name_start = idx + 3;
                    match replacement[name_start..].iter().position(|b| *b == b'>') {
                        Some(len) => {
                            out.extend_from_slice(b"${");
                            out.extend_from_slice(&replacement[name_start..name_start + len]);
                            out.push(b'}');
                            idx = name_start + len;
                        }
                        None => out.push(b'\\'),
                    }
                }
                Some(b'n') => {
                    out.push(b'\n');
                    idx += 1;
                }
                Some(b'\\') => {
                    out.push(b'\\');
                    idx += 1;
                }
                _ => out.push(b'\\'),
            },
            other => out.push(other),
        }
        idx += 1;
    }
    out
}

/// Every `-?\d+` run in the text, as integers.
pub fn read_numbers(text: &[u8]) -> Result<Vec<BigInt>, String> {
    let pattern = compile_regex(br"-?\d+")?;
    Ok(pattern
        .find_iter(text)
        .filter_map(|found| BigInt::parse_bytes(found.as_bytes(), 10))
        .collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Justify {
    Left,
    Center,
    Right,
}

/// Pads `items` with spaces to `width`, keeping them left, centred or right.
pub fn justify(items: &[Value], width: usize, how: Justify) -> Vec<Value> {
    let margin = width.saturating_sub(items.len());
    let left = match how {
        Justify::Left => 0,
        Justify::Right => margin,
        Justify::Center => margin / 2 + (margin & width & 1),
    };
    let space = Value::int(b' ');
    let mut out = vec![space.clone(); left];
    out.extend(items.iter().cloned());
    out.extend(std::iter::repeat(space).take(margin - left));
    out
}

/// Character classes behind the `is-*` opcodes, indexed from `is-alnum`.
pub fn char_class(class: u8, code: &BigInt) -> bool {
    let Some(byte) = code.to_u8() else {
        return false;
    };
    match class {
        0 => byte.is_ascii_alphanumeric(),
        1 => byte.is_ascii_alphabetic(),
        2 => byte.is_ascii_digit(),
        3 => byte.is_ascii_lowercase(),
        4 => matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c),
        5 => byte.is_ascii_uppercase(),
        6 => PRINTABLE.contains(&byte),
        _ => byte.is_ascii_hexdigit(),
    }
}

pub fn fizzbuzz() -> Vec<u8> {
    let lines: Vec<String> = (1..=FIZZBUZZ_LIMIT)
        .map(|n| match (n % 3, n % 5) {
            (0, 0) => "FizzBuzz".to_string(),
            (0, _) => "Fizz".to_string(),
            (_, 0) => "Buzz".to_string(),
            _ => n.to_string(),
        })
        .collect();
    lines.join("\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printf_handles_width_flags_and_strings() {
        let args = [Value::int(7), Value::text(b"ab"), Value::int(-5), Value::int(255)];
        let out = printf(b"%03d|%-4s|%+d%%|%x", &args).unwrap();
        assert_eq!(out, b"007|ab  |-5%|ff");
        assert_eq!(conversion_count(b"%d%% and %s").unwrap(), 2);
        assert!(printf(b"%d", &[]).is_err());
    }

    #[test]
    fn replacement_backrefs_are_translated() {
        assert_eq!(translate_replacement(br"<\1>$"), b"<${1}>$$".to_vec());
        assert_eq!(translate_replacement(br"\g<word>"), b"${word}".to_vec());
    }

    #[test]
    fn numbers_are_read_with_signs() {
        let numbers = read_numbers(b"a-12 b7 -x 003").unwrap();
        assert_eq!(
            numbers,
            vec![BigInt::from(-12), BigInt::from(7), BigInt::from(3)]
        );
    }

    #[test]
    fn justify_centres_and_right_aligns() {
        let text = Value::text(b"ab");
        let Value::List(items) = text else { unreachable!() };
        assert_eq!(Value::List(justify(&items, 5, Justify::Center)), Value::text(b"  ab "));
        assert_eq!(Value::List(justify(&items, 4, Justify::Right)), Value::text(b"  ab"));
        let odd = Value::text(b"abc");
        let Value::List(items) = odd else { unreachable!() };
        assert_eq!(Value::List(justify(&items, 6, Justify::Center)), Value::text(b" abc  "));
    }

    #[test]
    fn fizzbuzz_has_a_hundred_lines() {
        let text = fizzbuzz();
        let lines: Vec<&[u8]> = text.split(|b| *b == b'\n').collect();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[14], b"FizzBuzz");
        assert_eq!(lines[2], b"Fizz");
    }
}
