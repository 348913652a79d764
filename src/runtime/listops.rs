//! List helpers shared by several opcodes: splitting, joining, set
//! operations and combinatorics.

use crate::runtime::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

/// Splits `items` on every occurrence of the sublist `separator`. With
/// `clean`, empty pieces are dropped. An empty separator splits between
/// every element.
pub fn split(items: &[Value], separator: &[Value], clean: bool) -> Vec<Value> {
    if separator.is_empty() {
        return items.iter().map(|item| Value::List(vec![item.clone()])).collect();
    }
    let mut pieces = vec![Vec::new()];
    let mut idx = 0;
    while idx < items.len() {
        if items[idx..].starts_with(separator) {
            pieces.push(Vec::new());
            idx += separator.len();
        } else if let Some(piece) = pieces.last_mut() {
            piece.push(items[idx].clone());
            idx += 1;
        }
    }
    pieces
        .into_iter()
        .filter(|piece| !clean || !piece.is_empty())
        .map(Value::List)
        .collect()
}

/// Concatenates the elements of `items` with `separator` between them; list
/// elements are spliced in, other elements kept whole.
pub fn join(items: &[Value], separator: &[Value]) -> Vec<Value> {
    let mut joined = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            joined.extend(separator.iter().cloned());
        }
        match item {
            Value::List(inner) => joined.extend(inner.iter().cloned()),
            other => joined.push(other.clone()),
        }
    }
    joined
}

pub fn chunks(items: &[Value], size: usize) -> Vec<Value> {
    items
        .chunks(size.max(1))
        .map(|chunk| Value::List(chunk.to_vec()))
        .collect()
}

/// Runs of consecutive equal elements.
pub fn group_runs(items: &[Value]) -> Vec<Value> {
    let mut runs: Vec<Vec<Value>> = Vec::new();
    for item in items {
        match runs.last_mut() {
            Some(run) if run.first() == Some(item) => run.push(item.clone()),
            _ => runs.push(vec![item.clone()]),
        }
    }
    runs.into_iter().map(Value::List).collect()
}

pub fn set_diff(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().filter(|item| !b.contains(item)).cloned().collect()
}

pub fn set_and(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().filter(|item| b.contains(item)).cloned().collect()
}

pub fn set_or(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut union = a.to_vec();
    union.extend(set_diff(b, a));
    union
}

pub fn set_xor(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut sym = set_diff(a, b);
    sym.extend(set_diff(b, a));
    sym
}

pub fn inits(items: &[Value]) -> Vec<Value> {
    (0..=items.len())
        .map(|end| Value::List(items[..end].to_vec()))
        .collect()
}

pub fn tails(items: &[Value]) -> Vec<Value> {
    (0..=items.len())
        .map(|start| Value::List(items[start..].to_vec()))
        .collect()
}

pub fn flatten(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// Rows to columns, truncated to the shortest row.
pub fn transpose(rows: &[Vec<Value>]) -> Vec<Value> {
    let width = rows.iter().map(Vec::len).min().unwrap_or(0);
    (0..width)
        .map(|col| Value::List(rows.iter().map(|row| row[col].clone()).collect()))
        .collect()
}

/// Wrapping index: negative counts from the end.
pub fn resolve_index(len: usize, index: &BigInt) -> Option<usize> {
    let index = index.to_i64()?;
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index
    };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

/// Slice bound, negative from the end, clamped into `0..=len`.
pub fn slice_bound(len: usize, bound: &BigInt) -> usize {
    if bound.is_negative() {
        let back = bound.abs().to_usize().unwrap_or(usize::MAX);
        len.saturating_sub(back)
    } else {
        bound.to_usize().unwrap_or(usize::MAX).min(len)
    }
}

/// `items[::step]`; a negative step walks from the end. `step` must be
/// non-zero.
pub fn stride(items: &[Value], step: i64) -> Vec<Value> {
    let magnitude = step.unsigned_abs().max(1) as usize;
    if step > 0 {
        items.iter().step_by(magnitude).cloned().collect()
    } else {
        items.iter().rev().step_by(magnitude).cloned().collect()
    }
}

/// Length-`k` permutations in lexicographic index order.
pub fn permutations(items: &[Value], k: usize) -> Vec<Value> {
    fn extend(
        items: &[Value],
        k: usize,
        used: &mut Vec<bool>,
        current: &mut Vec<Value>,
        out: &mut Vec<Value>,
    ) {
        if current.len() == k {
            out.push(Value::List(current.clone()));
            return;
        }
        for idx in 0..items.len() {
            if used[idx] {
                continue;
            }
            used[idx] = true;
            current.push(items[idx].clone());
            extend(items, k, used, current, out);
            current.pop();
            used[idx] = false;
        }
    }

    let mut out = Vec::new();
    if k <= items.len() {
        extend(items, k, &mut vec![false; items.len()], &mut Vec::new(), &mut out);
    }
    out
}

/// Length-`k` combinations; with `replacement`, an element may repeat.
pub fn combinations(items: &[Value], k: usize, replacement: bool) -> Vec<Value> {
    fn extend(
        items: &[Value],
        k: usize,
        start: usize,
        replacement: bool,
        current: &mut Vec<Value>,
        out: &mut Vec<Value>,
    ) {
        if current.len() == k {
            out.push(Value::List(current.clone()));
            return;
        }
        for idx in start..items.len() {
            current.push(items[idx].clone());
            let next = if replacement { idx } else { idx + 1 };
            extend(items, k, next, replacement, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if replacement && items.is_empty() && k > 0 {
        return out;
    }
    extend(items, k, 0, replacement, &mut Vec::new(), &mut out);
    out
}

/// Cartesian product of several lists, first list varying slowest.
pub fn product(lists: &[Vec<Value>]) -> Vec<Value> {
    let mut rows: Vec<Vec<Value>> = vec![Vec::new()];
    for list in lists {
        rows = rows
            .iter()
            .flat_map(|row| {
                list.iter().map(move |item| {
                    let mut next = row.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect();
    }
    rows.into_iter().map(Value::List).collect()
}
