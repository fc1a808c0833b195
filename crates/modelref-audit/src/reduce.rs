//! Folding one field across a list of per-variation records.
//!
//! Each field of a grouped row picks a combinator (`sum`, `max`, `any`,
//! `union`, or any `fn(V, V) -> V`) instead of being merged by hand.

use std::ops::Add;

/// Fold `get(item)` over `items` with `combine`; `None` for an empty list.
pub fn fold<T, V>(items: &[T], get: impl Fn(&T) -> V, combine: fn(V, V) -> V) -> Option<V> {
    items.iter().map(get).reduce(combine)
}

pub fn sum<V: Add<Output = V>>(a: V, b: V) -> V {
    a + b
}

pub fn max<V: PartialOrd>(a: V, b: V) -> V {
    if b > a { b } else { a }
}

pub fn any(a: bool, b: bool) -> bool {
    a || b
}

/// Concatenate, keeping the first occurrence of each value.
pub fn union(mut a: Vec<String>, b: Vec<String>) -> Vec<String> {
    for value in b {
        if !a.contains(&value) {
            a.push(value);
        }
    }
    a
}

/// `max` over optional values; a known value wins over an unknown one.
pub fn max_known(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
