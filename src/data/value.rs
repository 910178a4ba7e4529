//! Typed cell values and rows
//!
//! Rows are insertion-ordered maps from normalized column key to a tagged
//! value. The tag is decided once at load time by the loader's cell hook.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    #[default]
    Null,
}

/// One data row keyed by normalized column key
pub type Row = IndexMap<String, CellValue>;

impl CellValue {
    /// Finite numeric value, `None` for everything else
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Loose numeric coercion used by threshold filters
    ///
    /// Numeric text parses, booleans count as 1/0, null has no value.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            CellValue::Null => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// String form used for grouping, categorical filters and export
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Null => String::new(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Value of `key` in `row` as a number, 0 when missing or non-numeric
pub fn numeric_or_zero(row: &Row, key: &str) -> f64 {
    row.get(key).and_then(CellValue::as_number).unwrap_or(0.0)
}

/// Numeric-aware, case-insensitive string ordering
///
/// Digit runs compare by value ("item 2" < "item 10"); other characters
/// compare case-insensitively, with case only breaking full ties.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ord = compare_digit_runs(&l_run, &r_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_number_is_strict() {
        assert_eq!(CellValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(CellValue::Text("3".into()).as_number(), None);
        assert_eq!(CellValue::Boolean(true).as_number(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(CellValue::Text(" 3.5 ".into()).coerce_number(), Some(3.5));
        assert_eq!(CellValue::Boolean(false).coerce_number(), Some(0.0));
        assert_eq!(CellValue::Text("abc".into()).coerce_number(), None);
        assert_eq!(CellValue::Null.coerce_number(), None);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(CellValue::Number(5.0).to_display_string(), "5");
        assert_eq!(CellValue::Number(-2.5).to_display_string(), "-2.5");
        assert_eq!(CellValue::Boolean(true).to_display_string(), "true");
        assert_eq!(CellValue::Null.to_display_string(), "");
    }

    #[test]
    fn test_numeric_or_zero() {
        let mut row = Row::new();
        row.insert("a".into(), CellValue::Number(4.0));
        row.insert("b".into(), CellValue::Text("x".into()));
        assert_eq!(numeric_or_zero(&row, "a"), 4.0);
        assert_eq!(numeric_or_zero(&row, "b"), 0.0);
        assert_eq!(numeric_or_zero(&row, "missing"), 0.0);
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("item 2", "item 10"), Ordering::Less);
        assert_eq!(natural_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("Alpha", "alpha"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_untagged_serialization() {
        let mut row = Row::new();
        row.insert("v".into(), CellValue::Number(1.5));
        row.insert("cat".into(), CellValue::Text("a".into()));
        row.insert("flag".into(), CellValue::Boolean(true));
        row.insert("none".into(), CellValue::Null);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"v":1.5,"cat":"a","flag":true,"none":null}"#);
    }
}
