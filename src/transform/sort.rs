//! Sort policy
//!
//! Direction depends on the role of the sort key:
//! - `count` (grouped data only): descending by group size
//! - the x-axis key: ascending, natural string order for text values
//! - any value column: descending, with missing values after every number
//!
//! All sorts are stable, so ties keep their incoming order.

use super::aggregate::COUNT_KEY;
use crate::data::value::{natural_cmp, numeric_or_zero, CellValue, Row};
use std::cmp::Ordering;

/// How a sort key is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortRole {
    Count,
    Category,
    Value,
}

/// Resolve the role of `sort_by`
pub fn sort_role(sort_by: &str, x_axis_key: &str, grouped: bool) -> SortRole {
    if grouped && sort_by == COUNT_KEY {
        SortRole::Count
    } else if sort_by == x_axis_key {
        SortRole::Category
    } else {
        SortRole::Value
    }
}

/// Sort rows in place according to the role of `sort_by`
pub fn sort_rows(rows: &mut [Row], sort_by: &str, x_axis_key: &str, grouped: bool) {
    match sort_role(sort_by, x_axis_key, grouped) {
        SortRole::Count => rows.sort_by(|a, b| descending(a.get(COUNT_KEY), b.get(COUNT_KEY))),
        SortRole::Category => rows.sort_by(|a, b| ascending_category(a, b, sort_by)),
        SortRole::Value => rows.sort_by(|a, b| descending(a.get(sort_by), b.get(sort_by))),
    }
}

fn ascending_category(a: &Row, b: &Row, key: &str) -> Ordering {
    match (a.get(key), b.get(key)) {
        (Some(CellValue::Text(left)), Some(right)) => natural_cmp(left, &right.to_display_string()),
        (Some(left), Some(CellValue::Text(right))) => natural_cmp(&left.to_display_string(), right),
        _ => numeric_or_zero(a, key)
            .partial_cmp(&numeric_or_zero(b, key))
            .unwrap_or(Ordering::Equal),
    }
}

/// Descending by number; values without a number sort last
fn descending(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    let left = a.and_then(CellValue::as_number);
    let right = b.and_then(CellValue::as_number);
    match (left, right) {
        (Some(l), Some(r)) => r.partial_cmp(&l).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn values(rows: &[Row], key: &str) -> Vec<CellValue> {
        rows.iter()
            .map(|r| r.get(key).cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_value_sort_descending_nulls_last() {
        let mut rows = vec![
            row(&[("v", CellValue::Null)]),
            row(&[("v", 0.0.into())]),
            row(&[("v", 5.0.into())]),
            row(&[]),
            row(&[("v", (-2.0).into())]),
        ];
        sort_rows(&mut rows, "v", "x", false);
        assert_eq!(
            values(&rows, "v"),
            vec![
                CellValue::Number(5.0),
                CellValue::Number(0.0),
                CellValue::Number(-2.0),
                CellValue::Null,
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn test_category_sort_natural() {
        let mut rows = vec![
            row(&[("x", "Item 10".into())]),
            row(&[("x", "item 2".into())]),
            row(&[("x", "Apple".into())]),
        ];
        sort_rows(&mut rows, "x", "x", false);
        assert_eq!(
            values(&rows, "x"),
            vec![
                CellValue::from("Apple"),
                CellValue::from("item 2"),
                CellValue::from("Item 10"),
            ]
        );
    }

    #[test]
    fn test_category_sort_numeric() {
        let mut rows = vec![
            row(&[("x", 2021.0.into())]),
            row(&[]),
            row(&[("x", 2019.0.into())]),
        ];
        sort_rows(&mut rows, "x", "x", false);
        assert_eq!(
            values(&rows, "x"),
            vec![CellValue::Null, CellValue::Number(2019.0), CellValue::Number(2021.0)]
        );
    }

    #[test]
    fn test_count_sort_only_when_grouped() {
        let mut rows = vec![
            row(&[("id", "a".into()), ("count", 1.0.into())]),
            row(&[("id", "b".into()), ("count", 3.0.into())]),
        ];
        assert_eq!(sort_role("count", "x", true), SortRole::Count);
        assert_eq!(sort_role("count", "x", false), SortRole::Value);

        sort_rows(&mut rows, "count", "x", true);
        assert_eq!(rows[0]["id"], CellValue::from("b"));
    }

    #[test]
    fn test_ties_keep_order() {
        let mut rows = vec![
            row(&[("id", "first".into()), ("v", 1.0.into())]),
            row(&[("id", "second".into()), ("v", 1.0.into())]),
            row(&[("id", "third".into()), ("v", 2.0.into())]),
        ];
        sort_rows(&mut rows, "v", "x", false);
        assert_eq!(
            values(&rows, "id"),
            vec![
                CellValue::from("third"),
                CellValue::from("first"),
                CellValue::from("second"),
            ]
        );
    }
}
