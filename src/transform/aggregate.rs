//! Group-by aggregation
//!
//! Rows are folded into one record per group key. Numeric fields are
//! summed; non-numeric fields keep the first value seen. Derived columns are
//! then recomputed from the summed base columns of each group.

use super::derived::{apply_derived, DerivedColumnSpec};
use crate::data::value::{CellValue, Row};
use indexmap::IndexMap;

/// Field holding the number of rows folded into a group
pub const COUNT_KEY: &str = "count";
/// Field holding the group key
pub const ID_KEY: &str = "id";

/// Group key for a value: stringified, trimmed, and stripped of everything
/// except word characters, whitespace and hyphens
pub fn group_key(value: Option<&CellValue>) -> String {
    let text = value.map(|v| v.to_display_string()).unwrap_or_default();
    text.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || *c == '-')
        .collect()
}

/// Inputs that shape the aggregation
pub struct GroupSpec<'a> {
    /// Column to group by
    pub group_by: &'a str,
    /// Category axis key; each record gets `{x_axis_key: group key}`
    pub x_axis_key: &'a str,
    /// Every known column key, seeded with 0 in each group so derived
    /// formulas can always find their sources
    pub all_keys: &'a [&'a str],
    pub derived: &'a [DerivedColumnSpec],
    pub selected: &'a [String],
}

/// Fold filtered rows into group records, in order of first appearance
pub fn group_rows(rows: &[Row], spec: &GroupSpec<'_>) -> Vec<Row> {
    let mut groups: IndexMap<String, Row> = IndexMap::new();

    for row in rows {
        let key = group_key(row.get(spec.group_by));
        let group = groups
            .entry(key)
            .or_insert_with(|| new_accumulator(spec.all_keys));

        for (field, value) in row {
            fold_value(group, field, value);
        }

        let count = group
            .get(COUNT_KEY)
            .and_then(CellValue::as_number)
            .unwrap_or(0.0);
        group.insert(COUNT_KEY.to_string(), CellValue::Number(count + 1.0));
    }

    groups
        .into_iter()
        .map(|(key, mut group)| {
            apply_derived(&mut group, spec.derived, spec.selected);
            group.insert(spec.x_axis_key.to_string(), CellValue::Text(key.clone()));
            group.insert(ID_KEY.to_string(), CellValue::Text(key));
            group
        })
        .collect()
}

fn new_accumulator(all_keys: &[&str]) -> Row {
    let mut group: Row = all_keys
        .iter()
        .map(|k| (k.to_string(), CellValue::Number(0.0)))
        .collect();
    group.insert(COUNT_KEY.to_string(), CellValue::Number(0.0));
    group
}

fn fold_value(group: &mut Row, field: &str, value: &CellValue) {
    if field == COUNT_KEY || value.is_null() {
        return;
    }

    let number = value.as_number();
    let Some(slot) = group.get_mut(field) else {
        group.insert(field.to_string(), value.clone());
        return;
    };

    // First non-numeric value replaces the untouched 0 seed
    let replace_seed = number.is_none() && matches!(slot, CellValue::Number(n) if *n == 0.0);
    if replace_seed {
        *slot = value.clone();
    } else if let (CellValue::Number(total), Some(n)) = (slot, number) {
        *total += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::derived::Formula;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_group_key_sanitized() {
        assert_eq!(group_key(Some(&CellValue::from("  North-East (HQ)! "))), "North-East HQ");
        assert_eq!(group_key(Some(&CellValue::Number(2024.0))), "2024");
        assert_eq!(group_key(Some(&CellValue::Number(1.5))), "15");
        assert_eq!(group_key(None), "");
    }

    #[test]
    fn test_sum_and_count() {
        let rows = vec![
            row(&[("cat", "a".into()), ("v", 5.0.into())]),
            row(&[("cat", "b".into()), ("v", 15.0.into())]),
            row(&[("cat", "a".into()), ("v", (-3.0).into())]),
        ];
        let keys = ["cat", "v"];
        let spec = GroupSpec {
            group_by: "cat",
            x_axis_key: "cat",
            all_keys: &keys,
            derived: &[],
            selected: &["v".to_string()],
        };

        let groups = group_rows(&rows, &spec);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0][ID_KEY], CellValue::from("a"));
        assert_eq!(groups[0]["v"], CellValue::Number(2.0));
        assert_eq!(groups[0][COUNT_KEY], CellValue::Number(2.0));

        assert_eq!(groups[1][ID_KEY], CellValue::from("b"));
        assert_eq!(groups[1]["v"], CellValue::Number(15.0));
        assert_eq!(groups[1][COUNT_KEY], CellValue::Number(1.0));
    }

    #[test]
    fn test_aggregate_then_derive() {
        let rows = vec![
            row(&[("cat", "g".into()), ("a", 10.0.into()), ("b", 0.0.into())]),
            row(&[("cat", "g".into()), ("a", 0.0.into()), ("b", 10.0.into())]),
        ];
        let derived = vec![DerivedColumnSpec {
            key: "r".into(),
            name: "R".into(),
            formula: Formula::Ratio {
                numerator: "a".into(),
                denominator: "b".into(),
            },
        }];
        // Per-row derived values as the pipeline would produce them
        let rows = crate::transform::derived::derive_rows(&rows, &derived, &[]);
        assert_eq!(rows[0]["r"], CellValue::Number(0.0));
        assert_eq!(rows[1]["r"], CellValue::Number(0.0));

        let keys = ["cat", "a", "b", "r"];
        let spec = GroupSpec {
            group_by: "cat",
            x_axis_key: "cat",
            all_keys: &keys,
            derived: &derived,
            selected: &[],
        };
        let groups = group_rows(&rows, &spec);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["a"], CellValue::Number(10.0));
        assert_eq!(groups[0]["b"], CellValue::Number(10.0));
        assert_eq!(groups[0]["r"], CellValue::Number(1.0));
    }

    #[test]
    fn test_unselected_sources_are_seeded() {
        // Group has no value for "b" at all; the seed keeps the formula total
        let rows = vec![row(&[("cat", "g".into()), ("a", 4.0.into())])];
        let derived = vec![DerivedColumnSpec {
            key: "s".into(),
            name: "S".into(),
            formula: Formula::CustomSum {
                columns: vec!["a".into(), "b".into()],
            },
        }];
        let keys = ["cat", "a", "b", "s"];
        let spec = GroupSpec {
            group_by: "cat",
            x_axis_key: "cat",
            all_keys: &keys,
            derived: &derived,
            selected: &[],
        };
        let groups = group_rows(&rows, &spec);
        assert_eq!(groups[0]["b"], CellValue::Number(0.0));
        assert_eq!(groups[0]["s"], CellValue::Number(4.0));
    }

    #[test]
    fn test_non_numeric_keeps_first_value() {
        let rows = vec![
            row(&[("cat", "g".into()), ("label", "first".into())]),
            row(&[("cat", "g".into()), ("label", "second".into())]),
        ];
        let keys = ["cat", "label"];
        let spec = GroupSpec {
            group_by: "cat",
            x_axis_key: "region",
            all_keys: &keys,
            derived: &[],
            selected: &[],
        };
        let groups = group_rows(&rows, &spec);
        assert_eq!(groups[0]["label"], CellValue::from("first"));
        assert_eq!(groups[0]["region"], CellValue::from("g"));
    }
}
