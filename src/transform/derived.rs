//! Derived (calculated) columns
//!
//! A derived column is a formula over other columns. Formulas never fail:
//! a missing or non-numeric source counts as 0, and every division is
//! zero-guarded, so sparse data degrades to deterministic zeros.
//!
//! Evaluation happens twice in the pipeline. Before filtering, each raw row
//! gets its derived values. When grouping is active the aggregation engine
//! re-runs the same formulas on each group's summed base columns, so group
//! values are aggregate-then-derive rather than a sum of per-row results.

use crate::data::codec;
use crate::data::value::{numeric_or_zero, CellValue, Row};
use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

/// Formula kinds offered by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    CustomSum,
    CustomAverage,
    SumSelected,
    AverageSelected,
    Ratio,
    Percentage,
}

/// A formula with its source columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    CustomSum { columns: Vec<String> },
    CustomAverage { columns: Vec<String> },
    /// Sum over whatever value columns are currently selected
    SumSelected,
    /// Average over whatever value columns are currently selected
    AverageSelected,
    Ratio { numerator: String, denominator: String },
    Percentage { part: String, total: String },
    /// Unrecognized kind from a stored configuration; evaluates to 0
    #[serde(other)]
    Unknown,
}

impl Formula {
    pub fn kind(&self) -> Option<FormulaKind> {
        match self {
            Formula::CustomSum { .. } => Some(FormulaKind::CustomSum),
            Formula::CustomAverage { .. } => Some(FormulaKind::CustomAverage),
            Formula::SumSelected => Some(FormulaKind::SumSelected),
            Formula::AverageSelected => Some(FormulaKind::AverageSelected),
            Formula::Ratio { .. } => Some(FormulaKind::Ratio),
            Formula::Percentage { .. } => Some(FormulaKind::Percentage),
            Formula::Unknown => None,
        }
    }

    /// Explicit source keys (empty for selection-based formulas)
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Formula::CustomSum { columns } | Formula::CustomAverage { columns } => {
                columns.iter().map(String::as_str).collect()
            }
            Formula::Ratio {
                numerator,
                denominator,
            } => vec![numerator.as_str(), denominator.as_str()],
            Formula::Percentage { part, total } => vec![part.as_str(), total.as_str()],
            Formula::SumSelected | Formula::AverageSelected | Formula::Unknown => Vec::new(),
        }
    }

    /// Whether the result depends on the current column selection
    pub fn uses_selection(&self) -> bool {
        matches!(self, Formula::SumSelected | Formula::AverageSelected)
    }

    /// Evaluate against one row (or one aggregated group record)
    ///
    /// `selected` is the current value-column selection; `own_key` is
    /// excluded from it so a selection formula never reads itself.
    pub fn evaluate(&self, row: &Row, selected: &[String], own_key: &str) -> f64 {
        match self {
            Formula::CustomSum { columns } => sum(row, columns.iter().map(String::as_str)),
            Formula::CustomAverage { columns } => average(row, columns.iter().map(String::as_str)),
            Formula::SumSelected => sum(row, selection(selected, own_key)),
            Formula::AverageSelected => average(row, selection(selected, own_key)),
            Formula::Ratio {
                numerator,
                denominator,
            } => ratio(row, numerator, denominator),
            Formula::Percentage { part, total } => ratio(row, part, total) * 100.0,
            Formula::Unknown => 0.0,
        }
    }
}

fn selection<'a>(selected: &'a [String], own_key: &'a str) -> impl Iterator<Item = &'a str> {
    selected
        .iter()
        .map(String::as_str)
        .filter(move |key| *key != own_key)
}

fn sum<'a>(row: &Row, columns: impl Iterator<Item = &'a str>) -> f64 {
    columns.map(|key| numeric_or_zero(row, key)).sum()
}

/// Mean over the columns that hold a finite number; 0 when none do
fn average<'a>(row: &Row, columns: impl Iterator<Item = &'a str>) -> f64 {
    let values: Vec<f64> = columns
        .filter_map(|key| row.get(key).and_then(CellValue::as_number))
        .collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(row: &Row, numerator: &str, denominator: &str) -> f64 {
    let denominator = numeric_or_zero(row, denominator);
    if denominator == 0.0 {
        return 0.0;
    }
    numeric_or_zero(row, numerator) / denominator
}

/// A user-defined synthetic column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumnSpec {
    /// Normalized key, unique across dataset and derived columns
    pub key: String,
    /// Display name as entered by the user
    pub name: String,
    pub formula: Formula,
}

impl DerivedColumnSpec {
    /// Build a spec from a formula kind and an explicit list of column keys
    ///
    /// # Arguments
    /// * `name` - Display name; its normalized form becomes the key
    /// * `kind` - Formula kind
    /// * `columns` - Source keys. Ratio and percentage take exactly two
    ///   (numerator/part first). Selection formulas ignore this list.
    /// * `is_taken` - Reports keys already used by the dataset or other
    ///   derived columns; collisions get a numeric suffix
    pub fn build<F>(name: &str, kind: FormulaKind, columns: &[String], is_taken: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::Formula(
                "derived column name is empty".to_string(),
            ));
        }

        let formula = match kind {
            FormulaKind::CustomSum | FormulaKind::CustomAverage => {
                if columns.is_empty() {
                    return Err(DashboardError::Formula(format!(
                        "'{}' needs at least one source column",
                        name
                    )));
                }
                let columns = columns.to_vec();
                if kind == FormulaKind::CustomSum {
                    Formula::CustomSum { columns }
                } else {
                    Formula::CustomAverage { columns }
                }
            }
            FormulaKind::SumSelected => Formula::SumSelected,
            FormulaKind::AverageSelected => Formula::AverageSelected,
            FormulaKind::Ratio | FormulaKind::Percentage => {
                let [first, second] = columns else {
                    return Err(DashboardError::Formula(format!(
                        "'{}' needs exactly two source columns, got {}",
                        name,
                        columns.len()
                    )));
                };
                if kind == FormulaKind::Ratio {
                    Formula::Ratio {
                        numerator: first.clone(),
                        denominator: second.clone(),
                    }
                } else {
                    Formula::Percentage {
                        part: first.clone(),
                        total: second.clone(),
                    }
                }
            }
        };

        Ok(Self {
            key: codec::unique_key(name, is_taken),
            name: name.to_string(),
            formula,
        })
    }
}

/// Write every derived value into `row`, in list order
///
/// Later specs may read columns produced by earlier ones.
pub fn apply_derived(row: &mut Row, specs: &[DerivedColumnSpec], selected: &[String]) {
    for spec in specs {
        let value = spec.formula.evaluate(row, selected, &spec.key);
        row.insert(spec.key.clone(), CellValue::Number(value));
    }
}

/// Derive over a whole row set, returning new rows
pub fn derive_rows(rows: &[Row], specs: &[DerivedColumnSpec], selected: &[String]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            apply_derived(&mut row, specs, selected);
            row
        })
        .collect()
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

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_custom_sum_missing_is_zero() {
        let r = row(&[("a", 2.0.into()), ("b", "x".into())]);
        let f = Formula::CustomSum {
            columns: keys(&["a", "b", "missing"]),
        };
        assert_eq!(f.evaluate(&r, &[], "s"), 2.0);
    }

    #[test]
    fn test_custom_average_skips_non_numeric() {
        let r = row(&[("a", 2.0.into()), ("b", 4.0.into()), ("c", CellValue::Null)]);
        let f = Formula::CustomAverage {
            columns: keys(&["a", "b", "c"]),
        };
        assert_eq!(f.evaluate(&r, &[], "avg"), 3.0);
    }

    #[test]
    fn test_custom_average_no_finite_values() {
        let r = row(&[("a", "text".into())]);
        let f = Formula::CustomAverage {
            columns: keys(&["a", "b"]),
        };
        let value = f.evaluate(&r, &[], "avg");
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }

    #[test]
    fn test_ratio_zero_guard() {
        let r = row(&[("a", 10.0.into()), ("b", 0.0.into())]);
        let f = Formula::Ratio {
            numerator: "a".into(),
            denominator: "b".into(),
        };
        assert_eq!(f.evaluate(&r, &[], "r"), 0.0);

        let r = row(&[("b", 4.0.into())]);
        assert_eq!(f.evaluate(&r, &[], "r"), 0.0); // missing numerator
    }

    #[test]
    fn test_percentage() {
        let r = row(&[("part", 25.0.into()), ("total", 200.0.into())]);
        let f = Formula::Percentage {
            part: "part".into(),
            total: "total".into(),
        };
        assert_eq!(f.evaluate(&r, &[], "p"), 12.5);
    }

    #[test]
    fn test_selection_formulas_follow_selection() {
        let r = row(&[("a", 1.0.into()), ("b", 2.0.into()), ("c", 6.0.into())]);
        assert_eq!(Formula::SumSelected.evaluate(&r, &keys(&["a", "b"]), "s"), 3.0);
        assert_eq!(Formula::SumSelected.evaluate(&r, &keys(&["a", "c"]), "s"), 7.0);
        assert_eq!(
            Formula::AverageSelected.evaluate(&r, &keys(&["b", "c"]), "s"),
            4.0
        );
    }

    #[test]
    fn test_selection_formula_ignores_itself() {
        let mut r = row(&[("a", 1.0.into()), ("b", 2.0.into())]);
        let spec = DerivedColumnSpec {
            key: "total".into(),
            name: "Total".into(),
            formula: Formula::SumSelected,
        };
        let selected = keys(&["a", "b", "total"]);
        apply_derived(&mut r, std::slice::from_ref(&spec), &selected);
        apply_derived(&mut r, std::slice::from_ref(&spec), &selected);
        assert_eq!(r.get("total"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_chained_specs() {
        let mut r = row(&[("a", 3.0.into()), ("b", 1.0.into())]);
        let specs = vec![
            DerivedColumnSpec::build("Both", FormulaKind::CustomSum, &keys(&["a", "b"]), |_| false)
                .unwrap(),
            DerivedColumnSpec::build("Share", FormulaKind::Percentage, &keys(&["a", "both"]), |_| {
                false
            })
            .unwrap(),
        ];
        apply_derived(&mut r, &specs, &[]);
        assert_eq!(r.get("both"), Some(&CellValue::Number(4.0)));
        assert_eq!(r.get("share"), Some(&CellValue::Number(75.0)));
    }

    #[test]
    fn test_build_validates_arity() {
        assert!(DerivedColumnSpec::build("R", FormulaKind::Ratio, &keys(&["a"]), |_| false).is_err());
        assert!(DerivedColumnSpec::build("S", FormulaKind::CustomSum, &[], |_| false).is_err());
        assert!(DerivedColumnSpec::build("  ", FormulaKind::SumSelected, &[], |_| false).is_err());
        assert!(DerivedColumnSpec::build("T", FormulaKind::SumSelected, &[], |_| false).is_ok());
    }

    #[test]
    fn test_build_key_is_unique() {
        let spec = DerivedColumnSpec::build(
            "Sales",
            FormulaKind::CustomSum,
            &keys(&["a"]),
            |k| k == "sales",
        )
        .unwrap();
        assert_eq!(spec.key, "sales_2");
        assert_eq!(spec.name, "Sales");
    }

    #[test]
    fn test_unknown_formula_kind_deserializes() {
        let spec: DerivedColumnSpec = serde_json::from_str(
            r#"{"key": "m", "name": "M", "formula": {"kind": "median"}}"#,
        )
        .unwrap();
        assert_eq!(spec.formula, Formula::Unknown);
        assert_eq!(spec.formula.evaluate(&Row::new(), &[], "m"), 0.0);
    }

    #[test]
    fn test_formula_round_trip_shape() {
        let f = Formula::Ratio {
            numerator: "a".into(),
            denominator: "b".into(),
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["kind"], "ratio");
        assert_eq!(json["numerator"], "a");
    }
}
