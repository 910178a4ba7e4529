//! Column classification
//!
//! Every column of a freshly loaded dataset is profiled once: numeric columns
//! get min/max/avg, categorical columns get their sorted unique values, and
//! columns with no usable values get no descriptor (and therefore no filter).

use super::value::{natural_cmp, CellValue, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Heuristic thresholds for numeric vs categorical
///
/// Defaults come from dashboard.json (`classifier.*`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierThresholds {
    /// Fewer uniques than this plus any non-numeric value → categorical
    pub low_cardinality: usize,
    /// Unique/total ratio below this (with few uniques) → categorical
    pub unique_ratio: f64,
    /// Upper bound on uniques for the ratio rule
    pub max_categorical_uniques: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            low_cardinality: 20,
            unique_ratio: 0.1,
            max_categorical_uniques: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Summary statistics of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// What the classifier learned about a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnProfile {
    Numeric(NumericStats),
    Categorical { values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub display_name: String,
    pub key: String,
    pub profile: ColumnProfile,
}

impl ColumnDescriptor {
    pub fn kind(&self) -> ColumnKind {
        match self.profile {
            ColumnProfile::Numeric(_) => ColumnKind::Numeric,
            ColumnProfile::Categorical { .. } => ColumnKind::Categorical,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn stats(&self) -> Option<&NumericStats> {
        match &self.profile {
            ColumnProfile::Numeric(stats) => Some(stats),
            ColumnProfile::Categorical { .. } => None,
        }
    }

    pub fn unique_values(&self) -> &[String] {
        match &self.profile {
            ColumnProfile::Categorical { values } => values,
            ColumnProfile::Numeric(_) => &[],
        }
    }
}

/// Decide numeric vs categorical from a column's values
///
/// Returns `None` when the column has no non-empty values.
pub fn classify_values<'a, I>(values: I, thresholds: &ClassifierThresholds) -> Option<ColumnKind>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let values: Vec<&CellValue> = values.into_iter().filter(|v| !v.is_empty()).collect();
    if values.is_empty() {
        return None;
    }

    let has_text = values.iter().any(|v| matches!(v, CellValue::Text(_)));
    let has_non_numeric = values.iter().any(|v| !v.is_number());
    let unique: HashSet<String> = values.iter().map(|v| v.to_display_string()).collect();

    let n_unique = unique.len();
    let ratio = n_unique as f64 / values.len() as f64;

    let categorical = has_text
        || (n_unique < thresholds.low_cardinality && has_non_numeric)
        || (n_unique > 1
            && ratio < thresholds.unique_ratio
            && n_unique < thresholds.max_categorical_uniques);

    Some(if categorical {
        ColumnKind::Categorical
    } else {
        ColumnKind::Numeric
    })
}

/// Profile one column of `rows`
pub fn describe_column(
    display_name: &str,
    key: &str,
    rows: &[Row],
    thresholds: &ClassifierThresholds,
) -> Option<ColumnDescriptor> {
    let values: Vec<&CellValue> = rows.iter().filter_map(|row| row.get(key)).collect();

    let profile = match classify_values(values.iter().copied(), thresholds)? {
        ColumnKind::Numeric => ColumnProfile::Numeric(numeric_stats(&values)),
        ColumnKind::Categorical => ColumnProfile::Categorical {
            values: sorted_unique(&values),
        },
    };

    Some(ColumnDescriptor {
        display_name: display_name.to_string(),
        key: key.to_string(),
        profile,
    })
}

/// Profile every column, in header order
///
/// `columns` are `(display_name, key)` pairs.
pub fn describe_columns(
    columns: &[(String, String)],
    rows: &[Row],
    thresholds: &ClassifierThresholds,
) -> Vec<ColumnDescriptor> {
    columns
        .iter()
        .filter_map(|(display_name, key)| {
            let descriptor = describe_column(display_name, key, rows, thresholds);
            if descriptor.is_none() {
                tracing::debug!("Column '{}' has no values, skipped", display_name);
            }
            descriptor
        })
        .collect()
}

fn numeric_stats(values: &[&CellValue]) -> NumericStats {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
    if numbers.is_empty() {
        return NumericStats {
            min: 0.0,
            max: 0.0,
            avg: 0.0,
        };
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = numbers.iter().sum::<f64>() / numbers.len() as f64;

    NumericStats { min, max, avg }
}

fn sorted_unique(values: &[&CellValue]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = values
        .iter()
        .map(|v| v.to_display_string().trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();
    unique.sort_by(|a, b| natural_cmp(a, b));
    unique
}
