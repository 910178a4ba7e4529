//! Per-column filters
//!
//! Numeric columns filter by a lower threshold, categorical columns by an
//! inclusion set. Filters are rebuilt from the column descriptors on every
//! dataset load; updates may move the threshold or change the selection but
//! never turn one kind of filter into the other.

use crate::data::classify::{ColumnDescriptor, ColumnProfile};
use crate::data::value::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Filter state for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterConfig {
    Numeric {
        min: f64,
        max: f64,
        threshold: f64,
    },
    Categorical {
        available: Vec<String>,
        selected: BTreeSet<String>,
    },
}

/// Change requested by the user for one filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum FilterUpdate {
    /// Numeric only: move the threshold (clamped into `[min, max]`)
    Threshold(f64),
    /// Categorical only: flip one value in or out of the selection
    Toggle(String),
    /// Categorical only: replace the selection (unknown values dropped)
    Select(BTreeSet<String>),
    /// Categorical: select every value. Numeric: threshold back to min
    SelectAll,
    /// Categorical only: explicit "none", which excludes every row
    SelectNone,
}

/// Map of column key to its filter
pub type FilterConfigs = BTreeMap<String, FilterConfig>;

impl FilterConfig {
    /// Default filter for a column: everything passes
    pub fn build_default(column: &ColumnDescriptor) -> Self {
        match &column.profile {
            ColumnProfile::Numeric(stats) => FilterConfig::Numeric {
                min: stats.min,
                max: stats.max,
                threshold: stats.min,
            },
            ColumnProfile::Categorical { values } => FilterConfig::Categorical {
                available: values.clone(),
                selected: values.iter().cloned().collect(),
            },
        }
    }

    /// Whether `row` passes this filter on column `key`
    pub fn passes(&self, row: &Row, key: &str) -> bool {
        let value = row.get(key);
        match self {
            // A threshold at the column minimum is inactive
            FilterConfig::Numeric { min, threshold, .. } if threshold <= min => true,
            FilterConfig::Numeric { threshold, .. } => value
                .and_then(|v| v.coerce_number())
                .map(|n| n >= *threshold)
                .unwrap_or(false),
            FilterConfig::Categorical { selected, .. } => {
                if selected.is_empty() {
                    return false;
                }
                let text = value.map(|v| v.to_display_string()).unwrap_or_default();
                selected.contains(text.trim())
            }
        }
    }

    /// Apply an update, keeping the filter's kind
    ///
    /// Returns the filter unchanged (and logs) when the update does not fit
    /// the filter's kind.
    pub fn updated(&self, update: &FilterUpdate) -> Self {
        match (self, update) {
            (FilterConfig::Numeric { min, max, .. }, FilterUpdate::Threshold(t)) => {
                let threshold = if t.is_finite() { t.clamp(*min, *max) } else { *min };
                FilterConfig::Numeric {
                    min: *min,
                    max: *max,
                    threshold,
                }
            }
            (FilterConfig::Numeric { min, max, .. }, FilterUpdate::SelectAll) => {
                FilterConfig::Numeric {
                    min: *min,
                    max: *max,
                    threshold: *min,
                }
            }
            (FilterConfig::Categorical { available, selected }, FilterUpdate::Toggle(value)) => {
                let mut selected = selected.clone();
                if !selected.remove(value) && available.contains(value) {
                    selected.insert(value.clone());
                }
                FilterConfig::Categorical {
                    available: available.clone(),
                    selected,
                }
            }
            (FilterConfig::Categorical { available, .. }, FilterUpdate::Select(values)) => {
                FilterConfig::Categorical {
                    available: available.clone(),
                    selected: values
                        .iter()
                        .filter(|v| available.contains(v))
                        .cloned()
                        .collect(),
                }
            }
            (FilterConfig::Categorical { available, .. }, FilterUpdate::SelectAll) => {
                FilterConfig::Categorical {
                    available: available.clone(),
                    selected: available.iter().cloned().collect(),
                }
            }
            (FilterConfig::Categorical { available, .. }, FilterUpdate::SelectNone) => {
                FilterConfig::Categorical {
                    available: available.clone(),
                    selected: BTreeSet::new(),
                }
            }
            (current, update) => {
                tracing::warn!(
                    "Filter update {:?} does not apply to {} filter, ignored",
                    update,
                    current.kind_name()
                );
                current.clone()
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FilterConfig::Numeric { .. } => "numeric",
            FilterConfig::Categorical { .. } => "categorical",
        }
    }

    pub fn same_kind(&self, other: &FilterConfig) -> bool {
        self.kind_name() == other.kind_name()
    }
}

/// Default filters for every described column
pub fn build_defaults(columns: &[ColumnDescriptor]) -> FilterConfigs {
    columns
        .iter()
        .map(|c| (c.key.clone(), FilterConfig::build_default(c)))
        .collect()
}

/// Keep the rows that pass every filter (AND across columns)
pub fn apply_filters(rows: Vec<Row>, configs: &FilterConfigs) -> Vec<Row> {
    if configs.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| configs.iter().all(|(key, config)| config.passes(row, key)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::NumericStats;
    use crate::data::value::CellValue;

    fn rows(values: &[f64]) -> Vec<Row> {
        values
            .iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert("v".into(), CellValue::Number(*v));
                row
            })
            .collect()
    }

    fn numeric(threshold: f64) -> FilterConfigs {
        let mut configs = FilterConfigs::new();
        configs.insert(
            "v".into(),
            FilterConfig::Numeric {
                min: 1.0,
                max: 9.0,
                threshold,
            },
        );
        configs
    }

    fn categorical(selected: &[&str]) -> FilterConfigs {
        let mut configs = FilterConfigs::new();
        configs.insert(
            "cat".into(),
            FilterConfig::Categorical {
                available: vec!["a".into(), "b".into(), "c".into()],
                selected: selected.iter().map(|s| s.to_string()).collect(),
            },
        );
        configs
    }

    fn cat_rows(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert("cat".into(), CellValue::from(*v));
                row
            })
            .collect()
    }

    #[test]
    fn test_threshold_at_min_passes_all() {
        let out = apply_filters(rows(&[1.0, 5.0, 9.0]), &numeric(1.0));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_threshold_at_max_passes_only_max() {
        let out = apply_filters(rows(&[1.0, 5.0, 9.0, 9.0]), &numeric(9.0));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r["v"] == CellValue::Number(9.0)));
    }

    #[test]
    fn test_numeric_missing_value_fails_active_threshold() {
        let mut row = Row::new();
        row.insert("v".into(), CellValue::Null);
        let out = apply_filters(vec![row.clone(), Row::new()], &numeric(5.0));
        assert!(out.is_empty());

        // At the minimum the filter lets everything through
        let out = apply_filters(vec![row, Row::new()], &numeric(1.0));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_selection_excludes_everything() {
        let out = apply_filters(cat_rows(&["a", "b", "c", ""]), &categorical(&[]));
        assert!(out.is_empty());
    }

    #[test]
    fn test_categorical_trims_values() {
        let out = apply_filters(cat_rows(&[" a ", "b", "c"]), &categorical(&["a", "c"]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let mut configs = numeric(5.0);
        configs.extend(categorical(&["a"]));

        let mut pass = Row::new();
        pass.insert("v".into(), CellValue::Number(6.0));
        pass.insert("cat".into(), CellValue::from("a"));
        let mut fail = pass.clone();
        fail.insert("cat".into(), CellValue::from("b"));

        let out = apply_filters(vec![pass, fail], &configs);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_build_default() {
        let numeric_col = ColumnDescriptor {
            display_name: "V".into(),
            key: "v".into(),
            profile: ColumnProfile::Numeric(NumericStats {
                min: -3.0,
                max: 15.0,
                avg: 5.0,
            }),
        };
        assert_eq!(
            FilterConfig::build_default(&numeric_col),
            FilterConfig::Numeric {
                min: -3.0,
                max: 15.0,
                threshold: -3.0
            }
        );

        let cat_col = ColumnDescriptor {
            display_name: "Cat".into(),
            key: "cat".into(),
            profile: ColumnProfile::Categorical {
                values: vec!["a".into(), "b".into()],
            },
        };
        match FilterConfig::build_default(&cat_col) {
            FilterConfig::Categorical {
                available,
                selected,
            } => {
                assert_eq!(available.len(), 2);
                assert_eq!(selected.len(), 2);
            }
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn test_updates_keep_kind() {
        let num = FilterConfig::Numeric {
            min: 0.0,
            max: 10.0,
            threshold: 0.0,
        };
        let after = num.updated(&FilterUpdate::Toggle("a".into()));
        assert_eq!(after, num);

        let cat = categorical(&["a"]).remove("cat").unwrap();
        let after = cat.updated(&FilterUpdate::Threshold(3.0));
        assert_eq!(after, cat);
    }

    #[test]
    fn test_threshold_clamped() {
        let num = FilterConfig::Numeric {
            min: 0.0,
            max: 10.0,
            threshold: 0.0,
        };
        match num.updated(&FilterUpdate::Threshold(42.0)) {
            FilterConfig::Numeric { threshold, .. } => assert_eq!(threshold, 10.0),
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn test_selection_stays_within_available() {
        let cat = categorical(&["a"]).remove("cat").unwrap();

        let toggled = cat.updated(&FilterUpdate::Toggle("zzz".into()));
        assert_eq!(toggled, cat);

        let selected: BTreeSet<String> = ["b", "nope"].iter().map(|s| s.to_string()).collect();
        match cat.updated(&FilterUpdate::Select(selected)) {
            FilterConfig::Categorical { selected, .. } => {
                assert_eq!(selected.into_iter().collect::<Vec<_>>(), vec!["b".to_string()]);
            }
            other => panic!("unexpected filter {:?}", other),
        }

        match cat.updated(&FilterUpdate::SelectNone) {
            FilterConfig::Categorical { selected, .. } => assert!(selected.is_empty()),
            other => panic!("unexpected filter {:?}", other),
        }
    }
}
