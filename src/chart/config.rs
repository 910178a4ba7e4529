//! Chart configuration and its reducer
//!
//! `ChartConfig` is an immutable value. Every change goes through
//! `update_config(old, patch, catalog)`, which applies the patch and then
//! repairs derived invariants against the current column catalog:
//! - selected columns are unique value columns
//! - `x_axis_column` and `group_by_column` name real dataset columns
//! - `secondary_axis` is one of the selected columns
//! - `sort_by` is a selected column, the x-axis key, or `count` when grouped
//! - every described column has a filter of the matching kind

use crate::data::catalog::ColumnCatalog;
use crate::data::classify::ColumnProfile;
use crate::transform::aggregate::COUNT_KEY;
use crate::transform::filter::{self, FilterConfig, FilterConfigs, FilterUpdate};
use crate::transform::limit::DisplayCount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven chart families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    #[default]
    StackedBar,
    StackedBar100,
    GroupedBar,
    Line,
    Area,
    Scatter,
    Composed,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        ChartType::StackedBar,
        ChartType::StackedBar100,
        ChartType::GroupedBar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Scatter,
        ChartType::Composed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::StackedBar => "stackedBar",
            ChartType::StackedBar100 => "stackedBar100",
            ChartType::GroupedBar => "groupedBar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
            ChartType::Composed => "composed",
        }
    }

    /// Parse a chart type name; unknown names fall back to stacked bars
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_else(|| {
                tracing::warn!("Unknown chart type '{}', using stackedBar", s);
                ChartType::StackedBar
            })
    }

    /// Bar families are the only ones with a horizontal layout
    pub fn supports_horizontal(&self) -> bool {
        matches!(
            self,
            ChartType::StackedBar | ChartType::StackedBar100 | ChartType::GroupedBar
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ChartType {
    fn from(s: String) -> Self {
        ChartType::parse(&s)
    }
}

impl From<ChartType> for String {
    fn from(t: ChartType) -> String {
        t.as_str().to_string()
    }
}

/// Session chart configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    /// Value columns to chart, in series order
    pub selected_columns: Vec<String>,
    /// Category axis column
    pub x_axis_column: String,
    pub group_by_column: Option<String>,
    /// Composed: the column drawn as bars, the rest become lines on the
    /// secondary axis. Scatter: explicit Y column
    pub secondary_axis: Option<String>,
    pub chart_type: ChartType,
    /// A selected column, the x-axis key, or `count` when grouped
    pub sort_by: String,
    pub display_count: DisplayCount,
    pub is_horizontal: bool,
    pub filter_configs: FilterConfigs,
}

impl ChartConfig {
    /// Initial configuration right after a dataset load
    ///
    /// # Arguments
    /// * `catalog` - Catalog of the freshly loaded dataset
    /// * `chart_type` - Default chart family
    /// * `display_count` - Default top-N
    /// * `n_selected` - How many value columns to pre-select
    pub fn initial(
        catalog: &ColumnCatalog,
        chart_type: ChartType,
        display_count: DisplayCount,
        n_selected: usize,
    ) -> Self {
        let selected_columns: Vec<String> = catalog
            .value_columns()
            .into_iter()
            .take(n_selected)
            .map(String::from)
            .collect();

        let config = ChartConfig {
            selected_columns,
            x_axis_column: default_x_axis(catalog),
            chart_type,
            display_count,
            filter_configs: filter::build_defaults(catalog.columns()),
            ..Default::default()
        };
        repair_config(config, catalog)
    }

    pub fn is_grouped(&self) -> bool {
        self.group_by_column.is_some()
    }

    /// Keys `sort_by` may currently take
    pub fn sort_options(&self) -> Vec<String> {
        let mut options = self.selected_columns.clone();
        if !options.contains(&self.x_axis_column) {
            options.push(self.x_axis_column.clone());
        }
        if self.is_grouped() {
            options.push(COUNT_KEY.to_string());
        }
        options
    }
}

/// One requested change to the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum ConfigPatch {
    SelectColumns(Vec<String>),
    ToggleColumn(String),
    SetXAxis(String),
    SetGroupBy(Option<String>),
    SetSecondaryAxis(Option<String>),
    SetChartType(ChartType),
    SetSortBy(String),
    SetDisplayCount(DisplayCount),
    SetHorizontal(bool),
    UpdateFilter { key: String, update: FilterUpdate },
    ResetFilters,
    /// Load a saved configuration wholesale
    Replace(Box<ChartConfig>),
}

/// Apply `patch` to `old` and repair invariants against `catalog`
pub fn update_config(old: &ChartConfig, patch: ConfigPatch, catalog: &ColumnCatalog) -> ChartConfig {
    let mut config = old.clone();

    match patch {
        ConfigPatch::SelectColumns(columns) => config.selected_columns = columns,
        ConfigPatch::ToggleColumn(key) => {
            if let Some(pos) = config.selected_columns.iter().position(|k| *k == key) {
                config.selected_columns.remove(pos);
            } else if catalog.is_value_column(&key) {
                config.selected_columns.push(key);
            } else {
                tracing::warn!("Column '{}' is not a value column, not selected", key);
            }
        }
        ConfigPatch::SetXAxis(key) => {
            if catalog.descriptor(&key).is_some() {
                config.x_axis_column = key;
            } else {
                tracing::warn!("Unknown x-axis column '{}', ignored", key);
            }
        }
        ConfigPatch::SetGroupBy(key) => config.group_by_column = key,
        ConfigPatch::SetSecondaryAxis(key) => config.secondary_axis = key,
        ConfigPatch::SetChartType(chart_type) => config.chart_type = chart_type,
        ConfigPatch::SetSortBy(key) => config.sort_by = key,
        ConfigPatch::SetDisplayCount(count) => config.display_count = count,
        ConfigPatch::SetHorizontal(horizontal) => {
            if config.chart_type.supports_horizontal() {
                config.is_horizontal = horizontal;
            } else {
                tracing::debug!(
                    "Horizontal layout not available for {}, ignored",
                    config.chart_type
                );
            }
        }
        ConfigPatch::UpdateFilter { key, update } => match config.filter_configs.get(&key) {
            Some(current) => {
                let updated = current.updated(&update);
                config.filter_configs.insert(key, updated);
            }
            None => tracing::warn!("No filter for column '{}', update ignored", key),
        },
        ConfigPatch::ResetFilters => {
            config.filter_configs = filter::build_defaults(catalog.columns());
        }
        ConfigPatch::Replace(saved) => {
            let current_filters = std::mem::take(&mut config.filter_configs);
            config = *saved;
            config.filter_configs = merge_saved_filters(&current_filters, &config.filter_configs);
        }
    }

    repair_config(config, catalog)
}

/// Re-establish every invariant of `config` against `catalog`
pub fn repair_config(mut config: ChartConfig, catalog: &ColumnCatalog) -> ChartConfig {
    // Selected columns: known value columns, no duplicates, order kept
    let mut seen = std::collections::HashSet::new();
    config
        .selected_columns
        .retain(|k| catalog.is_value_column(k) && seen.insert(k.clone()));

    if catalog.descriptor(&config.x_axis_column).is_none() {
        config.x_axis_column = default_x_axis(catalog);
    }

    if let Some(group_by) = &config.group_by_column {
        if catalog.descriptor(group_by).is_none() {
            tracing::warn!("Group-by column '{}' no longer exists, grouping cleared", group_by);
            config.group_by_column = None;
        }
    }

    if let Some(secondary) = &config.secondary_axis {
        if !config.selected_columns.contains(secondary) {
            config.secondary_axis = None;
        }
    }

    if !config.sort_options().contains(&config.sort_by) {
        let repaired = config
            .selected_columns
            .first()
            .cloned()
            .or_else(|| config.is_grouped().then(|| COUNT_KEY.to_string()))
            .unwrap_or_else(|| config.x_axis_column.clone());
        tracing::debug!("sortBy '{}' repaired to '{}'", config.sort_by, repaired);
        config.sort_by = repaired;
    }

    config.filter_configs = repair_filters(&config.filter_configs, catalog);
    config
}

fn default_x_axis(catalog: &ColumnCatalog) -> String {
    catalog
        .category_columns()
        .first()
        .map(|k| k.to_string())
        .or_else(|| catalog.columns().first().map(|c| c.key.clone()))
        .unwrap_or_default()
}

/// One filter per described column, each of the column's kind
fn repair_filters(filters: &FilterConfigs, catalog: &ColumnCatalog) -> FilterConfigs {
    catalog
        .columns()
        .iter()
        .map(|column| {
            let default = FilterConfig::build_default(column);
            let kept = match filters.get(&column.key) {
                Some(existing) if existing.same_kind(&default) => {
                    fit_to_column(existing, &column.profile)
                }
                _ => default,
            };
            (column.key.clone(), kept)
        })
        .collect()
}

/// Clamp a filter into the column's current domain
fn fit_to_column(existing: &FilterConfig, profile: &ColumnProfile) -> FilterConfig {
    match (existing, profile) {
        (FilterConfig::Numeric { threshold, .. }, ColumnProfile::Numeric(stats)) => {
            FilterConfig::Numeric {
                min: stats.min,
                max: stats.max,
                threshold: threshold.clamp(stats.min, stats.max.max(stats.min)),
            }
        }
        (FilterConfig::Categorical { selected, .. }, ColumnProfile::Categorical { values }) => {
            FilterConfig::Categorical {
                available: values.clone(),
                selected: selected
                    .iter()
                    .filter(|v| values.contains(v))
                    .cloned()
                    .collect(),
            }
        }
        _ => existing.clone(),
    }
}

/// Saved filters override current ones only where key and kind match
fn merge_saved_filters(current: &FilterConfigs, saved: &FilterConfigs) -> FilterConfigs {
    current
        .iter()
        .map(|(key, filter)| {
            let chosen = match saved.get(key) {
                Some(saved) if saved.same_kind(filter) => saved.clone(),
                _ => filter.clone(),
            };
            (key.clone(), chosen)
        })
        .collect()
}
