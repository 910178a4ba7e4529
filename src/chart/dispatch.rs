//! Chart dispatch
//!
//! Turns the final row set and the chart configuration into a declarative
//! chart description, or an explicit empty state.
//!
//! Routing is a capability table over `(ChartType, Orientation)`:
//! - vertical: every family, primary renderer (brushable category axis)
//! - horizontal: bar families only, flipped renderer (index-flipped axis)
//! - horizontal for line/area/scatter/composed: no-op, stays vertical

use super::config::{ChartConfig, ChartType};
use crate::data::catalog::ColumnCatalog;
use crate::data::value::{numeric_or_zero, CellValue, Row};
use serde::{Deserialize, Serialize};

/// Shared stack id for stacked bar families
pub const STACK_ID: &str = "stack";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    pub fn from_flag(is_horizontal: bool) -> Self {
        if is_horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// Rendering backend a description is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RendererId {
    /// Category axis with interactive brushing, no flipping
    Primary,
    /// Index-flipped category axis, no brushing
    Flipped,
}

impl RendererId {
    pub fn supports_brush(&self) -> bool {
        matches!(self, RendererId::Primary)
    }
}

/// Resolve the renderer and the effective orientation
pub fn route(chart_type: ChartType, requested: Orientation) -> (RendererId, Orientation) {
    use ChartType::*;
    use Orientation::*;

    match (chart_type, requested) {
        (StackedBar | StackedBar100 | GroupedBar, Horizontal) => (RendererId::Flipped, Horizontal),
        (StackedBar | StackedBar100 | GroupedBar, Vertical) => (RendererId::Primary, Vertical),
        (Line | Area | Scatter | Composed, Vertical | Horizontal) => (RendererId::Primary, Vertical),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesMark {
    Bar,
    Line,
    Area,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisRole {
    Primary,
    Secondary,
}

/// One drawn series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    /// Row key holding the series values
    pub key: String,
    /// Legend label
    pub name: String,
    pub mark: SeriesMark,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    pub axis: AxisRole,
}

/// Scatter X/Y column choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterAxes {
    pub x: String,
    pub y: String,
}

/// Guidance shown instead of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum EmptyState {
    NoColumns,
    NoRows,
    ScatterNeedsNumericColumns { found: usize },
}

impl EmptyState {
    pub fn message(&self) -> String {
        match self {
            EmptyState::NoColumns => "Select at least one column to chart.".to_string(),
            EmptyState::NoRows => {
                "No rows match the current filters. Adjust or reset the filters.".to_string()
            }
            EmptyState::ScatterNeedsNumericColumns { found } => format!(
                "A scatter plot needs 2 numeric columns; {} selected.",
                found
            ),
        }
    }
}

/// Declarative description handed to the charting collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescription {
    /// Family actually drawn (composed without a secondary axis draws stacked bars)
    pub family: ChartType,
    pub renderer: RendererId,
    pub orientation: Orientation,
    pub category_axis: String,
    pub series: Vec<SeriesSpec>,
    /// Fixed value-axis domain, when the family has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_domain: Option<[f64; 2]>,
    pub brush: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scatter: Option<ScatterAxes>,
    pub data: Vec<Row>,
}

/// Result of a render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ChartView {
    Empty(EmptyState),
    Chart(ChartDescription),
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartView::Empty(_))
    }

    pub fn description(&self) -> Option<&ChartDescription> {
        match self {
            ChartView::Chart(description) => Some(description),
            ChartView::Empty(_) => None,
        }
    }
}

/// Build the chart view for the final rows
///
/// # Arguments
/// * `rows` - Filtered, grouped, sorted and limited rows
/// * `config` - Current chart configuration
/// * `catalog` - Resolves series display names
pub fn dispatch(rows: &[Row], config: &ChartConfig, catalog: &ColumnCatalog) -> ChartView {
    if config.selected_columns.is_empty() {
        return ChartView::Empty(EmptyState::NoColumns);
    }
    if rows.is_empty() {
        return ChartView::Empty(EmptyState::NoRows);
    }

    let family = match (config.chart_type, &config.secondary_axis) {
        (ChartType::Composed, None) => {
            tracing::debug!("Composed chart without secondary axis, drawing stacked bars");
            ChartType::StackedBar
        }
        (chart_type, _) => chart_type,
    };

    // Routed on the requested family so a composed fallback stays vertical
    let (renderer, orientation) =
        route(config.chart_type, Orientation::from_flag(config.is_horizontal));
    let series_for = |mark: SeriesMark, stack_id: Option<&str>, axis: AxisRole| {
        config
            .selected_columns
            .iter()
            .map(|key| series(key, catalog, mark, stack_id, axis))
            .collect::<Vec<_>>()
    };

    let mut description = ChartDescription {
        family,
        renderer,
        orientation,
        category_axis: config.x_axis_column.clone(),
        series: Vec::new(),
        value_domain: None,
        brush: renderer.supports_brush(),
        scatter: None,
        data: Vec::new(),
    };

    match family {
        ChartType::StackedBar => {
            description.series = series_for(SeriesMark::Bar, Some(STACK_ID), AxisRole::Primary);
            description.data = rows.to_vec();
        }
        ChartType::StackedBar100 => {
            description.series = series_for(SeriesMark::Bar, Some(STACK_ID), AxisRole::Primary);
            description.value_domain = Some([0.0, 100.0]);
            description.data = rows
                .iter()
                .map(|row| to_percentages(row, &config.selected_columns))
                .collect();
        }
        ChartType::GroupedBar => {
            description.series = series_for(SeriesMark::Bar, None, AxisRole::Primary);
            description.data = rows.to_vec();
        }
        ChartType::Line => {
            description.series = series_for(SeriesMark::Line, None, AxisRole::Primary);
            description.data = rows.to_vec();
        }
        ChartType::Area => {
            description.series = series_for(SeriesMark::Area, None, AxisRole::Primary);
            description.data = rows.to_vec();
        }
        ChartType::Scatter => {
            let numeric: Vec<&String> = config
                .selected_columns
                .iter()
                .filter(|k| catalog.is_value_column(k))
                .collect();
            if numeric.len() < 2 {
                return ChartView::Empty(EmptyState::ScatterNeedsNumericColumns {
                    found: numeric.len(),
                });
            }

            let x = numeric[0].clone();
            let y = config
                .secondary_axis
                .as_ref()
                .filter(|s| numeric.contains(s) && **s != x)
                .cloned()
                .unwrap_or_else(|| numeric[1].clone());

            description.series = vec![series(&y, catalog, SeriesMark::Point, None, AxisRole::Primary)];
            description.data = rows
                .iter()
                .filter(|row| is_plottable(row, &x) && is_plottable(row, &y))
                .cloned()
                .collect();
            description.category_axis = x.clone();
            description.scatter = Some(ScatterAxes { x, y });
        }
        ChartType::Composed => {
            // The chosen column draws as bars, every other one as a line
            let bar_key = config.secondary_axis.as_deref().unwrap_or_default();

            description.series = config
                .selected_columns
                .iter()
                .map(|key| {
                    if key == bar_key {
                        series(key, catalog, SeriesMark::Bar, None, AxisRole::Primary)
                    } else {
                        series(key, catalog, SeriesMark::Line, None, AxisRole::Secondary)
                    }
                })
                .collect();
            description.data = rows.to_vec();
        }
    }

    tracing::debug!(
        "Dispatched {} to {:?} renderer ({:?}), {} series, {} rows",
        description.family,
        description.renderer,
        description.orientation,
        description.series.len(),
        description.data.len()
    );

    ChartView::Chart(description)
}

fn series(
    key: &str,
    catalog: &ColumnCatalog,
    mark: SeriesMark,
    stack_id: Option<&str>,
    axis: AxisRole,
) -> SeriesSpec {
    SeriesSpec {
        key: key.to_string(),
        name: catalog.display_name(key),
        mark,
        stack_id: stack_id.map(String::from),
        axis,
    }
}

fn is_plottable(row: &Row, key: &str) -> bool {
    row.get(key).map(CellValue::is_number).unwrap_or(false)
}

/// Replace each selected value with its percentage of the row's selected total
///
/// A zero total yields 0 for every selected column.
pub fn to_percentages(row: &Row, selected: &[String]) -> Row {
    let total: f64 = selected.iter().map(|k| numeric_or_zero(row, k)).sum();
    let mut out = row.clone();
    for key in selected {
        let percent = if total == 0.0 {
            0.0
        } else {
            numeric_or_zero(row, key) / total * 100.0
        };
        let percent = if percent.is_finite() { percent } else { 0.0 };
        out.insert(key.clone(), CellValue::Number(percent));
    }
    out
}
