//! Shared chart pipeline
//!
//! Every stage is a pure function of `(rows, config)` and the whole chain is
//! recomputed on each configuration change. Used by the session and by the
//! dev binary.
//!
//! The pipeline:
//! 1. Derives formula columns on every raw row
//! 2. Applies the per-column filters
//! 3. Groups (re-deriving formulas from the sums) when a group-by is set
//! 4. Sorts by the role of `sortBy`
//! 5. Truncates to the display count
//! 6. Dispatches to a chart description or an empty state

use crate::chart::config::ChartConfig;
use crate::chart::dispatch::{dispatch, ChartView};
use crate::data::catalog::ColumnCatalog;
use crate::data::value::Row;
use crate::transform::aggregate::{group_rows, GroupSpec};
use crate::transform::derived::derive_rows;
use crate::transform::filter::apply_filters;
use crate::transform::limit::limit_rows;
use crate::transform::sort::sort_rows;

/// Final rows plus the view built from them
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Rows that reach the chart, also what gets exported
    pub rows: Vec<Row>,
    pub view: ChartView,
}

/// Run the full stage chain over the raw dataset rows
///
/// # Arguments
/// * `rows` - Raw rows as loaded
/// * `config` - Current (repaired) chart configuration
/// * `catalog` - Dataset columns and derived column specs
pub fn run(rows: &[Row], config: &ChartConfig, catalog: &ColumnCatalog) -> PipelineOutput {
    let rows = prepare_rows(rows, config, catalog);
    let view = dispatch(&rows, config, catalog);
    PipelineOutput { rows, view }
}

/// Stages 1-5: the row set that is charted and exported
pub fn prepare_rows(rows: &[Row], config: &ChartConfig, catalog: &ColumnCatalog) -> Vec<Row> {
    let derived = catalog.derived();
    let selected = &config.selected_columns;

    tracing::debug!("[1/5] Deriving {} column(s) over {} rows", derived.len(), rows.len());
    let rows = derive_rows(rows, derived, selected);

    let rows = apply_filters(rows, &config.filter_configs);
    tracing::debug!("[2/5] {} rows pass the filters", rows.len());

    let mut rows = match &config.group_by_column {
        Some(group_by) => {
            let all_keys = catalog.all_keys();
            let spec = GroupSpec {
                group_by,
                x_axis_key: &config.x_axis_column,
                all_keys: &all_keys,
                derived,
                selected,
            };
            let grouped = group_rows(&rows, &spec);
            tracing::debug!("[3/5] Grouped by '{}' into {} groups", group_by, grouped.len());
            grouped
        }
        None => rows,
    };

    sort_rows(
        &mut rows,
        &config.sort_by,
        &config.x_axis_column,
        config.is_grouped(),
    );
    tracing::debug!("[4/5] Sorted by '{}'", config.sort_by);

    let rows = limit_rows(rows, config.display_count);
    tracing::debug!("[5/5] Keeping {} rows (display count {})", rows.len(), config.display_count);

    rows
}
