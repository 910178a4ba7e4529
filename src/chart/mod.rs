//! Chart configuration and dispatch
//!
//! Structure:
//! - `config.rs`: immutable `ChartConfig` and the `update_config` reducer
//! - `dispatch.rs`: `(ChartType, Orientation)` capability table and chart descriptions

pub mod config;
pub mod dispatch;

pub use config::{repair_config, update_config, ChartConfig, ChartType, ConfigPatch};
pub use dispatch::{
    dispatch, route, AxisRole, ChartDescription, ChartView, EmptyState, Orientation, RendererId,
    ScatterAxes, SeriesMark, SeriesSpec,
};
