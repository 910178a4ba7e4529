//! Chart Dashboard Library
//!
//! Core of an interactive data-exploration dashboard: dataset loading and
//! column classification, filters, derived columns, group-by aggregation,
//! sorting, top-N limiting and chart dispatch.
//!
//! The pipeline is `raw rows → derive → filter → group (re-derive) → sort →
//! limit → dispatch`, recomputed from scratch on every configuration change.

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod properties;
pub mod session;
pub mod transform;

pub use chart::{ChartConfig, ChartType, ChartView, ConfigPatch};
pub use config::DashboardSettings;
pub use error::{DashboardError, LoadError, Result};
pub use pipeline::PipelineOutput;
pub use session::{Dashboard, DatasetSummary, LoadTicket};
