//! Dataset model
//!
//! Structure:
//! - `value.rs`: typed cells and rows
//! - `codec.rs`: display name ↔ column key
//! - `classify.rs`: numeric vs categorical profiling
//! - `catalog.rs`: key lookup over dataset and derived columns
//! - `loader.rs`: text/path/URL loading and cell typing
//! - `export.rs`: delimited and image exports

pub mod catalog;
pub mod classify;
pub mod codec;
pub mod export;
pub mod loader;
pub mod value;

pub use catalog::ColumnCatalog;
pub use classify::{ClassifierThresholds, ColumnDescriptor, ColumnKind, ColumnProfile, NumericStats};
pub use loader::{DataSource, Dataset};
pub use value::{CellValue, Row};
