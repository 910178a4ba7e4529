//! Row transformation stages
//!
//! - `derived.rs`: formula columns (before and after aggregation)
//! - `filter.rs`: per-column filter state and application
//! - `aggregate.rs`: group-by folding
//! - `sort.rs`: role-dependent sort order
//! - `limit.rs`: top-N truncation

pub mod aggregate;
pub mod derived;
pub mod filter;
pub mod limit;
pub mod sort;

pub use aggregate::{group_rows, GroupSpec, COUNT_KEY, ID_KEY};
pub use derived::{DerivedColumnSpec, Formula, FormulaKind};
pub use filter::{apply_filters, FilterConfig, FilterConfigs, FilterUpdate};
pub use limit::{limit_rows, DisplayCount, DISPLAY_COUNTS};
pub use sort::{sort_rows, SortRole};
