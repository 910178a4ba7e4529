//! Column catalog
//!
//! Lookup table over the dataset's column descriptors plus the session's
//! derived columns. Everything that needs to validate a key or resolve a
//! display name goes through here.

use super::classify::{ColumnDescriptor, ColumnKind};
use super::codec;
use crate::transform::derived::DerivedColumnSpec;

#[derive(Debug, Clone, Default)]
pub struct ColumnCatalog {
    columns: Vec<ColumnDescriptor>,
    derived: Vec<DerivedColumnSpec>,
}

impl ColumnCatalog {
    pub fn new(columns: Vec<ColumnDescriptor>, derived: Vec<DerivedColumnSpec>) -> Self {
        Self { columns, derived }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn derived(&self) -> &[DerivedColumnSpec] {
        &self.derived
    }

    pub fn descriptor(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn derived_spec(&self, key: &str) -> Option<&DerivedColumnSpec> {
        self.derived.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.descriptor(key).is_some() || self.derived_spec(key).is_some()
    }

    /// Numeric dataset columns and every derived column
    pub fn is_value_column(&self, key: &str) -> bool {
        self.derived_spec(key).is_some()
            || self
                .descriptor(key)
                .map(|c| c.kind() == ColumnKind::Numeric)
                .unwrap_or(false)
    }

    pub fn is_category_column(&self, key: &str) -> bool {
        self.descriptor(key)
            .map(|c| c.kind() == ColumnKind::Categorical)
            .unwrap_or(false)
    }

    /// Keys of all selectable value columns, dataset order then derived order
    pub fn value_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.key.as_str())
            .chain(self.derived.iter().map(|d| d.key.as_str()))
            .collect()
    }

    pub fn category_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.is_numeric())
            .map(|c| c.key.as_str())
            .collect()
    }

    /// Every known key, used to seed group accumulators
    pub fn all_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.key.as_str())
            .chain(self.derived.iter().map(|d| d.key.as_str()))
            .collect()
    }

    /// Display name for a key (derived names first, then dataset headers)
    pub fn display_name(&self, key: &str) -> String {
        if let Some(spec) = self.derived_spec(key) {
            return spec.name.clone();
        }
        codec::denormalize(key, self.columns.iter().map(|c| c.display_name.as_str()))
    }

    pub fn set_derived(&mut self, derived: Vec<DerivedColumnSpec>) {
        self.derived = derived;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::{ColumnProfile, NumericStats};
    use crate::transform::derived::Formula;

    fn catalog() -> ColumnCatalog {
        let columns = vec![
            ColumnDescriptor {
                display_name: "Region Name".into(),
                key: "regionname".into(),
                profile: ColumnProfile::Categorical {
                    values: vec!["east".into(), "west".into()],
                },
            },
            ColumnDescriptor {
                display_name: "Net Sales".into(),
                key: "netsales".into(),
                profile: ColumnProfile::Numeric(NumericStats {
                    min: 0.0,
                    max: 10.0,
                    avg: 5.0,
                }),
            },
        ];
        let derived = vec![DerivedColumnSpec {
            key: "total".into(),
            name: "Total".into(),
            formula: Formula::SumSelected,
        }];
        ColumnCatalog::new(columns, derived)
    }

    #[test]
    fn test_value_and_category_columns() {
        let cat = catalog();
        assert_eq!(cat.value_columns(), vec!["netsales", "total"]);
        assert_eq!(cat.category_columns(), vec!["regionname"]);
        assert!(cat.is_value_column("total"));
        assert!(!cat.is_value_column("regionname"));
        assert!(cat.is_category_column("regionname"));
    }

    #[test]
    fn test_display_names() {
        let cat = catalog();
        assert_eq!(cat.display_name("netsales"), "Net Sales");
        assert_eq!(cat.display_name("total"), "Total");
        assert_eq!(cat.display_name("count"), "count");
    }

    #[test]
    fn test_all_keys() {
        assert_eq!(catalog().all_keys(), vec!["regionname", "netsales", "total"]);
    }
}
