//! Dashboard settings from properties
//!
//! Settings are read through `PropertyReader`. All default values come from
//! dashboard.json; nothing here hardcodes a fallback of its own.

use crate::chart::config::{ChartConfig, ChartType};
use crate::data::catalog::ColumnCatalog;
use crate::data::classify::ClassifierThresholds;
use crate::data::export::ImageFormat;
use crate::error::{DashboardError, Result};
use crate::properties::PropertyReader;
use crate::transform::limit::DisplayCount;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Numeric vs categorical heuristics
    pub thresholds: ClassifierThresholds,

    /// Chart family after a load
    pub chart_type: ChartType,

    /// Top-N after a load
    pub display_count: DisplayCount,

    /// Number of value columns pre-selected after a load
    pub default_selected: usize,

    /// Single-byte delimiter for delimited exports
    pub export_delimiter: u8,

    pub image_format: ImageFormat,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_properties(&PropertyReader::default())
    }
}

impl DashboardSettings {
    /// Create settings from properties
    ///
    /// # Arguments
    /// * `props` - User property values layered over the dashboard.json defaults
    pub fn from_properties(props: &PropertyReader) -> Self {
        let thresholds = ClassifierThresholds {
            low_cardinality: props.get_usize("classifier.low.cardinality"),
            unique_ratio: props.get_f64_in_range("classifier.unique.ratio", 0.0, 1.0),
            max_categorical_uniques: props.get_usize("classifier.max.categorical"),
        };

        let chart_type = ChartType::parse(&props.get_enum("chart.type"));
        let display_count = DisplayCount::parse(&props.get_enum("display.count"));
        let default_selected = props.get_usize("columns.default.selected");

        let delimiter = props.get_string("export.delimiter");
        let export_delimiter = parse_delimiter(&delimiter).unwrap_or_else(|e| {
            tracing::warn!("{}. Using ','", e);
            b','
        });

        let image_format = ImageFormat::parse(&props.get_enum("export.image.format"));

        Self {
            thresholds,
            chart_type,
            display_count,
            default_selected,
            export_delimiter,
            image_format,
        }
    }

    /// Build settings from a flat JSON settings document
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(Self::from_properties(&PropertyReader::from_json(document)?))
    }

    /// Configuration applied right after a dataset load
    pub fn initial_config(&self, catalog: &ColumnCatalog) -> ChartConfig {
        ChartConfig::initial(
            catalog,
            self.chart_type,
            self.display_count,
            self.default_selected,
        )
    }
}

/// A delimiter must be exactly one ASCII character; `\t` and `tab` mean tab
fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(DashboardError::Config(format!(
            "export.delimiter '{}' is not a single ASCII character",
            s
        ))),
    }
}
