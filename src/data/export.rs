//! Exports of the post-pipeline result
//!
//! - Delimited text: the rows that reach the chart, with display-name headers
//! - Image: chart markup (SVG) or encoded PNG bytes wrapped as a base64 data URI

use super::catalog::ColumnCatalog;
use super::value::Row;
use crate::error::{DashboardError, Result};
use base64::Engine;
use csv::WriterBuilder;

/// Image formats for chart export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "png" => Self::Png,
            _ => Self::Svg,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Write `rows` as delimited text
///
/// # Arguments
/// * `rows` - Post-pipeline rows (filtered, grouped, sorted, limited)
/// * `columns` - Keys to export, in order
/// * `catalog` - Resolves header display names
/// * `delimiter` - Single-byte field delimiter
pub fn to_delimited(
    rows: &[Row],
    columns: &[String],
    catalog: &ColumnCatalog,
    delimiter: u8,
) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let headers: Vec<String> = columns.iter().map(|k| catalog.display_name(k)).collect();
    writer.write_record(&headers)?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|k| row.get(k).map(|v| v.to_display_string()).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Other(format!("Failed to flush export: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DashboardError::Other(format!("Export is not valid UTF-8: {}", e)))
}

/// Every key present in `rows`: catalog columns in header order, then
/// derived columns, then keys only the pipeline adds (`count`, `id`)
pub fn export_columns(rows: &[Row], catalog: &ColumnCatalog) -> Vec<String> {
    let present = |key: &str| rows.iter().any(|row| row.contains_key(key));

    let mut columns: Vec<String> = catalog
        .all_keys()
        .into_iter()
        .filter(|k| present(k))
        .map(String::from)
        .collect();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns
}

/// Wrap rendered chart output as a `data:` URI
///
/// For SVG, `content` is the markup; for PNG it is the encoded image bytes.
pub fn image_data_uri(content: &[u8], format: ImageFormat) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    format!("data:{};base64,{}", format.mime_type(), encoded)
}
