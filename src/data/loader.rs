//! Dataset loading
//!
//! A dataset arrives as raw delimited text, a file path, or a URL. The text
//! is decoded as header-based rows; every cell passes through a transform
//! hook that maps spreadsheet error markers to 0 and types the cell
//! (empty → null, true/false → boolean, numeric literal → number).

use super::codec;
use super::value::{CellValue, Row};
use crate::error::LoadError;
use crate::transform::aggregate::{COUNT_KEY, ID_KEY};
use csv::ReaderBuilder;
use std::path::PathBuf;

/// Error marker fragments produced by spreadsheet exports (`#DIV/0!`, `#N/A`, ...)
const ERROR_MARKERS: [&str; 7] = ["DIV", "VALUE", "N/A", "REF", "NAME", "NUM", "NULL"];

/// Where a dataset comes from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Text already in memory (drag-and-drop or file picker)
    Text { name: String, contents: String },
    /// Local file
    Path(PathBuf),
    /// Remote file fetched over HTTP(S)
    Url(String),
}

impl DataSource {
    /// Human-readable name for logs and the dataset label
    pub fn name(&self) -> String {
        match self {
            DataSource::Text { name, .. } => name.clone(),
            DataSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            DataSource::Url(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
        }
    }
}

/// A decoded dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    /// `(display_name, key)` in header order; keys are unique
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Fetch (if needed) and decode a dataset
pub async fn load(source: &DataSource) -> Result<Dataset, LoadError> {
    let text = fetch_text(source).await?;
    parse_delimited(&source.name(), &text)
}

/// Read the raw text behind a source
pub async fn fetch_text(source: &DataSource) -> Result<String, LoadError> {
    match source {
        DataSource::Text { contents, .. } => Ok(contents.clone()),
        DataSource::Path(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.display().to_string(),
                    source,
                })
        }
        DataSource::Url(url) => {
            tracing::info!("Fetching dataset from {}", url);
            let response = reqwest::get(url).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        }
    }
}

/// Decode header-based delimited text into typed rows
///
/// The delimiter is sniffed from the header line (comma, semicolon, tab or
/// pipe). Blank records are skipped; short records are padded with nulls.
pub fn parse_delimited(name: &str, text: &str) -> Result<Dataset, LoadError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut columns: Vec<(String, String)> = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let display = if header.trim().is_empty() {
            format!("Column {}", i + 1)
        } else {
            header.trim().to_string()
        };
        // Group rows own `count` and `id`
        let key = codec::unique_key(&display, |k| {
            k == COUNT_KEY || k == ID_KEY || columns.iter().any(|(_, taken)| taken == k)
        });
        columns.push((display, key));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row: Row = columns
            .iter()
            .enumerate()
            .map(|(i, (_, key))| {
                let value = record.get(i).map(transform_cell).unwrap_or(CellValue::Null);
                (key.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    tracing::info!(
        "Parsed dataset '{}': {} rows × {} columns",
        name,
        rows.len(),
        columns.len()
    );

    Ok(Dataset {
        name: name.to_string(),
        columns,
        rows,
    })
}

/// Per-cell transform hook and type inference
pub fn transform_cell(raw: &str) -> CellValue {
    if is_error_marker(raw) {
        return CellValue::Number(0.0);
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }

    match trimmed {
        "true" | "TRUE" | "True" => return CellValue::Boolean(true),
        "false" | "FALSE" | "False" => return CellValue::Boolean(false),
        _ => {}
    }

    if is_numeric_literal(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }

    CellValue::Text(raw.to_string())
}

/// Spreadsheet error markers such as `#DIV/0!`, `#VALUE!`, `#N/A`
pub fn is_error_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with('#') && ERROR_MARKERS.iter().any(|m| trimmed.contains(m))
}

/// `-?(digits[.digits]|.digits)([eE][+-]?digits)?`
fn is_numeric_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = match frac_part {
        Some(frac) => {
            all_digits(int_part) && all_digits(frac) && !(int_part.is_empty() && frac.is_empty())
        }
        None => !int_part.is_empty() && all_digits(int_part),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|d| header.bytes().filter(|b| b == d).count())
        .filter(|d| header.bytes().any(|b| b == *d))
        .unwrap_or(b',')
}
