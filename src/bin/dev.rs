//! Chart Dashboard - Development entry point
//!
//! Loads a dataset from a local path or URL, runs the chart pipeline once
//! and writes the exported rows and the chart description to local files.
//!
//! Usage:
//! ```bash
//! export DATASET=./sales.csv            # or https://host/sales.csv
//! export RUST_LOG=chart_dashboard=debug # optional
//! cargo run --bin dev
//! ```
//!
//! Optional files in the working directory:
//! - `dashboard_config.json`: flat property values (see dashboard.json)
//! - `chart_config.json`: a saved chart configuration, applied after load

use anyhow::{Context, Result};
use chart_dashboard::chart::{ChartConfig, ChartView, ConfigPatch};
use chart_dashboard::config::DashboardSettings;
use chart_dashboard::data::DataSource;
use chart_dashboard::session::Dashboard;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn log_phase(start: Instant, phase: &str) {
    tracing::info!("[PHASE @{:.3}s] {}", start.elapsed().as_secs_f64(), phase);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let start = Instant::now();
    log_phase(start, "START: Development run");

    let dataset = std::env::var("DATASET").context("DATASET environment variable is required")?;
    let source = if dataset.starts_with("http://") || dataset.starts_with("https://") {
        DataSource::Url(dataset)
    } else {
        DataSource::Path(PathBuf::from(dataset))
    };

    let settings = load_dev_settings()?;
    tracing::info!(
        "Settings: chart type {}, display count {}, {} default column(s)",
        settings.chart_type,
        settings.display_count,
        settings.default_selected
    );

    log_phase(start, "PHASE 1: Loading dataset");
    let mut dashboard = Dashboard::new(settings);
    let summary = dashboard.load(&source).await?;
    println!(
        "✓ Loaded {} ({} rows, {} numeric, {} categorical columns)",
        summary.name, summary.n_rows, summary.n_numeric, summary.n_categorical
    );

    if let Some(saved) = load_saved_chart_config()? {
        dashboard.apply(ConfigPatch::Replace(Box::new(saved)));
        println!("✓ Applied chart_config.json");
    }

    log_phase(start, "PHASE 2: Running pipeline");
    let output = dashboard.render();
    match &output.view {
        ChartView::Empty(state) => println!("Empty chart: {}", state.message()),
        ChartView::Chart(description) => println!(
            "✓ {} chart, {} series, {} rows",
            description.family,
            description.series.len(),
            description.data.len()
        ),
    }

    log_phase(start, "PHASE 3: Writing outputs");
    let stem = summary
        .name
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or_else(|| summary.name.clone());

    let csv_path = format!("{}_export.csv", stem);
    std::fs::write(&csv_path, dashboard.export_delimited()?)
        .with_context(|| format!("Failed to write {}", csv_path))?;
    println!("✓ Saved {}", csv_path);

    let chart_path = format!("{}_chart.json", stem);
    let document = serde_json::json!({
        "config": dashboard.config(),
        "chart": output.view,
    });
    std::fs::write(&chart_path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Failed to write {}", chart_path))?;
    println!("✓ Saved {}", chart_path);

    log_phase(start, "COMPLETE");
    Ok(())
}

/// Load settings from dashboard_config.json if it exists
fn load_dev_settings() -> Result<DashboardSettings> {
    let config_path = "dashboard_config.json";
    match std::fs::read_to_string(config_path) {
        Ok(json) => {
            tracing::info!("Loaded settings from {}", config_path);
            DashboardSettings::from_json(&json)
                .with_context(|| format!("Failed to parse {}", config_path))
        }
        Err(_) => {
            tracing::info!("No {} found, using defaults", config_path);
            Ok(DashboardSettings::default())
        }
    }
}

/// Load a saved chart configuration from chart_config.json if it exists
fn load_saved_chart_config() -> Result<Option<ChartConfig>> {
    let config_path = "chart_config.json";
    let Ok(json) = std::fs::read_to_string(config_path) else {
        return Ok(None);
    };
    let config = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", config_path))?;
    Ok(Some(config))
}
