//! Dashboard session
//!
//! Owns the loaded dataset, the column catalog, the derived column list and
//! the current `ChartConfig`. Rendering is a pure pipeline run over that
//! state.
//!
//! Loads follow last-load-wins semantics: `begin_load` discards every piece
//! of state derived from the previous dataset (rows, descriptors, filters,
//! grouping) and hands out a ticket; `complete_load` only installs a result
//! whose ticket is still current. Derived column definitions survive loads
//! and are re-evaluated against the new rows.

use crate::chart::config::{repair_config, update_config, ChartConfig, ConfigPatch};
use crate::config::DashboardSettings;
use crate::data::catalog::ColumnCatalog;
use crate::data::classify::{describe_columns, ColumnKind};
use crate::data::export::{export_columns, image_data_uri, to_delimited};
use crate::data::loader::{self, DataSource, Dataset};
use crate::error::{DashboardError, LoadError, Result};
use crate::pipeline::{self, PipelineOutput};
use crate::transform::aggregate::{COUNT_KEY, ID_KEY};
use crate::transform::derived::{DerivedColumnSpec, FormulaKind};
use serde::Serialize;

/// Identifies one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Shape of the loaded dataset, logged on load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub name: String,
    pub n_rows: usize,
    pub n_numeric: usize,
    pub n_categorical: usize,
    pub n_derived: usize,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    settings: DashboardSettings,
    generation: u64,
    dataset: Option<Dataset>,
    catalog: ColumnCatalog,
    config: ChartConfig,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(settings: DashboardSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Message of the last terminal load failure, if the last load failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Load a dataset end to end
    pub async fn load(&mut self, source: &DataSource) -> Result<DatasetSummary> {
        let ticket = self.begin_load();
        let result = loader::load(source).await;
        self.complete_load(ticket, result)
    }

    /// Start a load, discarding all state derived from the previous dataset
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.dataset = None;
        self.catalog = ColumnCatalog::new(Vec::new(), self.catalog.derived().to_vec());
        self.config = ChartConfig::default();
        self.last_error = None;
        tracing::info!("Load {} started, previous dataset state discarded", self.generation);
        LoadTicket(self.generation)
    }

    /// Install the result of a load if `ticket` is still the current load
    ///
    /// # Returns
    /// The dataset summary, the load error, or `StaleLoad` when a newer
    /// load has started since `ticket` was issued.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<Dataset, LoadError>,
    ) -> Result<DatasetSummary> {
        if ticket.0 != self.generation {
            tracing::warn!(
                "Discarding result of load {} (current load is {})",
                ticket.0,
                self.generation
            );
            return Err(DashboardError::StaleLoad {
                ticket: ticket.0,
                current: self.generation,
            });
        }

        let dataset = match result {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::error!("Load {} failed: {}", ticket.0, e);
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let descriptors = describe_columns(&dataset.columns, &dataset.rows, &self.settings.thresholds);
        let derived = self
            .catalog
            .derived()
            .iter()
            .filter(|spec| {
                let collides = descriptors.iter().any(|c| c.key == spec.key);
                if collides {
                    tracing::warn!(
                        "Derived column '{}' collides with a dataset column, dropped",
                        spec.name
                    );
                }
                !collides
            })
            .cloned()
            .collect();
        self.catalog = ColumnCatalog::new(descriptors, derived);
        self.config = self.settings.initial_config(&self.catalog);
        self.dataset = Some(dataset);

        let summary = self.summary();
        tracing::info!(
            "Loaded '{}': {} rows, {} numeric and {} categorical columns",
            summary.name,
            summary.n_rows,
            summary.n_numeric,
            summary.n_categorical
        );
        Ok(summary)
    }

    pub fn summary(&self) -> DatasetSummary {
        let count_kind = |kind: ColumnKind| {
            self.catalog
                .columns()
                .iter()
                .filter(|c| c.kind() == kind)
                .count()
        };
        DatasetSummary {
            name: self
                .dataset
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_default(),
            n_rows: self.dataset.as_ref().map(Dataset::n_rows).unwrap_or(0),
            n_numeric: count_kind(ColumnKind::Numeric),
            n_categorical: count_kind(ColumnKind::Categorical),
            n_derived: self.catalog.derived().len(),
        }
    }

    /// Apply a configuration change through the reducer
    pub fn apply(&mut self, patch: ConfigPatch) -> &ChartConfig {
        self.config = update_config(&self.config, patch, &self.catalog);
        &self.config
    }

    /// Add a derived column and select it
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `kind` - Formula kind
    /// * `columns` - Source keys (ignored by the selection formulas)
    pub fn add_derived_column(
        &mut self,
        name: &str,
        kind: FormulaKind,
        columns: &[String],
    ) -> Result<DerivedColumnSpec> {
        if let Some(unknown) = columns.iter().find(|k| !self.catalog.is_value_column(k)) {
            return Err(DashboardError::Formula(format!(
                "'{}' is not a numeric or derived column",
                unknown
            )));
        }

        let catalog = &self.catalog;
        let spec = DerivedColumnSpec::build(name, kind, columns, |key| {
            catalog.contains(key) || key == COUNT_KEY || key == ID_KEY
        })?;

        let mut derived = self.catalog.derived().to_vec();
        derived.push(spec.clone());
        self.catalog.set_derived(derived);
        self.apply(ConfigPatch::ToggleColumn(spec.key.clone()));

        tracing::info!("Added derived column '{}' ({})", spec.name, spec.key);
        Ok(spec)
    }

    /// Remove a derived column; it also leaves the selection
    pub fn remove_derived_column(&mut self, key: &str) -> Result<()> {
        let mut derived = self.catalog.derived().to_vec();
        let Some(pos) = derived.iter().position(|d| d.key == key) else {
            return Err(DashboardError::Formula(format!(
                "no derived column with key '{}'",
                key
            )));
        };
        let removed = derived.remove(pos);
        self.catalog.set_derived(derived);
        self.config = repair_config(self.config.clone(), &self.catalog);

        tracing::info!("Removed derived column '{}'", removed.name);
        Ok(())
    }

    /// Run the pipeline over the current dataset
    pub fn render(&self) -> PipelineOutput {
        let rows = self.dataset.as_ref().map(|d| d.rows.as_slice()).unwrap_or(&[]);
        pipeline::run(rows, &self.config, &self.catalog)
    }

    /// The post-pipeline rows as delimited text with display-name headers
    pub fn export_delimited(&self) -> Result<String> {
        let rows = self.dataset.as_ref().map(|d| d.rows.as_slice()).unwrap_or(&[]);
        let rows = pipeline::prepare_rows(rows, &self.config, &self.catalog);
        let columns = export_columns(&rows, &self.catalog);
        to_delimited(&rows, &columns, &self.catalog, self.settings.export_delimiter)
    }

    /// Rendered chart output as a data URI in the configured image format
    pub fn export_image(&self, rendered: &[u8]) -> String {
        image_data_uri(rendered, self.settings.image_format)
    }
}
