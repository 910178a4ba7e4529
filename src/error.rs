use thiserror::Error;

/// Errors that end a dataset load
///
/// All of these are terminal: the session shows the message and waits for
/// the next load. There is no retry.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Network or transport failure while fetching a URL
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Fetch of {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Delimited text could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] csv::Error),

    /// Input decoded to zero data rows
    #[error("Dataset is empty")]
    Empty,
}

/// Errors raised by dashboard operations
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Dataset load failed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Formula builder misuse (bad arity, empty name, unknown column)
    #[error("Formula error: {0}")]
    Formula(String),

    /// Malformed settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A load finished after a newer one started
    #[error("Load ticket {ticket} superseded by load {current}")]
    StaleLoad { ticket: u64, current: u64 },

    /// Delimited export failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Type alias for Results using DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;
