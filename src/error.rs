use thiserror::Error;

/// Convenience result type for data-source and pipeline operations.
pub type FinderResult<T> = Result<T, FinderError>;

/// Error type returned when a filter request cannot be served.
///
/// Any of these fails the whole request. Per-school transit failures never surface here; they
/// are reported as [`LookupError`] and degrade to `"N/A"`.
#[derive(Debug, Error)]
pub enum FinderError {
    /// Underlying I/O error (e.g. workbook not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV source error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport error talking to a remote sheet source.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A required sheet is missing, empty, or does not have the expected shape.
    #[error("data source error in sheet '{sheet}': {message}")]
    DataSource { sheet: String, message: String },
}

impl FinderError {
    pub(crate) fn data_source(sheet: &str, message: impl Into<String>) -> Self {
        Self::DataSource {
            sheet: sheet.to_string(),
            message: message.into(),
        }
    }
}

/// Failure of a single transit-time lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network failure or timeout.
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The directions service answered with a non-OK routing status.
    #[error("directions status {status}{}", status_suffix(.message))]
    Status {
        status: String,
        message: Option<String>,
    },

    /// The response was OK but carried no route/leg/duration.
    #[error("no route found")]
    NoRoute,

    /// The response body could not be decoded.
    #[error("malformed directions payload: {0}")]
    Malformed(String),
}

fn status_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}
