use std::error::Error as StdError;

use crate::error::FinderError;

/// Severity classification used for observer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceSeverity {
    /// The sheet exists but has the wrong shape.
    Error,
    /// The source itself is unreachable (I/O, network).
    Critical,
}

/// Context about one sheet fetch.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Tag of the [`super::DataSource`] implementation (e.g. `"workbook"`).
    pub source: &'static str,
    /// Requested sheet name.
    pub sheet: String,
}

/// Minimal stats reported on a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    /// Number of data rows (header excluded).
    pub rows: usize,
}

/// Observer interface for sheet fetch outcomes.
pub trait SourceObserver: Send + Sync {
    /// Called when a sheet was fetched.
    fn on_success(&self, _ctx: &SourceContext, _stats: SourceStats) {}

    /// Called when a sheet could not be fetched.
    fn on_failure(&self, _ctx: &SourceContext, _severity: SourceSeverity, _error: &FinderError) {}
}

/// Logs fetch outcomes through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSourceObserver;

impl SourceObserver for TracingSourceObserver {
    fn on_success(&self, ctx: &SourceContext, stats: SourceStats) {
        tracing::debug!(source = ctx.source, sheet = %ctx.sheet, rows = stats.rows, "sheet loaded");
    }

    fn on_failure(&self, ctx: &SourceContext, severity: SourceSeverity, error: &FinderError) {
        match severity {
            SourceSeverity::Critical => {
                tracing::error!(source = ctx.source, sheet = %ctx.sheet, %error, "sheet source unavailable")
            }
            SourceSeverity::Error => {
                tracing::warn!(source = ctx.source, sheet = %ctx.sheet, %error, "sheet rejected")
            }
        }
    }
}

/// Classify a fetch error.
pub fn severity_for_error(e: &FinderError) -> SourceSeverity {
    match e {
        FinderError::Io(_) | FinderError::Http(_) => SourceSeverity::Critical,
        FinderError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => SourceSeverity::Critical,
            _ => SourceSeverity::Error,
        },
        #[cfg(feature = "excel")]
        FinderError::Excel(err) => {
            if error_chain_contains_io(err) {
                SourceSeverity::Critical
            } else {
                SourceSeverity::Error
            }
        }
        FinderError::DataSource { .. } => SourceSeverity::Error,
    }
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
