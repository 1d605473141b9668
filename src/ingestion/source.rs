//! The data-source capability and the three-sheet fetch used by every request.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{FinderError, FinderResult};
use crate::types::Sheet;

use super::observability::{severity_for_error, SourceContext, SourceObserver, SourceStats};

/// Primary school records.
pub const DATA_SHEET: &str = "Data";
/// DBN -> frequent-bullying fraction (column 5).
pub const BULLYING_SHEET: &str = "Bullying Survey Data";
/// DBN -> canonical school page (column 4).
pub const LINKS_SHEET: &str = "School Links";

/// A named-sheet row source.
///
/// A sheet that cannot be retrieved is an error; implementations must not return a
/// partial or placeholder sheet.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short identifier used in logs.
    fn source_tag(&self) -> &'static str;

    async fn fetch_sheet(&self, name: &str) -> FinderResult<Sheet>;
}

/// The three sheets one request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSheets {
    pub data: Sheet,
    pub bullying: Sheet,
    pub links: Sheet,
}

/// Fetch [`DATA_SHEET`], [`BULLYING_SHEET`] and [`LINKS_SHEET`] concurrently.
///
/// Fails if any of the three fails; each outcome is reported to `observer`.
pub async fn fetch_sheets(
    source: &dyn DataSource,
    observer: Option<&dyn SourceObserver>,
) -> FinderResult<SourceSheets> {
    let (data, bullying, links) = tokio::try_join!(
        fetch_observed(source, DATA_SHEET, observer),
        fetch_observed(source, BULLYING_SHEET, observer),
        fetch_observed(source, LINKS_SHEET, observer),
    )?;
    Ok(SourceSheets { data, bullying, links })
}

async fn fetch_observed(
    source: &dyn DataSource,
    sheet: &str,
    observer: Option<&dyn SourceObserver>,
) -> FinderResult<Sheet> {
    let result = source.fetch_sheet(sheet).await;

    if let Some(obs) = observer {
        let ctx = SourceContext {
            source: source.source_tag(),
            sheet: sheet.to_string(),
        };
        match &result {
            Ok(s) => obs.on_success(&ctx, SourceStats { rows: s.row_count() }),
            Err(e) => obs.on_failure(&ctx, severity_for_error(e), e),
        }
    }

    result
}

/// In-memory sheets, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: HashMap<String, Sheet>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet under its own name.
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.insert(sheet.name.clone(), sheet);
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn source_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_sheet(&self, name: &str) -> FinderResult<Sheet> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| FinderError::data_source(name, "sheet not found"))
    }
}
