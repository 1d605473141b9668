//! The request pipeline: source → build → filter → enrich → project.

use std::sync::Arc;
use std::time::Instant;

use crate::enrichment::TransitEnricher;
use crate::error::FinderResult;
use crate::ingestion::{fetch_sheets, DataSource, SourceObserver};
use crate::processing::{build, filter, project, FilterCriteria, OutputRow};

/// Serves filter requests against a [`DataSource`].
///
/// The dataset is rebuilt from the source on every call, so the result always reflects the
/// current sheets. Only the transit cache (inside the enricher) outlives a request.
pub struct SchoolFinder {
    source: Arc<dyn DataSource>,
    enricher: TransitEnricher,
    source_observer: Option<Arc<dyn SourceObserver>>,
}

impl SchoolFinder {
    pub fn new(source: Arc<dyn DataSource>, enricher: TransitEnricher) -> Self {
        Self {
            source,
            enricher,
            source_observer: None,
        }
    }

    pub fn with_source_observer(mut self, observer: Arc<dyn SourceObserver>) -> Self {
        self.source_observer = Some(observer);
        self
    }

    pub fn enricher(&self) -> &TransitEnricher {
        &self.enricher
    }

    /// Rows of every school matching `criteria`, in source order.
    ///
    /// Fails only if a sheet cannot be loaded or lacks a `DBN` column. Transit lookup failures
    /// never fail the request; the affected rows show `"N/A"`.
    pub async fn find_schools(&self, criteria: &FilterCriteria) -> FinderResult<Vec<OutputRow>> {
        let start = Instant::now();

        let sheets = fetch_sheets(self.source.as_ref(), self.source_observer.as_deref()).await?;
        let schools = build(&sheets.data, &sheets.bullying, &sheets.links)?;
        let mut matched = filter(&schools, criteria);

        tracing::debug!(total = schools.len(), matched = matched.len(), "filter applied");

        self.enricher
            .enrich(&mut matched, criteria.origin().unwrap_or_default())
            .await;

        let rows = project(&matched);
        tracing::info!(
            source = self.source.source_tag(),
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "filter request served"
        );
        Ok(rows)
    }
}

impl std::fmt::Debug for SchoolFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchoolFinder")
            .field("source", &self.source.source_tag())
            .field("enrichment", self.enricher.options())
            .finish()
    }
}
