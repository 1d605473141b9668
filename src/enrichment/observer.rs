use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Events emitted by [`super::TransitEnricher`].
#[derive(Debug, Clone)]
pub enum EnrichmentEvent {
    /// No origin was supplied; every record was marked `N/A` without lookups.
    Skipped { records: usize },
    RunStarted { records: usize, batches: usize },
    BatchStarted { index: usize, size: usize },
    CacheHit { destination: String },
    LookupFailed { destination: String, error: String },
    BatchFinished { index: usize, available: usize },
    Paused { duration: Duration },
    RunFinished {
        elapsed: Duration,
        metrics: EnrichmentMetricsSnapshot,
    },
}

/// Observer hook for enrichment events.
pub trait EnrichmentObserver: Send + Sync {
    fn on_event(&self, event: &EnrichmentEvent);
}

/// Logs enrichment events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingEnrichmentObserver;

impl EnrichmentObserver for TracingEnrichmentObserver {
    fn on_event(&self, event: &EnrichmentEvent) {
        match event {
            EnrichmentEvent::Skipped { records } => {
                tracing::debug!(records, "no origin address; transit times set to N/A");
            }
            EnrichmentEvent::RunStarted { records, batches } => {
                tracing::debug!(records, batches, "transit enrichment started");
            }
            EnrichmentEvent::BatchStarted { index, size } => {
                tracing::debug!(batch = index, size, "transit batch started");
            }
            EnrichmentEvent::CacheHit { destination } => {
                tracing::debug!(%destination, "transit time (cache)");
            }
            EnrichmentEvent::LookupFailed { destination, error } => {
                tracing::warn!(%destination, %error, "transit lookup failed");
            }
            EnrichmentEvent::BatchFinished { index, available } => {
                tracing::debug!(batch = index, available, "transit batch finished");
            }
            EnrichmentEvent::Paused { duration } => {
                tracing::trace!(?duration, "pausing between transit batches");
            }
            EnrichmentEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(?elapsed, %metrics, "transit enrichment finished");
            }
        }
    }
}

/// Cumulative enrichment counters.
///
/// Counters only grow, so one enricher can be shared across concurrent requests; callers
/// diff snapshots if they need per-run numbers.
#[derive(Debug, Default)]
pub struct EnrichmentMetrics {
    runs: AtomicU64,
    records: AtomicU64,
    batches: AtomicU64,
    lookups: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
    pause_ns: AtomicU64,
}

impl EnrichmentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_run(&self, records: usize) {
        let _ = self.runs.fetch_add(1, Ordering::SeqCst);
        let _ = self.records.fetch_add(records as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_batch(&self) {
        let _ = self.batches.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_lookup(&self) {
        let _ = self.lookups.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_cache_hit(&self) {
        let _ = self.cache_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_failure(&self) {
        let _ = self.failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_pause(&self, d: Duration) {
        let add = d.as_nanos().min(u64::MAX as u128) as u64;
        let _ = self.pause_ns.fetch_add(add, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> EnrichmentMetricsSnapshot {
        EnrichmentMetricsSnapshot {
            runs: self.runs.load(Ordering::SeqCst),
            records: self.records.load(Ordering::SeqCst),
            batches: self.batches.load(Ordering::SeqCst),
            lookups: self.lookups.load(Ordering::SeqCst),
            cache_hits: self.cache_hits.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            paused: Duration::from_nanos(self.pause_ns.load(Ordering::SeqCst)),
        }
    }
}

/// Immutable snapshot of [`EnrichmentMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentMetricsSnapshot {
    pub runs: u64,
    pub records: u64,
    pub batches: u64,
    /// External lookups issued (cache misses).
    pub lookups: u64,
    pub cache_hits: u64,
    pub failures: u64,
    pub paused: Duration,
}

impl fmt::Display for EnrichmentMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={}, records={}, batches={}, lookups={}, cache_hits={}, failures={}, paused={:?}",
            self.runs,
            self.records,
            self.batches,
            self.lookups,
            self.cache_hits,
            self.failures,
            self.paused
        )
    }
}
