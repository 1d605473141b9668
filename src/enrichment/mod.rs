//! Transit enrichment: per-school travel times from an origin address.
//!
//! Records are processed in fixed-size batches. Lookups inside a batch run concurrently; batches
//! run one after another with a fixed pause in between, which paces calls to the upstream
//! directions service. Each lookup consults a shared [`TransitCache`] first.
//!
//! Failures never escape this module: a record whose lookup fails is marked
//! [`TransitTime::NotAvailable`] and its siblings are unaffected.

mod cache;
mod directions;
mod lookup;
mod observer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::error::LookupError;
use crate::model::{SchoolRecord, TransitTime};

pub use cache::{
    cache_key, Clock, ManualClock, MemoryCache, SystemClock, TransitCache, CACHE_SWEEP_INTERVAL, TRANSIT_CACHE_TTL,
};
pub use directions::{parse_directions, DirectionsClient, DirectionsOptions, DIRECTIONS_ENDPOINT};
pub use lookup::{TransitLookup, TravelMode};
pub use observer::{
    EnrichmentEvent, EnrichmentMetrics, EnrichmentMetricsSnapshot, EnrichmentObserver, TracingEnrichmentObserver,
};

/// Configuration for [`TransitEnricher`].
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Records per batch; also the upper bound on concurrent lookups.
    pub batch_size: usize,
    /// Pause inserted between consecutive batches (not after the last one).
    pub batch_delay: Duration,
    /// Routing mode passed to the lookup.
    pub mode: TravelMode,
    /// Lifetime of cached results.
    pub cache_ttl: Duration,
    /// Upper bound on a single lookup; `None` waits for the lookup to resolve on its own.
    pub lookup_timeout: Option<Duration>,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_secs(1),
            mode: TravelMode::Transit,
            cache_ttl: TRANSIT_CACHE_TTL,
            lookup_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Annotates records with transit times using an injected lookup and cache.
pub struct TransitEnricher {
    lookup: Arc<dyn TransitLookup>,
    cache: Arc<dyn TransitCache>,
    opts: EnrichmentOptions,
    observer: Option<Arc<dyn EnrichmentObserver>>,
    metrics: Arc<EnrichmentMetrics>,
}

impl TransitEnricher {
    /// Create an enricher.
    ///
    /// A `batch_size` of 0 is raised to 1.
    pub fn new(lookup: Arc<dyn TransitLookup>, cache: Arc<dyn TransitCache>, mut opts: EnrichmentOptions) -> Self {
        if opts.batch_size == 0 {
            tracing::warn!("enrichment batch_size 0 raised to 1");
            opts.batch_size = 1;
        }
        Self {
            lookup,
            cache,
            opts,
            observer: None,
            metrics: Arc::new(EnrichmentMetrics::new()),
        }
    }

    /// Attach an observer for enrichment events.
    pub fn with_observer(mut self, observer: Arc<dyn EnrichmentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to the cumulative enrichment metrics.
    pub fn metrics(&self) -> Arc<EnrichmentMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &EnrichmentOptions {
        &self.opts
    }

    /// Set the transit time of every record in `schools`.
    ///
    /// A blank `origin` marks every record `N/A` without any lookup. Otherwise at most
    /// `ceil(n / batch_size)` sequential rounds are run.
    pub async fn enrich(&self, schools: &mut [SchoolRecord], origin: &str) {
        let origin = origin.trim();
        if origin.is_empty() {
            for school in schools.iter_mut() {
                school.transit_time = TransitTime::NotAvailable;
            }
            self.emit(EnrichmentEvent::Skipped { records: schools.len() });
            return;
        }

        let start = Instant::now();
        let batch_count = schools.len().div_ceil(self.opts.batch_size);
        self.metrics.on_run(schools.len());
        self.emit(EnrichmentEvent::RunStarted {
            records: schools.len(),
            batches: batch_count,
        });

        for (index, batch) in schools.chunks_mut(self.opts.batch_size).enumerate() {
            if index > 0 && !self.opts.batch_delay.is_zero() {
                self.emit(EnrichmentEvent::Paused {
                    duration: self.opts.batch_delay,
                });
                tokio::time::sleep(self.opts.batch_delay).await;
                self.metrics.on_pause(self.opts.batch_delay);
            }

            self.metrics.on_batch();
            self.emit(EnrichmentEvent::BatchStarted {
                index,
                size: batch.len(),
            });

            let times = join_all(batch.iter().map(|school| {
                let destination = school.destination();
                async move { self.transit_time(origin, &destination).await }
            }))
            .await;

            let mut available = 0usize;
            for (school, time) in batch.iter_mut().zip(times) {
                if time.is_available() {
                    available += 1;
                }
                school.transit_time = time;
            }

            self.emit(EnrichmentEvent::BatchFinished { index, available });
        }

        self.emit(EnrichmentEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
    }

    /// Travel time for one (origin, destination) pair, served from cache when possible.
    ///
    /// Successful lookups are cached; failures are not.
    pub async fn transit_time(&self, origin: &str, destination: &str) -> TransitTime {
        let (origin, destination) = (origin.trim(), destination.trim());
        if origin.is_empty() || destination.is_empty() {
            return TransitTime::NotAvailable;
        }

        let key = cache_key(origin, destination);
        if let Some(cached) = self.cache.get(&key) {
            let time = TransitTime::from_cached(&cached);
            if time.is_available() {
                self.metrics.on_cache_hit();
                self.emit(EnrichmentEvent::CacheHit {
                    destination: destination.to_string(),
                });
                return time;
            }
        }

        self.metrics.on_lookup();
        match self.lookup_with_timeout(origin, destination).await {
            Ok(duration) => {
                let minutes = whole_minutes(duration);
                self.cache.put(&key, minutes.to_string(), self.opts.cache_ttl);
                TransitTime::Minutes(minutes)
            }
            Err(err) => {
                self.metrics.on_failure();
                self.emit(EnrichmentEvent::LookupFailed {
                    destination: destination.to_string(),
                    error: err,
                });
                TransitTime::NotAvailable
            }
        }
    }

    async fn lookup_with_timeout(&self, origin: &str, destination: &str) -> Result<Duration, String> {
        let call = self.lookup.duration(origin, destination, self.opts.mode);
        let result: Result<Duration, LookupError> = match self.opts.lookup_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(r) => r,
                Err(_) => return Err(format!("lookup timed out after {limit:?}")),
            },
            None => call.await,
        };
        result.map_err(|e| e.to_string())
    }

    fn emit(&self, event: EnrichmentEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Seconds to whole minutes, rounding halves up.
fn whole_minutes(duration: Duration) -> u32 {
    let minutes = (duration.as_secs_f64() / 60.0).round();
    minutes.clamp(0.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::Demographics;

    fn school(dbn: &str, address: &str) -> SchoolRecord {
        SchoolRecord {
            dbn: dbn.to_string(),
            name: format!("School {dbn}"),
            address: address.to_string(),
            borough: "Queens".to_string(),
            school_type: String::new(),
            admissions_criteria: String::new(),
            link: String::new(),
            enrollment: 0.0,
            grad_rate: 0.0,
            freshman_credit: 0.0,
            sophomore_credit: 0.0,
            junior_credit: 0.0,
            college_career_readiness: 0.0,
            bullying_pct: 0.0,
            demographics: Demographics::default(),
            rating: 0.0,
            transit_time: TransitTime::Minutes(999),
        }
    }

    /// Returns a fixed duration and records every call.
    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
        modes: Mutex<Vec<TravelMode>>,
    }

    #[async_trait]
    impl TransitLookup for CountingLookup {
        async fn duration(&self, _o: &str, _d: &str, mode: TravelMode) -> Result<Duration, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.modes.lock().unwrap().push(mode);
            Ok(Duration::from_secs(1_530))
        }
    }

    /// Sleeps before answering and records when each call began.
    #[derive(Default)]
    struct SlowLookup {
        started: Mutex<Vec<tokio::time::Instant>>,
    }

    impl SlowLookup {
        const DELAY: Duration = Duration::from_secs(5);
    }

    #[async_trait]
    impl TransitLookup for SlowLookup {
        async fn duration(&self, _o: &str, _d: &str, _m: TravelMode) -> Result<Duration, LookupError> {
            self.started.lock().unwrap().push(tokio::time::Instant::now());
            tokio::time::sleep(Self::DELAY).await;
            Ok(Self::DELAY * 60)
        }
    }

    struct NeverLookup;

    #[async_trait]
    impl TransitLookup for NeverLookup {
        async fn duration(&self, _o: &str, _d: &str, _m: TravelMode) -> Result<Duration, LookupError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn enricher(lookup: Arc<dyn TransitLookup>) -> TransitEnricher {
        TransitEnricher::new(lookup, Arc::new(MemoryCache::new()), EnrichmentOptions::default())
    }

    #[test]
    fn minutes_round_half_up() {
        assert_eq!(whole_minutes(Duration::from_secs(89)), 1);
        assert_eq!(whole_minutes(Duration::from_secs(90)), 2);
        assert_eq!(whole_minutes(Duration::from_secs(1_530)), 26);
        assert_eq!(whole_minutes(Duration::ZERO), 0);
    }

    #[tokio::test]
    async fn blank_origin_marks_everything_na_without_lookups() {
        let lookup = Arc::new(CountingLookup::default());
        let enricher = enricher(lookup.clone());
        let mut schools = vec![school("A", "1 Main St"), school("B", "2 Main St")];

        enricher.enrich(&mut schools, "   ").await;

        assert!(schools.iter().all(|s| s.transit_time == TransitTime::NotAvailable));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uses_transit_mode_and_rounds_to_minutes() {
        let lookup = Arc::new(CountingLookup::default());
        let enricher = enricher(lookup.clone());
        let mut schools = vec![school("A", "1 Main St")];

        enricher.enrich(&mut schools, "10 Home Ave").await;

        assert_eq!(schools[0].transit_time, TransitTime::Minutes(26));
        assert_eq!(*lookup.modes.lock().unwrap(), vec![TravelMode::Transit]);
    }

    #[tokio::test]
    async fn blank_destination_is_na_without_lookup() {
        let lookup = Arc::new(CountingLookup::default());
        let enricher = enricher(lookup.clone());

        assert_eq!(enricher.transit_time("10 Home Ave", "  ").await, TransitTime::NotAvailable);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_lookup_times_out_to_na() {
        let enricher = enricher(Arc::new(NeverLookup));
        let mut schools = vec![school("A", "1 Main St")];

        enricher.enrich(&mut schools, "10 Home Ave").await;

        assert_eq!(schools[0].transit_time, TransitTime::NotAvailable);
        assert_eq!(enricher.metrics().snapshot().failures, 1);
    }

    #[tokio::test]
    async fn unparseable_cache_entry_falls_through_to_lookup() {
        let lookup = Arc::new(CountingLookup::default());
        let cache = Arc::new(MemoryCache::new());
        cache.put(&cache_key("home", "1 Main St Queens"), "soon".to_string(), TRANSIT_CACHE_TTL);
        let enricher = TransitEnricher::new(lookup.clone(), cache.clone(), EnrichmentOptions::default());

        let mut schools = vec![school("A", "1 Main St")];
        enricher.enrich(&mut schools, "home").await;

        assert_eq!(schools[0].transit_time, TransitTime::Minutes(26));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&cache_key("home", "1 Main St Queens")).as_deref(), Some("26"));
    }

    #[tokio::test]
    async fn zero_batch_size_runs_one_lookup_per_batch() {
        let lookup = Arc::new(CountingLookup::default());
        let enricher = TransitEnricher::new(
            lookup.clone(),
            Arc::new(MemoryCache::new()),
            EnrichmentOptions {
                batch_size: 0,
                batch_delay: Duration::ZERO,
                ..Default::default()
            },
        );
        assert_eq!(enricher.options().batch_size, 1);

        let mut schools = vec![school("A", "1 Main St"), school("B", "2 Main St")];
        enricher.enrich(&mut schools, "home").await;

        assert!(schools.iter().all(|s| s.transit_time == TransitTime::Minutes(26)));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert_eq!(enricher.metrics().snapshot().batches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn lookups_within_a_batch_run_concurrently() {
        let lookup = Arc::new(SlowLookup::default());
        let enricher = enricher(lookup.clone());
        let mut schools: Vec<_> = (0..11).map(|i| school(&format!("S{i}"), &format!("{i} Main St"))).collect();

        let t0 = tokio::time::Instant::now();
        enricher.enrich(&mut schools, "home").await;
        let elapsed = t0.elapsed();

        let starts = lookup.started.lock().unwrap().clone();
        assert_eq!(starts.len(), 11);
        for start in &starts[..10] {
            assert!(*start - t0 < Duration::from_millis(100), "first batch starts together");
        }
        // one lookup period plus the pause
        assert!(starts[10] - t0 >= SlowLookup::DELAY + Duration::from_secs(1));
        assert!(starts[10] - t0 < SlowLookup::DELAY * 2);
        assert!(elapsed < SlowLookup::DELAY * 3, "took {elapsed:?}");
        assert!(schools.iter().all(|s| s.transit_time == TransitTime::Minutes(5)));
    }
}
