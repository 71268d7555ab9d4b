//! Observability: histogram metrics for resolution latency and counters for
//! tier accounting. Histograms track p50/p95/p99 over a fixed sample ring.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A span measuring elapsed time from creation to explicit end.
pub struct TimingSpan {
    name: &'static str,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    pub fn new(name: &'static str, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            name,
            start: Instant::now(),
            registry,
        }
    }

    /// End the span, recording elapsed duration in microseconds.
    pub fn finish(self) -> f64 {
        let elapsed_us = self.start.elapsed().as_micros() as f64;
        self.registry.record(self.name, elapsed_us);
        elapsed_us
    }

    /// Elapsed so far without finishing.
    pub fn elapsed_us(&self) -> f64 {
        self.start.elapsed().as_micros() as f64
    }
}

/// Fixed-capacity ring buffer for histogram samples.
struct SampleRing {
    samples: Vec<f64>,
    pos: usize,
    count: usize,
    capacity: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            pos: 0,
            count: 0,
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        self.samples[self.pos] = value;
        self.pos = (self.pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.count].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (self.count as f64 - 1.0)).round() as usize;
        let idx = idx.min(self.count - 1);
        sorted[idx]
    }
}

/// Stores histograms and counters for all named metrics.
pub struct MetricsRegistry {
    histograms: Mutex<HashMap<&'static str, SampleRing>>,
    counters: Mutex<HashMap<&'static str, u64>>,
    ring_capacity: usize,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            histograms: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            ring_capacity: 1024,
        }
    }

    /// Record a sample (in microseconds) for the named metric.
    pub fn record(&self, name: &'static str, value_us: f64) {
        let mut hists = self.histograms.lock();
        hists
            .entry(name)
            .or_insert_with(|| SampleRing::new(self.ring_capacity))
            .push(value_us);
    }

    /// Increment a named counter.
    pub fn incr(&self, name: &'static str) {
        let mut counters = self.counters.lock();
        *counters.entry(name).or_insert(0) += 1;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Start a timing span that records on finish.
    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan::new(name, Arc::clone(self))
    }

    /// Get percentile for a metric (p value 0-100). Returns microseconds.
    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        let hists = self.histograms.lock();
        hists
            .get(name)
            .map(|ring| ring.percentile(p))
            .unwrap_or(0.0)
    }

    /// Summary of all histograms at p50/p95/p99 plus counter values.
    pub fn summary(&self) -> MetricsSummary {
        let hists = self.histograms.lock();
        let mut histograms = HashMap::new();
        for (&name, ring) in hists.iter() {
            histograms.insert(
                name.to_string(),
                HistogramSummary {
                    p50_us: ring.percentile(50.0),
                    p95_us: ring.percentile(95.0),
                    p99_us: ring.percentile(99.0),
                    count: ring.count,
                },
            );
        }
        let counters = self
            .counters
            .lock()
            .iter()
            .map(|(&k, &v)| (k.to_string(), v))
            .collect();
        MetricsSummary {
            histograms,
            counters,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistogramSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub histograms: HashMap<String, HistogramSummary>,
    pub counters: HashMap<String, u64>,
}

/// Well-known metric names (constants to avoid typos).
pub mod metric_names {
    pub const RESOLVE_LATENCY: &str = "t_resolve";
    pub const BULK_REFRESH_LATENCY: &str = "t_bulk_refresh";

    pub const TIER_IDENTITY: &str = "tier_identity";
    pub const TIER_STATIC_HIT: &str = "tier_static_hit";
    pub const TIER_CACHE_HIT: &str = "tier_cache_hit";
    pub const TIER_BULK_HIT: &str = "tier_bulk_hit";
    pub const TIER_LIVE_OK: &str = "tier_live_ok";
    pub const TIER_LIVE_FALLBACK: &str = "tier_live_fallback";
    pub const TIER_BREAKER_SKIP: &str = "tier_breaker_skip";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.incr(metric_names::TIER_STATIC_HIT);
        metrics.incr(metric_names::TIER_STATIC_HIT);
        assert_eq!(metrics.counter(metric_names::TIER_STATIC_HIT), 2);
        assert_eq!(metrics.counter(metric_names::TIER_CACHE_HIT), 0);
    }

    #[test]
    fn histogram_percentiles() {
        let metrics = MetricsRegistry::new();
        for v in 1..=100 {
            metrics.record(metric_names::RESOLVE_LATENCY, v as f64);
        }
        let p50 = metrics.percentile(metric_names::RESOLVE_LATENCY, 50.0);
        assert!((45.0..=55.0).contains(&p50), "p50 was {p50}");
        let p99 = metrics.percentile(metric_names::RESOLVE_LATENCY, 99.0);
        assert!(p99 >= 98.0);
    }

    #[test]
    fn span_records_on_finish() {
        let metrics = Arc::new(MetricsRegistry::new());
        let span = metrics.span(metric_names::RESOLVE_LATENCY);
        let elapsed = span.finish();
        assert!(elapsed >= 0.0);
        let summary = metrics.summary();
        assert_eq!(
            summary
                .histograms
                .get(metric_names::RESOLVE_LATENCY)
                .unwrap()
                .count,
            1
        );
    }
}
