//! Metrics collection and registry.

use crate::context::{EntropyContext, StatsSnapshot};
use crate::seeding::ReseedableRng;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric creation, registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of system state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Request counters of the entropy context.
    pub stats: StatsSnapshot,
    /// Number of registered sources.
    pub registered_sources: usize,
    /// Source capacity of the context.
    pub capacity: usize,
    /// Total CSPRNG (re)seeds performed.
    pub reseed_count: u64,
    /// Bytes generated since last reseed.
    pub bytes_since_reseed: u64,
}

/// Prometheus metrics registry for entropy monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Context metrics
    requests_total: IntCounter,
    bytes_served_total: IntCounter,
    registry_full_total: IntCounter,
    no_source_total: IntCounter,
    too_large_total: IntCounter,
    conditioning_failures_total: IntCounter,
    source_failures_total: IntCounter,
    registered_sources: IntGauge,
    source_capacity: IntGauge,

    // CSPRNG metrics
    reseed_total: IntCounter,
    bytes_since_reseed: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let metric = IntCounter::new(name, help)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, MetricsError> {
    let metric = IntGauge::new(name, help)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

// Counters only move forward, by the difference to the last snapshot.
fn advance(metric: &IntCounter, total: u64) {
    let current = metric.get();
    if total > current {
        metric.inc_by(total - current);
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all entropy metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = counter(
            &registry,
            "entropy_requests_total",
            "Total number of entropy requests",
        )?;
        let bytes_served_total = counter(
            &registry,
            "entropy_bytes_served_total",
            "Total conditioned bytes returned to callers",
        )?;
        let registry_full_total = counter(
            &registry,
            "entropy_registry_full_total",
            "Source registrations rejected because the registry was full",
        )?;
        let no_source_total = counter(
            &registry,
            "entropy_no_source_total",
            "Requests rejected because no source was registered",
        )?;
        let too_large_total = counter(
            &registry,
            "entropy_request_too_large_total",
            "Requests rejected for exceeding one block",
        )?;
        let conditioning_failures_total = counter(
            &registry,
            "entropy_conditioning_failures_total",
            "Requests failed by the block cipher",
        )?;
        let source_failures_total = counter(
            &registry,
            "entropy_source_failures_total",
            "Requests failed by a noise source",
        )?;
        let registered_sources = gauge(
            &registry,
            "entropy_registered_sources",
            "Number of registered noise sources",
        )?;
        let source_capacity = gauge(
            &registry,
            "entropy_source_capacity",
            "Maximum number of noise sources",
        )?;

        let reseed_total = counter(
            &registry,
            "entropy_csprng_reseed_total",
            "Total number of CSPRNG (re)seeds performed",
        )?;
        let bytes_since_reseed = gauge(
            &registry,
            "entropy_csprng_bytes_since_reseed",
            "Bytes generated since last CSPRNG reseed",
        )?;

        Ok(Self {
            registry,
            requests_total,
            bytes_served_total,
            registry_full_total,
            no_source_total,
            too_large_total,
            conditioning_failures_total,
            source_failures_total,
            registered_sources,
            source_capacity,
            reseed_total,
            bytes_since_reseed,
        })
    }

    /// Updates all metrics from a snapshot of system state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        let stats = &snapshot.stats;
        advance(&self.requests_total, stats.requests);
        advance(&self.bytes_served_total, stats.bytes_served);
        advance(&self.registry_full_total, stats.registry_full);
        advance(&self.no_source_total, stats.no_source);
        advance(&self.too_large_total, stats.too_large);
        advance(&self.conditioning_failures_total, stats.conditioning_failures);
        advance(&self.source_failures_total, stats.source_failures);

        self.registered_sources.set(snapshot.registered_sources as i64);
        self.source_capacity.set(snapshot.capacity as i64);

        advance(&self.reseed_total, snapshot.reseed_count);
        self.bytes_since_reseed.set(snapshot.bytes_since_reseed as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from a context and, if one is running, the
    /// generator seeded from it.
    pub fn from_components<const N: usize>(
        ctx: &EntropyContext<N>,
        rng: Option<&ReseedableRng>,
    ) -> Self {
        Self {
            stats: ctx.stats().snapshot(),
            registered_sources: ctx.source_count(),
            capacity: N,
            reseed_count: rng.map_or(0, |r| r.reseed_count()),
            bytes_since_reseed: rng.map_or(0, |r| r.bytes_since_reseed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FixedSource;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            stats: StatsSnapshot {
                requests: 10,
                bytes_served: 128,
                no_source: 2,
                ..StatsSnapshot::default()
            },
            registered_sources: 2,
            capacity: 3,
            reseed_count: 2,
            bytes_since_reseed: 1024,
        };

        registry.update(&snapshot);
        // counters must not double on a repeated snapshot
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("entropy_requests_total 10"));
        assert!(output.contains("entropy_bytes_served_total 128"));
        assert!(output.contains("entropy_no_source_total 2"));
        assert!(output.contains("entropy_registered_sources 2"));
        assert!(output.contains("entropy_csprng_reseed_total 2"));
    }

    #[test]
    fn test_snapshot_from_context() {
        let mut ctx: EntropyContext = EntropyContext::new();
        ctx.source_add(FixedSource::repeat(9)).unwrap();

        let mut out = [0u8; 12];
        ctx.get(&mut out).unwrap();
        let rng = ReseedableRng::from_context(&ctx).unwrap();

        let snapshot = MetricsSnapshot::from_components(&ctx, Some(&rng));
        assert_eq!(snapshot.stats.requests, 3);
        assert_eq!(snapshot.stats.bytes_served, 12 + 32);
        assert_eq!(snapshot.registered_sources, 1);
        assert_eq!(snapshot.capacity, crate::MAX_NUM_SOURCES);
        assert_eq!(snapshot.reseed_count, 1);

        let without_rng = MetricsSnapshot::from_components(&ctx, None);
        assert_eq!(without_rng.reseed_count, 0);
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("entropy_requests_total"));
        assert!(output.contains("entropy_source_failures_total"));
        assert!(output.contains("entropy_csprng_reseed_total"));
    }
}
