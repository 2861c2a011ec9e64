//! Prometheus metrics exporter for entropy monitoring.
//!
//! # Metrics Exposed
//!
//! ## Context Metrics
//! - `entropy_requests_total` - Total entropy requests
//! - `entropy_bytes_served_total` - Conditioned bytes returned
//! - `entropy_registry_full_total` - Rejected registrations
//! - `entropy_no_source_total` - Requests with no registered source
//! - `entropy_request_too_large_total` - Requests over one block
//! - `entropy_conditioning_failures_total` - Block cipher failures
//! - `entropy_source_failures_total` - Requests aborted by a source
//! - `entropy_registered_sources` - Registered sources
//! - `entropy_source_capacity` - Source capacity
//!
//! ## CSPRNG Metrics
//! - `entropy_csprng_reseed_total` - Total (re)seeds performed
//! - `entropy_csprng_bytes_since_reseed` - Bytes generated since last reseed
//!
//! With the `metrics` feature, [`MetricsServer`] serves them over HTTP on
//! `/metrics`, next to a `/health` endpoint.
//!
//! # Example
//!
//! ```no_run
//! use entropy_accumulator::EntropyContext;
//! use entropy_accumulator::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let ctx: EntropyContext = EntropyContext::new();
//!
//! registry.update(&MetricsSnapshot::from_components(&ctx, None));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
