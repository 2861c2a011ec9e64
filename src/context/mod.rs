//! The entropy context: registry plus conditioner.
//!
//! A context is an ordinary owned value. Registration needs `&mut self`,
//! so it cannot race with requests; `get` needs only `&self`, so a
//! context shared behind an `Arc` serves concurrent callers once its
//! sources are in place.

mod registry;
mod stats;

pub use registry::SourceRegistry;
pub use stats::{ContextStats, StatsSnapshot};

use crate::conditioning::{Block, EntropyConditioner, BLOCK_SIZE};
use crate::config::EntropyConfig;
use crate::error::EntropyError;
use crate::sources::{HwRngSource, NoiseSource, TimerJitterSource};
use crate::MAX_NUM_SOURCES;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Entropy accumulator holding up to `N` sources.
pub struct EntropyContext<const N: usize = MAX_NUM_SOURCES> {
    registry: SourceRegistry<N>,
    conditioner: EntropyConditioner,
    stats: ContextStats,
}

impl<const N: usize> EntropyContext<N> {
    /// Creates a context with no sources.
    pub fn new() -> Self {
        Self {
            registry: SourceRegistry::new(),
            conditioner: EntropyConditioner::new(),
            stats: ContextStats::default(),
        }
    }

    /// Registers the platform's default sources.
    ///
    /// Equivalent to [`init_with_config`](Self::init_with_config) with the
    /// default configuration.
    pub fn init(&mut self) -> Result<usize, EntropyError> {
        self.init_with_config(&EntropyConfig::default())
    }

    /// Registers the sources enabled in `config`: the hardware RNG first,
    /// then the timer jitter source.
    pub fn init_with_config(&mut self, config: &EntropyConfig) -> Result<usize, EntropyError> {
        let mut candidates: Vec<Arc<dyn NoiseSource>> = Vec::new();
        if config.sources.hwrng {
            candidates.push(Arc::new(HwRngSource::os()));
        }
        if config.sources.timer_jitter {
            candidates.push(Arc::new(TimerJitterSource::hosted(&config.timer_jitter)));
        }
        self.init_from(candidates)
    }

    /// Tries to register each candidate in order.
    ///
    /// A candidate that cannot be added is logged and skipped. Fails only
    /// if no source is registered afterwards; otherwise returns the number
    /// of registered sources.
    pub fn init_from<I>(&mut self, candidates: I) -> Result<usize, EntropyError>
    where
        I: IntoIterator<Item = Arc<dyn NoiseSource>>,
    {
        for source in candidates {
            let name = source.name().to_owned();
            if let Err(e) = self.source_add_shared(source) {
                tracing::warn!(source = %name, error = %e, "Could not add entropy source");
            }
        }

        if self.registry.is_empty() {
            tracing::warn!("No entropy source available");
            return Err(EntropyError::NoSource);
        }

        tracing::info!(
            count = self.registry.len(),
            sources = ?self.registry.names().collect::<Vec<_>>(),
            "Entropy sources initialized"
        );
        Ok(self.registry.len())
    }

    /// Registers a source.
    pub fn source_add<S: NoiseSource + 'static>(&mut self, source: S) -> Result<(), EntropyError> {
        self.source_add_shared(Arc::new(source))
    }

    /// Registers an already shared source.
    ///
    /// Registering the same `Arc` twice mixes it twice.
    pub fn source_add_shared(&mut self, source: Arc<dyn NoiseSource>) -> Result<(), EntropyError> {
        let name = source.name().to_owned();
        match self.registry.add(source) {
            Ok(()) => {
                tracing::debug!(source = %name, count = self.registry.len(), "Added entropy source");
                Ok(())
            }
            Err(e) => {
                self.stats.record_registry_full();
                Err(e)
            }
        }
    }

    /// Removes every registered source.
    pub fn reset(&mut self) {
        self.registry.reset();
        tracing::info!("Entropy context reset");
    }

    /// Fills `out` with conditioned entropy.
    ///
    /// `out` may be at most [`MAX_BYTES_REQUEST`](crate::MAX_BYTES_REQUEST)
    /// bytes long. Returns the number of bytes written.
    pub fn get(&self, out: &mut [u8]) -> Result<usize, EntropyError> {
        let result = self.conditioner.condition(self.registry.sources(), out);
        self.stats.record_get(&result);
        result
    }

    /// Returns one full conditioned block, wiped when dropped.
    pub fn get_block(&self) -> Result<Zeroizing<Block>, EntropyError> {
        let mut block = Zeroizing::new([0u8; BLOCK_SIZE]);
        self.get(block.as_mut_slice())?;
        Ok(block)
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.registry.len()
    }

    /// The source registry.
    pub fn registry(&self) -> &SourceRegistry<N> {
        &self.registry
    }

    /// Request counters.
    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }
}

impl<const N: usize> Default for EntropyContext<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for EntropyContext<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyContext")
            .field("registry", &self.registry)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
