//! Fixed-capacity source registry.

use crate::error::EntropyError;
use crate::sources::NoiseSource;
use crate::MAX_NUM_SOURCES;
use std::sync::Arc;

/// Ordered collection of at most `N` noise sources.
///
/// Sources are mixed in registration order. The same source may be
/// registered more than once; each registration adds a mixing round.
pub struct SourceRegistry<const N: usize = MAX_NUM_SOURCES> {
    sources: Vec<Arc<dyn NoiseSource>>,
}

impl<const N: usize> SourceRegistry<N> {
    pub fn new() -> Self {
        Self {
            sources: Vec::with_capacity(N),
        }
    }

    /// Appends a source, failing once `N` sources are registered.
    pub fn add(&mut self, source: Arc<dyn NoiseSource>) -> Result<(), EntropyError> {
        if self.sources.len() >= N {
            return Err(EntropyError::RegistryFull { capacity: N });
        }
        self.sources.push(source);
        Ok(())
    }

    /// Removes every source.
    pub fn reset(&mut self) {
        self.sources.clear();
    }

    /// Registered sources in mixing order.
    pub fn sources(&self) -> &[Arc<dyn NoiseSource>] {
        &self.sources
    }

    /// Names of registered sources in mixing order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.sources.len() >= N
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SourceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for SourceRegistry<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("capacity", &N)
            .field("sources", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FixedSource;

    #[test]
    fn test_capacity_enforced() {
        let mut registry = SourceRegistry::<3>::new();

        for i in 0..3 {
            assert!(registry.add(Arc::new(FixedSource::repeat(i))).is_ok());
        }
        assert!(registry.is_full());

        assert_eq!(
            registry.add(Arc::new(FixedSource::repeat(9))),
            Err(EntropyError::RegistryFull { capacity: 3 })
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reset_empties() {
        let mut registry = SourceRegistry::<2>::new();
        registry.add(Arc::new(FixedSource::repeat(1))).unwrap();

        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.add(Arc::new(FixedSource::repeat(1))).is_ok());
    }

    #[test]
    fn test_duplicate_registration_allowed() {
        let mut registry = SourceRegistry::<3>::new();
        let source: Arc<dyn NoiseSource> = Arc::new(FixedSource::repeat(1));

        registry.add(Arc::clone(&source)).unwrap();
        registry.add(Arc::clone(&source)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["fixed", "fixed"]);
    }

    #[test]
    fn test_default_capacity() {
        let registry: SourceRegistry = SourceRegistry::new();
        assert_eq!(registry.capacity(), MAX_NUM_SOURCES);
    }
}
