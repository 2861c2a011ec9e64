//! Cascaded XOR-then-encrypt conditioning.
//!
//! ```text
//! acc = 0
//! for each source s, in registration order:
//!     acc = E_k(acc ^ s.sample(16))
//! out = acc[..len]
//! ```
//!
//! Each source gets a full whitening round over everything accumulated so
//! far, so a badly biased source cannot simply copy its bias into the
//! output. Nothing is carried between calls: every request re-samples
//! every source.

use super::cipher::{Aes128Mixer, MixingCipher, BLOCK_SIZE};
use super::state::{ConditioningState, WipeGuard};
use crate::error::EntropyError;
use crate::sources::{NoiseSource, SourceError};
use crate::MAX_BYTES_REQUEST;
use std::marker::PhantomData;
use std::sync::Arc;

/// Stateless entropy conditioner.
pub struct EntropyConditioner<C = Aes128Mixer> {
    _cipher: PhantomData<fn() -> C>,
}

impl<C: MixingCipher> EntropyConditioner<C> {
    pub fn new() -> Self {
        Self {
            _cipher: PhantomData,
        }
    }

    /// Mixes one block from every source and writes `out.len()` bytes of it.
    ///
    /// Fails without touching `out` if the request exceeds one block, if
    /// `sources` is empty, or if any source or the cipher fails.
    pub fn condition(
        &self,
        sources: &[Arc<dyn NoiseSource>],
        out: &mut [u8],
    ) -> Result<usize, EntropyError> {
        let mut state = ConditioningState::new();
        self.condition_with(&mut state, sources, out)
    }

    /// Same as [`condition`](Self::condition) but runs in caller-provided
    /// scratch memory, which is wiped before returning.
    pub(crate) fn condition_with(
        &self,
        state: &mut ConditioningState,
        sources: &[Arc<dyn NoiseSource>],
        out: &mut [u8],
    ) -> Result<usize, EntropyError> {
        let len = out.len();
        if len > MAX_BYTES_REQUEST {
            tracing::debug!(requested = len, max = MAX_BYTES_REQUEST, "Requested too many bytes");
            return Err(EntropyError::RequestTooLarge {
                requested: len,
                max: MAX_BYTES_REQUEST,
            });
        }
        if sources.is_empty() {
            tracing::debug!("No entropy source registered");
            return Err(EntropyError::NoSource);
        }

        let mut state = WipeGuard::new(state);
        state.accumulator = [0u8; BLOCK_SIZE];

        let cipher = C::new(&state.key).map_err(|e| {
            tracing::warn!(error = %e, "Failed to initialize mixing cipher");
            e
        })?;

        for (index, source) in sources.iter().enumerate() {
            let scratch = &mut *state;

            let written = source
                .sample(&mut scratch.raw)
                .map_err(|e| source_failed(index, &**source, e))?;
            if written < BLOCK_SIZE {
                return Err(source_failed(
                    index,
                    &**source,
                    SourceError::ShortRead {
                        written,
                        requested: BLOCK_SIZE,
                    },
                ));
            }

            for (acc, raw) in scratch.accumulator.iter_mut().zip(scratch.raw.iter()) {
                *acc ^= *raw;
            }
            cipher.encrypt_block(&mut scratch.accumulator).map_err(|e| {
                tracing::warn!(error = %e, "Failed to encrypt accumulator");
                e
            })?;

            tracing::trace!(index, source = source.name(), "Mixed source into accumulator");
        }

        out.copy_from_slice(&state.accumulator[..len]);

        tracing::trace!(bytes = len, sources = sources.len(), "Conditioned entropy");
        Ok(len)
    }
}

fn source_failed(index: usize, source: &dyn NoiseSource, error: SourceError) -> EntropyError {
    tracing::warn!(index, source = source.name(), error = %error, "Entropy source failed");
    EntropyError::SourceFailed {
        index,
        name: source.name().to_owned(),
        source: error,
    }
}

impl<C: MixingCipher> Default for EntropyConditioner<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for EntropyConditioner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyConditioner")
            .field("cipher", &std::any::type_name::<C>())
            .finish()
    }
}
