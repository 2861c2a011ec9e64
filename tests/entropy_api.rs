//! Integration tests for entropy-accumulator.
//!
//! These tests drive the public surface end to end:
//! registration → conditioned requests → seeding.

use entropy_accumulator::config::{EntropyConfig, SourcesConfig};
use entropy_accumulator::sources::{FailingSource, FixedSource, SourceError};
use entropy_accumulator::{
    status_code, EntropyContext, EntropyError, ReseedableRng, MAX_BYTES_REQUEST, MAX_NUM_SOURCES,
};
use proptest::prelude::*;
use rand_core::RngCore;

const SOURCE_A: [u8; 16] = [
    0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x10,
];
const SOURCE_B: [u8; 16] = [
    0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x10, 0x21, 0x32, 0x43, 0x54, 0x65, 0x76, 0x87, 0x98, 0xa9,
];
const EXPECTED: [u8; 16] = [
    0x5a, 0xdc, 0x36, 0x7f, 0x2a, 0xbe, 0x33, 0x10, 0x21, 0xd6, 0x7f, 0x14, 0x0c, 0xea, 0x04, 0x75,
];

fn two_source_context(a: [u8; 16], b: [u8; 16]) -> EntropyContext {
    let mut ctx = EntropyContext::new();
    ctx.source_add(FixedSource::new(a)).unwrap();
    ctx.source_add(FixedSource::new(b)).unwrap();
    ctx
}

#[test]
fn known_two_source_vector() {
    let ctx = two_source_context(SOURCE_A, SOURCE_B);
    let mut out = [0u8; 16];

    assert_eq!(ctx.get(&mut out), Ok(16));
    assert_eq!(out, EXPECTED);
}

#[test]
fn closure_sources_are_accepted() {
    let mut ctx: EntropyContext = EntropyContext::new();
    ctx.source_add(|buf: &mut [u8]| {
        buf.copy_from_slice(&SOURCE_A);
        Ok::<usize, SourceError>(buf.len())
    })
    .unwrap();
    ctx.source_add(|buf: &mut [u8]| {
        buf.copy_from_slice(&SOURCE_B);
        Ok::<usize, SourceError>(buf.len())
    })
    .unwrap();

    let mut out = [0u8; 4];
    assert_eq!(ctx.get(&mut out), Ok(4));
    assert_eq!(out, EXPECTED[..4]);
}

#[test]
fn status_codes_match_outcomes() {
    let mut ctx: EntropyContext = EntropyContext::new();
    let mut out = [0u8; 8];

    assert_eq!(status_code(&ctx.get(&mut out)), EntropyError::NO_SRC);

    for i in 0..MAX_NUM_SOURCES {
        ctx.source_add(FixedSource::repeat(i as u8)).unwrap();
    }
    let full = ctx.source_add(FixedSource::repeat(0));
    assert_eq!(full.unwrap_err().code(), EntropyError::MAX_SRC);

    assert_eq!(status_code(&ctx.get(&mut out)), 8);

    let mut big = [0u8; MAX_BYTES_REQUEST + 1];
    assert_eq!(status_code(&ctx.get(&mut big)), EntropyError::ERR);
}

#[test]
fn failing_source_fails_closed() {
    let mut ctx: EntropyContext = EntropyContext::new();
    ctx.source_add(FixedSource::repeat(1)).unwrap();
    ctx.source_add(FailingSource::default()).unwrap();

    let mut out = [0xAAu8; 16];
    let err = ctx.get(&mut out).unwrap_err();

    assert_eq!(err.code(), EntropyError::ERR);
    assert_eq!(out, [0xAAu8; 16]);
}

#[test]
fn timer_jitter_only_context_produces_output() {
    let config = EntropyConfig {
        sources: SourcesConfig {
            hwrng: false,
            timer_jitter: true,
        },
        ..EntropyConfig::default()
    };
    let mut ctx: EntropyContext = EntropyContext::new();
    assert_eq!(ctx.init_with_config(&config), Ok(1));

    let mut out = [0u8; 16];
    assert_eq!(ctx.get(&mut out), Ok(16));
}

#[test]
fn seeded_generator_from_fixed_sources_is_reproducible() {
    let mut rng1 = ReseedableRng::from_context(&two_source_context(SOURCE_A, SOURCE_B)).unwrap();
    let mut rng2 = ReseedableRng::from_context(&two_source_context(SOURCE_A, SOURCE_B)).unwrap();

    assert_eq!(rng1.next_u64(), rng2.next_u64());
}

proptest! {
    #[test]
    fn output_is_deterministic_prefix(
        a in any::<[u8; 16]>(),
        b in any::<[u8; 16]>(),
        len in 0usize..=MAX_BYTES_REQUEST,
    ) {
        let ctx1 = two_source_context(a, b);
        let ctx2 = two_source_context(a, b);

        let mut full = [0u8; 16];
        prop_assert_eq!(ctx1.get(&mut full), Ok(16));

        let mut partial = vec![0u8; len];
        prop_assert_eq!(ctx2.get(&mut partial), Ok(len));
        prop_assert_eq!(&partial[..], &full[..len]);
    }

    #[test]
    fn oversized_requests_leave_buffer_untouched(
        len in (MAX_BYTES_REQUEST + 1)..256usize,
        fill in any::<u8>(),
    ) {
        let ctx = two_source_context(SOURCE_A, SOURCE_B);
        let mut out = vec![fill; len];

        let is_too_large = matches!(
            ctx.get(&mut out),
            Err(EntropyError::RequestTooLarge { .. })
        );
        prop_assert!(is_too_large);
        prop_assert!(out.iter().all(|&x| x == fill));
    }
}
