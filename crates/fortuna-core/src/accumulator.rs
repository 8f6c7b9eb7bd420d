//! Entropy pool bank and reseed scheduler.
//!
//! Incoming source bytes are spread round-robin across 32 pools. Pool 0
//! contributes to every reseed, pool 1 to every 2nd, pool 2 to every 4th,
//! and so on: an adversary controlling some sources cannot force a reseed
//! built only from their bytes without the slower pools eventually mixing
//! in uncontaminated entropy.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::generator::Generator;

/// Number of entropy pools.
pub const POOLS: usize = 32;

/// Threshold on pool 0 that permits a reseed.
pub const MIN_POOL_SIZE: usize = 64;

/// Maximum interval between forced reseeds once seeded. Reseeding happens
/// on demand, or at least every 100 ms of elapsed wall time between
/// `random_data` calls.
pub const RESEED_THROTTLE: Duration = Duration::from_millis(100);

/// Entropy source identifier. Doubles as the deposit tag and the index of
/// the per-source round-robin cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Local character device (hardware RNG file).
    File = 0,
    /// Remote byte-producing TCP/TLS peer.
    Tcp = 1,
}

impl SourceKind {
    pub(crate) fn id(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

pub(crate) const SOURCES: usize = 2;

/// Pool bank plus reseed bookkeeping. One instance sits behind the service
/// mutex; every method runs to completion under it.
pub(crate) struct Accumulator {
    generator: Generator,
    pools: Vec<Vec<u8>>,
    reseed_count: u128,
    last_reseed: Option<Instant>,
    cursors: [usize; SOURCES],
}

impl Accumulator {
    pub(crate) fn new() -> Self {
        Self {
            generator: Generator::new(),
            pools: vec![Vec::new(); POOLS],
            reseed_count: 0,
            last_reseed: None,
            cursors: [0; SOURCES],
        }
    }

    /// Append one source chunk to the next pool in that source's rotation.
    /// Returns the index of the pool that received the deposit.
    ///
    /// The deposit is framed as `ascii(source_id) || ascii(len) || bytes`,
    /// which domain-separates contributions across sources and exposes the
    /// chunk length inside the pool.
    pub(crate) fn deposit(&mut self, source: SourceKind, chunk: &[u8]) -> usize {
        let cursor = &mut self.cursors[source.id()];
        *cursor = (*cursor + 1) % POOLS;
        let index = *cursor;

        let pool = &mut self.pools[index];
        pool.extend_from_slice(source.id().to_string().as_bytes());
        pool.extend_from_slice(chunk.len().to_string().as_bytes());
        pool.extend_from_slice(chunk);
        index
    }

    /// Reseed gate. Pool 0 reaching its size threshold is authoritative for
    /// the first seed; once seeded, the throttle clause forces a reseed when
    /// enough wall time has passed regardless of pool levels.
    fn should_reseed(&self) -> bool {
        if self.pools[0].len() >= MIN_POOL_SIZE {
            return true;
        }
        match self.last_reseed {
            Some(at) => at.elapsed() > RESEED_THROTTLE,
            None => false,
        }
    }

    /// The public output path: decide whether to reseed, then hand the
    /// request to the generator. Returns empty while the generator has
    /// never been seeded.
    pub(crate) fn random_data(&mut self, n: usize) -> Vec<u8> {
        if self.should_reseed() {
            self.reseed_count += 1;
            let mut seed = Vec::new();
            for i in 0..POOLS {
                if self.reseed_count % (1u128 << i) == 0 {
                    seed.extend_from_slice(&Sha256::digest(&self.pools[i]));
                    self.pools[i].zeroize();
                }
            }
            self.generator.reseed(&seed);
            seed.zeroize();
            self.last_reseed = Some(Instant::now());
        }

        if self.reseed_count == 0 {
            return Vec::new();
        }
        self.generator.pseudo_random_data(n)
    }

    pub(crate) fn is_seeded(&self) -> bool {
        self.generator.is_seeded()
    }

    pub(crate) fn reseed_count(&self) -> u128 {
        self.reseed_count
    }

    pub(crate) fn pool_sizes(&self) -> Vec<usize> {
        self.pools.iter().map(Vec::len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Accumulator {
        let mut acc = Accumulator::new();
        acc.pools[0].extend_from_slice(&[0x01; MIN_POOL_SIZE]);
        let out = acc.random_data(16);
        assert_eq!(out.len(), 16);
        acc
    }

    // -----------------------------------------------------------------------
    // Reseed policy
    // -----------------------------------------------------------------------

    #[test]
    fn unseeded_read_returns_empty() {
        let mut acc = Accumulator::new();
        for n in [0, 1, 16, 1024] {
            assert!(acc.random_data(n).is_empty());
        }
        assert_eq!(acc.reseed_count(), 0);
        assert!(!acc.is_seeded());
    }

    #[test]
    fn first_seed_via_pool_zero() {
        let mut acc = Accumulator::new();
        acc.pools[0].extend_from_slice(&[0x01; MIN_POOL_SIZE]);

        let out = acc.random_data(16);
        assert_eq!(out.len(), 16);
        assert_eq!(acc.reseed_count(), 1);
        assert!(acc.pools[0].is_empty());
        // Reseed advanced the counter to 1, then 1 output block and 2 key
        // rotation blocks followed.
        assert_eq!(acc.generator.counter(), 4);
    }

    #[test]
    fn underfull_pool_zero_does_not_seed() {
        let mut acc = Accumulator::new();
        acc.pools[0].extend_from_slice(&[0x01; MIN_POOL_SIZE - 1]);
        assert!(acc.random_data(16).is_empty());
        assert_eq!(acc.reseed_count(), 0);
    }

    #[test]
    fn throttle_forces_reseed_once_seeded() {
        let mut acc = seeded();
        assert_eq!(acc.reseed_count(), 1);

        // Immediately afterwards no reseed is due, but output still flows.
        let out = acc.random_data(8);
        assert_eq!(out.len(), 8);
        assert_eq!(acc.reseed_count(), 1);

        // Once the throttle interval has elapsed, the next call reseeds even
        // with every pool underfull.
        acc.last_reseed = Some(Instant::now() - Duration::from_millis(150));
        let out = acc.random_data(8);
        assert_eq!(out.len(), 8);
        assert_eq!(acc.reseed_count(), 2);
    }

    #[test]
    fn exponential_pool_schedule() {
        let mut acc = Accumulator::new();
        acc.pools[2].extend_from_slice(b"marker-two");
        acc.pools[3].extend_from_slice(b"marker-three");

        for round in 1..=8u128 {
            acc.pools[0].extend_from_slice(&[round as u8; MIN_POOL_SIZE]);
            let out = acc.random_data(4);
            assert_eq!(out.len(), 4);
            assert_eq!(acc.reseed_count(), round);
            assert!(acc.pools[0].is_empty());

            match round {
                1..=3 => {
                    assert!(!acc.pools[2].is_empty());
                    assert!(!acc.pools[3].is_empty());
                }
                4 => {
                    // 4 mod 4 == 0 consumes pool 2; 4 mod 8 != 0 spares pool 3.
                    assert!(acc.pools[2].is_empty());
                    assert!(!acc.pools[3].is_empty());
                    acc.pools[2].extend_from_slice(b"marker-two-again");
                }
                5..=7 => {
                    assert!(!acc.pools[2].is_empty());
                    assert!(!acc.pools[3].is_empty());
                }
                8 => {
                    assert!(acc.pools[2].is_empty());
                    assert!(acc.pools[3].is_empty());
                }
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn zero_length_request_succeeds_after_seeding() {
        let mut acc = seeded();
        let before = acc.generator.counter();
        let out = acc.random_data(0);
        assert!(out.is_empty());
        // Key rotation still advanced the counter by two blocks.
        assert_eq!(acc.generator.counter(), before + 2);
    }

    #[test]
    fn oversized_request_returns_empty() {
        let mut acc = seeded();
        let before = acc.generator.counter();
        assert!(acc
            .random_data(crate::generator::MAX_RANDOM_DATA_BYTES + 1)
            .is_empty());
        assert_eq!(acc.generator.counter(), before);
    }

    #[test]
    fn consecutive_outputs_differ() {
        let mut acc = seeded();
        let a = acc.random_data(32);
        let b = acc.random_data(32);
        assert_eq!(a.len(), 32);
        assert_eq!(b.len(), 32);
        assert_ne!(a, b);
    }

    // -----------------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------------

    #[test]
    fn deposits_rotate_round_robin() {
        let mut acc = Accumulator::new();
        // Cursor starts at 0 and advances before each deposit.
        assert_eq!(acc.deposit(SourceKind::File, &[0xAA; 32]), 1);
        assert_eq!(acc.deposit(SourceKind::File, &[0xBB; 32]), 2);
        assert_eq!(acc.deposit(SourceKind::File, &[0xCC; 32]), 3);
    }

    #[test]
    fn cursors_are_independent_per_source() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.deposit(SourceKind::File, &[0xAA; 8]), 1);
        assert_eq!(acc.deposit(SourceKind::File, &[0xAB; 8]), 2);
        // The TCP cursor has not moved yet.
        assert_eq!(acc.deposit(SourceKind::Tcp, &[0xBA; 8]), 1);
    }

    #[test]
    fn cursor_wraps_after_full_rotation() {
        let mut acc = Accumulator::new();
        let mut last = 0;
        for _ in 0..POOLS {
            last = acc.deposit(SourceKind::Tcp, &[0x42; 4]);
        }
        assert_eq!(last, 0);
        assert_eq!(acc.deposit(SourceKind::Tcp, &[0x42; 4]), 1);
    }

    #[test]
    fn deposit_framing_tags_source_and_length() {
        let mut acc = Accumulator::new();
        acc.deposit(SourceKind::File, &[0xEE; 32]);
        let mut expected = b"032".to_vec();
        expected.extend_from_slice(&[0xEE; 32]);
        assert_eq!(acc.pools[1], expected);

        let mut acc = Accumulator::new();
        acc.deposit(SourceKind::Tcp, b"abc");
        let mut expected = b"13".to_vec();
        expected.extend_from_slice(b"abc");
        assert_eq!(acc.pools[1], expected);
    }

    #[test]
    fn pool_sizes_reflect_deposits() {
        let mut acc = Accumulator::new();
        acc.deposit(SourceKind::File, &[0x11; 32]);
        let sizes = acc.pool_sizes();
        assert_eq!(sizes.len(), POOLS);
        // "0" + "32" + 32 payload bytes.
        assert_eq!(sizes[1], 35);
        assert!(sizes.iter().enumerate().all(|(i, &s)| i == 1 || s == 0));
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn identical_histories_replay_identically() {
        let drive = |acc: &mut Accumulator| {
            for i in 0..64u8 {
                acc.deposit(SourceKind::File, &[i; 32]);
            }
            let first = acc.random_data(64);
            let second = acc.random_data(64);
            (first, second)
        };

        let mut a = Accumulator::new();
        let mut b = Accumulator::new();
        let (a1, a2) = drive(&mut a);
        let (b1, b2) = drive(&mut b);
        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
        assert!(!a1.is_empty());
    }
}
