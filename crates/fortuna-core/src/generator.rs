//! Keyed counter-mode output function.
//!
//! The generator encrypts a 128-bit counter under AES-256 to produce output
//! blocks, and replaces its own key with two freshly generated blocks after
//! every request. Key rotation makes already-emitted output unrecoverable
//! from a later compromise of the generator state.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// AES block size in bytes.
pub(crate) const BLOCK_LEN: usize = 16;

/// Generator key length in bytes (AES-256).
pub(crate) const KEY_LEN: usize = 32;

/// Hard cap on the output of a single request.
pub const MAX_RANDOM_DATA_BYTES: usize = 1_048_576;

/// Encrypt one 16-byte block with AES-256.
pub(crate) fn encrypt_block(block: [u8; BLOCK_LEN], key: &[u8; KEY_LEN]) -> [u8; BLOCK_LEN] {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let mut out = GenericArray::from(block);
    cipher.encrypt_block(&mut out);
    out.into()
}

/// Counter-mode generator state.
///
/// A zero counter means the generator has never been seeded and it refuses
/// to produce output. The concrete initial key bytes are irrelevant: nothing
/// is emitted before the first reseed has mixed seed material into the key.
pub(crate) struct Generator {
    key: [u8; KEY_LEN],
    counter: u128,
}

impl Generator {
    pub(crate) fn new() -> Self {
        Self {
            key: [0u8; KEY_LEN],
            counter: 0,
        }
    }

    pub(crate) fn is_seeded(&self) -> bool {
        self.counter != 0
    }

    #[cfg(test)]
    pub(crate) fn counter(&self) -> u128 {
        self.counter
    }

    /// Chain seed material into the key and advance the counter, which also
    /// transitions an unseeded generator into the seeded state.
    pub(crate) fn reseed(&mut self, seed: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(seed);
        self.install_key(hasher.finalize().into());
        self.counter = self.counter.wrapping_add(1);
    }

    fn install_key(&mut self, key: [u8; KEY_LEN]) {
        self.key.zeroize();
        self.key = key;
    }

    /// Produce `k` concatenated 16-byte blocks, or nothing while unseeded.
    ///
    /// Block j encrypts the 16 little-endian bytes of the current counter
    /// value; the counter advances once per block, wrapping at 2^128.
    fn generate_blocks(&mut self, k: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(k * BLOCK_LEN);
        if self.counter == 0 {
            return out;
        }
        let cipher = Aes256::new(GenericArray::from_slice(&self.key));
        for _ in 0..k {
            let mut block = GenericArray::from(self.counter.to_le_bytes());
            cipher.encrypt_block(&mut block);
            out.extend_from_slice(&block);
            self.counter = self.counter.wrapping_add(1);
        }
        out
    }

    /// Up to `n` pseudo-random bytes, followed by an unconditional key
    /// rotation. The rotation costs two blocks of counter advancement even
    /// when `n == 0`. Requests beyond [`MAX_RANDOM_DATA_BYTES`] are refused
    /// outright, without touching the key.
    pub(crate) fn pseudo_random_data(&mut self, n: usize) -> Vec<u8> {
        if n > MAX_RANDOM_DATA_BYTES {
            return Vec::new();
        }
        let mut out = self.generate_blocks(n.div_ceil(BLOCK_LEN));
        out.truncate(n);
        let fresh = self.generate_blocks(2);
        if fresh.len() == 2 * BLOCK_LEN {
            let mut key = [0u8; KEY_LEN];
            key.copy_from_slice(&fresh);
            self.install_key(key);
        }
        out
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // FIPS-197 appendix C.3: AES-256 single-block known answer.
    #[test]
    fn encrypt_block_known_answer() {
        let key: [u8; KEY_LEN] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b,
            0x1c, 0x1d, 0x1e, 0x1f,
        ];
        let plaintext: [u8; BLOCK_LEN] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        let expected: [u8; BLOCK_LEN] = [
            0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49,
            0x60, 0x89,
        ];
        assert_eq!(encrypt_block(plaintext, &key), expected);
    }

    #[test]
    fn unseeded_generator_emits_nothing() {
        let mut g = Generator::new();
        assert!(!g.is_seeded());
        assert!(g.pseudo_random_data(16).is_empty());
        assert_eq!(g.counter(), 0);
    }

    #[test]
    fn reseed_transitions_to_seeded() {
        let mut g = Generator::new();
        g.reseed(b"seed material");
        assert!(g.is_seeded());
        assert_eq!(g.counter(), 1);
    }

    #[test]
    fn output_length_and_counter_advance() {
        let mut g = Generator::new();
        g.reseed(b"seed");
        let before = g.counter();
        let out = g.pseudo_random_data(33);
        assert_eq!(out.len(), 33);
        // ceil(33/16) = 3 output blocks plus 2 key-rotation blocks.
        assert_eq!(g.counter(), before + 5);
    }

    #[test]
    fn zero_length_request_still_rotates_key() {
        let mut g = Generator::new();
        g.reseed(b"seed");
        let before = g.counter();
        let out = g.pseudo_random_data(0);
        assert!(out.is_empty());
        assert_eq!(g.counter(), before + 2);
    }

    #[test]
    fn oversized_request_refused_without_rotation() {
        let mut g = Generator::new();
        g.reseed(b"seed");
        let before = g.counter();
        assert!(g.pseudo_random_data(MAX_RANDOM_DATA_BYTES + 1).is_empty());
        assert_eq!(g.counter(), before);
    }

    #[test]
    fn consecutive_requests_differ() {
        let mut g = Generator::new();
        g.reseed(b"seed");
        let a = g.pseudo_random_data(64);
        let b = g.pseudo_random_data(64);
        assert_ne!(a, b);
    }

    #[test]
    fn first_block_matches_manual_construction() {
        // First output block after a reseed must be the encryption of the
        // little-endian counter value 1 under sha256(zero_key || seed).
        let seed = b"deterministic seed";
        let mut hasher = Sha256::new();
        hasher.update([0u8; KEY_LEN]);
        hasher.update(seed);
        let key: [u8; KEY_LEN] = hasher.finalize().into();
        let expected = encrypt_block(1u128.to_le_bytes(), &key);

        let mut g = Generator::new();
        g.reseed(seed);
        assert_eq!(g.pseudo_random_data(16), expected);
    }

    #[test]
    fn identical_seed_history_replays_identically() {
        let mut a = Generator::new();
        let mut b = Generator::new();
        for seed in [b"first".as_slice(), b"second", b"third"] {
            a.reseed(seed);
            b.reseed(seed);
        }
        assert_eq!(a.pseudo_random_data(100), b.pseudo_random_data(100));
    }
}
