//! # fortuna-core
//!
//! A Fortuna-style cryptographically secure pseudo-random number generator
//! served as a long-running service. Entropy is harvested from asynchronous
//! byte sources (a local character device and a remote TCP/TLS peer),
//! spread round-robin across 32 pools, and periodically mixed into an
//! AES-256 counter-mode generator whose key rotates after every output
//! request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fortuna_core::Fortuna;
//!
//! #[tokio::main]
//! async fn main() {
//!     let prng = Fortuna::new();
//!     prng.set_file_peer("/dev/urandom");
//!     prng.set_tcp_peer("192.0.2.17", false, 5000);
//!     prng.set_send_byte(0x00, Duration::from_millis(5000));
//!
//!     loop {
//!         let bytes = prng.random_data(250);
//!         if bytes.len() == 250 {
//!             println!("250 random bytes: {:02x?}", &bytes[..8]);
//!         } else {
//!             // Unseeded so far; pools are still filling.
//!         }
//!         tokio::time::sleep(Duration::from_millis(250)).await;
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! Sources → 32 pools → reseed schedule → counter-mode generator → output
//!
//! - Pool `i` contributes to reseed number `c` iff `c mod 2^i == 0`, so
//!   higher-indexed pools feed in exponentially more rarely and an attacker
//!   controlling some sources cannot keep uncontaminated entropy out
//!   forever.
//! - The generator refuses to emit anything until the first reseed; callers
//!   see an empty buffer and retry.
//! - Transient I/O failures (file open, connect, TLS) degrade to slower
//!   pool growth; they never surface through [`Fortuna::random_data`].

mod accumulator;
mod generator;
mod ingest;
mod prng;

pub use accumulator::{SourceKind, MIN_POOL_SIZE, POOLS, RESEED_THROTTLE};
pub use generator::MAX_RANDOM_DATA_BYTES;
pub use ingest::{TcpPeer, READ_CHUNK, RECONNECT_INTERVAL};
pub use prng::{Fortuna, PoolEvent};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
