//! Thread-safe PRNG service handle.
//!
//! [`Fortuna`] owns the accumulator state behind a single mutex and the
//! background ingestion tasks (file reader, connection supervisor,
//! heartbeat writer) that feed it. Every state-mutating operation (pool
//! deposit, reseed, key rotation) is mutually exclusive with every other;
//! the critical sections are short (a hash, a handful of cipher calls) and
//! contention stays low because callers pull output on demand.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::accumulator::{Accumulator, SourceKind};
use crate::ingest::{self, TcpPeer};

/// Capacity of the deposit event channel. Slow subscribers lag rather than
/// block ingestion.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observability event, emitted once per successful pool deposit.
#[derive(Debug, Clone, Copy)]
pub struct PoolEvent {
    /// Index of the pool that received the deposit.
    pub pool: usize,
    /// Source that produced the bytes.
    pub source: SourceKind,
}

/// Write half of the live peer connection. Occupied iff the peer socket is
/// in the connected state; the heartbeat writer keys off its presence.
pub(crate) type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State shared between the handle and its ingestion tasks.
pub(crate) struct Inner {
    state: Mutex<Accumulator>,
    pub(crate) writer: tokio::sync::Mutex<Option<PeerWriter>>,
    events: broadcast::Sender<PoolEvent>,
}

impl Inner {
    /// Route one read chunk into the pool bank and notify subscribers.
    pub(crate) fn deposit(&self, source: SourceKind, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        let pool = self.state.lock().unwrap().deposit(source, chunk);
        let _ = self.events.send(PoolEvent { pool, source });
    }
}

#[derive(Default)]
struct Tasks {
    file: Option<JoinHandle<()>>,
    tcp: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
}

/// A Fortuna CSPRNG service instance.
///
/// Created unseeded: [`random_data`](Self::random_data) returns empty until
/// the configured sources have filled pool 0 far enough for the first
/// reseed. Callers distinguish "no randomness yet" from "bad state" by
/// retrying with backoff; once constructed the service has no fatal errors.
///
/// Must be created inside a Tokio runtime: the constructor captures the
/// runtime handle so the peer setters can spawn ingestion tasks from any
/// thread afterwards.
pub struct Fortuna {
    inner: Arc<Inner>,
    tasks: Mutex<Tasks>,
    runtime: Handle,
}

impl Fortuna {
    /// Construct an unseeded instance with no sources attached.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Accumulator::new()),
                writer: tokio::sync::Mutex::new(None),
                events,
            }),
            tasks: Mutex::new(Tasks::default()),
            runtime: Handle::current(),
        }
    }

    /// Return `n` random bytes, or empty while the generator is unseeded or
    /// when `n` exceeds [`MAX_RANDOM_DATA_BYTES`](crate::MAX_RANDOM_DATA_BYTES).
    ///
    /// Non-blocking: never awaits I/O, returns synchronously.
    pub fn random_data(&self, n: usize) -> Vec<u8> {
        self.inner.state.lock().unwrap().random_data(n)
    }

    /// Attach (or replace) the local file source. An empty or
    /// whitespace-only path is a no-op. Open failures deactivate the file
    /// source only; they are logged, never surfaced here.
    pub fn set_file_peer(&self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }
        let task = self
            .runtime
            .spawn(ingest::run_file_source(self.inner.clone(), path.to_owned()));
        if let Some(old) = self.tasks.lock().unwrap().file.replace(task) {
            old.abort();
        }
    }

    /// Attach (or replace) the remote byte-producing peer. An empty address
    /// is a no-op. Aborts any current connection and starts the 500 ms
    /// reconnect loop; with `tls`, certificate verification failures are
    /// swallowed, since the peer is an entropy source rather than an
    /// authenticated channel.
    pub fn set_tcp_peer(&self, address: &str, tls: bool, port: u16) {
        let address = address.trim();
        if address.is_empty() {
            return;
        }
        let peer = TcpPeer {
            address: address.to_owned(),
            port,
            tls,
        };
        let task = self
            .runtime
            .spawn(ingest::run_tcp_supervisor(self.inner.clone(), peer));
        if let Some(old) = self.tasks.lock().unwrap().tcp.replace(task) {
            old.abort();
        }
    }

    /// Enable (or reset) the heartbeat: every `interval`, write `byte` to
    /// the peer while connected. Some devices require periodic data. A zero
    /// interval is a no-op.
    pub fn set_send_byte(&self, byte: u8, interval: Duration) {
        if interval.is_zero() {
            return;
        }
        let task = self
            .runtime
            .spawn(ingest::run_heartbeat(self.inner.clone(), byte, interval));
        if let Some(old) = self.tasks.lock().unwrap().heartbeat.replace(task) {
            old.abort();
        }
    }

    /// Subscribe to deposit events.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }

    /// Whether the first reseed has happened yet.
    pub fn is_seeded(&self) -> bool {
        self.inner.state.lock().unwrap().is_seeded()
    }

    /// Number of reseeds performed so far.
    pub fn reseed_count(&self) -> u128 {
        self.inner.state.lock().unwrap().reseed_count()
    }

    /// Current fill level of each pool in bytes.
    pub fn pool_sizes(&self) -> Vec<usize> {
        self.inner.state.lock().unwrap().pool_sizes()
    }

    /// Stop all background activity: heartbeat first, then the peer
    /// connection, then the file source. The accumulator state itself is
    /// released when the handle drops.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for task in [
            tasks.heartbeat.take(),
            tasks.tcp.take(),
            tasks.file.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

impl Default for Fortuna {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Fortuna {
    fn drop(&mut self) {
        self.shutdown();
    }
}
