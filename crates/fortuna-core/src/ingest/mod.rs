//! Asynchronous entropy ingestion.
//!
//! Three background tasks feed the accumulator: a file reader draining a
//! local character device, a connection supervisor keeping the remote TCP
//! or TLS peer alive, and a heartbeat writer emitting a periodic liveness
//! byte to that peer. Each successful read is one activation: the source's
//! round-robin cursor advances and the chunk lands in the selected pool.

use std::time::Duration;

mod file;
mod tcp;
mod tls;

pub(crate) use file::run_file_source;
pub(crate) use tcp::{run_heartbeat, run_tcp_supervisor};
pub use tcp::TcpPeer;

/// Bytes requested per source read.
pub const READ_CHUNK: usize = 32;

/// Interval of the reconnect tick while the peer is unconnected. Also
/// bounds each connect attempt.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(500);
