//! Remote peer supervision: reconnect loop, read drain, heartbeat.
//!
//! The peer socket moves through `Unconnected -> Connecting -> Connected`.
//! While unconnected, a 500 ms tick drives connect attempts (and bounds
//! each attempt); while connected the tick is quiescent and the read loop
//! drains incoming bytes into the accumulator. Any disconnect (clean,
//! errored, or mid-connect) puts the supervisor back on the tick.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::{tls, READ_CHUNK, RECONNECT_INTERVAL};
use crate::accumulator::SourceKind;
use crate::prng::Inner;

/// Remote byte-producing peer configuration.
#[derive(Debug, Clone)]
pub struct TcpPeer {
    /// Host name or IP address.
    pub address: String,
    /// TCP port.
    pub port: u16,
    /// Wrap the connection in TLS after connecting.
    pub tls: bool,
}

trait PeerIo: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> PeerIo for T {}

type PeerStream = Box<dyn PeerIo>;

/// Keep the peer connection alive for the lifetime of the task.
///
/// On connect, the write half is parked in the shared writer slot (which is
/// what the heartbeat writer keys off) and the read loop runs until the
/// peer goes away; the slot is vacated before the next attempt.
pub(crate) async fn run_tcp_supervisor(inner: Arc<Inner>, peer: TcpPeer) {
    // A replaced supervisor may have left its write half behind.
    inner.writer.lock().await.take();

    let mut tick = time::interval(RECONNECT_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let stream = match time::timeout(RECONNECT_INTERVAL, connect(&peer)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(error)) => {
                debug!(address = %peer.address, port = peer.port, %error, "connect attempt failed");
                continue;
            }
            Err(_) => {
                debug!(address = %peer.address, port = peer.port, "connect attempt timed out");
                continue;
            }
        };

        info!(address = %peer.address, port = peer.port, tls = peer.tls, "peer connected");
        let (read_half, write_half) = tokio::io::split(stream);
        *inner.writer.lock().await = Some(Box::new(write_half));

        match read_loop(&inner, read_half).await {
            Ok(()) => info!(address = %peer.address, port = peer.port, "peer disconnected"),
            Err(error) => {
                debug!(address = %peer.address, port = peer.port, %error, "peer read failed")
            }
        }

        inner.writer.lock().await.take();
        tick.reset();
    }
}

async fn connect(peer: &TcpPeer) -> io::Result<PeerStream> {
    let stream = TcpStream::connect((peer.address.as_str(), peer.port)).await?;
    if peer.tls {
        Ok(Box::new(tls::connect(stream, &peer.address).await?))
    } else {
        Ok(Box::new(stream))
    }
}

/// Drain the peer in 32-byte reads, one deposit per read, until it
/// disconnects.
async fn read_loop(inner: &Inner, mut read_half: ReadHalf<PeerStream>) -> io::Result<()> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match read_half.read(&mut buf).await? {
            0 => return Ok(()),
            n => inner.deposit(SourceKind::Tcp, &buf[..n]),
        }
    }
}

/// Write the configured liveness byte on every tick, iff the peer is
/// currently connected. Silent no-op otherwise.
pub(crate) async fn run_heartbeat(inner: Arc<Inner>, byte: u8, period: Duration) {
    let mut tick = time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let mut writer = inner.writer.lock().await;
        if let Some(peer) = writer.as_mut() {
            match peer.write_all(&[byte]).await {
                Ok(()) => {
                    let _ = peer.flush().await;
                }
                // The read loop observes the broken connection and vacates
                // the writer slot.
                Err(error) => debug!(%error, "heartbeat write failed"),
            }
        }
    }
}
