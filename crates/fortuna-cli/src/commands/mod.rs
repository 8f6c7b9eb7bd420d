pub mod serve;
pub mod stream;

use std::time::Duration;

use clap::Args;

use fortuna_core::Fortuna;

/// Entropy source flags shared by every subcommand.
#[derive(Args)]
pub struct SourceArgs {
    /// Path to a local character device to harvest (e.g. /dev/hwrng)
    #[arg(long)]
    pub device: Option<String>,

    /// Address of a remote byte-producing peer
    #[arg(long)]
    pub peer: Option<String>,

    /// Port of the remote peer
    #[arg(long, default_value = "5000")]
    pub port: u16,

    /// Wrap the peer connection in TLS (certificate errors are ignored)
    #[arg(long)]
    pub tls: bool,

    /// Heartbeat byte written to the peer while connected
    #[arg(long)]
    pub send_byte: Option<u8>,

    /// Heartbeat interval in milliseconds (0 disables the heartbeat)
    #[arg(long, default_value = "0")]
    pub send_interval_ms: u64,
}

/// Wire the configured sources into a PRNG instance.
pub fn attach_sources(prng: &Fortuna, args: &SourceArgs) {
    if args.device.is_none() && args.peer.is_none() {
        eprintln!("Warning: no entropy sources configured; the generator will never seed");
    }

    if let Some(device) = &args.device {
        prng.set_file_peer(device);
    }
    if let Some(peer) = &args.peer {
        prng.set_tcp_peer(peer, args.tls, args.port);
    }
    if let Some(byte) = args.send_byte {
        prng.set_send_byte(byte, Duration::from_millis(args.send_interval_ms));
    }
}
