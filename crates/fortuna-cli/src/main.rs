//! CLI for fortuna, a Fortuna CSPRNG fed by local and remote entropy.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "fortuna")]
#[command(about = "fortuna: a Fortuna CSPRNG fed by local and remote entropy")]
#[command(version = fortuna_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write random bytes to stdout (pipe-friendly)
    Stream {
        #[command(flatten)]
        sources: SourceArgs,

        /// Total bytes (0 = infinite)
        #[arg(long, default_value = "0")]
        bytes: usize,

        /// Bytes requested per poll
        #[arg(long, default_value = "250")]
        chunk: usize,

        /// Output format
        #[arg(long, default_value = "raw", value_parser = ["raw", "hex"])]
        format: String,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "250")]
        poll_ms: u64,
    },

    /// Start an HTTP server answering bounded random-byte requests
    Serve {
        #[command(flatten)]
        sources: SourceArgs,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8042")]
        http_port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stream {
            sources,
            bytes,
            chunk,
            format,
            poll_ms,
        } => commands::stream::run(&sources, bytes, chunk, &format, poll_ms),
        Commands::Serve {
            sources,
            host,
            http_port,
        } => commands::serve::run(&sources, &host, http_port),
    }
}
