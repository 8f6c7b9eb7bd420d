//! Local file source, typically a character device yielding random bytes.

use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::READ_CHUNK;
use crate::accumulator::SourceKind;
use crate::prng::Inner;

/// Read 32-byte chunks from the device and deposit each successful read.
///
/// An open or read failure deactivates this source only; the TCP source and
/// the generator keep operating, so the failure shows up to callers as
/// nothing more than slower pool growth.
pub(crate) async fn run_file_source(inner: Arc<Inner>, path: String) {
    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(error) => {
            warn!(path = %path, %error, "file source unavailable");
            return;
        }
    };

    let mut buf = [0u8; READ_CHUNK];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => {
                debug!(path = %path, "file source exhausted");
                return;
            }
            Ok(n) => inner.deposit(SourceKind::File, &buf[..n]),
            Err(error) => {
                warn!(path = %path, %error, "file source read failed");
                return;
            }
        }
    }
}
