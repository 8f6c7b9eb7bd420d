use std::io::Write;
use std::time::Duration;

use fortuna_core::Fortuna;

use super::SourceArgs;

pub fn run(sources: &SourceArgs, n_bytes: usize, chunk: usize, format: &str, poll_ms: u64) {
    let chunk = if chunk > 0 { chunk } else { 250 };
    let poll = Duration::from_millis(poll_ms.max(1));

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let prng = Fortuna::new();
        super::attach_sources(&prng, sources);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let mut total = 0usize;

        loop {
            if n_bytes > 0 && total >= n_bytes {
                break;
            }
            let want = if n_bytes == 0 {
                chunk
            } else {
                chunk.min(n_bytes - total)
            };

            let data = prng.random_data(want);
            if data.is_empty() {
                // Not enough randomness yet; let the pools keep filling.
                tokio::time::sleep(poll).await;
                continue;
            }

            let write_result = match format {
                "hex" => {
                    let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
                    out.write_all(hex.as_bytes())
                }
                _ => out.write_all(&data),
            };

            if write_result.is_err() {
                break; // Broken pipe
            }
            let _ = out.flush();

            total += data.len();
            tokio::time::sleep(poll).await;
        }

        prng.shutdown();
    });
}
