//! Minimal end-to-end usage: feed the PRNG from /dev/urandom and print a
//! little output once it has seeded itself.

use std::time::Duration;

use fortuna_core::Fortuna;

#[tokio::main]
async fn main() {
    let prng = Fortuna::new();
    prng.set_file_peer("/dev/urandom");

    let mut events = prng.subscribe();

    // Wait for the first few deposits, then poll until seeded.
    for _ in 0..8 {
        if let Ok(event) = events.recv().await {
            println!("pool {} filled by {} source", event.pool, event.source);
        }
    }

    loop {
        let bytes = prng.random_data(32);
        if !bytes.is_empty() {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            println!("32 random bytes: {hex}");
            println!("reseeds so far: {}", prng.reseed_count());
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    prng.shutdown();
}
