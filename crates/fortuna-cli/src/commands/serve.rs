use fortuna_core::Fortuna;

use super::SourceArgs;

pub fn run(sources: &SourceArgs, host: &str, http_port: u16) {
    let base = format!("http://{host}:{http_port}");

    println!("Fortuna Server v{}", fortuna_core::VERSION);
    println!("   {base}");
    println!();
    println!("   Endpoints:");
    println!("     GET /                 API index (try: curl {base})");
    println!("     GET /api/v1/random    Random bytes from the generator");
    println!("     GET /health           Seeding state and pool fill levels");
    println!();
    println!("   Query params for /api/v1/random:");
    println!("     length=N              Bytes to return (default: 32)");
    println!("     type=hex|uint8        Output format (default: hex)");
    println!();
    println!("   Until the pools have seeded the generator, /api/v1/random");
    println!("   answers 503; clients should retry with backoff.");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let prng = Fortuna::new();
        super::attach_sources(&prng, sources);
        fortuna_server::run_server(prng, host, http_port).await;
    });
}
