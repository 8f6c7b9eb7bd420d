//! HTTP facade over a running [`Fortuna`] instance.
//!
//! Serves bounded random blobs per request: every response is a single
//! `random_data` call, never a stream. While the generator is unseeded the
//! random endpoint answers 503 and clients retry with backoff.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use fortuna_core::{Fortuna, MAX_RANDOM_DATA_BYTES, POOLS};

/// Shared server state.
struct AppState {
    prng: Fortuna,
}

#[derive(Deserialize)]
struct RandomParams {
    length: Option<usize>,
    #[serde(rename = "type")]
    data_type: Option<String>,
}

#[derive(Serialize)]
struct RandomResponse {
    #[serde(rename = "type")]
    data_type: String,
    length: usize,
    data: serde_json::Value,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    seeded: bool,
    reseeds: u64,
    pools: usize,
    pool_bytes: usize,
}

async fn handle_random(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RandomParams>,
) -> (StatusCode, Json<RandomResponse>) {
    let length = params.length.unwrap_or(32).clamp(1, MAX_RANDOM_DATA_BYTES);
    let data_type = params.data_type.unwrap_or_else(|| "hex".to_string());

    let bytes = state.prng.random_data(length);
    if bytes.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(RandomResponse {
                data_type,
                length: 0,
                data: serde_json::Value::Null,
                success: false,
                error: Some("generator not yet seeded; retry later".to_string()),
            }),
        );
    }

    let data = match data_type.as_str() {
        "uint8" => {
            serde_json::Value::Array(bytes.iter().map(|&b| serde_json::Value::from(b)).collect())
        }
        _ => serde_json::Value::String(hex::encode(&bytes)),
    };

    (
        StatusCode::OK,
        Json(RandomResponse {
            data_type,
            length: bytes.len(),
            data,
            success: true,
            error: None,
        }),
    )
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let seeded = state.prng.is_seeded();
    let pool_sizes = state.prng.pool_sizes();
    Json(HealthResponse {
        status: if seeded { "ready" } else { "seeding" }.to_string(),
        seeded,
        reseeds: state.prng.reseed_count().min(u64::MAX as u128) as u64,
        pools: POOLS,
        pool_bytes: pool_sizes.iter().sum(),
    })
}

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Fortuna Server",
        "version": fortuna_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/api/v1/random": {
                "method": "GET",
                "description": "Get random bytes from the generator",
                "params": {
                    "length": format!("Bytes to return (1-{MAX_RANDOM_DATA_BYTES}, default: 32)"),
                    "type": "Output format: hex, uint8 (default: hex)",
                },
                "errors": {
                    "503": "Generator not yet seeded; retry later",
                },
            },
            "/health": "Seeding state, reseed count, pool fill levels",
        },
    }))
}

/// Build the axum router.
fn build_router(prng: Fortuna) -> Router {
    let state = Arc::new(AppState { prng });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/random", get(handle_random))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the process exits.
pub async fn run_server(prng: Fortuna, host: &str, port: u16) {
    let app = build_router(prng);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

// Simple hex encoding without external dep
mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{b:02x}")).collect()
    }
}
