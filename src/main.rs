use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huddle::{broadcast, config::BrokerConfig, state::AppState, store::MemoryStore, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Huddle chat broker...");

    let config = BrokerConfig::from_env();

    // Development wiring: an in-memory store standing in for the hosted
    // user/event/message stores. A deployment swaps in database-backed
    // implementations of the store traits.
    let store = Arc::new(MemoryStore::new());
    tracing::warn!("using in-memory stores; all data is lost on restart");

    let state = Arc::new(AppState::new(
        config.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    ));

    // Reap connections that stop answering pings
    broadcast::spawn_liveness_reaper(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/healthz", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server error");
}
