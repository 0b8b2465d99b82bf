//! HTTP surface: the `/api?action=` endpoint, static slide files, and chat.
//!
//! ```text
//! GET|POST /api?action=upload|list_slides|save_edited|export_zip|export_pptx
//! GET      /slides/*  /edited/*  /exports/*      (files from the workspace)
//! POST     /api/text  /chat
//! GET      /api/info  /health
//! ```
//!
//! Conversion runs inside the upload request. Tokio keeps serving other
//! requests while the external tools run, but each upload is processed
//! serially from start to finish.

pub mod handlers;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{any, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::workspace::{EDITED_DIR, EXPORTS_DIR, SLIDES_DIR};

pub use handlers::ActionResponse;
pub use state::AppState;

/// Build the router. Bodies larger than `max_body_bytes` are rejected; on
/// `/api` the rejection is the usual `{ok:false}` upload error.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let ws = state.workspace.clone();

    Router::new()
        .route("/api", any(handlers::api_handler))
        .route("/api/text", post(handlers::text_handler))
        .route("/api/info", get(handlers::info_handler))
        .route("/chat", post(handlers::chat_handler))
        .route("/health", get(handlers::health_handler))
        .nest_service(&format!("/{SLIDES_DIR}"), ServeDir::new(ws.slides_root()))
        .nest_service(&format!("/{EDITED_DIR}"), ServeDir::new(ws.edited_root()))
        .nest_service(&format!("/{EXPORTS_DIR}"), ServeDir::new(ws.exports_dir()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::from_fn(handlers::upload_limit_envelope))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

/// Open the workspace, bind, and serve until the process exits.
pub async fn serve(config: &ServerConfig) -> Result<(), crate::SlidepressError> {
    let state = AppState::from_config(config)?;
    tracing::info!(
        base_dir = %config.base_dir.display(),
        qa_pairs = state.qa.len(),
        "Workspace ready"
    );
    let router = create_router(state, config.max_upload_bytes);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::SlidepressError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| crate::SlidepressError::Internal(format!("Server error: {}", e)))
}
