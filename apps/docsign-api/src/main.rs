//! DocSign API Server - Backend for template preparation
//!
//! Provides REST endpoints for:
//! - Document upload (with conversion to PDF)
//! - Signatories of a template
//! - Field placement (annotations) on template pages

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod convert;
mod db;
mod error;
mod handlers;
mod models;
mod state;
mod storage;
mod upload;

use config::Args;
use state::AppState;

/// Routes without middleware
fn routes(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Upload
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Templates
        .route("/api/templates/:id", get(handlers::get_template))
        .route("/api/templates/:id/document", get(handlers::get_document))
        .route("/api/templates/:id/pages", get(handlers::get_pages))
        .route(
            "/api/templates/:id/signatories",
            get(handlers::list_signatories).post(handlers::create_signatories),
        )
        .route(
            "/api/templates/:id/annotations",
            get(handlers::list_annotations).put(handlers::save_annotations),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("docsign_api={}", level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Initialize application state
    info!("Initializing DocSign API...");
    let state = Arc::new(AppState::from_args(&args).await?);

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes(state, args.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = args.bind_addr()?;
    info!("Starting DocSign API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
