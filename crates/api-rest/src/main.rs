//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without loading `.env`.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `clinic-run` binary loads `.env`
//! first and then serves the same router.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::{
    constants::DEFAULT_DATA_DIR, reference_table_from_env_value, transition_table_from_env_value,
    CoreConfig,
};

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Record store root (default: "clinic_data")
/// - `CLINIC_REFERENCE_FILE`: Optional WHO reference table override
/// - `CLINIC_TRANSITIONS_FILE`: Optional appointment transition table override
/// - `API_KEY`: Optional; when set, requests must carry a matching `x-api-key` header
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configured override file cannot be loaded,
/// - the data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());

    let reference_table =
        reference_table_from_env_value(std::env::var("CLINIC_REFERENCE_FILE").ok())?;
    let transitions =
        transition_table_from_env_value(std::env::var("CLINIC_TRANSITIONS_FILE").ok())?;

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(data_dir),
        reference_table,
        transitions,
    )?);
    let state = AppState::new(cfg, std::env::var("API_KEY").ok());

    tracing::info!("-- Starting clinic REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
