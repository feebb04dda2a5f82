use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::{
    constants::DEFAULT_DATA_DIR, reference_table_from_env_value, transition_table_from_env_value,
    CoreConfig,
};

/// Main entry point for the clinic application
///
/// Loads `.env`, resolves configuration once, and serves the REST API (with Swagger UI at
/// `/swagger-ui`).
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for record storage (default: "clinic_data")
/// - `CLINIC_REFERENCE_FILE`: WHO reference table override (YAML)
/// - `CLINIC_TRANSITIONS_FILE`: Appointment transition table override (YAML)
/// - `API_KEY`: API key required on every route except `/health`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?)
                .add_directive("clinic_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(&data_dir),
        reference_table_from_env_value(std::env::var("CLINIC_REFERENCE_FILE").ok())?,
        transition_table_from_env_value(std::env::var("CLINIC_TRANSITIONS_FILE").ok())?,
    )?);

    tracing::info!("++ Record store at {}", data_dir);
    tracing::info!("++ Starting clinic REST on {}", rest_addr);

    let app = router(AppState::new(cfg, std::env::var("API_KEY").ok()));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
