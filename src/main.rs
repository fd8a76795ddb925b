use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Clinica application
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`) over the clinic data directory.
/// Every endpoint except `/health` requires the `API_KEY` as a bearer token plus the
/// `x-user-id` and `x-user-role` identity headers.
///
/// # Environment Variables
/// - `CLINICA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for clinic data storage (default: "clinic_data")
/// - `API_KEY`: API key clients present as a bearer token
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinica=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINICA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let state = api_rest::state_from_env()?;
    tracing::info!(
        "++ Starting Clinica REST on {} (data: {})",
        rest_addr,
        state.cfg.clinic_data_dir().display()
    );
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
