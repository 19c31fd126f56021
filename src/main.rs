use std::sync::Arc;

use form_coach::api::analyze::AppState;
use form_coach::api::routes::create_routes;
use form_coach::config::AppConfig;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let level: tracing::Level = config.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let address = config.server_address();
    let app = create_routes(Arc::new(AppState { config }));

    let listener = TcpListener::bind(&address).await?;
    info!("Form analysis server starting on http://{address}");
    info!("Health check available at http://{address}/api/health");

    axum::serve(listener, app).await?;

    Ok(())
}
