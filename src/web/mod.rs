//! Web server and API endpoints for the light.
//!
//! Three routes: a greeting at `/`, the sensor at `/light/intensity` and the
//! relay at `/light/power`.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use handlers::AppState;
pub use router::{create_app, create_router};

use crate::error::{LightError, Result};
use crate::light::LightController;
use axum::{extract::Request, ServiceExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the web server with the provided configuration and light controller.
pub async fn start_web_server(config: WebConfig, light: Arc<LightController>) -> Result<()> {
    let state = AppState::new(light).with_strict_json(config.strict_json);
    let app = create_app(&config, state);

    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| LightError::config_error(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LightError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("server starting on http://{}", addr);
    info!("Intensity endpoint: http://{}{}", addr, router::PATH_INTENSITY);
    info!("Power endpoint: http://{}{}", addr, router::PATH_POWER);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .map_err(|e| LightError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
