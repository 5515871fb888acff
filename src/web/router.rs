//! Web application router and middleware setup.

use crate::web::config::WebConfig;
use crate::web::handlers::{self, AppState};
use axum::{routing::get, Router};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

/// Route paths served by the application.
pub const PATH_HOME: &str = "/";
pub const PATH_INTENSITY: &str = "/light/intensity";
pub const PATH_POWER: &str = "/light/power";

/// Build the axum router with all routes and middleware.
pub fn create_router(config: &WebConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .route(PATH_HOME, get(handlers::home))
        .route(PATH_INTENSITY, get(handlers::get_intensity))
        .route(
            PATH_POWER,
            get(handlers::get_power).post(handlers::set_power),
        )
        .with_state(state);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Build the full application, including trailing-slash normalisation.
///
/// Path normalisation has to run before routing, so it wraps the router
/// instead of being added as a router layer.
pub fn create_app(config: &WebConfig, state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(config, state))
}
