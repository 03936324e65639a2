use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::CurrentUser;
pub use middleware::*;
pub use state::*;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    use crate::middleware::security::*;

    let is_production = state.config.environment.is_production();

    let api = Router::new()
        .merge(routes::auth::create_router())
        .merge(routes::activities::create_router())
        .merge(routes::attendance::create_router())
        .merge(routes::payments::create_router())
        .merge(routes::diplomas::create_router())
        .merge(routes::admin::create_router())
        .merge(routes::reports::create_router());

    let mut router = Router::new()
        .merge(routes::health::create_router())
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Hardening layers only in production
    if is_production {
        use std::sync::Arc;
        use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

        router = router
            .layer(axum::middleware::from_fn(security_headers_middleware))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                request_validation_middleware,
            ));

        match GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .finish()
        {
            Some(config) => {
                router = router.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => tracing::warn!("Invalid rate limiter configuration, rate limiting disabled"),
        }
    } else {
        tracing::info!("Development mode: permissive CORS, no rate limiting");
    }

    let cors = if is_production {
        cors_layer(&state.config.server.allowed_origins)
    } else {
        CorsLayer::permissive()
    };

    router
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
