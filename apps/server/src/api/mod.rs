pub mod health;
pub mod media;
pub mod pages;
pub mod simulation;
pub mod users;

use std::sync::Arc;

use axum::{http::HeaderValue, middleware, Router};
use psyclinic_core::errors::Error as CoreError;
use tokio::task;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{auth, config::Config, error::ApiResult, main_lib::AppState};

/// Runs account-store work (file I/O, password hashing) off the async workers.
pub(crate) async fn run_blocking<T, F>(op: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    let result = task::spawn_blocking(op)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute blocking task: {}", e))??;
    Ok(result)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allow.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins = config
        .cors_allow
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect::<Vec<_>>();
    // Credentials cannot be combined with wildcards, so echo the preflight.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let public = Router::new()
        .merge(auth::public_router())
        .merge(health::router())
        .merge(pages::public_router(&config.templates_dir));

    let protected = Router::new()
        .merge(auth::router())
        .merge(pages::router(&config.templates_dir))
        .merge(media::router())
        .merge(simulation::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let admin = users::router(&config.templates_dir).route_layer(
        middleware::from_fn_with_state(state.clone(), auth::require_admin),
    );

    let timed = Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TimeoutLayer::new(config.request_timeout));

    let report = simulation::report_router()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ))
        .layer(TimeoutLayer::new(config.report_timeout));

    Router::new()
        .merge(timed)
        .merge(report)
        .with_state(state)
        .layer(cors_layer(config))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
}
