use std::{path::Path, sync::Arc};

use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::services::ServeFile;

use crate::{auth, error::ApiResult, main_lib::AppState};

pub const LOGIN_PAGE: &str = "logsign.html";
pub const APP_PAGE: &str = "index.html";
pub const ADMIN_PAGE: &str = "loginlist.html";

/// Send signed-in users to the app and everyone else to the login page.
async fn root(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let target = match auth::current_user(&state, &headers).await? {
        Some(_) => "/app",
        None => "/login",
    };
    Ok((StatusCode::FOUND, [(LOCATION, target)]))
}

pub(crate) fn page(templates_dir: &str, name: &str) -> ServeFile {
    ServeFile::new(Path::new(templates_dir).join(name))
}

pub fn public_router(templates_dir: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route_service("/login", page(templates_dir, LOGIN_PAGE))
}

pub fn router(templates_dir: &str) -> Router<Arc<AppState>> {
    Router::new().route_service("/app", page(templates_dir, APP_PAGE))
}
