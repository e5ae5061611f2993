//! Administrator views over the trainee database.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::Local;
use psyclinic_core::users::UserSummary;
use serde::Serialize;

use crate::{
    api::{
        pages::{page, ADMIN_PAGE},
        run_blocking,
    },
    auth::{CurrentUser, MessageResponse},
    error::ApiResult,
    main_lib::AppState,
};

#[derive(Serialize)]
struct UserListResponse {
    users: Vec<UserSummary>,
    total: usize,
}

async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<UserListResponse>> {
    let service = state.user_service.clone();
    let users = run_blocking(move || service.list_users()).await?;
    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}

async fn download_users_csv(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let service = state.user_service.clone();
    let bytes = run_blocking(move || service.export_csv()).await?;
    let filename = format!("users_backup_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentUser>,
    Path(email): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let service = state.user_service.clone();
    let target = email.clone();
    run_blocking(move || service.delete_user(&target)).await?;
    tracing::info!("{} deleted user {}", admin.email, email);
    Ok(Json(MessageResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

pub fn router(templates_dir: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route_service("/loginlist", page(templates_dir, ADMIN_PAGE))
        .route("/api/users", get(list_users))
        .route("/api/download_users_csv", get(download_users_csv))
        .route("/api/delete_user/{email}", delete(delete_user))
}
