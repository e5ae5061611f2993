use std::{path::Path as StdPath, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use psyclinic_core::simulation::is_allowed_avatar_video;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Stream an avatar clip. Only the known clip names are served, so the path
/// parameter can never reach outside the media directory.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request<Body>,
) -> ApiResult<Response> {
    if !is_allowed_avatar_video(&filename) {
        return Err(ApiError::NotFound("Video not found".into()));
    }

    let path = StdPath::new(&state.media_dir).join(&filename);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::warn!("Avatar video missing on disk: {}", path.display());
        return Err(ApiError::NotFound(format!("Video file not found: {filename}")));
    }

    // Content type is guessed from the `.mp4` extension; ranges are honoured.
    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/videos/{filename}", get(get_video))
}
