use std::{path::Path, sync::Arc};

use axum::{extract::State, routing::post, Extension, Json, Router};
use psyclinic_ai::{ChatTurn, PerformanceReport, SessionSetup};
use psyclinic_core::simulation::{PatientProfile, DEFAULT_AVATAR_VIDEO};
use serde::{Deserialize, Serialize};

use crate::{auth::CurrentUser, error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
struct ChatRequest {
    history: Vec<ChatTurn>,
    persona_prompt: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Deserialize)]
struct ReportRequest {
    transcript: String,
    #[serde(default)]
    chat_history: Option<Vec<ChatTurn>>,
    #[serde(default)]
    language: Option<String>,
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(profile): Json<PatientProfile>,
) -> ApiResult<Json<SessionSetup>> {
    let mut setup = state.simulation_service.start_session(&profile).await?;

    let video_path = Path::new(&state.media_dir).join(&setup.video_filename);
    if !tokio::fs::try_exists(&video_path).await.unwrap_or(false) {
        tracing::warn!(
            "Video file not found: {}, using {}",
            video_path.display(),
            DEFAULT_AVATAR_VIDEO
        );
        setup.video_filename = DEFAULT_AVATAR_VIDEO.to_string();
    }

    tracing::info!("{} started a session ({})", user.email, setup.video_filename);
    Ok(Json(setup))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let reply = state
        .simulation_service
        .reply(&request.persona_prompt, request.history)
        .await?;
    Ok(Json(ChatResponse { reply }))
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<ReportRequest>,
) -> ApiResult<Json<PerformanceReport>> {
    tracing::info!("Generating report for {}", user.email);
    let report = state
        .simulation_service
        .generate_report(
            &request.transcript,
            request.chat_history,
            request.language.as_deref(),
        )
        .await?;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start_session", post(start_session))
        .route("/chat", post(chat))
}

/// Kept apart so it can run under its own timeout.
pub fn report_router() -> Router<Arc<AppState>> {
    Router::new().route("/generate_report", post(generate_report))
}
