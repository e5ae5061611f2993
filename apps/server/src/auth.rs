//! Login sessions over HTTP.
//!
//! The browser carries the opaque session token in the `session_token`
//! cookie; API clients may send it as a bearer token instead.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use psyclinic_core::users::NewUser;
use serde::{Deserialize, Serialize};

use crate::{
    api::run_blocking,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

pub const SESSION_COOKIE: &str = "session_token";

/// The authenticated trainee, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub email: String,
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Token presented by the client, bearer header first.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, SESSION_COOKIE))
}

pub(crate) async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<Option<CurrentUser>> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    let email = state.session_service.verify_session(&token).await?;
    Ok(email.map(|email| CurrentUser { email }))
}

fn session_cookie(token: &str, max_age: i64, secure: bool) -> ApiResult<HeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Anyhow(anyhow::anyhow!("Invalid cookie value: {e}")))
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&state, request.headers())
        .await?
        .ok_or(ApiError::Unauthorized)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Like [`require_session`], but only for emails listed as administrators.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&state, request.headers())
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !state.is_admin(&user.email) {
        tracing::warn!("Admin route refused for {}", user.email);
        return Err(ApiError::Forbidden);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let users = state.user_service.clone();
    let user =
        run_blocking(move || users.authenticate(&payload.email, &payload.password)).await?;
    let session = state.session_service.create_session(&user.email).await?;
    tracing::info!("Login: {}", user.email);

    let cookie = session_cookie(
        &session.token,
        state.session_service.ttl_secs(),
        state.cookie_secure,
    )?;
    Ok(([(SET_COOKIE, cookie)], MessageResponse::ok("Login successful")).into_response())
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewUser>,
) -> ApiResult<Json<MessageResponse>> {
    let users = state.user_service.clone();
    let user = run_blocking(move || users.register(payload)).await?;
    tracing::info!("Account created: {}", user.email);
    Ok(MessageResponse::ok("Account created successfully"))
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = session_token(&headers) {
        state.session_service.revoke_session(&token).await?;
    }
    let cookie = session_cookie("", 0, state.cookie_secure)?;
    Ok(([(SET_COOKIE, cookie)], MessageResponse::ok("Logged out")).into_response())
}

async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse { email: user.email })
}

/// Routes that do not need a session.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/signup", post(signup))
        .route("/api/logout", post(logout))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(me))
}
