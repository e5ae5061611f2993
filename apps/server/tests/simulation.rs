use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use psyclinic_ai::{AiError, ScriptedModel, SimulationConfig};
use psyclinic_core::sessions::SessionServiceTrait;
use psyclinic_server::{api::app_router, build_state_with_model, config::Config};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    model: Arc<ScriptedModel>,
    cookie: String,
    _tmp: TempDir,
}

async fn logged_in_app(model: ScriptedModel) -> TestApp {
    let tmp = tempdir().unwrap();
    std::fs::write(tmp.path().join("female-adult.mp4"), b"\x00\x00\x00\x18ftypmp42").unwrap();

    let mut config = Config::from_env();
    config.users_file = tmp.path().join("users.csv").to_string_lossy().into_owned();
    config.templates_dir = tmp.path().to_string_lossy().into_owned();
    config.media_dir = config.templates_dir.clone();
    config.cookie_secure = false;

    let model = Arc::new(model);
    let state = build_state_with_model(&config, model.clone(), SimulationConfig::without_delays())
        .unwrap();
    let router = app_router(state, &config);

    router
        .clone()
        .oneshot(post_json(
            "/api/signup",
            None,
            serde_json::json!({ "email": "trainee@example.com", "password": "pw", "full_name": "Trainee" }),
        ))
        .await
        .unwrap();
    let login = router
        .clone()
        .oneshot(post_json(
            "/api/login",
            None,
            serde_json::json!({ "email": "trainee@example.com", "password": "pw" }),
        ))
        .await
        .unwrap();
    let cookie = login.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    TestApp {
        router,
        model,
        cookie,
        _tmp: tmp,
    }
}

fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn profile(age: u32, gender: &str) -> serde_json::Value {
    serde_json::json!({
        "age": age,
        "ethnicity": "Malayali",
        "diseases": "panic disorder, insomnia",
        "working_domain": "software engineer",
        "gender": gender,
        "session_duration": 30
    })
}

#[tokio::test]
async fn start_session_returns_persona_and_video() {
    let app = logged_in_app(ScriptedModel::with_reply("She was laid off in March.")).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/start_session", Some(&app.cookie), profile(31, "female")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["video_filename"], "female-adult.mp4");
    assert_eq!(body["backstory"], "She was laid off in March.");
    assert!(body["system_prompt"]
        .as_str()
        .unwrap()
        .starts_with("You are Sai, a 31-year-old female Malayali software engineer in therapy."));
}

#[tokio::test]
async fn start_session_falls_back_to_default_video_when_clip_is_missing() {
    let app = logged_in_app(ScriptedModel::with_reply("Backstory.")).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/start_session", Some(&app.cookie), profile(70, "male")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["video_filename"], "male-adult.mp4");
}

#[tokio::test]
async fn start_session_requires_login() {
    let app = logged_in_app(ScriptedModel::with_reply("x")).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/start_session", None, profile(31, "female")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.model.requests().is_empty());
}

#[tokio::test]
async fn chat_returns_patient_reply() {
    let app = logged_in_app(ScriptedModel::with_reply("I... I don't really know.")).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/chat",
            Some(&app.cookie),
            serde_json::json!({
                "persona_prompt": "You are Sai",
                "history": [
                    { "role": "user", "content": "Hi, I'm Dr. Mehta." },
                    { "role": "assistant", "content": "Hi." },
                    { "role": "user", "content": "What brings you in today?" }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reply"], "I... I don't really know.");

    let sent = &app.model.requests()[0];
    assert_eq!(sent.system, "You are Sai");
    assert_eq!(sent.messages.len(), 3);
}

#[tokio::test]
async fn chat_rejects_out_of_turn_history() {
    let app = logged_in_app(ScriptedModel::with_reply("x")).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/chat",
            Some(&app.cookie),
            serde_json::json!({
                "persona_prompt": "You are Sai",
                "history": [
                    { "role": "user", "content": "Hello?" },
                    { "role": "assistant", "content": "Hi." }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Therapist must speak last");
}

#[tokio::test]
async fn throttled_chat_maps_to_429() {
    let model = ScriptedModel::new(|_| Err(AiError::RateLimited("ThrottlingException".into())));
    let app = logged_in_app(model).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/chat",
            Some(&app.cookie),
            serde_json::json!({
                "persona_prompt": "You are Sai",
                "history": [{ "role": "user", "content": "Hello" }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["message"], "Rate limit. Wait 10s.");
}

#[tokio::test]
async fn report_includes_per_turn_feedback() {
    let model = ScriptedModel::new(|request| {
        if request.system == "Concise therapy evaluator." {
            Ok("<h1>Section 1</h1>".to_string())
        } else {
            Ok("STATUS: NEEDS_IMPROVEMENT\nANALYSIS: Too direct.\nSUGGESTION: Reflect first.".to_string())
        }
    });
    let app = logged_in_app(model).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/generate_report",
            Some(&app.cookie),
            serde_json::json!({
                "transcript": "Therapist: Why are you anxious?\nPatient: I don't know.",
                "chat_history": [
                    { "role": "user", "content": "Why are you anxious?" },
                    { "role": "assistant", "content": "I don't know." }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["report"], "<h1>Section 1</h1>");
    let improvements = body["improvements"].as_array().unwrap();
    assert_eq!(improvements.len(), 1);
    assert_eq!(improvements[0]["therapist_message"], "Why are you anxious?");
    assert_eq!(improvements[0]["patient_response"], "I don't know.");
    assert_eq!(improvements[0]["needs_improvement"], true);
    assert_eq!(improvements[0]["suggestion"], "Reflect first.");
}

#[tokio::test]
async fn videos_are_allowlisted() {
    let app = logged_in_app(ScriptedModel::with_reply("x")).await;

    let get = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, &app.cookie)
            .body(Body::empty())
            .unwrap()
    };

    let ok = app.router.clone().oneshot(get("/videos/female-adult.mp4")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(ok.headers()[header::CONTENT_TYPE], "video/mp4");

    let missing = app.router.clone().oneshot(get("/videos/male-young.mp4")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let foreign = app.router.clone().oneshot(get("/videos/users.csv")).await.unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(foreign).await["message"], "Video not found");
}

#[tokio::test]
async fn report_may_outlive_the_general_request_timeout() {
    let tmp = tempdir().unwrap();
    let mut config = Config::from_env();
    config.users_file = tmp.path().join("users.csv").to_string_lossy().into_owned();
    config.templates_dir = tmp.path().to_string_lossy().into_owned();
    config.request_timeout = Duration::from_millis(20);
    config.report_timeout = Duration::from_secs(30);

    let simulation = SimulationConfig {
        feedback_pacing: Duration::from_millis(150),
        ..SimulationConfig::without_delays()
    };
    let model = ScriptedModel::new(|request| {
        if request.system == "Concise therapy evaluator." {
            Ok("<h1>Report</h1>".to_string())
        } else {
            Ok("STATUS: GOOD\nANALYSIS: Warm.\nSUGGESTION: No changes needed.".to_string())
        }
    });
    let state = build_state_with_model(&config, Arc::new(model), simulation).unwrap();
    let session = state
        .session_service
        .create_session("trainee@example.com")
        .await
        .unwrap();
    let router = app_router(state, &config);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/generate_report")
                .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "transcript": "Therapist: Hello\nPatient: Hi",
                        "chat_history": [
                            { "role": "user", "content": "Hello" },
                            { "role": "assistant", "content": "Hi" },
                            { "role": "user", "content": "How was your week?" },
                            { "role": "assistant", "content": "Long." }
                        ]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["report"], "<h1>Report</h1>");
    assert_eq!(body["improvements"].as_array().unwrap().len(), 2);
}
