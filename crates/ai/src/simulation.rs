//! Session orchestrator.
//!
//! Drives the three model-backed steps of a practice session: setting up the
//! patient, answering each therapist turn, and scoring the finished session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use psyclinic_core::simulation::{avatar_video_filename, PatientProfile};

use crate::constants::MAX_TOKENS_CHAT;
use crate::error::AiError;
use crate::feedback::{extract_exchanges, fallback_feedback, improvement_request, parse_feedback};
use crate::model::LanguageModelTrait;
use crate::persona::{backstory_request, build_persona_prompt, fallback_backstory};
use crate::report::report_request;
use crate::tokens::fit_to_token_limit;
use crate::types::{
    ChatRole, ChatTurn, CompletionRequest, PerformanceReport, SessionSetup, TurnFeedback,
};

/// Retry and pacing policy for the per-turn feedback calls.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub feedback_max_attempts: u32,
    pub feedback_initial_backoff: Duration,
    /// Pause between consecutive feedback calls.
    pub feedback_pacing: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            feedback_max_attempts: 3,
            feedback_initial_backoff: Duration::from_secs(1),
            feedback_pacing: Duration::from_millis(500),
        }
    }
}

impl SimulationConfig {
    /// Same attempts, no waiting.
    pub fn without_delays() -> Self {
        Self {
            feedback_initial_backoff: Duration::ZERO,
            feedback_pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub struct SimulationService {
    model: Arc<dyn LanguageModelTrait>,
    config: SimulationConfig,
}

impl SimulationService {
    pub fn new(model: Arc<dyn LanguageModelTrait>, config: SimulationConfig) -> Self {
        Self { model, config }
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// Generate a backstory and persona for a new practice session.
    ///
    /// A failed backstory call does not fail the session; a short generic
    /// backstory is used instead.
    pub async fn start_session(&self, profile: &PatientProfile) -> Result<SessionSetup, AiError> {
        profile
            .validate()
            .map_err(|e| AiError::invalid_input(e.to_string()))?;
        let started = Instant::now();

        let backstory = match self.model.complete(backstory_request(profile)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Backstory generation failed, using fallback: {}", e);
                fallback_backstory(profile)
            }
        };

        let system_prompt = build_persona_prompt(profile, &backstory);
        let video_filename = avatar_video_filename(profile.age, &profile.gender);

        info!(
            "Session ready in {:.2}s | age={} gender={} video={}",
            started.elapsed().as_secs_f64(),
            profile.age,
            profile.gender,
            video_filename
        );
        Ok(SessionSetup {
            system_prompt,
            video_filename,
            backstory,
        })
    }

    /// Produce the patient's next line.
    pub async fn reply(&self, persona_prompt: &str, history: Vec<ChatTurn>) -> Result<String, AiError> {
        let started = Instant::now();
        let messages = normalize_history(history)?;
        let messages = fit_to_token_limit(messages, persona_prompt)?;
        let context_len = messages.len();

        let reply = self
            .model
            .complete(CompletionRequest::new(persona_prompt, messages, MAX_TOKENS_CHAT))
            .await?;

        debug!(
            "Reply in {:.2}s | context {} messages",
            started.elapsed().as_secs_f64(),
            context_len
        );
        Ok(reply)
    }

    /// Score a finished session.
    ///
    /// The competency report is required; per-turn feedback degrades to a
    /// fallback entry for each turn whose analysis could not be produced.
    pub async fn generate_report(
        &self,
        transcript: &str,
        history: Option<Vec<ChatTurn>>,
        language: Option<&str>,
    ) -> Result<PerformanceReport, AiError> {
        let started = Instant::now();
        let report = self
            .model
            .complete(report_request(transcript, language))
            .await?;

        let improvements = match history {
            Some(history) => self.turn_feedback(&history).await,
            None => Vec::new(),
        };

        info!(
            "Report + {} improvements in {:.2}s",
            improvements.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(PerformanceReport {
            report,
            improvements,
        })
    }

    async fn turn_feedback(&self, history: &[ChatTurn]) -> Vec<TurnFeedback> {
        let exchanges = extract_exchanges(history);
        let last = exchanges.len().saturating_sub(1);
        let mut improvements = Vec::with_capacity(exchanges.len());

        for (index, exchange) in exchanges.iter().enumerate() {
            let feedback = match self.complete_with_retry(improvement_request(exchange)).await {
                Ok(reply) => parse_feedback(exchange, &reply),
                Err(e) => {
                    warn!("Feedback for turn {} failed after retries: {}", index + 1, e);
                    fallback_feedback(exchange, &e)
                }
            };
            improvements.push(feedback);

            if index < last && !self.config.feedback_pacing.is_zero() {
                tokio::time::sleep(self.config.feedback_pacing).await;
            }
        }
        improvements
    }

    async fn complete_with_retry(&self, request: CompletionRequest) -> Result<String, AiError> {
        let attempts = self.config.feedback_max_attempts.max(1);
        let mut backoff = self.config.feedback_initial_backoff;
        let mut attempt = 1;

        loop {
            match self.model.complete(request.clone()).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt < attempts && is_retryable(&e) => {
                    debug!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, attempts, e, backoff
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_retryable(err: &AiError) -> bool {
    !matches!(
        err,
        AiError::NotConfigured(_) | AiError::InvalidInput(_) | AiError::ContextOverflow(_)
    )
}

/// Trim turns, drop blank ones and check the conversation can be continued.
fn normalize_history(history: Vec<ChatTurn>) -> Result<Vec<ChatTurn>, AiError> {
    let messages: Vec<ChatTurn> = history
        .into_iter()
        .filter_map(|turn| {
            let content = turn.content.trim();
            (!content.is_empty()).then(|| ChatTurn {
                role: turn.role,
                content: content.to_string(),
            })
        })
        .collect();

    let Some(last) = messages.last() else {
        return Err(AiError::invalid_input("Empty history"));
    };
    if messages.windows(2).any(|pair| pair[0].role == pair[1].role) {
        return Err(AiError::invalid_input("Wait for patient reply"));
    }
    if last.role != ChatRole::User {
        return Err(AiError::invalid_input("Therapist must speak last"));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScriptedModel, UnconfiguredModel};

    fn profile() -> PatientProfile {
        PatientProfile {
            age: 52,
            ethnicity: "Punjabi".into(),
            diseases: "depression, alcohol use".into(),
            working_domain: "truck driver".into(),
            gender: "male".into(),
            session_duration: 45,
        }
    }

    fn service(model: Arc<ScriptedModel>) -> SimulationService {
        SimulationService::new(model, SimulationConfig::without_delays())
    }

    #[tokio::test]
    async fn start_session_builds_persona_and_video() {
        let model = Arc::new(ScriptedModel::with_reply("  His business partner left last year.  "));
        let setup = service(model.clone()).start_session(&profile()).await.unwrap();

        assert_eq!(setup.backstory, "His business partner left last year.");
        assert_eq!(setup.video_filename, "male-middle.mp4");
        assert!(setup.system_prompt.starts_with("You are Sai, a 52-year-old male Punjabi truck driver"));
        assert!(setup.system_prompt.contains("His business partner left last year."));
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn start_session_falls_back_when_backstory_fails() {
        let svc = SimulationService::new(
            Arc::new(UnconfiguredModel::new("no region")),
            SimulationConfig::without_delays(),
        );
        let setup = svc.start_session(&profile()).await.unwrap();
        assert_eq!(setup.backstory, "Trauma from depression.");
    }

    #[tokio::test]
    async fn start_session_rejects_invalid_profile() {
        let mut bad = profile();
        bad.age = 0;
        let model = Arc::new(ScriptedModel::with_reply("x"));
        let err = service(model.clone()).start_session(&bad).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn reply_sends_trimmed_history() {
        let model = Arc::new(ScriptedModel::with_reply("I guess..."));
        let history = vec![
            ChatTurn::user("  Hello  "),
            ChatTurn::assistant("   "),
            ChatTurn::assistant("Hi."),
            ChatTurn::user("How was your week?"),
        ];
        let reply = service(model.clone()).reply("You are Sai", history).await.unwrap();
        assert_eq!(reply, "I guess...");

        let sent = &model.requests()[0];
        assert_eq!(sent.system, "You are Sai");
        assert_eq!(sent.max_tokens, 500);
        assert_eq!(sent.messages.len(), 3);
        assert_eq!(sent.messages[0].content, "Hello");
    }

    #[tokio::test]
    async fn reply_validates_turn_order() {
        let svc = service(Arc::new(ScriptedModel::with_reply("x")));

        let err = svc.reply("p", vec![ChatTurn::user("  ")]).await.unwrap_err();
        assert_eq!(err.to_string(), "Empty history");

        let err = svc
            .reply("p", vec![ChatTurn::user("a"), ChatTurn::user("b")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Wait for patient reply");

        let err = svc
            .reply("p", vec![ChatTurn::user("a"), ChatTurn::assistant("b")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Therapist must speak last");
    }

    #[tokio::test]
    async fn report_without_history_has_no_improvements() {
        let model = Arc::new(ScriptedModel::with_reply("<h1>Report</h1>"));
        let report = service(model.clone())
            .generate_report("Therapist: hi", None, None)
            .await
            .unwrap();
        assert_eq!(report.report, "<h1>Report</h1>");
        assert!(report.improvements.is_empty());
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn report_failure_propagates() {
        let model = Arc::new(ScriptedModel::with_reply("unused"));
        model.push_result(Err(AiError::RateLimited("throttled".into())));
        let err = service(model)
            .generate_report("t", Some(vec![ChatTurn::user("hi")]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::RateLimited(_)));
    }

    #[tokio::test]
    async fn feedback_retries_then_falls_back() {
        let model = Arc::new(ScriptedModel::with_reply("STATUS: GOOD\nANALYSIS: Warm."));
        model.push_result(Ok("<h1>Report</h1>".into()));
        // First turn: one transient failure, then success.
        model.push_result(Err(AiError::provider("Bedrock error: ServiceUnavailable")));
        model.push_result(Ok("STATUS: NEEDS_IMPROVEMENT\nANALYSIS: Closed question.".into()));
        // Second turn: every attempt is throttled.
        for _ in 0..3 {
            model.push_result(Err(AiError::RateLimited("throttled".into())));
        }

        let history = vec![
            ChatTurn::user("Are you sad?"),
            ChatTurn::assistant("Maybe..."),
            ChatTurn::user("Tell me more."),
            ChatTurn::assistant("I don't know."),
            ChatTurn::user("That's okay."),
        ];
        let report = service(model.clone())
            .generate_report("t", Some(history), Some("English"))
            .await
            .unwrap();

        assert_eq!(report.improvements.len(), 3);
        assert!(report.improvements[0].needs_improvement);
        assert!(report.improvements[1].improvement.contains("currently busy"));
        assert!(!report.improvements[1].needs_improvement);
        assert_eq!(report.improvements[2].status.as_deref(), Some("GOOD"));
        // 1 report + 2 + 3 + 1 feedback calls.
        assert_eq!(model.requests().len(), 7);
    }

    #[tokio::test]
    async fn unconfigured_model_is_not_retried() {
        let svc = SimulationService::new(
            Arc::new(UnconfiguredModel::new("no region")),
            SimulationConfig::without_delays(),
        );
        assert!(!svc.is_model_ready());
        let err = svc.complete_with_retry(CompletionRequest::single("s", "p", 10)).await;
        assert!(matches!(err, Err(AiError::NotConfigured(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_calls_are_paced() {
        let model = Arc::new(ScriptedModel::with_reply("STATUS: GOOD"));
        let svc = SimulationService::new(model, SimulationConfig::default());
        let history = vec![
            ChatTurn::user("a"),
            ChatTurn::assistant("b"),
            ChatTurn::user("c"),
        ];

        let started = tokio::time::Instant::now();
        svc.generate_report("t", Some(history), None).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }
}
