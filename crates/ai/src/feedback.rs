//! Per-turn supervisor feedback.
//!
//! Every therapist message in a session is paired with the patient reply that
//! followed it and sent to the model for a short STATUS / ANALYSIS / SUGGESTION
//! critique.

use crate::constants::{IMPROVEMENT_SYSTEM_PROMPT, MAX_TOKENS_IMPROVEMENT};
use crate::error::AiError;
use crate::types::{ChatRole, ChatTurn, CompletionRequest, TurnFeedback};

const CONTEXT_TURNS: usize = 2;
const CONTEXT_SNIPPET_CHARS: usize = 100;
const CONTEXT_PROMPT_CHARS: usize = 300;

const NO_CONTEXT: &str = "Start of conversation";
const NO_RESPONSE: &str = "No response yet";
const NEEDS_IMPROVEMENT_MARKER: &str = "NEEDS_IMPROVEMENT";

/// One therapist turn with the surrounding conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub therapist_message: String,
    pub patient_response: String,
    pub context: String,
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pair every therapist turn with the next patient turn, if there is one.
pub fn extract_exchanges(history: &[ChatTurn]) -> Vec<Exchange> {
    history
        .iter()
        .enumerate()
        .filter(|(_, turn)| turn.role == ChatRole::User)
        .map(|(index, turn)| {
            let patient_response = history
                .get(index + 1)
                .filter(|next| next.role == ChatRole::Assistant)
                .map(|next| next.content.clone())
                .unwrap_or_default();

            let context = history[index.saturating_sub(CONTEXT_TURNS)..index]
                .iter()
                .map(|prev| {
                    format!(
                        "{}: {}",
                        prev.role.as_str(),
                        clip(&prev.content, CONTEXT_SNIPPET_CHARS)
                    )
                })
                .collect::<Vec<_>>()
                .join(" | ");

            Exchange {
                therapist_message: turn.content.clone(),
                patient_response,
                context,
            }
        })
        .collect()
}

pub fn improvement_prompt(exchange: &Exchange) -> String {
    let context = if exchange.context.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        clip(&exchange.context, CONTEXT_PROMPT_CHARS)
    };
    let response = if exchange.patient_response.is_empty() {
        NO_RESPONSE
    } else {
        exchange.patient_response.as_str()
    };

    format!(
        "You are an expert therapy supervisor. Analyze this exchange:\n\n\
         CONTEXT: {context}\n\n\
         THERAPIST: \"{therapist}\"\n\
         PATIENT: \"{response}\"\n\n\
         Respond in this EXACT format:\n\
         STATUS: [GOOD or NEEDS_IMPROVEMENT]\n\
         ANALYSIS: [1 sentence explaining why]\n\
         SUGGESTION: [If NEEDS_IMPROVEMENT, provide a better alternative in 2-3 sentences. \
         If GOOD, write \"No changes needed.\"]\n\n\
         Be strict - only mark as GOOD if the response shows excellent therapeutic skills.",
        therapist = exchange.therapist_message,
    )
}

pub fn improvement_request(exchange: &Exchange) -> CompletionRequest {
    CompletionRequest::single(
        IMPROVEMENT_SYSTEM_PROMPT,
        improvement_prompt(exchange),
        MAX_TOKENS_IMPROVEMENT,
    )
}

fn labelled_line(reply: &str, label: &str) -> Option<String> {
    reply.lines().find_map(|line| {
        let line = line.trim();
        let (head, rest) = line.split_once(':')?;
        if head.trim().eq_ignore_ascii_case(label) {
            let value = rest.trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Build feedback from the supervisor's raw reply.
pub fn parse_feedback(exchange: &Exchange, reply: &str) -> TurnFeedback {
    TurnFeedback {
        therapist_message: exchange.therapist_message.clone(),
        patient_response: exchange.patient_response.clone(),
        improvement: reply.to_string(),
        needs_improvement: reply.to_uppercase().contains(NEEDS_IMPROVEMENT_MARKER),
        status: labelled_line(reply, "STATUS"),
        analysis: labelled_line(reply, "ANALYSIS"),
        suggestion: labelled_line(reply, "SUGGESTION"),
    }
}

/// Notice shown in place of an analysis that could not be produced.
pub fn fallback_message(err: &AiError) -> String {
    let detail = match err {
        AiError::RateLimited(_) => {
            "The AI service is currently busy. This response will be analyzed in the summary above."
        }
        AiError::Timeout(_) => {
            "The analysis request timed out. Your overall performance is covered in the main report."
        }
        _ => "Please refer to the overall evaluation above for guidance on this exchange.",
    };
    format!("Unable to generate detailed analysis at this time. {detail}")
}

pub fn fallback_feedback(exchange: &Exchange, err: &AiError) -> TurnFeedback {
    TurnFeedback {
        therapist_message: exchange.therapist_message.clone(),
        patient_response: exchange.patient_response.clone(),
        improvement: fallback_message(err),
        needs_improvement: false,
        status: None,
        analysis: None,
        suggestion: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<ChatTurn> {
        vec![
            ChatTurn::user("Hello, what brings you here?"),
            ChatTurn::assistant("I... I haven't been sleeping."),
            ChatTurn::user("Why don't you just try harder?"),
            ChatTurn::assistant("I guess I could..."),
            ChatTurn::user("Okay, see you next week."),
        ]
    }

    #[test]
    fn exchanges_follow_therapist_turns() {
        let exchanges = extract_exchanges(&history());
        assert_eq!(exchanges.len(), 3);

        assert_eq!(exchanges[0].patient_response, "I... I haven't been sleeping.");
        assert_eq!(exchanges[0].context, "");

        assert_eq!(exchanges[1].therapist_message, "Why don't you just try harder?");
        assert_eq!(
            exchanges[1].context,
            "user: Hello, what brings you here? | assistant: I... I haven't been sleeping."
        );

        assert_eq!(exchanges[2].patient_response, "");
    }

    #[test]
    fn context_snippets_are_clipped() {
        let long = "x".repeat(250);
        let exchanges = extract_exchanges(&[ChatTurn::assistant(long), ChatTurn::user("Go on")]);
        assert_eq!(exchanges[0].context, format!("assistant: {}", "x".repeat(100)));
    }

    #[test]
    fn prompt_uses_placeholders_for_missing_parts() {
        let exchange = Exchange {
            therapist_message: "Hi".into(),
            patient_response: String::new(),
            context: String::new(),
        };
        let prompt = improvement_prompt(&exchange);
        assert!(prompt.contains("CONTEXT: Start of conversation"));
        assert!(prompt.starts_with("You are an expert therapy supervisor."));
        assert!(prompt.contains("THERAPIST: \"Hi\"\nPATIENT: \"No response yet\""));
        assert!(prompt.contains("ANALYSIS: [1 sentence explaining why]"));
        assert!(prompt.contains("If GOOD, write \"No changes needed.\""));
        assert_eq!(improvement_request(&exchange).max_tokens, 1000);
    }

    #[test]
    fn parses_structured_reply() {
        let exchange = &extract_exchanges(&history())[1];
        let reply = "STATUS: NEEDS_IMPROVEMENT\nANALYSIS: Dismissive of the sleep problem.\nSUGGESTION: \"That sounds exhausting. Tell me more.\"";
        let feedback = parse_feedback(exchange, reply);

        assert!(feedback.needs_improvement);
        assert_eq!(feedback.status.as_deref(), Some("NEEDS_IMPROVEMENT"));
        assert_eq!(feedback.analysis.as_deref(), Some("Dismissive of the sleep problem."));
        assert_eq!(
            feedback.suggestion.as_deref(),
            Some("\"That sounds exhausting. Tell me more.\"")
        );
        assert_eq!(feedback.improvement, reply);
    }

    #[test]
    fn good_reply_does_not_need_improvement() {
        let exchange = &extract_exchanges(&history())[0];
        let feedback = parse_feedback(exchange, "status: good\nAnalysis: Open question.");
        assert!(!feedback.needs_improvement);
        assert_eq!(feedback.status.as_deref(), Some("good"));
        assert_eq!(feedback.suggestion, None);
    }

    #[test]
    fn fallback_depends_on_error_kind() {
        let exchange = &extract_exchanges(&history())[0];
        let busy = fallback_feedback(exchange, &AiError::RateLimited("x".into()));
        assert!(busy.improvement.contains("currently busy"));
        assert!(!busy.needs_improvement);

        assert!(fallback_message(&AiError::Timeout("x".into())).contains("timed out"));
        assert!(fallback_message(&AiError::EmptyResponse)
            .ends_with("Please refer to the overall evaluation above for guidance on this exchange."));
    }
}
