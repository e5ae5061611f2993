//! Context budgeting for patient replies.
//!
//! Token counts are estimated from whitespace-separated words. The estimate
//! overshoots typical English tokenization slightly, which keeps requests under
//! the provider's hard limit.

use log::debug;

use crate::constants::{
    CONTEXT_SAFETY_MARGIN, MAX_TOKENS_CHAT, MAX_TOTAL_TOKENS, MIN_HISTORY_TOKENS,
};
use crate::error::AiError;
use crate::types::{ChatRole, ChatTurn};

/// Characters per estimated token when cutting an oversized message.
const CHARS_PER_TOKEN: f64 = 3.5;

/// Cut messages shorter than this are dropped instead.
const MIN_TRUNCATED_CHARS: usize = 50;

/// Estimated tokens per whitespace-separated word.
const TOKENS_PER_WORD: f64 = 1.3;

pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Longest prefix of `text` holding at most `max_words` words, without
/// trailing whitespace.
fn word_prefix(text: &str, max_words: usize) -> &str {
    let mut words = 0;
    let mut in_word = false;
    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == max_words {
                return text[..index].trim_end();
            }
            words += 1;
            in_word = true;
        }
    }
    text.trim_end()
}

/// History budget left once the system prompt and the reply are accounted for.
pub fn history_budget(system_prompt: &str) -> Result<usize, AiError> {
    let reserved = MAX_TOKENS_CHAT as usize + estimate_tokens(system_prompt) + CONTEXT_SAFETY_MARGIN;
    let available = MAX_TOTAL_TOKENS.saturating_sub(reserved);
    if available < MIN_HISTORY_TOKENS {
        return Err(AiError::ContextOverflow("System prompt too long".into()));
    }
    Ok(available)
}

/// Keep the most recent history that fits the budget.
///
/// Walks newest to oldest; the first message that does not fit is cut down to
/// the remaining budget (or dropped when too little would survive) and the walk
/// stops there. The result is in chronological order and never starts with a
/// patient turn.
pub fn fit_to_token_limit(
    messages: Vec<ChatTurn>,
    system_prompt: &str,
) -> Result<Vec<ChatTurn>, AiError> {
    let available = history_budget(system_prompt)?;
    let original_len = messages.len();

    let mut kept = Vec::with_capacity(messages.len());
    let mut total = 0usize;

    for mut turn in messages.into_iter().rev() {
        let tokens = estimate_tokens(&turn.content);
        if total + tokens <= available {
            total += tokens;
            kept.push(turn);
            continue;
        }

        let remaining = available - total;
        let max_chars = (remaining as f64 * CHARS_PER_TOKEN) as usize;
        let cut: String = turn.content.chars().take(max_chars).collect();
        // Short words would overshoot the character cut, so cap by words too.
        let max_words = (remaining as f64 / TOKENS_PER_WORD).floor() as usize;
        let cut = word_prefix(&cut, max_words);
        if cut.chars().count() > MIN_TRUNCATED_CHARS {
            turn.content = format!("{cut}...");
            kept.push(turn);
        }
        break;
    }

    kept.reverse();
    let leading_patient_turns = kept
        .iter()
        .take_while(|turn| turn.role == ChatRole::Assistant)
        .count();
    kept.drain(..leading_patient_turns);

    if kept.len() != original_len {
        debug!(
            "Trimmed history from {} to {} messages (budget {} tokens)",
            original_len,
            kept.len(),
            available
        );
    }
    Ok(kept)
}
