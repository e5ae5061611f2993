/// Bedrock model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// Anthropic Messages API version expected by Bedrock.
pub const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_TOP_P: f32 = 0.9;

// Output token caps per call type.
pub const MAX_TOKENS_CHAT: u32 = 500;
pub const MAX_TOKENS_BACKSTORY: u32 = 1000;
pub const MAX_TOKENS_REPORT: u32 = 10_000;
pub const MAX_TOKENS_IMPROVEMENT: u32 = 1000;

/// Total context budget (system + history + reply) for patient replies.
pub const MAX_TOTAL_TOKENS: usize = 10_000;

/// Slack kept free in the context budget for message framing.
pub const CONTEXT_SAFETY_MARGIN: usize = 100;

/// Smallest history budget worth sending.
pub const MIN_HISTORY_TOKENS: usize = 500;

/// Transcript characters included in the report prompt.
pub const REPORT_TRANSCRIPT_MAX_CHARS: usize = 3000;

pub const REPORT_SYSTEM_PROMPT: &str = "Concise therapy evaluator.";
pub const IMPROVEMENT_SYSTEM_PROMPT: &str =
    "Expert therapy supervisor providing constructive feedback.";
