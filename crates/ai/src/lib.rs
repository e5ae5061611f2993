//! Psyclinic AI - simulated patient orchestration on AWS Bedrock.
//!
//! This crate turns a patient profile into a role-play persona, produces the
//! patient's replies during a practice session, and scores the finished
//! session with a competency report plus per-turn supervisor feedback.
//!
//! # Architecture
//!
//! - `model`: `LanguageModelTrait` seam plus unconfigured and scripted backends
//! - `bedrock`: Bedrock runtime backend (Anthropic Messages format)
//! - `tokens`: Context budgeting for patient replies
//! - `persona`: Backstory request and persona system prompt
//! - `report`: Competency rubric and report prompt
//! - `feedback`: Per-turn improvement prompts and parsing
//! - `simulation`: `SimulationService`, the orchestrator used by the server
//! - `types`: Shared DTOs used by the HTTP layer
//!
//! # Example
//!
//! ```ignore
//! use psyclinic_ai::{BedrockConfig, BedrockModel, SimulationConfig, SimulationService};
//!
//! let model = BedrockModel::connect(&BedrockConfig {
//!     region: Some("us-east-1".into()),
//!     ..Default::default()
//! })
//! .await?;
//! let service = SimulationService::new(Arc::new(model), SimulationConfig::default());
//!
//! let setup = service.start_session(&profile).await?;
//! let reply = service.reply(&setup.system_prompt, history).await?;
//! ```

pub mod bedrock;
pub mod constants;
pub mod error;
pub mod feedback;
pub mod model;
pub mod persona;
pub mod report;
pub mod simulation;
pub mod tokens;
pub mod types;

pub use bedrock::{BedrockConfig, BedrockModel};
pub use error::AiError;
pub use model::{LanguageModelTrait, ScriptedModel, UnconfiguredModel};
pub use simulation::{SimulationConfig, SimulationService};
pub use types::{ChatRole, ChatTurn, CompletionRequest, PerformanceReport, SessionSetup, TurnFeedback};
