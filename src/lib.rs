//! Prompt-template engine for LLM search-relevance judgments.
//!
//! Modules:
//! - `prompt`: Output schemas, `{{placeholder}}` extraction/validation, and
//!   prompt assembly.
//! - `relevance`: Thin client for the search-relevance backend and the
//!   query-set field loader.
//! - `judge`: Trial validation of a prompt against a judge model.
//! - `session`: Caller-owned editing state tying the pieces together.
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `RelevanceClient`,
//! `PromptConstructor`, `OutputSchema`, and `PromptSession`.
pub mod api;
pub mod config;
pub mod error;
pub mod judge;
pub mod prompt;
pub mod relevance;
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use prompt::constructor::{build_full_prompt, get_prompt_template, PromptConstructor, PromptTemplate};
pub use prompt::placeholders::{extract_placeholders, validate_placeholders, PlaceholderPartition};
pub use prompt::schema::OutputSchema;
pub use relevance::client::RelevanceClient;
pub use session::PromptSession;
