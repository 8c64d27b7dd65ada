//! Common error type and result alias.
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Search relevance backend returned {status}")]
    Backend { status: u16, body: Option<Value> },

    #[error("Prompt construction error: {0}")]
    PromptConstruction(String),

    #[error("Invalid output schema: {0}")]
    InvalidSchema(String),

    #[error("Query set error: {0}")]
    QuerySet(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
