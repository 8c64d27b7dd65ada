//! Thin HTTP client for the search-relevance backend.
//!
//! - `get_query_set` fetches `/api/relevancy/query_sets/{id}`.
//! - `validate_prompt` posts a trial judgment to
//!   `/api/relevancy/judgments/validate_prompt`.
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::prompt::schema::LlmRatingType;

pub const QUERY_SETS_PATH: &str = "/api/relevancy/query_sets";
pub const VALIDATE_PROMPT_PATH: &str = "/api/relevancy/judgments/validate_prompt";

/// Body of a validate-prompt call, in the backend's camelCase vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromptRequest {
    pub model_id: String,
    pub prompt_template: String,
    pub placeholder_values: BTreeMap<String, String>,
    pub search_configuration_list: Vec<String>,
    pub context_fields: Vec<String>,
    pub size: u32,
    pub token_limit: u32,
    pub ignore_failure: bool,
    pub llm_judgment_rating_type: LlmRatingType,
}

/// Sends a validate-prompt request to whatever judges it.
#[async_trait]
pub trait JudgeTransport: Send + Sync {
    async fn validate_prompt(&self, request: &ValidatePromptRequest) -> AppResult<Value>;
}

/// Resolves a query set by identifier.
#[async_trait]
pub trait QuerySetSource: Send + Sync {
    async fn get_query_set(&self, id: &str) -> AppResult<Value>;
}

#[derive(Clone)]
pub struct RelevanceClient {
    client: Client,
    base_url: String,
}

impl RelevanceClient {
    pub fn new(base_url: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        RelevanceClient { client: Client::new(), base_url: base }
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> AppResult<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(RelevanceClient { client, base_url: base })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a single query set. The id becomes one percent-encoded path
    /// segment, so `?`, `#` and `/` cannot change which resource is addressed.
    pub fn query_set_url(&self, id: &str) -> AppResult<Url> {
        let invalid = || AppError::QuerySet(format!("Invalid query set id: '{}'", id));
        if id.trim().is_empty() || id == "." || id == ".." {
            return Err(invalid());
        }
        let mut url = Url::parse(&format!("{}{}", self.base_url, QUERY_SETS_PATH))
            .map_err(|e| AppError::QuerySet(format!("Invalid backend URL: {}", e)))?;
        url.path_segments_mut().map_err(|_| invalid())?.push(id);
        Ok(url)
    }

    /// Fetch a query set document as JSON.
    pub async fn get_query_set(&self, id: &str) -> AppResult<Value> {
        let url = self.query_set_url(id)?;
        tracing::debug!("Fetching query set from {}", url);
        let response = self.client.get(url).send().await?;
        Self::json_or_backend_error(response).await
    }

    /// Post a validate-prompt request and return the backend's JSON reply.
    pub async fn validate_prompt(&self, request: &ValidatePromptRequest) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, VALIDATE_PROMPT_PATH);
        tracing::info!("Validating prompt with model {} at {}", request.model_id, url);
        tracing::debug!("Validate payload: {:?}", request);
        let response = self
            .client
            .post(&url)
            // Dashboards rejects writes without this header.
            .header("osd-xsrf", "true")
            .json(request)
            .send()
            .await?;
        Self::json_or_backend_error(response).await
    }

    async fn json_or_backend_error(response: Response) -> AppResult<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).ok().or_else(|| {
            if text.trim().is_empty() {
                None
            } else {
                Some(Value::String(text))
            }
        });
        tracing::error!("Backend request failed. Status: {}, Body: {:?}", status, body);
        Err(AppError::Backend { status: status.as_u16(), body })
    }
}

#[async_trait]
impl JudgeTransport for RelevanceClient {
    async fn validate_prompt(&self, request: &ValidatePromptRequest) -> AppResult<Value> {
        RelevanceClient::validate_prompt(self, request).await
    }
}

#[async_trait]
impl QuerySetSource for RelevanceClient {
    async fn get_query_set(&self, id: &str) -> AppResult<Value> {
        RelevanceClient::get_query_set(self, id).await
    }
}
