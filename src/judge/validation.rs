//! Trial run of a prompt template against a judge model.
//!
//! `validate_prompt` never returns an error: preconditions, remote rejections
//! and transport failures all come back as a failed `PromptValidationResponse`
//! so a bad trial run cannot take the editor down with it.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::prompt::placeholders::{extract_placeholders, missing_sample_values, validate_placeholders};
use crate::prompt::schema::OutputSchema;
use crate::relevance::client::{JudgeTransport, ValidatePromptRequest};

pub const DEFAULT_SIZE: u32 = 5;
pub const DEFAULT_TOKEN_LIMIT: u32 = 4000;

pub const NO_MODEL_SELECTED: &str = "No model selected";
pub const NO_TRANSPORT: &str = "No transport available";
pub const NO_SEARCH_CONFIGURATION: &str = "No search configuration selected";
pub const NO_MODEL_RESPONSE: &str = "No response returned from model";
pub const VALIDATION_FAILED: &str = "Validation failed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatePromptParams {
    pub model_id: Option<String>,
    pub placeholder_values: BTreeMap<String, String>,
    pub search_configuration_list: Vec<String>,
    pub context_fields: Vec<String>,
    pub size: Option<u32>,
    pub token_limit: Option<u32>,
    pub ignore_failure: Option<bool>,
    pub output_schema: OutputSchema,
    pub user_instructions: String,
}

impl ValidatePromptParams {
    /// Request body for the backend. The raw instructions are sent, not the
    /// assembled prompt.
    pub fn to_request(&self, model_id: &str) -> ValidatePromptRequest {
        ValidatePromptRequest {
            model_id: model_id.to_string(),
            prompt_template: self.user_instructions.clone(),
            placeholder_values: self.placeholder_values.clone(),
            search_configuration_list: self.search_configuration_list.clone(),
            context_fields: self.context_fields.clone(),
            size: self.size.unwrap_or(DEFAULT_SIZE),
            token_limit: self.token_limit.unwrap_or(DEFAULT_TOKEN_LIMIT),
            ignore_failure: self.ignore_failure.unwrap_or(false),
            llm_judgment_rating_type: self.output_schema.judgment_rating_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptValidationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl PromptValidationResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        PromptValidationResponse {
            success: false,
            output: None,
            error: Some(error.into()),
            raw_response: None,
        }
    }
}

pub async fn validate_prompt(
    transport: Option<&dyn JudgeTransport>,
    params: &ValidatePromptParams,
) -> PromptValidationResponse {
    let Some(model_id) = params.model_id.as_deref().filter(|m| !m.trim().is_empty()) else {
        return PromptValidationResponse::failure(NO_MODEL_SELECTED);
    };
    let Some(transport) = transport else {
        return PromptValidationResponse::failure(NO_TRANSPORT);
    };
    if params.search_configuration_list.is_empty() {
        return PromptValidationResponse::failure(NO_SEARCH_CONFIGURATION);
    }

    let request = params.to_request(model_id);
    match transport.validate_prompt(&request).await {
        Ok(response) => interpret_response(response),
        Err(e) => {
            tracing::error!("Prompt validation failed: {:?}", e);
            PromptValidationResponse::failure(extract_error_message(&e))
        }
    }
}

/// Local placeholder gate: unknown placeholders, or placeholders still
/// lacking a sample value, block the trial run before any I/O.
pub fn placeholder_gate(
    placeholders: &[String],
    known_fields: &[String],
    values: &BTreeMap<String, String>,
) -> Option<PromptValidationResponse> {
    let partition = validate_placeholders(placeholders, known_fields);
    if !partition.is_ready() {
        return Some(PromptValidationResponse::failure(format!(
            "Unknown placeholders: {}",
            partition.invalid_placeholders.join(", ")
        )));
    }
    let missing = missing_sample_values(placeholders, values);
    if !missing.is_empty() {
        return Some(PromptValidationResponse::failure(format!(
            "Missing sample values for: {}",
            missing.join(", ")
        )));
    }
    None
}

/// `validate_prompt` behind the placeholder gate. `known_fields` empty means
/// no field constraint.
pub async fn validate_prompt_gated(
    transport: Option<&dyn JudgeTransport>,
    params: &ValidatePromptParams,
    known_fields: &[String],
) -> PromptValidationResponse {
    let placeholders = extract_placeholders(&params.user_instructions);
    if let Some(blocked) = placeholder_gate(&placeholders, known_fields, &params.placeholder_values) {
        tracing::info!("Prompt validation blocked: {}", blocked.error.as_deref().unwrap_or_default());
        return blocked;
    }
    validate_prompt(transport, params).await
}

fn interpret_response(response: Value) -> PromptValidationResponse {
    if response.get("success").and_then(Value::as_bool) != Some(true) {
        let reason = response
            .get("error")
            .or_else(|| response.get("message"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_MODEL_RESPONSE);
        return PromptValidationResponse::failure(reason);
    }

    let raw_response = match response.get("rawResponse").and_then(Value::as_str) {
        Some(raw) => raw.to_string(),
        None => {
            let full = response.get("fullResponse").unwrap_or(&response);
            serde_json::to_string_pretty(full).unwrap_or_else(|_| full.to_string())
        }
    };
    PromptValidationResponse {
        success: true,
        output: Some(response),
        error: None,
        raw_response: Some(raw_response),
    }
}

/// Human-readable message for a failed validate-prompt call.
///
/// Priority: body `message`, then body `error.message`, then the error's own
/// message, then a fixed fallback. A backend rejection only carries a status
/// of its own, so without a usable body it gets the fallback. A distinct
/// detail string from the body is appended as `"\n\nDetails: ..."`.
pub fn extract_error_message(err: &AppError) -> String {
    let body = match err {
        AppError::Backend { body: Some(body), .. } => Some(body),
        _ => None,
    };

    let message = body
        .and_then(|b| {
            b.get("message")
                .and_then(Value::as_str)
                .or_else(|| b.pointer("/error/message").and_then(Value::as_str))
                .or_else(|| b.as_str())
        })
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match err {
            AppError::Backend { .. } => VALIDATION_FAILED.to_string(),
            other => other.to_string(),
        });

    match body.and_then(error_details) {
        Some(details) if details != message => format!("{}\n\nDetails: {}", message, details),
        _ => message,
    }
}

fn error_details(body: &Value) -> Option<String> {
    [
        "/attributes/error",
        "/attributes/error/reason",
        "/attributes/reason",
        "/error/reason",
        "/details",
    ]
    .iter()
    .filter_map(|ptr| body.pointer(ptr).and_then(Value::as_str))
    .find(|s| !s.trim().is_empty())
    .map(str::to_string)
}
