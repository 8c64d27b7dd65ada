//! Axum request handlers for the HTTP API.
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::error::AppError;
use crate::judge::validation::{self, PromptValidationResponse, ValidatePromptParams};
use crate::prompt::constructor::{build_full_prompt, get_prompt_template, PromptTemplate};
use crate::prompt::placeholders::{extract_placeholders, validate_placeholders};
use crate::prompt::schema::OutputSchema;
use crate::relevance::client::JudgeTransport;
use crate::relevance::fields::load_known_fields;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::PromptConstruction(_) | AppError::InvalidSchema(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::QuerySet(_) => StatusCode::NOT_FOUND,
            AppError::HttpClient(_) | AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

pub async fn root() -> &'static str {
    "Judgment Prompt Proxy"
}

pub async fn list_schemas() -> Json<Value> {
    let schemas: Vec<Value> = OutputSchema::ALL
        .iter()
        .map(|s| {
            json!({
                "value": s.as_str(),
                "label": s.label(),
                "description": s.description(),
            })
        })
        .collect();
    Json(Value::Array(schemas))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholdersRequest {
    #[serde(default)]
    pub user_instructions: String,
    #[serde(default)]
    pub known_fields: Vec<String>,
}

pub async fn placeholders(Json(req): Json<PlaceholdersRequest>) -> Json<Value> {
    let placeholders = extract_placeholders(&req.user_instructions);
    let partition = validate_placeholders(&placeholders, &req.known_fields);
    Json(json!({
        "placeholders": placeholders,
        "validPlaceholders": partition.valid_placeholders,
        "invalidPlaceholders": partition.invalid_placeholders,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default)]
    pub output_schema: OutputSchema,
    #[serde(default)]
    pub user_instructions: String,
}

pub async fn build_prompt(Json(req): Json<PromptRequest>) -> Json<Value> {
    Json(json!({"prompt": build_full_prompt(req.output_schema, &req.user_instructions)}))
}

pub async fn prompt_template(Json(req): Json<PromptRequest>) -> Json<PromptTemplate> {
    Json(get_prompt_template(req.output_schema, &req.user_instructions))
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

pub async fn render_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<Value>, AppError> {
    let prompt = state.prompt_constructor.render(&req.template, &req.values)?;
    Ok(Json(json!({"prompt": prompt})))
}

/// Always 200: a failed lookup yields an empty field list.
pub async fn query_set_fields(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Json<Value> {
    let fields = load_known_fields(&state.relevance_client, &id).await;
    Json(json!({"querySetId": id, "fields": fields}))
}

/// Validation parameters plus the field constraint for the placeholder gate.
/// Explicit `knownFields` win over `querySetId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(flatten)]
    pub params: ValidatePromptParams,
    #[serde(default)]
    pub known_fields: Vec<String>,
    #[serde(default)]
    pub query_set_id: Option<String>,
}

pub async fn validate_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Json<PromptValidationResponse> {
    let known_fields = match (req.known_fields.is_empty(), req.query_set_id.as_deref()) {
        (true, Some(id)) => load_known_fields(&state.relevance_client, id).await,
        _ => req.known_fields,
    };
    let transport: &dyn JudgeTransport = &state.relevance_client;
    Json(validation::validate_prompt_gated(Some(transport), &req.params, &known_fields).await)
}
