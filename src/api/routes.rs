//! Router setup and shared state.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::prompt::constructor::PromptConstructor;
use crate::relevance::client::RelevanceClient;

pub struct AppState {
    pub relevance_client: RelevanceClient,
    pub prompt_constructor: PromptConstructor,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/schemas", get(handlers::list_schemas))
        .route("/placeholders", post(handlers::placeholders))
        .route("/prompt/build", post(handlers::build_prompt))
        .route("/prompt/template", post(handlers::prompt_template))
        .route("/prompt/render", post(handlers::render_prompt))
        .route("/prompt/validate", post(handlers::validate_prompt))
        .route("/query_sets/:id/fields", get(handlers::query_set_fields))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
