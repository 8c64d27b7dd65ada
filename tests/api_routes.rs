//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use hyper::Body;
use judgment_prompt_proxy::api::routes::{router, AppState};
use judgment_prompt_proxy::{PromptConstructor, RelevanceClient};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(base_url: String) -> axum::Router {
    router(Arc::new(AppState {
        relevance_client: RelevanceClient::new(base_url),
        prompt_constructor: PromptConstructor::new(),
    }))
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn placeholders_endpoint_partitions() {
    let (status, body) = post_json(
        app("http://127.0.0.1:9".to_string()),
        "/placeholders",
        json!({"userInstructions": "Rate {{queryText}} and {{badField}}", "knownFields": ["queryText", "category"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placeholders"], json!(["queryText", "badField"]));
    assert_eq!(body["validPlaceholders"], json!(["queryText"]));
    assert_eq!(body["invalidPlaceholders"], json!(["badField"]));
}

#[tokio::test]
async fn build_and_template_endpoints() {
    let (status, body) = post_json(
        app("http://127.0.0.1:9".to_string()),
        "/prompt/build",
        json!({"outputSchema": "RELEVANT_IRRELEVANT", "userInstructions": "Focus on {{queryText}}"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("IRRELEVANT"));
    assert!(prompt.contains("Focus on {{queryText}}\n\n"));

    let (_, template) = post_json(
        app("http://127.0.0.1:9".to_string()),
        "/prompt/template",
        json!({"outputSchema": "SCORE_1_5", "userInstructions": "{{a}} {{ a }} {{b}}"}),
    )
    .await;
    assert_eq!(template["outputSchema"], "SCORE_1_5");
    assert_eq!(template["placeholders"], json!(["a", "b"]));
    assert_eq!(template["userInstructions"], "{{a}} {{ a }} {{b}}");
}

#[tokio::test]
async fn render_endpoint_rejects_missing_value() {
    let (status, body) = post_json(
        app("http://127.0.0.1:9".to_string()),
        "/prompt/render",
        json!({"template": "{{queryText}} / {{category}}", "values": {"queryText": "shoes"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn validate_endpoint_reports_precondition_failure() {
    let (status, body) = post_json(
        app("http://127.0.0.1:9".to_string()),
        "/prompt/validate",
        json!({"modelId": "m", "outputSchema": "SCORE_0_1", "userInstructions": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No search configuration selected");
}

#[tokio::test]
async fn fields_endpoint_fails_open() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/relevancy/query_sets/qs-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "querySetQueries": [{"queryText": "a", "_id": "1"}]
        })))
        .mount(&mock_server)
        .await;

    let (status, body) = get_json(app(mock_server.uri()), "/query_sets/qs-1/fields").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fields"], json!(["queryText"]));

    let (status, body) = get_json(app(mock_server.uri()), "/query_sets/unknown/fields").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fields"], json!([]));
}

#[tokio::test]
async fn schemas_endpoint_lists_all() {
    let (status, body) = get_json(app("http://127.0.0.1:9".to_string()), "/schemas").await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<&str> = body.as_array().unwrap().iter().filter_map(|s| s["value"].as_str()).collect();
    assert_eq!(values, vec!["SCORE_1_5", "SCORE_0_1", "RELEVANT_IRRELEVANT"]);
}

#[tokio::test]
async fn validate_endpoint_blocks_unknown_placeholders_before_calling_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/relevancy/query_sets/qs-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "querySetQueries": [{"queryText": "a", "category": "b"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "rawResponse": "[]"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = json!({
        "modelId": "m",
        "searchConfigurationList": ["sc"],
        "userInstructions": "Rate {{queryText}} and {{badField}}",
        "placeholderValues": {"queryText": "a", "badField": "b"},
        "knownFields": ["queryText", "category"]
    });
    let (status, body) = post_json(app(mock_server.uri()), "/prompt/validate", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unknown placeholders: badField");

    let request = json!({
        "modelId": "m",
        "searchConfigurationList": ["sc"],
        "userInstructions": "Rate {{queryText}} and {{badField}}",
        "placeholderValues": {"queryText": "a", "badField": "b"},
        "querySetId": "qs-1"
    });
    let (_, body) = post_json(app(mock_server.uri()), "/prompt/validate", request).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unknown placeholders: badField");

    let request = json!({
        "modelId": "m",
        "searchConfigurationList": ["sc"],
        "userInstructions": "Rate {{queryText}} in {{category}}",
        "placeholderValues": {"queryText": "a"},
        "knownFields": ["queryText", "category"]
    });
    let (_, body) = post_json(app(mock_server.uri()), "/prompt/validate", request).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing sample values for: category");
}
