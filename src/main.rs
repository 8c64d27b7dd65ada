use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use judgment_prompt_proxy::{
    api::routes::{router, AppState},
    Config, PromptConstructor, RelevanceClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Config::dotenv_load();
    let config = Config::from_env();
    Config::log_env_vars();

    let relevance_client = RelevanceClient::with_timeout(config.relevance_url.clone(), config.request_timeout())?;
    let state = Arc::new(AppState {
        relevance_client,
        prompt_constructor: PromptConstructor::new(),
    });
    let app = router(state);

    let socket_address = config.socket_addr();
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
