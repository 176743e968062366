use crate::config::Config;
use crate::data::coingecko::MarketClient;
use crate::engine::Engine;
use crate::model::gemini::GeminiClient;
use crate::routes::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod analytics;
mod config;
mod data;
mod engine;
mod error;
mod forecast;
mod model;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,augur=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;

    let model = GeminiClient::new(
        &config.gemini_api_url,
        &config.gemini_model,
        &config.gemini_api_key,
    );
    let engine = Engine::new(
        MarketClient::new(&config.coingecko_api_url),
        Arc::new(model),
        config.history_hours,
    );
    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = routes::router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, model = %config.gemini_model, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
