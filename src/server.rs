//! # Server Module
//!
//! HTTP server setup and route configuration for the travel assistant.

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use axum::{Router, routing::{get, post}};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::{AzureOpenAiClient, CompletionClient};
use crate::config::Config;
use crate::routes::{health::ping, query};
use crate::services::{AmadeusClient, ExchangeRateClient, FlightDataApi, RateSource};

/// Application state shared across all route handlers.
///
/// Holds the upstream clients only; no per-request data outlives a request.
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionClient>,
    pub flight_data: Arc<dyn FlightDataApi>,
    pub rates: Arc<dyn RateSource>,
}

impl AppState {
    /// Build the provider clients from startup configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.server.request_timeout_secs);

        let completion = AzureOpenAiClient::new(&config.llm, timeout)
            .context("Failed to create Azure OpenAI client")?;
        let flight_data = AmadeusClient::new(&config.amadeus, timeout)
            .context("Failed to create Amadeus client")?;
        let rates = ExchangeRateClient::new(&config.exchange, timeout)
            .context("Failed to create exchange rate client")?;

        if config.amadeus.client_id.is_none() || config.amadeus.client_secret.is_none() {
            tracing::warn!("AMADEUS_API_KEY/AMADEUS_API_SECRET not set, flight searches will fail");
        }

        Ok(Self {
            completion: Arc::new(completion),
            flight_data: Arc::new(flight_data),
            rates: Arc::new(rates),
        })
    }
}

/// Routes plus the CORS layer, without binding a socket
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query::index))
        .route("/query", post(query::query))
        .route("/ping", get(ping)) // Health check endpoint
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            axum::http::Method::GET,
                            axum::http::Method::POST,
                            axum::http::Method::OPTIONS,
                        ])
                        .allow_headers([
                            axum::http::header::ORIGIN,
                            axum::http::header::CONTENT_TYPE,
                            axum::http::header::ACCEPT,
                        ])
                )
        )
        .with_state(state)
}

/// Starts the travel assistant HTTP server.
///
/// Binds to the configured host and port and serves until the process is
/// terminated.
pub async fn start(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("✈️  Travel assistant starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🧭 Completion deployment: {}", config.llm.deployment);
    tracing::info!("🌐 Flight data provider: {}", config.amadeus.base_url);
    if config.exchange.api_key.is_some() {
        tracing::debug!("EXCHANGE_API_KEY is set; {} does not require it", config.exchange.base_url);
    }

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
