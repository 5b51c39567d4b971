//! # Travel Assistant Server
//!
//! Answers free-text travel questions over HTTP. Queries that mention a flight
//! are turned into an Amadeus one-way search (cities extracted by an Azure
//! OpenAI deployment, prices converted to INR); everything else is answered
//! by the model directly.
//!
//! ## Architecture
//! - `server`: Router, CORS and listener setup
//! - `config`: Environment variable configuration
//! - `agent`: Completion client and flight query extraction
//! - `services`: Amadeus, exchange rate and flight search pipeline
//! - `routes`: HTTP route handlers
//!   - `health`: Health check endpoint
//!   - `query`: Landing page and `/query`
//!
//! ## Environment Setup
//! Put the settings in `.env` or the process environment:
//! ```bash
//! AZURE_OPENAI_ENDPOINT=https://<resource>.openai.azure.com/
//! AZURE_OPENAI_KEY=...
//! AZURE_OPENAI_DEPLOYMENT_NAME=gpt35turbo16k
//! AMADEUS_API_KEY=...
//! AMADEUS_API_SECRET=...
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! curl -d "user_query=flight from Delhi to Mumbai on 05/12/25" http://localhost:3000/query
//! ```

mod server;
mod routes;
mod services;
mod agent;
mod config;

use tracing_subscriber::{ EnvFilter, layer::SubscriberExt, util::SubscriberInitExt };

/// Application entry point.
///
/// Loads `.env`, initializes tracing, validates configuration and starts the
/// HTTP server. Missing completion settings abort startup before anything
/// is served.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the variables may come from the environment
    dotenv::dotenv().ok();

    tracing_subscriber
        ::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt
                ::layer()
                .with_target(false)
                .compact()
        )
        .init();

    tracing::info!("🏁 Starting travel assistant...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    server::start(config).await
}
