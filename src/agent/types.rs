use chrono::NaiveDate;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Errors raised at the boundary with an upstream provider.
///
/// These never reach a route handler: each component turns them into an
/// absent value or a fallback and logs them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing provider credentials")]
    MissingCredentials,

    #[error("Completion response contained no choices")]
    EmptyCompletion,
}

/// Pass a provider reply through only when it is exactly `200 OK`.
///
/// Every other status, including other 2xx codes, becomes
/// [`AgentError::Upstream`] carrying the reply body.
pub async fn ensure_ok(response: Response, provider: &str) -> Result<Response, AgentError> {
    if response.status() == StatusCode::OK {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!("{} returned {}", provider, status);
    Err(AgentError::Upstream { status, body })
}

/// Read the whole body and decode it; a malformed body is a
/// [`AgentError::Serialization`], a broken transfer an [`AgentError::Http`].
pub async fn decode_json<T>(response: Response) -> Result<T, AgentError>
where
    T: DeserializeOwned,
{
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Flight search parameters pulled out of a free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightDetails {
    pub source_city: String,
    pub destination_city: String,
    pub date: NaiveDate,
}

/// How an offer is labelled in the response list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OfferTag {
    Cheapest,
    Popular,
}

/// One annotated flight option as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOffer {
    pub airline_name: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub price: f64,
    pub currency: String,
    pub tag: OfferTag,
}
