//! Amadeus Flight Data Service
//!
//! Client-credential tokens, airport and airline reference lookups, and the
//! flight offers search. Every operation asks for a fresh token; nothing is
//! cached between calls.

use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::agent::types::{AgentError, decode_json, ensure_ok};
use crate::config::AmadeusConfig;

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub data: Vec<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(rename = "iataCode")]
    pub iata_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirlinesResponse {
    #[serde(default)]
    pub data: Vec<Airline>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Airline {
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
}

/// Flight offers search response. `data` is absent on some error bodies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffersResponse {
    pub data: Option<Vec<RawOffer>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOffer {
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    pub price: Option<OfferPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Itinerary {
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// A single flight leg. Every field is optional so that one incomplete leg
/// does not reject the whole offers response.
#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(rename = "carrierCode")]
    pub carrier_code: Option<String>,
    pub departure: Option<SegmentEndpoint>,
    pub arrival: Option<SegmentEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentEndpoint {
    pub at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferPrice {
    /// Decimal string exactly as quoted, e.g. `"100.00"`
    pub total: String,
    pub currency: String,
}

/// One-way search parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub adults: u32,
}

impl OfferQuery {
    pub fn one_way(origin: &str, destination: &str, departure_date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date,
            adults: 1,
        }
    }
}

/// Raw access to the flight data provider.
///
/// Any non-200 reply surfaces as [`AgentError::Upstream`].
#[async_trait]
pub trait FlightDataApi: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenResponse, AgentError>;

    async fn search_locations(&self, token: &str, keyword: &str) -> Result<LocationsResponse, AgentError>;

    async fn lookup_airlines(&self, token: &str, airline_codes: &str) -> Result<AirlinesResponse, AgentError>;

    async fn flight_offers(&self, token: &str, query: &OfferQuery) -> Result<OffersResponse, AgentError>;
}

pub struct AmadeusClient {
    client: Client,
    base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl AmadeusClient {
    pub fn new(config: &AmadeusConfig, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    async fn get_json<T>(&self, token: &str, path: &str, query: &[(&str, String)]) -> Result<T, AgentError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let response = ensure_ok(response, &format!("Amadeus {}", path)).await?;
        decode_json(response).await
    }
}

#[async_trait]
impl FlightDataApi for AmadeusClient {
    async fn fetch_token(&self) -> Result<TokenResponse, AgentError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(AgentError::MissingCredentials);
        };

        let path = "/v1/security/oauth2/token";
        let response = self.client
            .post(format!("{}{}", self.base_url, path))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?;

        let response = ensure_ok(response, &format!("Amadeus {}", path)).await?;
        decode_json(response).await
    }

    async fn search_locations(&self, token: &str, keyword: &str) -> Result<LocationsResponse, AgentError> {
        self.get_json(
            token,
            "/v1/reference-data/locations",
            &[("subType", "AIRPORT".to_string()), ("keyword", keyword.to_string())],
        )
        .await
    }

    async fn lookup_airlines(&self, token: &str, airline_codes: &str) -> Result<AirlinesResponse, AgentError> {
        self.get_json(
            token,
            "/v1/reference-data/airlines",
            &[("airlineCodes", airline_codes.to_string())],
        )
        .await
    }

    async fn flight_offers(&self, token: &str, query: &OfferQuery) -> Result<OffersResponse, AgentError> {
        self.get_json(
            token,
            "/v2/shopping/flight-offers",
            &[
                ("originLocationCode", query.origin.clone()),
                ("destinationLocationCode", query.destination.clone()),
                ("departureDate", query.departure_date.format("%Y-%m-%d").to_string()),
                ("adults", query.adults.to_string()),
            ],
        )
        .await
    }
}

/// Obtain a fresh bearer token, or `None` when the exchange is refused.
pub async fn get_token(api: &dyn FlightDataApi) -> Option<String> {
    match api.fetch_token().await {
        Ok(token) => Some(token.access_token),
        Err(e) => {
            warn!("Amadeus token request failed: {}", e);
            None
        }
    }
}

/// Resolve a city name to the IATA code of its first matching airport.
pub async fn resolve_airport(api: &dyn FlightDataApi, city_name: &str) -> Option<String> {
    let token = get_token(api).await?;

    match api.search_locations(&token, city_name).await {
        Ok(locations) => {
            let code = locations.data.into_iter().next().map(|l| l.iata_code);
            if code.is_none() {
                debug!("No airport found for {}", city_name);
            }
            code
        }
        Err(e) => {
            warn!("Airport lookup for {} failed: {}", city_name, e);
            None
        }
    }
}

/// Resolve an airline code to its common name. Falls back to the code itself.
pub async fn resolve_airline(api: &dyn FlightDataApi, airline_code: &str) -> String {
    let Some(token) = get_token(api).await else {
        return airline_code.to_string();
    };

    match api.lookup_airlines(&token, airline_code).await {
        Ok(airlines) => airlines
            .data
            .into_iter()
            .next()
            .and_then(|a| a.common_name)
            .unwrap_or_else(|| {
                debug!("No airline name for {}, using code", airline_code);
                airline_code.to_string()
            }),
        Err(e) => {
            warn!("Airline lookup for {} failed: {}", airline_code, e);
            airline_code.to_string()
        }
    }
}
