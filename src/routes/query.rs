//! Travel query endpoints
//!
//! `POST /query` takes a form field `user_query`. Queries mentioning a flight
//! go through extraction, airport resolution and the offers search; anything
//! else is answered directly by the completion provider. Failures are always
//! reported as HTTP 200 with an `error` field.

use axum::{
    extract::{Form, State},
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::extractor;
use crate::agent::types::FlightOffer;
use crate::server::AppState;
use crate::services::{amadeus, flight_search};

pub const FORMAT_ERROR: &str =
    "Please enter travel details in the format: 'flight from source_city to destination_city on dd/mm/yy'.";
pub const AIRPORT_ERROR: &str = "Error fetching airport codes. Please check the city names.";
pub const NO_FLIGHTS_ERROR: &str = "No flights found or error fetching flight data.";

const LANDING_PAGE: &str = include_str!("../../templates/index.html");

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub user_query: String,
}

/// Body of every `/query` reply
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Flights {
        flights: Vec<FlightOffer>,
        source_city: String,
        destination_city: String,
        /// `dd/mm/yyyy`
        date: String,
    },
    Error {
        error: String,
    },
    Answer {
        response: Option<String>,
    },
}

impl QueryResponse {
    fn error(message: &str) -> Self {
        Self::Error { error: message.to_string() }
    }
}

/// `GET /` — static landing page
pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// `POST /query`
pub async fn query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Json<QueryResponse> {
    let user_query = form.user_query;

    if is_flight_query(&user_query) {
        info!("Handling flight query");
        Json(flight_query(&state, &user_query).await)
    } else {
        info!("Handling free-form query");
        let response = extractor::extract_completion(state.completion.as_ref(), &user_query).await;
        Json(QueryResponse::Answer { response })
    }
}

fn is_flight_query(user_query: &str) -> bool {
    user_query.to_lowercase().contains("flight")
}

async fn flight_query(state: &AppState, user_query: &str) -> QueryResponse {
    let Some(details) = extractor::parse_flight_details(state.completion.as_ref(), user_query).await
    else {
        return QueryResponse::error(FORMAT_ERROR);
    };

    let source_code = amadeus::resolve_airport(state.flight_data.as_ref(), &details.source_city).await;
    let destination_code =
        amadeus::resolve_airport(state.flight_data.as_ref(), &details.destination_city).await;

    let (Some(source_code), Some(destination_code)) = (source_code, destination_code) else {
        warn!(
            "Could not resolve airports for {} -> {}",
            details.source_city, details.destination_city
        );
        return QueryResponse::error(AIRPORT_ERROR);
    };

    let flights = flight_search::search_flights(
        state.flight_data.as_ref(),
        state.rates.as_ref(),
        &source_code,
        &destination_code,
        details.date,
    )
    .await;

    match flights {
        Some(flights) if !flights.is_empty() => QueryResponse::Flights {
            flights,
            source_city: details.source_city,
            destination_city: details.destination_city,
            date: details.date.format("%d/%m/%Y").to_string(),
        },
        _ => QueryResponse::error(NO_FLIGHTS_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use axum::{
        body::{self, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::agent::ai_client::testing::ScriptedCompletion;
    use crate::services::amadeus::testing::FakeFlightData;
    use crate::services::amadeus::OffersResponse;
    use crate::services::exchange::testing::FakeRates;

    const DELHI_MUMBAI: &str = "source_city: Delhi, destination_city: Mumbai, date: 05/12/25";

    struct Harness {
        completion: Arc<ScriptedCompletion>,
        flight_data: Arc<FakeFlightData>,
        rates: Arc<FakeRates>,
    }

    impl Harness {
        fn new(reply: &str, flight_data: FakeFlightData) -> Self {
            Self {
                completion: Arc::new(ScriptedCompletion::replying(reply)),
                flight_data: Arc::new(flight_data),
                rates: Arc::new(FakeRates::default().with_rate("EUR", "INR", 90.0)),
            }
        }

        fn state(&self) -> AppState {
            AppState {
                completion: self.completion.clone(),
                flight_data: self.flight_data.clone(),
                rates: self.rates.clone(),
            }
        }

        async fn post_query(&self, form_body: &str) -> Value {
            let request = Request::builder()
                .method("POST")
                .uri("/query")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_body.to_string()))
                .unwrap();

            let response = crate::server::router(self.state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }
    }

    fn delhi_mumbai_provider() -> FakeFlightData {
        let mut provider = FakeFlightData::default();
        provider.airports.insert("Delhi".to_string(), "DEL".to_string());
        provider.airports.insert("Mumbai".to_string(), "BOM".to_string());
        provider.airlines.insert("6E".to_string(), "INDIGO".to_string());
        provider
    }

    fn one_offer() -> OffersResponse {
        serde_json::from_value(json!({
            "data": [{
                "itineraries": [{
                    "duration": "PT2H10M",
                    "segments": [{
                        "carrierCode": "6E",
                        "departure": { "at": "2025-12-05T06:00:00" },
                        "arrival": { "at": "2025-12-05T08:10:00" }
                    }]
                }],
                "price": { "total": "50.00", "currency": "EUR" }
            }]
        }))
        .unwrap()
    }

    const FLIGHT_FORM: &str = "user_query=flight+from+Delhi+to+Mumbai+on+05%2F12%2F25";

    #[tokio::test]
    async fn test_flight_query_returns_tagged_offers() {
        let provider = FakeFlightData { offers: Some(one_offer()), ..delhi_mumbai_provider() };
        let harness = Harness::new(DELHI_MUMBAI, provider);

        let body = harness.post_query(FLIGHT_FORM).await;

        assert_eq!(
            body,
            json!({
                "flights": [{
                    "airline_name": "INDIGO",
                    "departure": "2025-12-05T06:00:00",
                    "arrival": "2025-12-05T08:10:00",
                    "duration": "PT2H10M",
                    "price": 4500.0,
                    "currency": "EUR",
                    "tag": "Cheapest"
                }],
                "source_city": "Delhi",
                "destination_city": "Mumbai",
                "date": "05/12/2025"
            })
        );
        assert!(harness.flight_data.calls().contains(&"offers:DEL-BOM:2025-12-05:1".to_string()));
    }

    #[tokio::test]
    async fn test_unresolved_airport_reports_city_error() {
        let mut provider = FakeFlightData { offers: Some(one_offer()), ..Default::default() };
        provider.airports.insert("Delhi".to_string(), "DEL".to_string());
        let harness = Harness::new(DELHI_MUMBAI, provider);

        let body = harness.post_query(FLIGHT_FORM).await;

        assert_eq!(body, json!({ "error": AIRPORT_ERROR }));
        assert!(!harness.flight_data.calls().iter().any(|c| c.starts_with("offers:")));
    }

    #[tokio::test]
    async fn test_unparsable_extraction_reports_format_error() {
        let harness = Harness::new("I am not sure what you mean.", delhi_mumbai_provider());

        let body = harness.post_query("user_query=Any+FLIGHTS+soon%3F").await;

        assert_eq!(body, json!({ "error": FORMAT_ERROR }));
        assert!(harness.flight_data.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_date_reports_format_error() {
        let harness = Harness::new(
            "source_city: Delhi, destination_city: Mumbai, date: 32/01/24",
            delhi_mumbai_provider(),
        );

        let body = harness.post_query(FLIGHT_FORM).await;
        assert_eq!(body, json!({ "error": FORMAT_ERROR }));
    }

    #[tokio::test]
    async fn test_empty_or_failed_search_reports_no_flights() {
        let empty = FakeFlightData { offers: Some(OffersResponse::default()), ..delhi_mumbai_provider() };
        let body = Harness::new(DELHI_MUMBAI, empty).post_query(FLIGHT_FORM).await;
        assert_eq!(body, json!({ "error": NO_FLIGHTS_ERROR }));

        let rejected = delhi_mumbai_provider();
        let body = Harness::new(DELHI_MUMBAI, rejected).post_query(FLIGHT_FORM).await;
        assert_eq!(body, json!({ "error": NO_FLIGHTS_ERROR }));
    }

    #[tokio::test]
    async fn test_free_form_query_bypasses_flight_components() {
        let harness = Harness::new("It is sunny in Goa.", delhi_mumbai_provider());

        let body = harness.post_query("user_query=what%27s+the+weather").await;

        assert_eq!(body, json!({ "response": "It is sunny in Goa." }));
        assert!(harness.flight_data.calls().is_empty());
        assert!(harness.rates.requested().is_empty());

        let prompts = harness.completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].1, "what's the weather");
    }

    #[tokio::test]
    async fn test_free_form_provider_failure_is_null_response() {
        let harness = Harness {
            completion: Arc::new(ScriptedCompletion::failing()),
            flight_data: Arc::new(FakeFlightData::default()),
            rates: Arc::new(FakeRates::default()),
        };

        let body = harness.post_query("user_query=hello").await;
        assert_eq!(body, json!({ "response": null }));
    }

    #[tokio::test]
    async fn test_landing_page_served() {
        let harness = Harness::new("", FakeFlightData::default());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = crate::server::router(harness.state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("user_query"));
    }

    #[test]
    fn test_flight_keyword_is_case_insensitive() {
        assert!(is_flight_query("Book a FLIGHT to Goa"));
        assert!(is_flight_query("cheap flights please"));
        assert!(!is_flight_query("what's the weather"));
    }
}
