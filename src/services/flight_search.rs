//! Flight Search Orchestrator
//!
//! Fetches one-way offers, resolves airline names, converts prices to INR
//! and tags the cheapest offers.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::agent::types::{FlightOffer, OfferTag};
use crate::services::amadeus::{self, FlightDataApi, OfferQuery, RawOffer};
use crate::services::exchange::{self, RateSource};

/// Search one-way offers for a single adult.
///
/// `None` when no token could be obtained or the search was rejected. A
/// successful reply without offers gives an empty list.
pub async fn search_flights(
    api: &dyn FlightDataApi,
    rates: &dyn RateSource,
    source_code: &str,
    destination_code: &str,
    date: NaiveDate,
) -> Option<Vec<FlightOffer>> {
    let token = amadeus::get_token(api).await?;
    let query = OfferQuery::one_way(source_code, destination_code, date);

    let response = match api.flight_offers(&token, &query).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Flight offers search {}->{} failed: {}", source_code, destination_code, e);
            return None;
        }
    };

    let raw_offers = response.data.unwrap_or_default();
    let cheapest_total = cheapest_total(&raw_offers);
    info!(
        "Received {} offers {}->{} on {}",
        raw_offers.len(), source_code, destination_code, date
    );

    let mut flights = Vec::with_capacity(raw_offers.len());
    for raw in &raw_offers {
        if let Some(offer) = annotate_offer(api, rates, raw, cheapest_total.as_deref()).await {
            flights.push(offer);
        }
    }

    Some(flights)
}

/// Lexical minimum of the quoted totals, compared exactly as the provider
/// formats them.
fn cheapest_total(offers: &[RawOffer]) -> Option<String> {
    offers
        .iter()
        .filter_map(|offer| offer.price.as_ref().map(|p| p.total.as_str()))
        .min()
        .map(str::to_string)
}

fn tag_for(total: &str, cheapest_total: Option<&str>) -> OfferTag {
    if cheapest_total == Some(total) {
        OfferTag::Cheapest
    } else {
        OfferTag::Popular
    }
}

async fn annotate_offer(
    api: &dyn FlightDataApi,
    rates: &dyn RateSource,
    raw: &RawOffer,
    cheapest_total: Option<&str>,
) -> Option<FlightOffer> {
    // Only the first leg of the first itinerary is reported
    let Some((itinerary, segment)) = raw
        .itineraries
        .first()
        .and_then(|itinerary| itinerary.segments.first().map(|segment| (itinerary, segment)))
    else {
        warn!("Skipping offer without itinerary segments");
        return None;
    };
    let Some(price) = raw.price.as_ref() else {
        warn!("Skipping offer without price");
        return None;
    };
    let (Some(carrier_code), Some(departure), Some(arrival)) = (
        segment.carrier_code.as_deref(),
        segment.departure.as_ref().and_then(|d| d.at.clone()),
        segment.arrival.as_ref().and_then(|a| a.at.clone()),
    ) else {
        warn!("Skipping offer with incomplete first segment");
        return None;
    };
    let amount: f64 = match price.total.parse() {
        Ok(amount) => amount,
        Err(_) => {
            warn!("Skipping offer with unparsable total {:?}", price.total);
            return None;
        }
    };

    let airline_name = amadeus::resolve_airline(api, carrier_code).await;
    let converted = exchange::convert_to_inr(rates, amount, &price.currency).await;

    Some(FlightOffer {
        airline_name,
        departure,
        arrival,
        duration: itinerary.duration.clone().unwrap_or_default(),
        price: converted.unwrap_or(amount),
        currency: price.currency.clone(),
        tag: tag_for(&price.total, cheapest_total),
    })
}
