//! # Services Module
//!
//! Upstream provider clients and the flight search pipeline built on them.

pub mod amadeus;
pub mod exchange;
pub mod flight_search;

pub use amadeus::{AmadeusClient, FlightDataApi};
pub use exchange::{ExchangeRateClient, RateSource};
