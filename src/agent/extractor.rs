//! Flight query extraction
//!
//! Asks the completion provider to restate a free-text travel request as
//! `source_city: X, destination_city: Y, date: dd/mm/yy` and parses that reply.
//! The model's output is untrusted: anything that does not match the exact
//! shape is rejected as a whole.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

use crate::agent::ai_client::CompletionClient;
use crate::agent::types::FlightDetails;

pub const SYSTEM_PROMPT: &str = "You are a helpful travel assistant.";

static DETAILS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)source_city: (\w+(?:\s\w+)*), destination_city: (\w+(?:\s\w+)*), date: (\d{2}/\d{2}/\d{2})",
    )
    .expect("flight details pattern is valid")
});

/// Run a single-turn completion and return its text, or `None` when the
/// provider gave nothing back.
pub async fn extract_completion(client: &dyn CompletionClient, prompt: &str) -> Option<String> {
    match client.complete(SYSTEM_PROMPT, prompt).await {
        Ok(content) => Some(content),
        Err(e) => {
            error!("Completion request failed: {}", e);
            None
        }
    }
}

/// Ask the model for the flight triple and parse it.
///
/// Returns `None` unless all three of source, destination and a valid
/// calendar date were recovered.
pub async fn parse_flight_details(
    client: &dyn CompletionClient,
    input_text: &str,
) -> Option<FlightDetails> {
    let prompt = extraction_prompt(input_text);
    let result = extract_completion(client, &prompt).await.unwrap_or_default();

    info!("Extracted details: {}", result);

    parse_extracted_details(&result)
}

fn extraction_prompt(input_text: &str) -> String {
    format!(
        "Extract the source city, destination city, and date from this message: '{}' in the format 'source_city: X, destination_city: Y, date: dd/mm/yy'.",
        input_text
    )
}

/// Parse the model's reply into flight details
pub fn parse_extracted_details(text: &str) -> Option<FlightDetails> {
    let Some(captures) = DETAILS_PATTERN.captures(text) else {
        error!("Pattern did not match the extracted details.");
        return None;
    };

    let date_str = &captures[3];
    let Some(date) = parse_short_date(date_str) else {
        error!("Date parsing error for {}: not a valid dd/mm/yy date", date_str);
        return None;
    };

    Some(FlightDetails {
        source_city: captures[1].to_string(),
        destination_city: captures[2].to_string(),
        date,
    })
}

/// Parse `dd/mm/yy`. Two-digit years 00-68 land in 2000-2068 and 69-99 in
/// 1969-1999, the POSIX `%y` pivot.
fn parse_short_date(date_str: &str) -> Option<NaiveDate> {
    let mut parts = date_str.split('/');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    // `\d` also matches non-ASCII digits; those fail here
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let year = if year <= 68 { 2000 + year } else { 1900 + year };

    NaiveDate::from_ymd_opt(year, month, day)
}
