use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status": "pong"}`
///
/// Does not touch any upstream provider, so it stays green while Amadeus or
/// the completion deployment are unavailable.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_reports_pong() {
        let Json(body) = ping().await;
        assert_eq!(body, json!({ "status": "pong" }));
    }
}
