/// Health check endpoint
///
/// Reports process liveness plus database connectivity, so a load balancer
/// can distinguish "up but cut off from the store" from "up".

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,

    /// Crate version
    pub version: String,

    /// Database connectivity: "connected" or "disconnected"
    pub database: String,
}

/// GET /health
///
/// Returns 200 when the database answers, 503 when it does not. The body is
/// the same shape either way.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = trousseau_shared::db::pool::health_check(&state.db)
        .await
        .is_ok();

    let response = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        version: trousseau_shared::VERSION.to_string(),
        database: if database_ok {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            database: "connected".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
    }
}
