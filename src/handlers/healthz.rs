use actix_web::HttpResponse;
use chrono::Utc;

use crate::api::{HealthResponse, Response};

use super::convert_response;

/// Liveness probe, the only api route besides login that skips
/// authentication.
pub async fn get_healthz_handler() -> HttpResponse {
    let now = Utc::now().timestamp() as u64;
    convert_response(Response::with_data(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
    }))
}
