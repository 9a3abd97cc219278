use actix_web::{get, HttpResponse};
use chrono::Utc;

use crate::types::HealthResponse;

/// Liveness probe; does not touch the store
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
