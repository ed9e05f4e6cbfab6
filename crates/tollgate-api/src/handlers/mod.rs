//! HTTP request handlers

pub mod account;
pub mod rating;
pub mod scheduler;

use crate::dto::HealthResponse;
use actix_web::HttpResponse;

pub use account::configure as configure_accounts;
pub use rating::configure as configure_rating;
pub use scheduler::configure as configure_scheduler;

/// Health check endpoint
///
/// GET /api/v1/health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "tollgate",
        version: env!("CARGO_PKG_VERSION"),
    })
}
