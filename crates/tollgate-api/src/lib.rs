//! API layer for Tollgate
//!
//! HTTP handlers for rating calls, debiting accounts and driving the
//! scheduler. Handlers are generic over the storage backend so the binary
//! and the tests can mount the same routes.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

use actix_web::web;
use tollgate_core::traits::DataStorage;

pub use dto::ApiResponse;
pub use handlers::{configure_accounts, configure_rating, configure_scheduler, health_check};
pub use state::AppState;

/// Configure API routes
pub fn configure_routes<S: DataStorage + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Health check
            .route("/health", web::get().to(health_check))
            // Rating endpoints
            .configure(configure_rating::<S>)
            // Account endpoints
            .configure(configure_accounts::<S>)
            // Scheduler endpoints
            .configure(configure_scheduler::<S>),
    );
}
