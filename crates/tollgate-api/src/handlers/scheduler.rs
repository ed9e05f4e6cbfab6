//! Scheduler handlers

use crate::dto::{ApiResponse, ReloadResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use tollgate_core::traits::DataStorage;
use tollgate_core::AppError;
use tracing::{info, instrument};

/// Reload action timings from storage
///
/// POST /api/v1/scheduler/reload
#[instrument(skip(state))]
pub async fn reload<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
) -> Result<HttpResponse, AppError> {
    let queued = state.scheduler.reload().await?;
    info!(queued, "Scheduler reloaded");
    Ok(HttpResponse::Ok().json(ApiResponse::success(ReloadResponse { queued })))
}

pub fn configure<S: DataStorage + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/scheduler").route("/reload", web::post().to(reload::<S>)));
}
