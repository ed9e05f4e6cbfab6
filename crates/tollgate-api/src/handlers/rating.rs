//! Rating handlers
//!
//! HTTP handlers pricing calls and charging them to accounts.

use crate::dto::{ApiResponse, CallCostResponse, CallDescriptorRequest, MaxSessionResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use tollgate_core::models::CallDescriptor;
use tollgate_core::traits::DataStorage;
use tollgate_core::AppError;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn descriptor(req: &CallDescriptorRequest) -> Result<CallDescriptor, AppError> {
    req.validate().map_err(|e| {
        warn!("Call descriptor validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    req.to_descriptor()
}

/// Price a call without charging it
///
/// POST /api/v1/rating/cost
#[instrument(skip(state, req), fields(subject = %req.subject, destination = %req.destination))]
pub async fn get_cost<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    req: web::Json<CallDescriptorRequest>,
) -> Result<HttpResponse, AppError> {
    let cd = descriptor(&req)?;
    let cost = state.rating.get_cost(&cd).await?;
    debug!(cost = %cost.cost, "Cost computed");
    Ok(HttpResponse::Ok().json(ApiResponse::success(CallCostResponse::from(cost))))
}

/// Longest session the paying account can afford
///
/// POST /api/v1/rating/max-session
#[instrument(skip(state, req), fields(subject = %req.subject, destination = %req.destination))]
pub async fn max_session<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    req: web::Json<CallDescriptorRequest>,
) -> Result<HttpResponse, AppError> {
    let cd = descriptor(&req)?;
    let limit = state.rating.max_session_time(&cd).await?;
    debug!(?limit, "Max session computed");
    Ok(HttpResponse::Ok().json(ApiResponse::success(MaxSessionResponse::from(limit))))
}

/// Price a call and charge it
///
/// POST /api/v1/rating/debit
#[instrument(skip(state, req), fields(subject = %req.subject, destination = %req.destination))]
pub async fn debit<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    req: web::Json<CallDescriptorRequest>,
) -> Result<HttpResponse, AppError> {
    let cd = descriptor(&req)?;
    let cost = state.rating.debit(&cd).await?;
    info!(account_id = %cost.account, cost = %cost.cost, "Call charged");
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        CallCostResponse::from(cost),
        "Call debited",
    )))
}

/// Configure rating routes
pub fn configure<S: DataStorage + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rating")
            .route("/cost", web::post().to(get_cost::<S>))
            .route("/max-session", web::post().to(max_session::<S>))
            .route("/debit", web::post().to(debit::<S>)),
    );
}
