//! Account handlers
//!
//! HTTP handlers for account endpoints.

use crate::dto::{AccountDebitRequest, AccountDebitResponse, AccountResponse, ApiResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use tollgate_core::traits::DataStorage;
use tollgate_core::AppError;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Get a single account by ID
///
/// GET /api/v1/accounts/{id}
#[instrument(skip(state))]
pub async fn get_account<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let account_id = path.into_inner();
    debug!(account_id = %account_id, "Fetching account");

    let account = state.accounts.get_account(&account_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(AccountResponse::from(account))))
}

/// Debit one balance category
///
/// POST /api/v1/accounts/{id}/debit
#[instrument(skip(state, req))]
pub async fn debit_account<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    path: web::Path<String>,
    req: web::Json<AccountDebitRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Debit validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let account_id = path.into_inner();
    let outcome = state
        .accounts
        .debit(&account_id, req.category, req.amount, req.prefix.as_deref())
        .await?;

    info!(account_id = %account_id, category = %req.category, amount = %req.amount, "Account debited");
    Ok(HttpResponse::Ok().json(ApiResponse::success(AccountDebitResponse::from(outcome))))
}

/// Run a stored action list on an account
///
/// POST /api/v1/accounts/{id}/actions/{actions_id}
#[instrument(skip(state))]
pub async fn execute_actions<S: DataStorage + 'static>(
    state: web::Data<AppState<S>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (account_id, actions_id) = path.into_inner();
    let account = state
        .accounts
        .execute_actions(&account_id, &actions_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        AccountResponse::from(account),
        format!("Actions {} executed", actions_id),
    )))
}

/// Configure account routes
pub fn configure<S: DataStorage + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("/{id}", web::get().to(get_account::<S>))
            .route("/{id}/debit", web::post().to(debit_account::<S>))
            .route(
                "/{id}/actions/{actions_id}",
                web::post().to(execute_actions::<S>),
            ),
    );
}
