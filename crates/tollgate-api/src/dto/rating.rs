//! Rating DTOs
//!
//! Request and response types for the cost, max session and debit endpoints.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tollgate_core::models::call::DIRECTION_OUT;
use tollgate_core::models::{CallCost, CallDescriptor, TimeSpan};
use tollgate_core::{AppError, AppResult};
use tollgate_services::SessionLimit;
use validator::Validate;

/// Longest call window, max session request or elapsed time accepted (31 days)
pub const MAX_CALL_SECONDS: i64 = 2_678_400;

/// Call descriptor as sent by clients
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CallDescriptorRequest {
    /// `*out` or `*in`
    #[serde(default = "default_direction")]
    #[validate(length(min = 1, max = 16))]
    pub direction: String,

    #[validate(length(min = 1, max = 64, message = "Tenant is required"))]
    pub tenant: String,

    #[serde(default)]
    #[validate(length(max = 64))]
    pub category: String,

    #[validate(length(min = 1, max = 64, message = "Subject is required"))]
    pub subject: String,

    /// Paying account, the subject when absent
    pub account: Option<String>,

    /// Dialed number
    #[validate(length(min = 1, max = 64, message = "Destination is required"))]
    pub destination: String,

    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,

    /// Requested seconds for max session estimates
    #[serde(default)]
    pub amount: Decimal,

    /// Seconds already elapsed before `time_end` in an ongoing session
    #[serde(default)]
    #[validate(range(min = 0, max = 2_678_400))]
    pub call_duration: i64,

    pub fallback_subject: Option<String>,
}

fn default_direction() -> String {
    DIRECTION_OUT.to_string()
}

impl CallDescriptorRequest {
    /// Convert to a call descriptor, checking what `validate` cannot
    pub fn to_descriptor(&self) -> AppResult<CallDescriptor> {
        if self.time_end < self.time_start {
            return Err(AppError::InvalidInput(
                "time_end must not be before time_start".to_string(),
            ));
        }
        if self.time_end - self.time_start > Duration::seconds(MAX_CALL_SECONDS) {
            return Err(AppError::InvalidInput(format!(
                "call window must not exceed {} seconds",
                MAX_CALL_SECONDS
            )));
        }
        if self.amount < Decimal::ZERO || self.amount > Decimal::from(MAX_CALL_SECONDS) {
            return Err(AppError::InvalidInput(format!(
                "amount must be between 0 and {}",
                MAX_CALL_SECONDS
            )));
        }
        let call_duration = Duration::try_seconds(self.call_duration)
            .ok_or_else(|| AppError::InvalidInput("call_duration is out of range".to_string()))?;

        let mut cd = CallDescriptor::new(
            self.tenant.clone(),
            self.subject.clone(),
            self.destination.clone(),
            self.time_start,
            self.time_end,
        );
        cd.direction = self.direction.clone();
        cd.category = self.category.clone();
        cd.account = self.account.clone().unwrap_or_default();
        cd.amount = self.amount;
        cd.call_duration = call_duration;
        cd.fallback_subject = self.fallback_subject.clone();
        Ok(cd)
    }
}

/// One priced span
#[derive(Debug, Clone, Serialize)]
pub struct TimeSpanResponse {
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub duration_seconds: i64,
    pub cost: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_seconds: Option<Decimal>,
}

impl From<TimeSpan> for TimeSpanResponse {
    fn from(ts: TimeSpan) -> Self {
        Self {
            time_start: ts.time_start,
            time_end: ts.time_end,
            duration_seconds: ts.duration().num_seconds(),
            cost: ts.cost,
            rate_plan_id: ts.rate_plan.map(|plan| plan.id),
            bonus_destination_id: ts.bonus.as_ref().map(|b| b.destination_id.clone()),
            bonus_seconds: ts.bonus.map(|b| b.quantity),
        }
    }
}

/// Priced call
#[derive(Debug, Clone, Serialize)]
pub struct CallCostResponse {
    pub direction: String,
    pub tenant: String,
    pub subject: String,
    pub account: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_prefix: Option<String>,
    pub cost: Decimal,
    pub connect_fee: Decimal,
    /// Part of the cost charged to the money balance
    pub money_cost: Decimal,
    pub bonus_seconds: Decimal,
    pub duration_seconds: Decimal,
    pub timespans: Vec<TimeSpanResponse>,
}

impl From<CallCost> for CallCostResponse {
    fn from(cc: CallCost) -> Self {
        let money_cost = cc.money_cost();
        let bonus_seconds = cc.bonus_seconds();
        let duration_seconds = cc.total_seconds();
        Self {
            direction: cc.direction,
            tenant: cc.tenant,
            subject: cc.subject,
            account: cc.account,
            destination: cc.destination,
            destination_id: cc.destination_id,
            matched_prefix: cc.matched_prefix,
            cost: cc.cost,
            connect_fee: cc.connect_fee,
            money_cost,
            bonus_seconds,
            duration_seconds,
            timespans: cc.timespans.into_iter().map(Into::into).collect(),
        }
    }
}

/// Longest affordable session
#[derive(Debug, Clone, Serialize)]
pub struct MaxSessionResponse {
    pub unlimited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<Decimal>,
}

impl From<SessionLimit> for MaxSessionResponse {
    fn from(limit: SessionLimit) -> Self {
        match limit {
            SessionLimit::Unlimited => Self {
                unlimited: true,
                seconds: None,
            },
            SessionLimit::Seconds(seconds) => Self {
                unlimited: false,
                seconds: Some(seconds),
            },
        }
    }
}
