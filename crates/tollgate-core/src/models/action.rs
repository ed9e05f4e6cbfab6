//! Account actions
//!
//! Actions are the mutations that triggers and scheduled timings apply to
//! accounts. They are grouped in named lists, stored under their list id.

use super::account::{Account, AccountType};
use super::balance::BalanceCategory;
use super::bucket::MinuteBucket;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Action lists keyed by their id, fetched ahead of a mutation
pub type ActionCatalog = HashMap<String, Vec<Action>>;

/// Resource moved by a top-up or a debit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub category: BalanceCategory,

    #[serde(default)]
    pub units: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,

    /// Weight of a balance entry created by a top-up
    #[serde(default)]
    pub weight: f64,

    /// Minute bucket moved for the minutes category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<MinuteBucket>,
}

impl Movement {
    pub fn new(category: BalanceCategory, units: Decimal) -> Self {
        Self {
            category,
            units,
            expiration: None,
            weight: 0.0,
            bucket: None,
        }
    }

    pub fn with_bucket(bucket: MinuteBucket) -> Self {
        Self {
            category: BalanceCategory::Minutes,
            units: bucket.seconds,
            expiration: bucket.expiration,
            weight: bucket.weight,
            bucket: Some(bucket),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type")]
pub enum ActionKind {
    #[serde(rename = "*log")]
    Log,
    #[serde(rename = "*reset_triggers")]
    ResetTriggers,
    #[serde(rename = "*set_postpaid")]
    SetPostpaid,
    #[serde(rename = "*set_prepaid")]
    SetPrepaid,
    #[serde(rename = "*reset_postpaid")]
    ResetPostpaid,
    #[serde(rename = "*reset_prepaid")]
    ResetPrepaid,
    #[serde(rename = "*topup")]
    TopUp(Movement),
    #[serde(rename = "*topup_reset")]
    TopUpReset(Movement),
    #[serde(rename = "*debit")]
    Debit(Movement),
    #[serde(rename = "*reset_counter")]
    ResetCounter { category: BalanceCategory },
    #[serde(rename = "*reset_counters")]
    ResetCounters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub id: String,

    /// Lower weights run first
    #[serde(default)]
    pub weight: f64,

    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(id: impl Into<String>, weight: f64, kind: ActionKind) -> Self {
        Self {
            id: id.into(),
            weight,
            kind,
        }
    }

    pub fn apply(&self, account: &mut Account, now: DateTime<Utc>) {
        match &self.kind {
            ActionKind::Log => {
                info!(
                    account_id = %account.id,
                    account_type = %account.account_type,
                    money = %account.balance(BalanceCategory::Money, now),
                    buckets = account.minute_buckets.len(),
                    action_id = %self.id,
                    "Account snapshot"
                );
            }
            ActionKind::ResetTriggers => account.reset_triggers(),
            ActionKind::SetPostpaid => account.account_type = AccountType::Postpaid,
            ActionKind::SetPrepaid => account.account_type = AccountType::Prepaid,
            ActionKind::ResetPostpaid => account.reset(AccountType::Postpaid),
            ActionKind::ResetPrepaid => account.reset(AccountType::Prepaid),
            ActionKind::TopUp(movement) => top_up(account, movement),
            ActionKind::TopUpReset(movement) => {
                account.reset_category(movement.category);
                top_up(account, movement);
            }
            ActionKind::Debit(movement) => match (&movement.category, &movement.bucket) {
                (BalanceCategory::Minutes, Some(bucket)) => {
                    account.debit_bucket_seconds(&bucket.destination_id, bucket.seconds)
                }
                (category, _) => account.debit_unchecked(*category, movement.units, now),
            },
            ActionKind::ResetCounter { category } => account.reset_counter(*category),
            ActionKind::ResetCounters => account.unit_counters.clear(),
        }
    }
}

fn top_up(account: &mut Account, movement: &Movement) {
    match (&movement.category, &movement.bucket) {
        (BalanceCategory::Minutes, Some(bucket)) => account.add_minute_bucket(bucket.clone()),
        (category, _) => account.credit(*category, movement.units, movement.expiration, movement.weight),
    }
}

/// Apply a list in ascending weight order
pub fn apply_actions(actions: &[Action], account: &mut Account, now: DateTime<Utc>) {
    let mut ordered: Vec<&Action> = actions.iter().collect();
    ordered.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    for action in ordered {
        action.apply(account, now);
    }
}
