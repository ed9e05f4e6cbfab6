//! Account DTOs
//!
//! Request and response types for account endpoints.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tollgate_core::models::{
    Account, AccountType, ActionTrigger, BalanceCategory, MinuteBucket, UnitsCounter,
};
use tollgate_services::DebitOutcome;
use validator::Validate;

/// Direct debit of one balance category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountDebitRequest {
    /// `*monetary`, `*sms`, `*data`, `*data_time` or `*minutes`
    pub category: BalanceCategory,

    /// Units to take, negative to give back
    pub amount: Decimal,

    /// Dialed number, required for minutes
    #[validate(length(min = 2, max = 64))]
    pub prefix: Option<String>,
}

/// Account with its spendable totals
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Unexpired total per category
    pub balances: HashMap<BalanceCategory, Decimal>,
    pub minute_buckets: Vec<MinuteBucket>,
    pub unit_counters: Vec<UnitsCounter>,
    pub action_triggers: Vec<ActionTrigger>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let now = Utc::now();
        let balances = account
            .balances
            .iter()
            .map(|(category, chain)| (*category, chain.total(now)))
            .collect();
        Self {
            id: account.id,
            account_type: account.account_type,
            balances,
            minute_buckets: account.minute_buckets,
            unit_counters: account.unit_counters,
            action_triggers: account.action_triggers,
        }
    }
}

/// Result of a direct debit
#[derive(Debug, Clone, Serialize)]
pub struct AccountDebitResponse {
    pub account: AccountResponse,
    /// Balance of the debited category, absent for minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

impl From<DebitOutcome> for AccountDebitResponse {
    fn from(outcome: DebitOutcome) -> Self {
        Self {
            account: outcome.account.into(),
            balance: outcome.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tollgate_core::models::BalanceChain;

    #[test]
    fn test_debit_request_parsing() {
        let req: AccountDebitRequest =
            serde_json::from_str(r#"{"category": "*minutes", "amount": "6", "prefix": "0256"}"#).unwrap();
        assert_eq!(req.category, BalanceCategory::Minutes);
        assert_eq!(req.amount, dec!(6));
        assert!(req.validate().is_ok());

        let req: AccountDebitRequest =
            serde_json::from_str(r#"{"category": "*minutes", "amount": "6", "prefix": "0"}"#).unwrap();
        assert!(req.validate().is_err());

        assert!(serde_json::from_str::<AccountDebitRequest>(r#"{"category": "*gold", "amount": "1"}"#).is_err());
    }

    #[test]
    fn test_account_response_totals() {
        let mut account = Account::new("rif", AccountType::Prepaid);
        account
            .balances
            .insert(BalanceCategory::Money, BalanceChain::with_value(dec!(21)));

        let response = AccountResponse::from(account);
        assert_eq!(response.balances[&BalanceCategory::Money], dec!(21));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "*prepaid");
        assert_eq!(json["balances"]["*monetary"], "21");
    }
}
