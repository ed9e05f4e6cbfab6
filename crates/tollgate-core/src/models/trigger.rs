//! Action triggers
//!
//! A trigger watches a counter or a balance of its account and runs an action
//! list once its threshold is reached. It then stays executed until reset.

use super::balance::BalanceCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a trigger compares against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThresholdType {
    /// Usage counter reached the threshold
    #[default]
    #[serde(rename = "*max_counter")]
    MaxCounter,
    /// Usage counter fell to the threshold
    #[serde(rename = "*min_counter")]
    MinCounter,
    #[serde(rename = "*max_balance")]
    MaxBalance,
    #[serde(rename = "*min_balance")]
    MinBalance,
}

impl ThresholdType {
    pub fn watches_counter(self) -> bool {
        matches!(self, ThresholdType::MaxCounter | ThresholdType::MinCounter)
    }

    pub fn is_met(self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            ThresholdType::MaxCounter | ThresholdType::MaxBalance => value >= threshold,
            ThresholdType::MinCounter | ThresholdType::MinBalance => value <= threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrigger {
    #[serde(default)]
    pub id: String,

    pub category: BalanceCategory,

    /// Restricts a minutes trigger to one destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,

    pub threshold_value: Decimal,

    #[serde(default)]
    pub threshold_type: ThresholdType,

    /// Lower weights are evaluated first
    #[serde(default)]
    pub weight: f64,

    pub actions_id: String,

    #[serde(default)]
    pub executed: bool,
}

impl ActionTrigger {
    pub fn new(
        id: impl Into<String>,
        category: BalanceCategory,
        threshold_value: Decimal,
        actions_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            destination_id: None,
            threshold_value,
            threshold_type: ThresholdType::default(),
            weight: 0.0,
            actions_id: actions_id.into(),
            executed: false,
        }
    }

    pub fn is_met(&self, value: Decimal) -> bool {
        self.threshold_type.is_met(value, self.threshold_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_threshold_comparisons() {
        let mut at = ActionTrigger::new("t", BalanceCategory::Money, dec!(2), "TOPUP10");
        assert!(!at.is_met(dec!(1)));
        assert!(at.is_met(dec!(2)));

        at.threshold_type = ThresholdType::MinBalance;
        assert!(at.is_met(dec!(1)));
        assert!(!at.is_met(dec!(3)));
        assert!(!at.threshold_type.watches_counter());
    }

    #[test]
    fn test_trigger_deserialize_defaults() {
        let json = r#"{"category":"*minutes","destination_id":"NAT","threshold_value":"100","actions_id":"RESET"}"#;
        let at: ActionTrigger = serde_json::from_str(json).unwrap();
        assert_eq!(at.threshold_type, ThresholdType::MaxCounter);
        assert!(!at.executed);
        assert_eq!(at.destination_id.as_deref(), Some("NAT"));
    }
}
