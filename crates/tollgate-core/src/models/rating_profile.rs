//! Rating profile model
//!
//! A rating profile binds a subject (direction, tenant, category, subject) to
//! activation periods per destination. An activation period is a set of rate
//! plans effective from its activation time until a later period supersedes
//! it.

use super::rate::RatePlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rate plans effective from `activation_time` onward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationPeriod {
    pub activation_time: DateTime<Utc>,
    #[serde(default)]
    pub plans: Vec<RatePlan>,
}

impl ActivationPeriod {
    pub fn new(activation_time: DateTime<Utc>, plans: Vec<RatePlan>) -> Self {
        let mut period = Self {
            activation_time,
            plans,
        };
        period.sort_plan_rates();
        period
    }

    pub fn sort_plan_rates(&mut self) {
        for plan in &mut self.plans {
            plan.sort_rates();
        }
    }
}

/// Rating configuration of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingProfile {
    /// `direction:tenant:category:subject`
    pub id: String,

    /// Activation periods keyed by destination id
    #[serde(default)]
    pub destination_map: HashMap<String, Vec<ActivationPeriod>>,

    /// Profile consulted when nothing here matches the destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_key: Option<String>,
}

impl RatingProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            destination_map: HashMap::new(),
            fallback_key: None,
        }
    }

    /// Attach periods to a destination, kept ordered by activation time
    pub fn add_activation_periods(
        &mut self,
        destination_id: impl Into<String>,
        periods: impl IntoIterator<Item = ActivationPeriod>,
    ) {
        let entry = self.destination_map.entry(destination_id.into()).or_default();
        entry.extend(periods);
        entry.sort_by_key(|p| p.activation_time);
    }

    pub fn activation_periods(&self, destination_id: &str) -> Option<&[ActivationPeriod]> {
        self.destination_map
            .get(destination_id)
            .map(Vec::as_slice)
            .filter(|periods| !periods.is_empty())
    }
}

/// Key of a rating profile
pub fn rating_profile_key(direction: &str, tenant: &str, category: &str, subject: &str) -> String {
    format!("{}:{}:{}:{}", direction, tenant, category, subject)
}
