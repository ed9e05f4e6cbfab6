//! Call descriptor and call cost models

use super::duration::{self, to_seconds};
use super::rating_profile::rating_profile_key;
use super::timespan::TimeSpan;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DIRECTION_OUT: &str = "*out";
pub const DIRECTION_IN: &str = "*in";

/// What is being rated: who calls where and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    #[serde(default = "default_direction")]
    pub direction: String,
    pub tenant: String,
    #[serde(default)]
    pub category: String,
    pub subject: String,
    /// Account paying for the call, the subject when empty
    #[serde(default)]
    pub account: String,
    pub destination: String,

    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,

    /// Units requested by a debit or a max session estimate
    #[serde(default)]
    pub amount: Decimal,

    /// Position of this slice in an incrementally rated session
    #[serde(default)]
    pub loop_index: u32,

    /// Elapsed call time before `time_end` for incremental rating
    #[serde(with = "duration::seconds", default = "Duration::zero")]
    pub call_duration: Duration,

    /// Subject whose profile is tried when this one has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_subject: Option<String>,
}

fn default_direction() -> String {
    DIRECTION_OUT.to_string()
}

impl CallDescriptor {
    pub fn new(
        tenant: impl Into<String>,
        subject: impl Into<String>,
        destination: impl Into<String>,
        time_start: DateTime<Utc>,
        time_end: DateTime<Utc>,
    ) -> Self {
        Self {
            direction: default_direction(),
            tenant: tenant.into(),
            category: String::new(),
            subject: subject.into(),
            account: String::new(),
            destination: destination.into(),
            time_start,
            time_end,
            amount: Decimal::ZERO,
            loop_index: 0,
            call_duration: Duration::zero(),
            fallback_subject: None,
        }
    }

    /// Rating profile key of the subject
    pub fn key(&self) -> String {
        rating_profile_key(&self.direction, &self.tenant, &self.category, &self.subject)
    }

    /// Rating profile key of the fallback subject, if any
    pub fn fallback_key(&self) -> Option<String> {
        self.fallback_subject
            .as_deref()
            .map(|fallback| rating_profile_key(&self.direction, &self.tenant, &self.category, fallback))
    }

    pub fn account_id(&self) -> &str {
        if self.account.is_empty() {
            &self.subject
        } else {
            &self.account
        }
    }

    /// Length of the rated window
    pub fn window(&self) -> Duration {
        (self.time_end - self.time_start).max(Duration::zero())
    }
}

/// Priced result of a call descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallCost {
    pub direction: String,
    pub tenant: String,
    pub category: String,
    pub subject: String,
    pub account: String,
    pub destination: String,

    /// Destination id the number resolved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,

    /// Prefix that selected the activation periods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_prefix: Option<String>,

    /// Connect fee plus the cost of every span
    pub cost: Decimal,
    pub connect_fee: Decimal,
    pub timespans: Vec<TimeSpan>,
}

impl CallCost {
    /// Price the spans and build the call cost
    pub fn from_spans(cd: &CallDescriptor, mut timespans: Vec<TimeSpan>) -> Self {
        let connect_fee = timespans.first().map(TimeSpan::connect_fee).unwrap_or_default();
        let spans_cost: Decimal = timespans.iter_mut().map(TimeSpan::compute_cost).sum();
        Self {
            direction: cd.direction.clone(),
            tenant: cd.tenant.clone(),
            category: cd.category.clone(),
            subject: cd.subject.clone(),
            account: cd.account_id().to_string(),
            destination: cd.destination.clone(),
            destination_id: None,
            matched_prefix: None,
            cost: connect_fee + spans_cost,
            connect_fee,
            timespans,
        }
    }

    /// Total rated duration, including increment rounding
    pub fn duration(&self) -> Duration {
        self.timespans
            .iter()
            .fold(Duration::zero(), |acc, ts| acc + ts.duration())
    }

    /// Seconds paid with bonus minutes
    pub fn bonus_seconds(&self) -> Decimal {
        self.timespans
            .iter()
            .filter_map(|ts| ts.bonus.as_ref())
            .map(|bonus| bonus.quantity)
            .sum()
    }

    /// Part of the cost charged straight to the money balance
    pub fn money_cost(&self) -> Decimal {
        let bonus_cost: Decimal = self
            .timespans
            .iter()
            .filter(|ts| ts.is_bonus())
            .map(|ts| ts.cost)
            .sum();
        self.cost - bonus_cost
    }

    /// Append the cost of the following slice of the same session
    ///
    /// The following slice's connect fee is not charged again. When the
    /// boundary spans touch and share their pricing they become one span.
    pub fn merge(&mut self, other: CallCost) {
        self.cost += other.cost - other.connect_fee;
        let mut incoming = other.timespans.into_iter();

        if let (Some(last), Some(first)) = (self.timespans.last_mut(), incoming.next()) {
            let coalesce = last.time_end == first.time_start
                && !last.is_bonus()
                && !first.is_bonus()
                && last.rate_plan == first.rate_plan;
            if coalesce {
                last.time_end = first.time_end;
                last.call_duration = first.call_duration;
                last.cost += first.cost;
            } else {
                self.timespans.push(first);
            }
        }
        self.timespans.extend(incoming);
    }

    pub fn total_seconds(&self) -> Decimal {
        to_seconds(self.duration())
    }
}
