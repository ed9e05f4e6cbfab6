//! Rate plan model
//!
//! A rate plan (rate interval) is a calendar-scoped pricing rule carrying a
//! connect fee, a rounding policy and ordered price tiers. A tier becomes
//! active once the elapsed call time reaches its `group_interval_start`.

use super::calendar::CalendarRule;
use super::duration::{self, secs};
use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Price tier of a rate plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// Elapsed call time from which this tier applies
    #[serde(with = "duration::seconds", default = "Duration::zero")]
    pub group_interval_start: Duration,

    /// Price of one rate unit
    pub value: Decimal,

    /// Billing granularity
    #[serde(with = "duration::seconds", default = "one_second")]
    pub rate_increment: Duration,

    /// Duration charged `value`
    #[serde(with = "duration::seconds", default = "one_second")]
    pub rate_unit: Duration,
}

fn one_second() -> Duration {
    secs(1)
}

impl Rate {
    pub fn new(
        group_interval_start: Duration,
        value: Decimal,
        rate_increment: Duration,
        rate_unit: Duration,
    ) -> Self {
        Self {
            group_interval_start,
            value,
            rate_increment,
            rate_unit,
        }
    }

    fn unit(&self) -> Duration {
        if self.rate_unit > Duration::zero() {
            self.rate_unit
        } else {
            one_second()
        }
    }

    /// Effective price of one second
    pub fn price_per_second(&self) -> Decimal {
        self.value / duration::to_seconds(self.unit())
    }

    /// Duration rounded up to a whole number of increments
    pub fn billed_duration(&self, duration: Duration) -> Duration {
        let increment = self.rate_increment;
        if increment <= Duration::zero() || duration <= Duration::zero() {
            return duration.max(Duration::zero());
        }
        match (duration.num_nanoseconds(), increment.num_nanoseconds()) {
            (Some(d), Some(inc)) => Duration::nanoseconds(((d + inc - 1) / inc) * inc),
            _ => duration,
        }
    }

    /// Unrounded cost of a duration under this tier
    pub fn cost(&self, duration: Duration) -> Decimal {
        let billed = duration::to_seconds(self.billed_duration(duration));
        billed / duration::to_seconds(self.unit()) * self.value
    }
}

/// Rounding applied once to every priced span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundingMethod {
    #[serde(rename = "*up")]
    Up,
    #[default]
    #[serde(rename = "*middle")]
    Middle,
    #[serde(rename = "*down")]
    Down,
}

impl RoundingMethod {
    pub fn round(self, value: Decimal, decimals: u32) -> Decimal {
        let strategy = match self {
            RoundingMethod::Up => RoundingStrategy::AwayFromZero,
            RoundingMethod::Middle => RoundingStrategy::MidpointAwayFromZero,
            RoundingMethod::Down => RoundingStrategy::ToZero,
        };
        value.round_dp_with_strategy(decimals, strategy)
    }
}

impl std::fmt::Display for RoundingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundingMethod::Up => write!(f, "*up"),
            RoundingMethod::Middle => write!(f, "*middle"),
            RoundingMethod::Down => write!(f, "*down"),
        }
    }
}

fn default_rounding_decimals() -> u32 {
    4
}

/// Calendar-scoped pricing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePlan {
    #[serde(default)]
    pub id: String,

    /// When the plan is valid
    #[serde(default)]
    pub timing: CalendarRule,

    /// Priority against overlapping plans (higher wins)
    #[serde(default)]
    pub weight: f64,

    /// Charged once per call
    #[serde(default)]
    pub connect_fee: Decimal,

    #[serde(default)]
    pub rounding_method: RoundingMethod,

    #[serde(default = "default_rounding_decimals")]
    pub rounding_decimals: u32,

    /// Price tiers ordered by `group_interval_start`
    pub rates: Vec<Rate>,
}

impl RatePlan {
    /// Plan valid at any time with the given tiers
    pub fn with_rates(id: impl Into<String>, rates: Vec<Rate>) -> Self {
        let mut plan = Self {
            id: id.into(),
            timing: CalendarRule::always(),
            weight: 0.0,
            connect_fee: Decimal::ZERO,
            rounding_method: RoundingMethod::default(),
            rounding_decimals: default_rounding_decimals(),
            rates,
        };
        plan.sort_rates();
        plan
    }

    pub fn sort_rates(&mut self) {
        self.rates
            .sort_by(|a, b| a.group_interval_start.cmp(&b.group_interval_start));
    }

    /// Tier active at the given elapsed call time
    ///
    /// The tier with the greatest `group_interval_start` not after
    /// `group_start`; `None` if every tier starts later.
    pub fn rate_at(&self, group_start: Duration) -> Option<&Rate> {
        self.rates
            .iter()
            .filter(|r| r.group_interval_start <= group_start)
            .max_by(|a, b| a.group_interval_start.cmp(&b.group_interval_start))
    }

    /// Per-second price at the given elapsed call time, used for tie-breaks
    pub fn price_at(&self, group_start: Duration) -> Option<Decimal> {
        self.rate_at(group_start).map(Rate::price_per_second)
    }

    /// Rounded cost of a span starting at `group_start` elapsed seconds
    pub fn cost(&self, duration: Duration, group_start: Duration) -> Decimal {
        match self.rate_at(group_start) {
            Some(rate) => self
                .rounding_method
                .round(rate.cost(duration), self.rounding_decimals),
            None => Decimal::ZERO,
        }
    }
}
