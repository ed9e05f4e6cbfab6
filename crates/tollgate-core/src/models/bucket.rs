//! Minute bucket model
//!
//! A minute bucket is a prepaid allowance of seconds scoped to one
//! destination. Priced buckets also draw money from the account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a bucket price is meant to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceType {
    /// Percentage of the standard price
    #[serde(rename = "*percent")]
    Percent,
    /// Absolute price per second
    #[default]
    #[serde(rename = "*absolute")]
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBucket {
    #[serde(default)]
    pub seconds: Decimal,

    #[serde(default)]
    pub weight: f64,

    /// Per-second price, zero for free minutes
    #[serde(default)]
    pub price: Decimal,

    #[serde(default)]
    pub price_type: PriceType,

    pub destination_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,

    /// Length of the prefix that matched during the last lookup
    #[serde(skip)]
    pub precision: usize,
}

impl MinuteBucket {
    pub fn new(destination_id: impl Into<String>, seconds: Decimal, weight: f64, price: Decimal) -> Self {
        Self {
            seconds,
            weight,
            price,
            price_type: PriceType::Absolute,
            destination_id: destination_id.into(),
            expiration: None,
            precision: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }

    /// Seconds this bucket can give for the available credit
    pub fn seconds_for_credit(&self, credit: Decimal) -> Decimal {
        if self.price > Decimal::ZERO {
            (credit / self.price).min(self.seconds).max(Decimal::ZERO)
        } else {
            self.seconds
        }
    }

    /// Same allowance kind, ignoring the remaining seconds
    pub fn same_kind(&self, other: &MinuteBucket) -> bool {
        self.destination_id == other.destination_id
            && self.weight == other.weight
            && self.price == other.price
            && self.price_type == other.price_type
            && self.expiration == other.expiration
    }

    /// Consumption priority: weight desc, precision desc, price asc
    pub fn priority_cmp(&self, other: &MinuteBucket) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.precision.cmp(&self.precision))
            .then_with(|| self.price.cmp(&other.price))
    }
}

/// Sort buckets into consumption order
pub fn sort_by_priority(buckets: &mut [MinuteBucket]) {
    buckets.sort_by(MinuteBucket::priority_cmp);
}
