//! Balance model
//!
//! Each account holds one balance chain per category. A chain is a list of
//! entries that may expire independently; the spendable balance of a category
//! is the sum of its unexpired entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of resource a balance holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceCategory {
    #[serde(rename = "*monetary")]
    Money,
    #[serde(rename = "*sms")]
    Sms,
    #[serde(rename = "*data")]
    Data,
    #[serde(rename = "*data_time")]
    DataTime,
    #[serde(rename = "*minutes")]
    Minutes,
}

impl fmt::Display for BalanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceCategory::Money => write!(f, "*monetary"),
            BalanceCategory::Sms => write!(f, "*sms"),
            BalanceCategory::Data => write!(f, "*data"),
            BalanceCategory::DataTime => write!(f, "*data_time"),
            BalanceCategory::Minutes => write!(f, "*minutes"),
        }
    }
}

impl BalanceCategory {
    /// Parse from the wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "*monetary" => Some(BalanceCategory::Money),
            "*sms" => Some(BalanceCategory::Sms),
            "*data" => Some(BalanceCategory::Data),
            "*data_time" => Some(BalanceCategory::DataTime),
            "*minutes" => Some(BalanceCategory::Minutes),
            _ => None,
        }
    }
}

/// One entry of a balance chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default = "new_balance_id")]
    pub id: String,

    pub value: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,

    /// Entries with a higher weight are spent first
    #[serde(default)]
    pub weight: f64,
}

fn new_balance_id() -> String {
    Uuid::new_v4().to_string()
}

impl Balance {
    pub fn new(value: Decimal, expiration: Option<DateTime<Utc>>, weight: f64) -> Self {
        Self {
            id: new_balance_id(),
            value,
            expiration,
            weight,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

/// Ordered entries of one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceChain(pub Vec<Balance>);

impl BalanceChain {
    pub fn with_value(value: Decimal) -> Self {
        Self(vec![Balance::new(value, None, 0.0)])
    }

    pub fn entries(&self) -> &[Balance] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Spendable value at `now`
    pub fn total(&self, now: DateTime<Utc>) -> Decimal {
        self.0
            .iter()
            .filter(|b| !b.is_expired(now))
            .map(|b| b.value)
            .sum()
    }

    /// Spending order: weight desc, then the soonest expiration first
    fn spend_order(&self, now: DateTime<Utc>) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.0.len())
            .filter(|&i| !self.0[i].is_expired(now))
            .collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.0[a], &self.0[b]);
            b.weight.total_cmp(&a.weight).then_with(|| {
                match (a.expiration, b.expiration) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            })
        });
        order
    }

    /// Take `amount` from the chain without any check
    ///
    /// Entries are drained in spending order; whatever is left lands on the
    /// last unexpired entry, which may go negative. A negative amount credits
    /// the first entry.
    pub fn debit(&mut self, amount: Decimal, now: DateTime<Utc>) {
        if amount.is_zero() {
            return;
        }
        let order = self.spend_order(now);
        let Some((&last, rest)) = order.split_last() else {
            self.0.push(Balance::new(-amount, None, 0.0));
            return;
        };
        if amount < Decimal::ZERO {
            self.0[order[0]].value -= amount;
            return;
        }

        let mut remaining = amount;
        for &i in rest {
            let available = self.0[i].value.max(Decimal::ZERO);
            let taken = available.min(remaining);
            self.0[i].value -= taken;
            remaining -= taken;
            if remaining.is_zero() {
                return;
            }
        }
        self.0[last].value -= remaining;
    }

    /// Add value, merging into the entry with the same expiration
    pub fn credit(&mut self, amount: Decimal, expiration: Option<DateTime<Utc>>, weight: f64) {
        match self.0.iter_mut().find(|b| b.expiration == expiration) {
            Some(existing) => existing.value += amount,
            None => self.0.push(Balance::new(amount, expiration, weight)),
        }
    }

    pub fn clean_expired(&mut self, now: DateTime<Utc>) {
        self.0.retain(|b| !b.is_expired(now));
    }
}
