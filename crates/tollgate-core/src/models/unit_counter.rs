//! Usage counters watched by action triggers

use super::balance::BalanceCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-destination sub-total of a minutes counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterBucket {
    pub destination_id: String,
    pub seconds: Decimal,
}

/// Consumption of one category since the last reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitsCounter {
    pub category: BalanceCategory,

    #[serde(default)]
    pub units: Decimal,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub minute_buckets: Vec<CounterBucket>,
}

impl UnitsCounter {
    pub fn new(category: BalanceCategory) -> Self {
        Self {
            category,
            units: Decimal::ZERO,
            minute_buckets: Vec::new(),
        }
    }

    /// Count units, also per destination when one is known
    pub fn add(&mut self, units: Decimal, destination_id: Option<&str>) {
        self.units += units;
        let Some(destination_id) = destination_id else {
            return;
        };
        match self
            .minute_buckets
            .iter_mut()
            .find(|b| b.destination_id == destination_id)
        {
            Some(bucket) => bucket.seconds += units,
            None => self.minute_buckets.push(CounterBucket {
                destination_id: destination_id.to_string(),
                seconds: units,
            }),
        }
    }

    /// Total, or the sub-total of one destination
    pub fn units_for(&self, destination_id: Option<&str>) -> Decimal {
        match destination_id {
            None => self.units,
            Some(id) => self
                .minute_buckets
                .iter()
                .filter(|b| b.destination_id == id)
                .map(|b| b.seconds)
                .sum(),
        }
    }
}
