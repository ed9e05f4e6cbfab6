//! Scheduled action lists
//!
//! An action timing runs an action list against a set of accounts whenever
//! its calendar rule opens a window. Timings are stored in groups under a
//! key, typically the account-actions profile that created them.

use super::calendar::CalendarRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Start time keyword for "as soon as loaded"
pub const ASAP: &str = "*asap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTiming {
    #[serde(default)]
    pub id: String,

    /// Free-form label used in logs
    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub timing: CalendarRule,

    /// Start at load time instead of `timing.start_time`
    #[serde(default)]
    pub asap: bool,

    /// Lower weights run first among timings due at the same instant
    #[serde(default)]
    pub weight: f64,

    pub actions_id: String,

    #[serde(default)]
    pub account_ids: Vec<String>,

    #[serde(skip)]
    next_run: Option<DateTime<Utc>>,
}

impl ActionTiming {
    pub fn new(
        id: impl Into<String>,
        timing: CalendarRule,
        actions_id: impl Into<String>,
        account_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tag: String::new(),
            timing,
            asap: false,
            weight: 0.0,
            actions_id: actions_id.into(),
            account_ids,
            next_run: None,
        }
    }

    /// Runs once, at load, then is dropped from storage
    pub fn is_one_time(&self) -> bool {
        self.timing.has_no_date_components()
    }

    /// Pin an `*asap` timing to the load instant
    ///
    /// Returns true when the timing was changed and should be saved back.
    pub fn check_for_asap(&mut self, now: DateTime<Utc>) -> bool {
        if !self.asap {
            return false;
        }
        self.timing.start_time = Some(now.time());
        self.asap = false;
        self.next_run = Some(now);
        true
    }

    /// Next instant the timing is due, cached until `advance`
    pub fn next_start_time(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.next_run.is_none() {
            // a window opening right now counts as due
            self.next_run = self.timing.next_occurrence(now - chrono::Duration::nanoseconds(1));
        }
        self.next_run
    }

    /// Cached next run, without recomputing it
    pub fn cached_next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    /// Move past a run that fired at `fired_at`
    pub fn advance(&mut self, fired_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let previous = self.next_run.unwrap_or(fired_at);
        self.next_run = self.timing.next_occurrence(previous.max(fired_at));
        self.next_run
    }

    /// Queue order: soonest first, timings that never run again last
    pub fn queue_cmp(&self, other: &ActionTiming) -> Ordering {
        match (self.next_run, other.next_run) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.weight.total_cmp(&other.weight)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.weight.total_cmp(&other.weight),
        }
    }
}
