//! Time-span splitter
//!
//! Cuts a call window into spans that each carry a single pricing context.
//! The passes run in a fixed order: bonus minutes, activation periods, rate
//! plans, then increment rounding. Everything here works on owned data; the
//! bucket list is a snapshot and the account is never touched.

use chrono::Duration;
use std::sync::Arc;
use tollgate_core::models::{round_to_increments, ActivationPeriod, CallDescriptor, MinuteBucket, TimeSpan};
use tracing::trace;

/// Split a call window into priced-ready spans
///
/// `periods` must be ordered by activation time. `buckets` must be in
/// consumption order and are decremented as they are carved.
pub fn split(cd: &CallDescriptor, periods: &[Arc<ActivationPeriod>], mut buckets: Vec<MinuteBucket>) -> Vec<TimeSpan> {
    let mut first = TimeSpan::new(cd.time_start, cd.time_end);
    first.call_duration = cd.call_duration.max(cd.window());
    let mut spans = vec![first];
    if spans[0].duration() <= Duration::zero() {
        return spans;
    }

    split_by_buckets(&mut spans, &mut buckets);
    if spans.iter().all(TimeSpan::is_bonus) {
        return spans;
    }

    split_by_activation(&mut spans, periods);
    split_by_plans(&mut spans);

    let spans = round_to_increments(spans);
    trace!(spans = spans.len(), "Call window split");
    spans
}

fn split_by_buckets(spans: &mut Vec<TimeSpan>, buckets: &mut [MinuteBucket]) {
    for bucket in buckets.iter_mut() {
        let mut i = 0;
        while i < spans.len() {
            if spans[i].is_bonus() {
                i += 1;
                continue;
            }
            let tail = spans[i].split_by_minute_bucket(bucket);
            let assigned = spans[i].is_bonus();
            if let Some(tail) = tail {
                spans.insert(i + 1, tail);
            }
            if !assigned || bucket.seconds.is_zero() {
                break;
            }
            i += 1;
        }
    }
}

fn split_by_activation(spans: &mut Vec<TimeSpan>, periods: &[Arc<ActivationPeriod>]) {
    let Some(start) = spans.first().map(|ts| ts.time_start) else {
        return;
    };

    for period in periods.iter().filter(|p| p.activation_time > start) {
        let mut i = 0;
        while i < spans.len() {
            if !spans[i].is_bonus() {
                if let Some(tail) = spans[i].split_by_activation_period(period) {
                    spans.insert(i + 1, tail);
                    i += 1;
                }
            }
            i += 1;
        }
    }

    for span in spans.iter_mut().filter(|ts| !ts.is_bonus()) {
        span.activation_period = active_period(periods, span);
    }
}

/// Latest period activated at the span start, else the earliest one
fn active_period(periods: &[Arc<ActivationPeriod>], span: &TimeSpan) -> Option<Arc<ActivationPeriod>> {
    periods
        .iter()
        .rev()
        .find(|p| p.activation_time <= span.time_start)
        .or_else(|| periods.first())
        .cloned()
}

fn split_by_plans(spans: &mut Vec<TimeSpan>) {
    let mut i = 0;
    while i < spans.len() {
        if spans[i].is_bonus() {
            i += 1;
            continue;
        }
        let Some(period) = spans[i].activation_period.clone() else {
            i += 1;
            continue;
        };

        loop {
            let mut changed = false;
            for plan in &period.plans {
                while let Some(tail) = spans[i].split_by_rate_plan(plan) {
                    spans.insert(i + 1, tail);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        i += 1;
    }
}
