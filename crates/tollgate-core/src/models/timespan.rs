//! Time span model
//!
//! A time span is a contiguous `[time_start, time_end)` slice of a call that
//! carries exactly one pricing context: a rate plan or bonus-minute info.
//! `call_duration` is the elapsed call time at `time_end`, which is what tiered
//! plans key on.
//!
//! The split primitives here operate on one span and return the newly cut
//! tail, if any. Driving them over a whole call lives in the rating service.

use super::bucket::MinuteBucket;
use super::duration::{self, from_seconds, to_seconds};
use super::rate::RatePlan;
use super::rating_profile::ActivationPeriod;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bonus minutes consumed by a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusInfo {
    pub destination_id: String,
    /// Seconds taken from the bucket
    pub quantity: Decimal,
    /// Per-second price of the bucket
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,

    #[serde(default)]
    pub cost: Decimal,

    /// Activation period the plans are taken from
    #[serde(skip)]
    pub activation_period: Option<Arc<ActivationPeriod>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_plan: Option<RatePlan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<BonusInfo>,

    /// Elapsed call time at `time_end`
    #[serde(with = "duration::seconds", default = "Duration::zero")]
    pub call_duration: Duration,
}

impl TimeSpan {
    pub fn new(time_start: DateTime<Utc>, time_end: DateTime<Utc>) -> Self {
        Self {
            time_start,
            time_end,
            cost: Decimal::ZERO,
            activation_period: None,
            rate_plan: None,
            bonus: None,
            call_duration: Duration::zero(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.time_end - self.time_start
    }

    /// Strictly inside the span; both ends excluded
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t > self.time_start && t < self.time_end
    }

    pub fn is_bonus(&self) -> bool {
        self.bonus.is_some()
    }

    /// Elapsed call time at `time_start`
    pub fn group_start(&self) -> Duration {
        (self.call_duration - self.duration()).max(Duration::zero())
    }

    /// Elapsed call time at `time_end`
    pub fn group_end(&self) -> Duration {
        self.call_duration
    }

    /// Cut the span at `at`, returning the tail `[at, time_end)`
    ///
    /// The tail inherits the activation period but no pricing context. The
    /// elapsed time of the head is reduced by the tail's duration.
    pub fn split_at(&mut self, at: DateTime<Utc>) -> TimeSpan {
        let mut tail = TimeSpan::new(at, self.time_end);
        tail.activation_period = self.activation_period.clone();
        tail.call_duration = self.call_duration;
        self.time_end = at;
        self.call_duration = (self.call_duration - tail.duration()).max(Duration::zero());
        tail
    }

    /// Attach a plan unless the current one takes precedence
    ///
    /// A candidate wins over the current plan with a strictly greater weight,
    /// or with an equal weight and a strictly lower per-second price at the
    /// span's elapsed-time position.
    pub fn set_rate_plan(&mut self, plan: &RatePlan) {
        let replace = match &self.rate_plan {
            None => true,
            Some(current) if plan.weight > current.weight => true,
            Some(current) if plan.weight == current.weight => {
                let at = self.group_start();
                match (plan.price_at(at), current.price_at(at)) {
                    (Some(candidate), Some(existing)) => candidate < existing,
                    (Some(_), None) => true,
                    _ => false,
                }
            }
            Some(_) => false,
        };
        if replace {
            self.rate_plan = Some(plan.clone());
        }
    }

    /// Split the span according to how it relates to a rate plan
    ///
    /// Returns the new tail span when a split happened. The plan attaches to
    /// whichever part lies inside its calendar rule, and a span carrying the
    /// plan is further cut on the plan's tier boundaries.
    pub fn split_by_rate_plan(&mut self, plan: &RatePlan) -> Option<TimeSpan> {
        let timing = &plan.timing;
        let start_in = timing.contains(self.time_start);
        let end_in = timing.contains_end(self.time_end);

        if start_in {
            // the window may close and reopen inside a multi-day span
            if let Some(close) = self.window_close(plan) {
                self.set_rate_plan(plan);
                return Some(self.split_at(close));
            }
            if end_in {
                self.set_rate_plan(plan);
                if self.rate_plan.as_ref() == Some(plan) {
                    return self.split_by_tiers(plan);
                }
            }
            return None;
        }

        if end_in {
            let open = self.window_open(plan)?;
            let mut tail = self.split_at(open);
            tail.set_rate_plan(plan);
            return Some(tail);
        }

        None
    }

    /// First instant inside the span where the plan's window closes
    fn window_close(&self, plan: &RatePlan) -> Option<DateTime<Utc>> {
        let timing = &plan.timing;
        if timing.is_always() {
            return None;
        }
        let mut margin = timing.right_margin(self.time_start);
        while margin > self.time_start && margin < self.time_end {
            if !timing.contains(margin) {
                return Some(margin);
            }
            let next = timing.right_margin(margin);
            if next <= margin {
                return None;
            }
            margin = next;
        }
        None
    }

    /// Last instant inside the span where the plan's window opens
    fn window_open(&self, plan: &RatePlan) -> Option<DateTime<Utc>> {
        let timing = &plan.timing;
        let mut margin = timing.left_margin(self.time_end);
        while margin > self.time_start && margin < self.time_end {
            if !timing.contains_end(margin) {
                return Some(margin);
            }
            let previous = timing.left_margin(margin);
            if previous >= margin {
                return None;
            }
            margin = previous;
        }
        None
    }

    fn split_by_tiers(&mut self, plan: &RatePlan) -> Option<TimeSpan> {
        let group_start = self.group_start();
        let group_end = self.group_end();
        for rate in &plan.rates {
            let boundary = rate.group_interval_start;
            if group_start < boundary && group_end > boundary {
                let at = self.time_start + (boundary - group_start);
                if self.contains(at) {
                    let mut tail = self.split_at(at);
                    tail.set_rate_plan(plan);
                    return Some(tail);
                }
            }
        }
        None
    }

    /// Split at an activation time strictly inside the span
    ///
    /// The tail carries the new activation period.
    pub fn split_by_activation_period(
        &mut self,
        period: &Arc<ActivationPeriod>,
    ) -> Option<TimeSpan> {
        if !self.contains(period.activation_time) {
            return None;
        }
        let mut tail = self.split_at(period.activation_time);
        tail.activation_period = Some(Arc::clone(period));
        Some(tail)
    }

    /// Carve bonus minutes off the start of the span
    ///
    /// The span is consumed from its start for as long as the bucket has
    /// seconds and has not expired; the remainder, if any, is returned as a
    /// new span. The bucket is decremented by what the span took.
    pub fn split_by_minute_bucket(&mut self, bucket: &mut MinuteBucket) -> Option<TimeSpan> {
        if bucket.seconds <= Decimal::ZERO {
            return None;
        }
        if bucket.expiration.is_some_and(|exp| self.time_start >= exp) {
            return None;
        }

        let exhausted_at = self.time_start + from_seconds(bucket.seconds);
        let cut = [bucket.expiration, Some(exhausted_at)]
            .into_iter()
            .flatten()
            .filter(|t| *t < self.time_end)
            .min();
        let tail = cut.map(|at| self.split_at(at));

        let quantity = to_seconds(self.duration()).min(bucket.seconds);
        bucket.seconds -= quantity;
        self.bonus = Some(BonusInfo {
            destination_id: bucket.destination_id.clone(),
            quantity,
            price: bucket.price,
        });
        tail
    }

    /// Increment of the tier pricing this span, if it is plan priced
    pub fn rate_increment(&self) -> Option<Duration> {
        if self.is_bonus() {
            return None;
        }
        self.rate_plan
            .as_ref()
            .and_then(|plan| plan.rate_at(self.group_start()))
            .map(|rate| rate.rate_increment)
    }

    /// Compute and store the cost of the span
    pub fn compute_cost(&mut self) -> Decimal {
        self.cost = if let Some(bonus) = &self.bonus {
            to_seconds(self.duration()) * bonus.price
        } else if let Some(plan) = &self.rate_plan {
            plan.cost(self.duration(), self.group_start())
        } else {
            Decimal::ZERO
        };
        self.cost
    }

    /// Connect fee when the span is plan priced
    pub fn connect_fee(&self) -> Decimal {
        match (&self.bonus, &self.rate_plan) {
            (None, Some(plan)) => plan.connect_fee,
            _ => Decimal::ZERO,
        }
    }
}

/// Stretch plan-priced spans shorter than one increment
///
/// A span shorter than its tier's increment is extended to exactly one
/// increment. Longer spans keep their length, the cost evaluator already
/// bills them in whole increments. Following spans are truncated, or
/// dropped when the extension covers them entirely. The last span may grow
/// past the original end of the call.
pub fn round_to_increments(mut spans: Vec<TimeSpan>) -> Vec<TimeSpan> {
    let mut i = 0;
    while i < spans.len() {
        let extension = spans[i]
            .rate_increment()
            .and_then(|increment| missing_to_increment(spans[i].duration(), increment));

        if let Some(extension) = extension {
            let new_end = spans[i].time_end + extension;
            spans[i].time_end = new_end;
            spans[i].call_duration += extension;

            while i + 1 < spans.len() {
                let next = &mut spans[i + 1];
                if next.time_end <= new_end {
                    spans.remove(i + 1);
                } else {
                    if next.time_start < new_end {
                        next.time_start = new_end;
                    }
                    break;
                }
            }
        }
        i += 1;
    }
    spans
}

fn missing_to_increment(duration: Duration, increment: Duration) -> Option<Duration> {
    if duration <= Duration::zero() || increment <= duration {
        return None;
    }
    Some(increment - duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::{parse_time, CalendarRule};
    use crate::models::duration::secs;
    use crate::models::rate::Rate;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn tier(start: i64, value: Decimal, increment: i64) -> Rate {
        Rate::new(secs(start), value, secs(increment), secs(1))
    }

    fn plan_with(timing: CalendarRule, rates: Vec<Rate>) -> RatePlan {
        let mut plan = RatePlan::with_rates("plan", rates);
        plan.timing = timing;
        plan
    }

    fn workdays() -> CalendarRule {
        CalendarRule {
            week_days: vec![1, 2, 3, 4, 5],
            ..Default::default()
        }
    }

    fn ends_at(hms: &str) -> CalendarRule {
        CalendarRule {
            end_time: parse_time(hms).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_contains_excludes_ends() {
        let ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 55, 0));
        assert!(!ts.contains(at(2012, 2, 5, 17, 45, 0)));
        assert!(!ts.contains(at(2012, 2, 5, 17, 55, 0)));
        assert!(ts.contains(at(2012, 2, 5, 17, 50, 0)));
    }

    #[test]
    fn test_right_margin_split() {
        let plan = plan_with(workdays(), vec![tier(0, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 3, 23, 45, 0), at(2012, 2, 4, 0, 10, 0));
        let before = ts.duration();
        let nts = ts.split_by_rate_plan(&plan).unwrap();

        assert_eq!(ts.time_end, at(2012, 2, 4, 0, 0, 0));
        assert_eq!(nts.time_start, at(2012, 2, 4, 0, 0, 0));
        assert_eq!(nts.time_end, at(2012, 2, 4, 0, 10, 0));
        assert_eq!(ts.rate_plan.as_ref(), Some(&plan));
        assert!(nts.rate_plan.is_none());
        assert_eq!(ts.duration(), secs(15 * 60));
        assert_eq!(ts.duration() + nts.duration(), before);
    }

    #[test]
    fn test_right_hour_margin_split() {
        let mut timing = workdays();
        timing.end_time = parse_time("17:59:00").unwrap();
        let plan = plan_with(timing, vec![tier(0, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 3, 17, 30, 0), at(2012, 2, 3, 18, 0, 0));
        let nts = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(ts.time_end, at(2012, 2, 3, 17, 59, 0));
        assert_eq!(nts.duration(), secs(60));
        assert!(ts.rate_plan.is_some());
    }

    #[test]
    fn test_left_margin_split() {
        let plan = plan_with(workdays(), vec![tier(0, dec!(1), 1)]);
        // Sunday night into Monday
        let mut ts = TimeSpan::new(at(2012, 2, 5, 23, 45, 0), at(2012, 2, 6, 0, 10, 0));
        let nts = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(ts.time_end, at(2012, 2, 6, 0, 0, 0));
        assert_eq!(nts.time_start, at(2012, 2, 6, 0, 0, 0));
        assert!(ts.rate_plan.is_none());
        assert_eq!(nts.rate_plan.as_ref(), Some(&plan));
        assert_eq!(nts.duration(), secs(10 * 60));
    }

    #[test]
    fn test_left_hour_margin_split() {
        let timing = CalendarRule {
            months: vec![12],
            month_days: vec![1],
            start_time: parse_time("09:00:00").unwrap(),
            ..Default::default()
        };
        let plan = plan_with(timing, vec![tier(0, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 12, 1, 8, 45, 0), at(2012, 12, 1, 9, 20, 0));
        let nts = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(ts.time_end, at(2012, 12, 1, 9, 0, 0));
        assert_eq!(nts.duration(), secs(20 * 60));
        assert!(nts.rate_plan.is_some());
    }

    #[test]
    fn test_enclosing_and_outside() {
        let sunday = CalendarRule {
            week_days: vec![7],
            ..Default::default()
        };
        let plan = plan_with(sunday, vec![tier(0, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 18, 10, 0));
        assert!(ts.split_by_rate_plan(&plan).is_none());
        assert_eq!(ts.rate_plan.as_ref(), Some(&plan));

        let monday = CalendarRule {
            week_days: vec![1],
            ..Default::default()
        };
        let plan = plan_with(monday, vec![tier(0, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 18, 10, 0));
        assert!(ts.split_by_rate_plan(&plan).is_none());
        assert!(ts.rate_plan.is_none());
    }

    #[test]
    fn test_midnight_is_not_a_boundary_when_next_day_matches() {
        let plan = plan_with(workdays(), vec![tier(0, dec!(1), 1)]);
        // Monday night into Tuesday
        let mut ts = TimeSpan::new(at(2012, 2, 6, 23, 50, 0), at(2012, 2, 7, 0, 10, 0));
        assert!(ts.split_by_rate_plan(&plan).is_none());
        assert!(ts.rate_plan.is_some());
    }

    #[test]
    fn test_set_rate_plan_tie_break() {
        let cheap = RatePlan::with_rates("cheap", vec![tier(0, dec!(1), 1)]);
        let mut dear = RatePlan::with_rates("dear", vec![tier(0, dec!(2), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 55, 0));

        ts.set_rate_plan(&cheap);
        ts.set_rate_plan(&dear);
        assert_eq!(ts.rate_plan.as_ref().unwrap().id, "cheap");

        dear.weight = 1.0;
        ts.set_rate_plan(&dear);
        assert_eq!(ts.rate_plan.as_ref().unwrap().id, "dear");

        // lower weight never wins, whatever the price
        ts.set_rate_plan(&cheap);
        assert_eq!(ts.rate_plan.as_ref().unwrap().id, "dear");
    }

    #[test]
    fn test_tier_split_at_boundary() {
        let plan = RatePlan::with_rates("tiers", vec![tier(0, dec!(2), 1), tier(60, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 3, 17, 0, 0), at(2012, 2, 3, 17, 4, 0));
        ts.call_duration = secs(240);

        let nts = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(ts.time_end, at(2012, 2, 3, 17, 1, 0));
        assert_eq!(nts.time_start, at(2012, 2, 3, 17, 1, 0));
        assert_eq!(ts.call_duration, secs(60));
        assert_eq!(nts.call_duration, secs(240));
        assert_eq!(ts.group_start(), secs(0));
        assert_eq!(nts.group_start(), secs(60));
        assert_eq!(plan.rate_at(ts.group_start()).unwrap().value, dec!(2));
        assert_eq!(plan.rate_at(nts.group_start()).unwrap().value, dec!(1));
    }

    #[test]
    fn test_resplit_is_idempotent() {
        let plan = RatePlan::with_rates("tiers", vec![tier(0, dec!(2), 1), tier(60, dec!(1), 1)]);
        let mut ts = TimeSpan::new(at(2012, 2, 3, 17, 0, 0), at(2012, 2, 3, 17, 4, 0));
        ts.call_duration = secs(240);
        let mut nts = ts.split_by_rate_plan(&plan).unwrap();

        assert!(ts.split_by_rate_plan(&plan).is_none());
        assert!(nts.split_by_rate_plan(&plan).is_none());
    }

    #[test]
    fn test_grouped_rates_under_closing_window() {
        let plan = plan_with(
            ends_at("17:59:00"),
            vec![tier(0, dec!(2), 1), tier(900, dec!(1), 1)],
        );
        let mut ts = TimeSpan::new(at(2012, 2, 3, 17, 30, 0), at(2012, 2, 3, 18, 0, 0));
        ts.call_duration = secs(1800);

        // the window closes first, then the tier boundary splits the head
        let tail = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(tail.time_start, at(2012, 2, 3, 17, 59, 0));
        let middle = ts.split_by_rate_plan(&plan).unwrap();
        assert_eq!(ts.time_end, at(2012, 2, 3, 17, 45, 0));
        assert_eq!(middle.time_end, at(2012, 2, 3, 17, 59, 0));

        assert_eq!(ts.clone().compute_cost(), dec!(1800));
        assert_eq!(middle.clone().compute_cost(), dec!(840));
    }

    #[test]
    fn test_split_by_activation_period() {
        let t1 = at(2012, 2, 5, 17, 45, 0);
        let t2 = at(2012, 2, 5, 17, 55, 0);
        let t3 = at(2012, 2, 5, 17, 50, 0);
        let mut ts = TimeSpan::new(t1, t2);
        let ap = |t| Arc::new(ActivationPeriod::new(t, vec![]));

        assert!(ts.split_by_activation_period(&ap(t1)).is_none());
        assert!(ts.split_by_activation_period(&ap(t2)).is_none());
        let tail = ts.split_by_activation_period(&ap(t3)).unwrap();
        assert_eq!(tail.time_start, t3);
        assert_eq!(tail.time_end, t2);
        assert_eq!(tail.activation_period.as_ref().unwrap().activation_time, t3);
    }

    #[test]
    fn test_minute_bucket_covers_span() {
        let mut mb = MinuteBucket::new("NAT", dec!(100), 10.0, dec!(0));
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 46, 0));
        assert!(ts.split_by_minute_bucket(&mut mb).is_none());
        assert_eq!(mb.seconds, dec!(40));
        assert_eq!(ts.bonus.as_ref().unwrap().quantity, dec!(60));
    }

    #[test]
    fn test_minute_bucket_runs_out() {
        let mut mb = MinuteBucket::new("NAT", dec!(10), 10.0, dec!(0.5));
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 46, 0));
        let tail = ts.split_by_minute_bucket(&mut mb).unwrap();
        assert_eq!(ts.duration(), secs(10));
        assert_eq!(tail.duration(), secs(50));
        assert!(tail.bonus.is_none());
        assert_eq!(mb.seconds, dec!(0));
        assert_eq!(ts.compute_cost(), dec!(5));
    }

    #[test]
    fn test_minute_bucket_expiring_inside_span() {
        let mut mb = MinuteBucket::new("NAT", dec!(1000), 10.0, dec!(0));
        mb.expiration = Some(at(2012, 2, 5, 17, 45, 20));
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 46, 0));
        let tail = ts.split_by_minute_bucket(&mut mb).unwrap();
        assert_eq!(ts.duration(), secs(20));
        assert_eq!(tail.time_start, at(2012, 2, 5, 17, 45, 20));
        assert_eq!(tail.time_end, at(2012, 2, 5, 17, 46, 0));
        assert_eq!(mb.seconds, dec!(980));

        // expired at the start of the span
        let mut later = TimeSpan::new(at(2012, 2, 5, 17, 45, 20), at(2012, 2, 5, 17, 46, 0));
        assert!(later.split_by_minute_bucket(&mut mb).is_none());
        assert!(later.bonus.is_none());
    }

    #[test]
    fn test_cost_of_unpriced_span_is_zero() {
        let mut ts = TimeSpan::new(at(2012, 2, 5, 17, 45, 0), at(2012, 2, 5, 17, 55, 0));
        assert_eq!(ts.compute_cost(), Decimal::ZERO);

        ts.set_rate_plan(&RatePlan::with_rates("s", vec![tier(0, dec!(1), 1)]));
        assert_eq!(ts.compute_cost(), dec!(600));

        let mut per_minute = TimeSpan::new(ts.time_start, ts.time_end);
        per_minute.set_rate_plan(&RatePlan::with_rates(
            "m",
            vec![Rate::new(secs(0), dec!(1), secs(1), secs(60))],
        ));
        assert_eq!(per_minute.compute_cost(), dec!(10));
    }

    fn priced_span(start: DateTime<Utc>, end: DateTime<Utc>, increment: i64) -> TimeSpan {
        let mut ts = TimeSpan::new(start, end);
        ts.rate_plan = Some(RatePlan::with_rates("inc", vec![tier(0, dec!(1), increment)]));
        ts
    }

    #[test]
    fn test_rounding_expands_past_end() {
        let spans = vec![
            priced_span(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 30, 30), 60),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 30), at(2013, 9, 10, 14, 30, 45)),
        ];
        let spans = round_to_increments(spans);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].time_end, at(2013, 9, 10, 14, 31, 0));
        assert_eq!(spans[0].call_duration, secs(30));
    }

    #[test]
    fn test_rounding_keeps_spans_longer_than_increment() {
        let spans = vec![
            priced_span(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 30, 20), 15),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 20), at(2013, 9, 10, 14, 30, 40)),
        ];
        let spans = round_to_increments(spans);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].time_end, at(2013, 9, 10, 14, 30, 20));
        assert_eq!(spans[1].time_start, at(2013, 9, 10, 14, 30, 20));
        assert_eq!(spans[1].time_end, at(2013, 9, 10, 14, 30, 40));
    }

    #[test]
    fn test_rounding_removes_equal_end() {
        let spans = vec![
            priced_span(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 30, 30), 60),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 30), at(2013, 9, 10, 14, 30, 40)),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 40), at(2013, 9, 10, 14, 31, 0)),
        ];
        let spans = round_to_increments(spans);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].time_end, at(2013, 9, 10, 14, 31, 0));
    }

    #[test]
    fn test_rounding_truncates_before_end() {
        let spans = vec![
            priced_span(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 30, 30), 45),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 30), at(2013, 9, 10, 14, 30, 50)),
            TimeSpan::new(at(2013, 9, 10, 14, 30, 50), at(2013, 9, 10, 14, 31, 0)),
        ];
        let spans = round_to_increments(spans);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].time_end, at(2013, 9, 10, 14, 30, 45));
        assert_eq!(spans[1].time_start, at(2013, 9, 10, 14, 30, 45));
        assert_eq!(spans[1].time_end, at(2013, 9, 10, 14, 30, 50));
    }

    #[test]
    fn test_rounding_leaves_whole_increments_and_bonus_spans() {
        let mut bonus = TimeSpan::new(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 30, 7));
        bonus.bonus = Some(BonusInfo {
            destination_id: "NAT".to_string(),
            quantity: dec!(7),
            price: dec!(0),
        });
        let spans = vec![
            bonus,
            priced_span(at(2013, 9, 10, 14, 30, 7), at(2013, 9, 10, 14, 31, 7), 60),
        ];
        let spans = round_to_increments(spans.clone());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].time_end, at(2013, 9, 10, 14, 30, 7));
        assert_eq!(spans[1].time_end, at(2013, 9, 10, 14, 31, 7));
    }

    #[test]
    fn test_connect_fee_only_for_plan_spans() {
        let mut plan = RatePlan::with_rates("fee", vec![tier(0, dec!(1), 1)]);
        plan.connect_fee = dec!(0.5);
        let mut ts = TimeSpan::new(at(2013, 9, 10, 14, 30, 0), at(2013, 9, 10, 14, 31, 0));
        assert_eq!(ts.connect_fee(), Decimal::ZERO);
        ts.set_rate_plan(&plan);
        assert_eq!(ts.connect_fee(), dec!(0.5));
    }
}
