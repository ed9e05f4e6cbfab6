//! Account model
//!
//! An account holds per-category balance chains, minute buckets, usage
//! counters and action triggers. Debits are all-or-nothing: a failing debit
//! leaves the account untouched.
//!
//! Prepaid accounts are capped by their balances. Postpaid accounts let the
//! money and unit balances go negative.

use super::action::{apply_actions, ActionCatalog};
use super::balance::{BalanceCategory, BalanceChain};
use super::bucket::MinuteBucket;
use super::destination::Destination;
use super::trigger::ActionTrigger;
use super::unit_counter::UnitsCounter;
use crate::error::AppError;
use crate::AppResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Account type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountType {
    /// Debits are capped by the available balance
    #[default]
    #[serde(rename = "*prepaid")]
    Prepaid,
    /// Balances may go negative
    #[serde(rename = "*postpaid")]
    Postpaid,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Prepaid => write!(f, "*prepaid"),
            AccountType::Postpaid => write!(f, "*postpaid"),
        }
    }
}

/// Outcome of the minute-bucket lookup for a dialed prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefixAllowance {
    /// Seconds the matching buckets can give, priced buckets capped by credit
    pub seconds: Decimal,
    /// Money left once the priced seconds are paid for
    pub credit: Decimal,
    /// Matching buckets in consumption order, with their index in the account
    pub buckets: Vec<(usize, MinuteBucket)>,
}

impl PrefixAllowance {
    /// Bucket copies the splitter can consume without touching the account
    pub fn snapshot(&self) -> Vec<MinuteBucket> {
        self.buckets.iter().map(|(_, bucket)| bucket.clone()).collect()
    }
}

/// What a debit needs besides the account itself
#[derive(Debug, Clone, Copy)]
pub struct DebitContext<'a> {
    pub now: DateTime<Utc>,
    /// Destinations referenced by the account's buckets
    pub destinations: &'a [Destination],
    /// Count the debited units and run triggers with these action lists
    pub counting: Option<&'a ActionCatalog>,
}

impl<'a> DebitContext<'a> {
    pub fn new(now: DateTime<Utc>, destinations: &'a [Destination]) -> Self {
        Self {
            now,
            destinations,
            counting: None,
        }
    }

    pub fn counting(mut self, catalog: &'a ActionCatalog) -> Self {
        self.counting = Some(catalog);
        self
    }
}

/// Account entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,

    #[serde(rename = "type", default)]
    pub account_type: AccountType,

    #[serde(default)]
    pub balances: HashMap<BalanceCategory, BalanceChain>,

    #[serde(default)]
    pub minute_buckets: Vec<MinuteBucket>,

    #[serde(default)]
    pub unit_counters: Vec<UnitsCounter>,

    #[serde(default)]
    pub action_triggers: Vec<ActionTrigger>,
}

impl Account {
    pub fn new(id: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: id.into(),
            account_type,
            balances: HashMap::new(),
            minute_buckets: Vec::new(),
            unit_counters: Vec::new(),
            action_triggers: Vec::new(),
        }
    }

    pub fn is_prepaid(&self) -> bool {
        self.account_type == AccountType::Prepaid
    }

    /// Spendable value of a category
    pub fn balance(&self, category: BalanceCategory, now: DateTime<Utc>) -> Decimal {
        self.balances
            .get(&category)
            .map(|chain| chain.total(now))
            .unwrap_or_default()
    }

    pub fn credit(
        &mut self,
        category: BalanceCategory,
        amount: Decimal,
        expiration: Option<DateTime<Utc>>,
        weight: f64,
    ) {
        self.balances
            .entry(category)
            .or_default()
            .credit(amount, expiration, weight);
    }

    /// Subtract without any check; a negative amount credits
    pub fn debit_unchecked(&mut self, category: BalanceCategory, amount: Decimal, now: DateTime<Utc>) {
        self.balances.entry(category).or_default().debit(amount, now);
    }

    /// Buckets usable for a dialed number, in consumption order
    pub fn seconds_for_prefix(
        &self,
        prefix: &str,
        destinations: &[Destination],
        now: DateTime<Utc>,
    ) -> PrefixAllowance {
        let mut buckets: Vec<(usize, MinuteBucket)> = self
            .minute_buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_expired(now))
            .filter_map(|(index, bucket)| {
                let destination = destinations.iter().find(|d| d.id == bucket.destination_id)?;
                let precision = destination.contains_prefix(prefix)?;
                let mut matched = bucket.clone();
                matched.precision = precision;
                Some((index, matched))
            })
            .collect();
        buckets.sort_by(|a, b| a.1.priority_cmp(&b.1));

        let mut credit = self.balance(BalanceCategory::Money, now);
        let mut seconds = Decimal::ZERO;
        for (_, bucket) in &buckets {
            let given = bucket.seconds_for_credit(credit);
            credit -= given * bucket.price;
            seconds += given;
        }

        PrefixAllowance {
            seconds,
            credit,
            buckets,
        }
    }

    /// Take money from the account unconditionally
    ///
    /// Returns the resulting money balance.
    pub fn debit_money(&mut self, amount: Decimal, ctx: &DebitContext<'_>) -> Decimal {
        self.debit_unchecked(BalanceCategory::Money, amount, ctx.now);
        self.count_debit(BalanceCategory::Money, amount, None, ctx);
        self.balance(BalanceCategory::Money, ctx.now)
    }

    /// Consume bucket seconds for a dialed number
    ///
    /// Fails without mutating anything when the buckets cannot cover the
    /// amount, or when paying for priced buckets would take a prepaid
    /// account's money below zero. A negative amount credits the top bucket.
    pub fn debit_minutes(&mut self, amount: Decimal, prefix: &str, ctx: &DebitContext<'_>) -> AppResult<()> {
        let allowance = self.seconds_for_prefix(prefix, ctx.destinations, ctx.now);

        if amount < Decimal::ZERO {
            let Some((index, top)) = allowance.buckets.first() else {
                return Err(AppError::insufficient(BalanceCategory::Minutes, amount, Decimal::ZERO));
            };
            let credited = -amount;
            self.minute_buckets[*index].seconds += credited;
            if top.price > Decimal::ZERO {
                self.debit_unchecked(BalanceCategory::Money, amount * top.price, ctx.now);
            }
            debug!(account_id = %self.id, seconds = %credited, "Credited minute bucket");
            return Ok(());
        }

        if allowance.seconds < amount {
            return Err(AppError::insufficient(
                BalanceCategory::Minutes,
                amount,
                allowance.seconds,
            ));
        }

        let money = self.balance(BalanceCategory::Money, ctx.now);
        let mut credit = money;
        let mut remaining = amount;
        let mut takes = Vec::with_capacity(allowance.buckets.len());
        for (index, bucket) in &allowance.buckets {
            if remaining <= Decimal::ZERO {
                break;
            }
            let taken = bucket.seconds.min(remaining);
            if taken <= Decimal::ZERO {
                continue;
            }
            credit -= taken * bucket.price;
            remaining -= taken;
            takes.push((*index, taken));
            if self.is_prepaid() && credit < Decimal::ZERO {
                return Err(AppError::insufficient(BalanceCategory::Money, money - credit, money));
            }
        }

        let cost = money - credit;
        if !cost.is_zero() {
            self.debit_unchecked(BalanceCategory::Money, cost, ctx.now);
        }
        for (index, taken) in takes {
            self.minute_buckets[index].seconds -= taken;
        }

        if self.minute_buckets.iter().any(|b| b.seconds < Decimal::ZERO) {
            debug_assert!(false, "minute bucket went negative after a debit");
            return Err(AppError::Internal(format!(
                "negative minute bucket on account {} after debit",
                self.id
            )));
        }

        let destination_id = best_destination(prefix, ctx.destinations);
        self.count_debit(BalanceCategory::Minutes, amount, destination_id.as_deref(), ctx);
        Ok(())
    }

    pub fn debit_sms(&mut self, amount: Decimal, ctx: &DebitContext<'_>) -> AppResult<Decimal> {
        self.debit_capped(BalanceCategory::Sms, amount, ctx)
    }

    pub fn debit_data(&mut self, amount: Decimal, ctx: &DebitContext<'_>) -> AppResult<Decimal> {
        self.debit_capped(BalanceCategory::Data, amount, ctx)
    }

    pub fn debit_data_time(&mut self, amount: Decimal, ctx: &DebitContext<'_>) -> AppResult<Decimal> {
        self.debit_capped(BalanceCategory::DataTime, amount, ctx)
    }

    fn debit_capped(
        &mut self,
        category: BalanceCategory,
        amount: Decimal,
        ctx: &DebitContext<'_>,
    ) -> AppResult<Decimal> {
        let available = self.balance(category, ctx.now);
        if self.is_prepaid() && amount > Decimal::ZERO && available < amount {
            return Err(AppError::insufficient(category, amount, available));
        }
        self.debit_unchecked(category, amount, ctx.now);
        self.count_debit(category, amount, None, ctx);
        Ok(self.balance(category, ctx.now))
    }

    fn count_debit(
        &mut self,
        category: BalanceCategory,
        amount: Decimal,
        destination_id: Option<&str>,
        ctx: &DebitContext<'_>,
    ) {
        if let Some(catalog) = ctx.counting {
            if amount > Decimal::ZERO {
                self.count_units(category, amount, destination_id, catalog, ctx.now);
            }
        }
    }

    /// Add to the usage counter of a category, then run the triggers
    pub fn count_units(
        &mut self,
        category: BalanceCategory,
        units: Decimal,
        destination_id: Option<&str>,
        catalog: &ActionCatalog,
        now: DateTime<Utc>,
    ) {
        let position = match self.unit_counters.iter().position(|uc| uc.category == category) {
            Some(position) => position,
            None => {
                self.unit_counters.push(UnitsCounter::new(category));
                self.unit_counters.len() - 1
            }
        };
        let destination_id = destination_id.filter(|_| category == BalanceCategory::Minutes);
        self.unit_counters[position].add(units, destination_id);
        self.execute_triggers(catalog, now);
    }

    /// Fire every eligible trigger once, lowest weight first
    pub fn execute_triggers(&mut self, catalog: &ActionCatalog, now: DateTime<Utc>) {
        let mut order: Vec<usize> = (0..self.action_triggers.len()).collect();
        order.sort_by(|&a, &b| {
            self.action_triggers[a]
                .weight
                .total_cmp(&self.action_triggers[b].weight)
        });

        for index in order {
            let trigger = &self.action_triggers[index];
            if trigger.executed {
                continue;
            }
            let Some(value) = self.trigger_value(trigger, now) else {
                continue;
            };
            if !trigger.is_met(value) {
                continue;
            }
            let Some(actions) = catalog.get(&trigger.actions_id) else {
                warn!(
                    account_id = %self.id,
                    trigger_id = %trigger.id,
                    actions_id = %trigger.actions_id,
                    "Action list not found for trigger"
                );
                continue;
            };

            debug!(account_id = %self.id, trigger_id = %trigger.id, value = %value, "Trigger fired");
            apply_actions(actions, self, now);
            self.action_triggers[index].executed = true;
        }
    }

    /// Value a trigger compares with its threshold
    fn trigger_value(&self, trigger: &ActionTrigger, now: DateTime<Utc>) -> Option<Decimal> {
        let destination = trigger
            .destination_id
            .as_deref()
            .filter(|_| trigger.category == BalanceCategory::Minutes);

        if trigger.threshold_type.watches_counter() {
            return self
                .unit_counters
                .iter()
                .find(|uc| uc.category == trigger.category)
                .map(|uc| uc.units_for(destination));
        }

        if trigger.category == BalanceCategory::Minutes {
            let seconds = self
                .minute_buckets
                .iter()
                .filter(|b| !b.is_expired(now))
                .filter(|b| destination.map_or(true, |id| b.destination_id == id))
                .map(|b| b.seconds)
                .sum();
            return Some(seconds);
        }
        Some(self.balance(trigger.category, now))
    }

    /// Add a bucket, merging it into one for the same destination
    pub fn add_minute_bucket(&mut self, bucket: MinuteBucket) {
        match self
            .minute_buckets
            .iter_mut()
            .find(|b| b.destination_id == bucket.destination_id)
        {
            Some(existing) => existing.seconds += bucket.seconds,
            None => self.minute_buckets.push(bucket),
        }
    }

    /// Remove seconds from the top bucket of a destination
    ///
    /// Buckets never go below zero. Crediting a destination without a bucket
    /// creates one.
    pub fn debit_bucket_seconds(&mut self, destination_id: &str, seconds: Decimal) {
        let top = self
            .minute_buckets
            .iter_mut()
            .filter(|b| b.destination_id == destination_id)
            .min_by(|a, b| a.priority_cmp(b));
        match top {
            Some(bucket) => bucket.seconds = (bucket.seconds - seconds).max(Decimal::ZERO),
            None if seconds < Decimal::ZERO => {
                self.minute_buckets
                    .push(MinuteBucket::new(destination_id, -seconds, 0.0, Decimal::ZERO));
            }
            None => {}
        }
    }

    /// Drop the balances of one category
    pub fn reset_category(&mut self, category: BalanceCategory) {
        if category == BalanceCategory::Minutes {
            self.minute_buckets.clear();
        }
        self.balances.remove(&category);
    }

    /// Switch type and start over with empty balances
    pub fn reset(&mut self, account_type: AccountType) {
        self.account_type = account_type;
        self.balances.clear();
        self.minute_buckets.clear();
        self.unit_counters.clear();
        self.reset_triggers();
    }

    pub fn reset_triggers(&mut self) {
        for trigger in &mut self.action_triggers {
            trigger.executed = false;
        }
    }

    pub fn reset_counter(&mut self, category: BalanceCategory) {
        self.unit_counters.retain(|uc| uc.category != category);
    }

    /// Drop expired balance entries and buckets
    pub fn clean_expired(&mut self, now: DateTime<Utc>) {
        for chain in self.balances.values_mut() {
            chain.clean_expired(now);
        }
        self.minute_buckets.retain(|b| !b.is_expired(now));
    }

    /// Ids of the destinations the buckets refer to
    pub fn bucket_destination_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .minute_buckets
            .iter()
            .map(|b| b.destination_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Ids of the action lists the triggers refer to
    pub fn trigger_actions_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .action_triggers
            .iter()
            .map(|t| t.actions_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Destination a dialed number belongs to, longest prefix wins
fn best_destination(prefix: &str, destinations: &[Destination]) -> Option<String> {
    destinations
        .iter()
        .filter_map(|d| d.contains_prefix(prefix).map(|precision| (precision, d)))
        .max_by_key(|(precision, _)| *precision)
        .map(|(_, d)| d.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::{Action, ActionKind, Movement};
    use crate::models::trigger::ThresholdType;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 7, 18, 12, 0, 0).unwrap()
    }

    fn destinations() -> Vec<Destination> {
        vec![
            Destination::new("NAT", &["0256", "0257", "0723"]),
            Destination::new("RET", &["0723", "0724"]),
        ]
    }

    /// NAT 10s weight 10, RET 100s weight 20, money 21
    fn rif(ret_price: Decimal) -> Account {
        let mut acc = Account::new("other", AccountType::Prepaid);
        acc.minute_buckets.push(MinuteBucket::new("NAT", dec!(10), 10.0, dec!(0)));
        acc.minute_buckets.push(MinuteBucket::new("RET", dec!(100), 20.0, ret_price));
        acc.credit(BalanceCategory::Money, dec!(21), None, 0.0);
        acc
    }

    fn seconds(acc: &Account) -> (Decimal, Decimal) {
        (acc.minute_buckets[0].seconds, acc.minute_buckets[1].seconds)
    }

    fn money(acc: &Account) -> Decimal {
        acc.balance(BalanceCategory::Money, now())
    }

    #[test]
    fn test_seconds_for_prefix_orders_by_weight() {
        let acc = rif(dec!(0));
        let allowance = acc.seconds_for_prefix("0723", &destinations(), now());
        assert_eq!(allowance.seconds, dec!(110));
        assert_eq!(allowance.credit, dec!(21));
        assert_eq!(allowance.buckets[0].1.destination_id, "RET");
        assert_eq!(allowance.buckets[0].1.precision, 4);
    }

    #[test]
    fn test_seconds_for_prefix_caps_priced_by_credit() {
        let acc = rif(dec!(1));
        let allowance = acc.seconds_for_prefix("0723", &destinations(), now());
        assert_eq!(allowance.seconds, dec!(31));
        assert_eq!(allowance.credit, dec!(0));
        assert_eq!(allowance.buckets.len(), 2);
    }

    #[test]
    fn test_seconds_for_prefix_skips_expired_and_unrelated() {
        let mut acc = rif(dec!(0));
        acc.minute_buckets[1].expiration = Some(now() - Duration::seconds(1));
        let allowance = acc.seconds_for_prefix("0723", &destinations(), now());
        assert_eq!(allowance.seconds, dec!(10));

        let allowance = acc.seconds_for_prefix("0999", &destinations(), now());
        assert!(allowance.buckets.is_empty());
    }

    #[test]
    fn test_precision_beats_price() {
        let dests = vec![
            Destination::new("NAT", &["0723"]),
            Destination::new("MOB", &["07231"]),
        ];
        let mut acc = Account::new("p", AccountType::Prepaid);
        acc.minute_buckets.push(MinuteBucket::new("NAT", dec!(10), 10.0, dec!(0)));
        acc.minute_buckets.push(MinuteBucket::new("MOB", dec!(10), 10.0, dec!(1)));
        acc.credit(BalanceCategory::Money, dec!(100), None, 0.0);
        let allowance = acc.seconds_for_prefix("07231234", &dests, now());
        assert_eq!(allowance.buckets[0].1.destination_id, "MOB");
    }

    #[test]
    fn test_debit_minutes_from_top_bucket() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(0));
        acc.debit_minutes(dec!(6), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(94)));
    }

    #[test]
    fn test_debit_minutes_across_buckets() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(0));
        acc.debit_minutes(dec!(105), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(5), dec!(0)));

        let mut acc = rif(dec!(0));
        acc.debit_minutes(dec!(110), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(0), dec!(0)));
    }

    #[test]
    fn test_debit_minutes_too_much_changes_nothing() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(0));
        let before = acc.clone();
        let err = acc.debit_minutes(dec!(115), "0723", &ctx).unwrap_err();
        assert!(matches!(err, AppError::InsufficientResource { .. }));
        assert_eq!(acc, before);
    }

    #[test]
    fn test_debit_priced_minutes() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);

        let mut acc = rif(dec!(1));
        acc.debit_minutes(dec!(5), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(95)));
        assert_eq!(money(&acc), dec!(16));

        let mut acc = rif(dec!(1));
        acc.debit_minutes(dec!(21), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(79)));
        assert_eq!(money(&acc), dec!(0));
    }

    #[test]
    fn test_debit_priced_minutes_prepaid_cannot_go_negative() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(1));
        let before = acc.clone();
        assert!(acc.debit_minutes(dec!(25), "0723", &ctx).is_err());
        assert_eq!(acc, before);
    }

    #[test]
    fn test_debit_priced_minutes_postpaid_goes_negative() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(1));
        acc.account_type = AccountType::Postpaid;
        acc.debit_minutes(dec!(25), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(75)));
        assert_eq!(money(&acc), dec!(-4));
    }

    #[test]
    fn test_negative_minutes_debit_credits_top_bucket() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);

        let mut acc = rif(dec!(0));
        acc.debit_minutes(dec!(-15), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(115)));
        assert_eq!(money(&acc), dec!(21));

        let mut acc = rif(dec!(1));
        acc.debit_minutes(dec!(-15), "0723", &ctx).unwrap();
        assert_eq!(seconds(&acc), (dec!(10), dec!(115)));
        assert_eq!(money(&acc), dec!(36));

        let mut empty = Account::new("e", AccountType::Prepaid);
        assert!(empty.debit_minutes(dec!(-15), "0723", &ctx).is_err());
    }

    #[test]
    fn test_nat_bucket_exhaustion() {
        let dests = vec![Destination::new("NAT", &["0723"])];
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = Account::new("rif", AccountType::Prepaid);
        acc.minute_buckets.push(MinuteBucket::new("NAT", dec!(10), 10.0, dec!(0)));
        acc.credit(BalanceCategory::Money, dec!(21), None, 0.0);

        acc.debit_minutes(dec!(6), "0723", &ctx).unwrap();
        assert_eq!(acc.minute_buckets[0].seconds, dec!(4));
        assert_eq!(money(&acc), dec!(21));

        let before = acc.clone();
        assert!(acc.debit_minutes(dec!(10), "0723", &ctx).is_err());
        assert_eq!(acc, before);
    }

    #[test]
    fn test_debit_money() {
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests);
        let mut acc = rif(dec!(0));
        assert_eq!(acc.debit_money(dec!(7), &ctx), dec!(14));
        assert_eq!(acc.debit_money(dec!(20), &ctx), dec!(-6));
        assert_eq!(acc.debit_money(dec!(-15), &ctx), dec!(9));
    }

    #[test]
    fn test_debit_sms_prepaid_and_postpaid() {
        let ctx = DebitContext::new(now(), &[]);
        let mut acc = Account::new("rif", AccountType::Prepaid);
        acc.credit(BalanceCategory::Sms, dec!(100), None, 0.0);

        assert_eq!(acc.debit_sms(dec!(12), &ctx).unwrap(), dec!(88));
        assert!(acc.debit_sms(dec!(101), &ctx).is_err());
        assert_eq!(acc.balance(BalanceCategory::Sms, now()), dec!(88));
        assert_eq!(acc.debit_sms(dec!(-15), &ctx).unwrap(), dec!(103));

        acc.account_type = AccountType::Postpaid;
        assert_eq!(acc.debit_sms(dec!(110), &ctx).unwrap(), dec!(-7));
    }

    #[test]
    fn test_debit_data_categories() {
        let ctx = DebitContext::new(now(), &[]);
        let mut acc = Account::new("rif", AccountType::Prepaid);
        acc.credit(BalanceCategory::Data, dec!(1024), None, 0.0);
        acc.credit(BalanceCategory::DataTime, dec!(60), None, 0.0);

        assert_eq!(acc.debit_data(dec!(24), &ctx).unwrap(), dec!(1000));
        assert!(acc.debit_data(dec!(1001), &ctx).is_err());
        assert_eq!(acc.debit_data_time(dec!(60), &ctx).unwrap(), dec!(0));
        assert!(acc.debit_data_time(dec!(1), &ctx).is_err());
    }

    fn catalog() -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        catalog.insert(
            "TOPUP10".to_string(),
            vec![Action::new(
                "a1",
                0.0,
                ActionKind::TopUp(Movement::new(BalanceCategory::Money, dec!(10))),
            )],
        );
        catalog
    }

    #[test]
    fn test_trigger_fires_once() {
        let dests = destinations();
        let catalog = catalog();
        let ctx = DebitContext::new(now(), &dests).counting(&catalog);
        let mut acc = rif(dec!(0));
        acc.action_triggers
            .push(ActionTrigger::new("t1", BalanceCategory::Money, dec!(2), "TOPUP10"));

        acc.debit_money(dec!(1), &ctx);
        assert!(!acc.action_triggers[0].executed);
        assert_eq!(money(&acc), dec!(20));

        acc.debit_money(dec!(1), &ctx);
        assert!(acc.action_triggers[0].executed);
        assert_eq!(money(&acc), dec!(29));

        acc.debit_money(dec!(1), &ctx);
        assert_eq!(money(&acc), dec!(28));
    }

    #[test]
    fn test_reset_triggers_allows_refire() {
        let dests = destinations();
        let catalog = catalog();
        let ctx = DebitContext::new(now(), &dests).counting(&catalog);
        let mut acc = rif(dec!(0));
        acc.action_triggers
            .push(ActionTrigger::new("t1", BalanceCategory::Money, dec!(2), "TOPUP10"));

        acc.debit_money(dec!(2), &ctx);
        assert_eq!(money(&acc), dec!(29));
        acc.reset_triggers();
        acc.debit_money(dec!(1), &ctx);
        assert_eq!(money(&acc), dec!(38));
    }

    #[test]
    fn test_missing_action_list_keeps_trigger_armed() {
        let dests = destinations();
        let empty = ActionCatalog::new();
        let ctx = DebitContext::new(now(), &dests).counting(&empty);
        let mut acc = rif(dec!(0));
        acc.action_triggers
            .push(ActionTrigger::new("t1", BalanceCategory::Money, dec!(1), "MISSING"));
        acc.debit_money(dec!(5), &ctx);
        assert!(!acc.action_triggers[0].executed);
    }

    #[test]
    fn test_minutes_trigger_with_destination() {
        let dests = destinations();
        let catalog = catalog();
        let ctx = DebitContext::new(now(), &dests).counting(&catalog);
        let mut acc = rif(dec!(0));
        let mut trigger = ActionTrigger::new("t1", BalanceCategory::Minutes, dec!(20), "TOPUP10");
        trigger.destination_id = Some("NAT".to_string());
        acc.action_triggers.push(trigger);

        // 0724 only belongs to RET
        acc.debit_minutes(dec!(30), "0724", &ctx).unwrap();
        assert!(!acc.action_triggers[0].executed);

        assert!(acc.debit_minutes(dec!(20), "0256", &ctx).is_err());
        acc.minute_buckets[0].seconds = dec!(50);
        acc.debit_minutes(dec!(20), "0256", &ctx).unwrap();
        assert!(acc.action_triggers[0].executed);
        assert_eq!(money(&acc), dec!(31));
    }

    #[test]
    fn test_min_balance_trigger() {
        let dests = destinations();
        let catalog = catalog();
        let ctx = DebitContext::new(now(), &dests).counting(&catalog);
        let mut acc = rif(dec!(0));
        let mut trigger = ActionTrigger::new("low", BalanceCategory::Money, dec!(5), "TOPUP10");
        trigger.threshold_type = ThresholdType::MinBalance;
        acc.action_triggers.push(trigger);

        acc.debit_money(dec!(10), &ctx);
        assert!(!acc.action_triggers[0].executed);
        acc.debit_money(dec!(7), &ctx);
        assert!(acc.action_triggers[0].executed);
        assert_eq!(money(&acc), dec!(14));
    }

    #[test]
    fn test_triggers_run_by_ascending_weight() {
        let mut catalog = catalog();
        catalog.insert(
            "RESET".to_string(),
            vec![Action::new("r", 0.0, ActionKind::ResetPrepaid)],
        );
        let dests = destinations();
        let ctx = DebitContext::new(now(), &dests).counting(&catalog);
        let mut acc = rif(dec!(0));
        let mut topup = ActionTrigger::new("topup", BalanceCategory::Money, dec!(1), "TOPUP10");
        topup.weight = 20.0;
        let mut reset = ActionTrigger::new("reset", BalanceCategory::Money, dec!(1), "RESET");
        reset.weight = 10.0;
        acc.action_triggers.push(topup);
        acc.action_triggers.push(reset);

        acc.debit_money(dec!(1), &ctx);
        // the reset cleared the counter, so the top-up trigger had nothing to see
        assert!(acc.action_triggers[1].executed);
        assert!(!acc.action_triggers[0].executed);
        assert_eq!(money(&acc), dec!(0));
    }

    #[test]
    fn test_add_minute_bucket_merges_destination() {
        let mut acc = Account::new("rif", AccountType::Postpaid);
        acc.add_minute_bucket(MinuteBucket::new("NAT", dec!(10), 0.0, dec!(0)));
        acc.add_minute_bucket(MinuteBucket::new("NAT", dec!(10), 0.0, dec!(0)));
        assert_eq!(acc.minute_buckets.len(), 1);
        assert_eq!(acc.minute_buckets[0].seconds, dec!(20));
        acc.add_minute_bucket(MinuteBucket::new("OTHER", dec!(10), 0.0, dec!(0)));
        assert_eq!(acc.minute_buckets.len(), 2);
    }

    #[test]
    fn test_clean_expired() {
        let mut acc = rif(dec!(0));
        acc.minute_buckets[0].expiration = Some(now() - Duration::seconds(1));
        acc.credit(BalanceCategory::Money, dec!(5), Some(now() - Duration::seconds(1)), 0.0);
        acc.clean_expired(now());
        assert_eq!(acc.minute_buckets.len(), 1);
        assert_eq!(acc.balances[&BalanceCategory::Money].entries().len(), 1);
    }

    #[test]
    fn test_account_json() {
        let json = r#"{
            "id": "rif",
            "type": "*postpaid",
            "balances": {"*monetary": [{"value": "21"}], "*sms": [{"value": "100"}]},
            "minute_buckets": [{"seconds": "10", "weight": 10, "destination_id": "NAT"}]
        }"#;
        let acc: Account = serde_json::from_str(json).unwrap();
        assert_eq!(acc.account_type, AccountType::Postpaid);
        assert_eq!(money(&acc), dec!(21));
        assert_eq!(acc.balance(BalanceCategory::Sms, now()), dec!(100));
        assert_eq!(acc.bucket_destination_ids(), vec!["NAT".to_string()]);
    }
}
