//! Rating engine
//!
//! Resolves the activation periods of a call descriptor, splits and prices
//! the call window, estimates the longest affordable session and debits the
//! priced cost from the paying account.

use crate::accounts::AccountService;
use crate::splitter;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tollgate_core::{
    config::RatingConfig,
    models::{
        destination::{normalize_number, prefix_candidates},
        duration::from_seconds,
        ActivationPeriod, CallCost, CallDescriptor, MinuteBucket,
    },
    traits::DataStorage,
    AppError, AppResult,
};
use tracing::{debug, instrument, warn};

/// Activation periods found for a call descriptor
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Profile the periods came from, after any fallback
    pub profile_id: String,
    pub destination_id: String,
    /// Longest prefix of the dialed number that selected the destination
    pub matched_prefix: String,
    /// Ordered by activation time
    pub periods: Vec<Arc<ActivationPeriod>>,
}

/// Longest session an account can pay for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLimit {
    /// Postpaid accounts are never cut
    Unlimited,
    Seconds(Decimal),
}

/// Rating engine over a storage backend
pub struct RatingEngine<S: DataStorage> {
    storage: Arc<S>,
    accounts: Arc<AccountService<S>>,
    config: RatingConfig,
}

impl<S: DataStorage> RatingEngine<S> {
    /// Create a new rating engine
    pub fn new(storage: Arc<S>, accounts: Arc<AccountService<S>>, config: RatingConfig) -> Self {
        Self {
            storage,
            accounts,
            config,
        }
    }

    /// Find the activation periods rating a call
    ///
    /// The subject's profile is tried first, then its fallback chain. Within
    /// a profile the dialed number is shrunk from its full length down to two
    /// digits until a destination owning the prefix has periods. `Ok(None)`
    /// means the call is not rated.
    #[instrument(skip(self, cd), fields(key = %cd.key(), destination = %cd.destination))]
    pub async fn find_activation_periods(&self, cd: &CallDescriptor) -> AppResult<Option<Resolved>> {
        let number = normalize_number(&cd.destination);
        if number.is_empty() {
            warn!("Empty destination after normalization");
            return Ok(None);
        }

        let mut visited = HashSet::new();
        let mut next_key = Some(cd.key());
        let mut subject_fallback = cd.fallback_key();

        while let Some(key) = next_key.take() {
            if !visited.insert(key.clone()) {
                warn!(key = %key, "Rating profile fallback cycle");
                break;
            }
            if visited.len() > self.config.max_fallback_depth + 1 {
                warn!(key = %key, depth = self.config.max_fallback_depth, "Rating profile fallback too deep");
                break;
            }

            let profile = self.storage.get_rating_profile(&key).await?;
            let Some(profile) = profile else {
                debug!(key = %key, "Rating profile not found");
                next_key = subject_fallback.take();
                continue;
            };

            for prefix in prefix_candidates(&number) {
                for destination_id in self.storage.destination_ids_for_prefix(prefix).await? {
                    if let Some(periods) = profile.activation_periods(&destination_id) {
                        debug!(profile_id = %profile.id, destination_id = %destination_id, prefix, "Activation periods found");
                        return Ok(Some(Resolved {
                            profile_id: profile.id.clone(),
                            destination_id,
                            matched_prefix: prefix.to_string(),
                            periods: periods.iter().cloned().map(Arc::new).collect(),
                        }));
                    }
                }
            }

            next_key = profile.fallback_key.clone().or_else(|| subject_fallback.take());
        }

        debug!("No activation periods, call is not rated");
        Ok(None)
    }

    fn price(cd: &CallDescriptor, resolved: Option<&Resolved>, buckets: Vec<MinuteBucket>) -> CallCost {
        let periods = resolved.map(|r| r.periods.as_slice()).unwrap_or_default();
        let spans = splitter::split(cd, periods, buckets);
        let mut cost = CallCost::from_spans(cd, spans);
        if let Some(resolved) = resolved {
            cost.destination_id = Some(resolved.destination_id.clone());
            cost.matched_prefix = Some(resolved.matched_prefix.clone());
        }
        cost
    }

    /// Price a call
    ///
    /// Bonus minutes of the paying account are taken into account but not
    /// consumed. An unknown account simply has none.
    #[instrument(skip(self, cd), fields(key = %cd.key(), destination = %cd.destination))]
    pub async fn get_cost(&self, cd: &CallDescriptor) -> AppResult<CallCost> {
        let resolved = self.find_activation_periods(cd).await?;
        let number = normalize_number(&cd.destination);
        let buckets = self
            .accounts
            .prefix_allowance(cd.account_id(), &number)
            .await?
            .map(|(_, allowance)| allowance.snapshot())
            .unwrap_or_default();

        let cost = Self::price(cd, resolved.as_ref(), buckets);
        debug!(cost = %cost.cost, spans = cost.timespans.len(), "Call priced");
        Ok(cost)
    }

    /// Longest session, up to `cd.amount` seconds, the account can pay for
    ///
    /// Bucket seconds are granted first. The rest is estimated by pricing
    /// candidate sessions starting at `cd.time_start`, each shrinking the candidate by a
    /// tenth of the requested amount, until one fits in the credit left.
    #[instrument(skip(self, cd), fields(account_id = %cd.account_id(), amount = %cd.amount))]
    pub async fn max_session_time(&self, cd: &CallDescriptor) -> AppResult<SessionLimit> {
        let resolved = self.find_activation_periods(cd).await?;
        let number = normalize_number(&cd.destination);
        let (account, allowance) = self
            .accounts
            .prefix_allowance(cd.account_id(), &number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(cd.account_id().to_string()))?;

        if !account.is_prepaid() {
            return Ok(SessionLimit::Unlimited);
        }
        if allowance.credit <= Decimal::ZERO {
            return Ok(SessionLimit::Seconds(allowance.seconds.min(cd.amount)));
        }

        let steps = self.config.max_session_steps.max(1);
        let step = cd.amount / Decimal::from(steps);
        let mut candidate = cd.amount;
        for _ in 0..steps {
            if candidate <= allowance.seconds {
                return Ok(SessionLimit::Seconds(candidate.max(Decimal::ZERO)));
            }

            let mut trial = cd.clone();
            trial.time_end = trial
                .time_start
                .checked_add_signed(from_seconds(candidate - allowance.seconds))
                .ok_or_else(|| AppError::InvalidInput(format!("session of {} seconds is out of range", candidate)))?;
            trial.call_duration = chrono::Duration::zero();
            let cost = Self::price(&trial, resolved.as_ref(), Vec::new());
            if cost.cost <= allowance.credit {
                debug!(seconds = %candidate, cost = %cost.cost, "Session fits in credit");
                return Ok(SessionLimit::Seconds(candidate));
            }
            candidate -= step;
        }

        Ok(SessionLimit::Seconds(Decimal::ZERO))
    }

    /// Price a call and charge it to the paying account
    ///
    /// Bonus spans consume bucket seconds, the remaining cost is taken from
    /// the money balance. Both happen under one account write lock and the
    /// account is saved only when every part succeeded.
    #[instrument(skip(self, cd), fields(account_id = %cd.account_id(), destination = %cd.destination))]
    pub async fn debit(&self, cd: &CallDescriptor) -> AppResult<CallCost> {
        let resolved = self.find_activation_periods(cd).await?;
        let number = normalize_number(&cd.destination);

        let cost = self
            .accounts
            .mutate(cd.account_id(), |account, ctx| {
                let allowance = account.seconds_for_prefix(&number, ctx.destinations, ctx.now);
                let cost = Self::price(cd, resolved.as_ref(), allowance.snapshot());

                let bonus = cost.bonus_seconds();
                if bonus > Decimal::ZERO {
                    account.debit_minutes(bonus, &number, ctx)?;
                }
                account.debit_money(cost.money_cost(), ctx);
                Ok(cost)
            })
            .await?;

        debug!(cost = %cost.cost, "Call debited");
        Ok(cost)
    }
}
