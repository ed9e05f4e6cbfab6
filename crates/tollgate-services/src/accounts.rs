//! Account service
//!
//! Serializes every mutation of an account behind a per-account lock, loads
//! what a debit needs (destinations, trigger action lists) and persists the
//! account once the mutation succeeded. A failed mutation leaves the stored
//! account untouched.

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tollgate_core::{
    models::{apply_actions, Account, ActionCatalog, ActionTiming, BalanceCategory, DebitContext, PrefixAllowance},
    traits::DataStorage,
    AppError, AppResult,
};
use tracing::{debug, info, instrument, warn};

/// Outcome of a direct balance debit
#[derive(Debug, Clone, PartialEq)]
pub struct DebitOutcome {
    pub account: Account,
    /// Balance of the debited category afterwards, `None` for minutes
    pub balance: Option<Decimal>,
}

type LockTable = Mutex<HashMap<String, Arc<RwLock<()>>>>;

/// Shared use of one account lock
///
/// Dropping the last handle removes the lock from the table, so ids that
/// are looked up once do not stay behind.
struct LockHandle<'a> {
    table: &'a LockTable,
    account_id: String,
    lock: Arc<RwLock<()>>,
}

impl Drop for LockHandle<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        // held by the table and this handle only
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.account_id);
        }
    }
}

/// Account operations with per-account serialization
pub struct AccountService<S: DataStorage> {
    storage: Arc<S>,
    locks: LockTable,
}

impl<S: DataStorage> AccountService<S> {
    /// Create a new account service
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding one account, created on first use
    fn lock_for(&self, account_id: &str) -> LockHandle<'_> {
        let lock = self
            .locks
            .lock()
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone();
        LockHandle {
            table: &self.locks,
            account_id: account_id.to_string(),
            lock,
        }
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().len()
    }

    async fn load(&self, account_id: &str) -> AppResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    async fn load_catalog(&self, account: &Account) -> AppResult<ActionCatalog> {
        let mut catalog = ActionCatalog::new();
        for id in account.trigger_actions_ids() {
            match self.storage.get_actions(&id).await? {
                Some(actions) => {
                    catalog.insert(id, actions);
                }
                None => warn!(account_id = %account.id, actions_id = %id, "Trigger refers to unknown actions"),
            }
        }
        Ok(catalog)
    }

    /// Read an account
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: &str) -> AppResult<Account> {
        let handle = self.lock_for(account_id);
        let _guard = handle.lock.read().await;
        self.load(account_id).await
    }

    /// Read an account and its bucket allowance for a dialed number
    ///
    /// Returns `None` when the account does not exist.
    #[instrument(skip(self))]
    pub async fn prefix_allowance(
        &self,
        account_id: &str,
        number: &str,
    ) -> AppResult<Option<(Account, PrefixAllowance)>> {
        let handle = self.lock_for(account_id);
        let _guard = handle.lock.read().await;

        let Some(account) = self.storage.get_account(account_id).await? else {
            return Ok(None);
        };
        let destinations = self
            .storage
            .get_destinations(&account.bucket_destination_ids())
            .await?;
        let allowance = account.seconds_for_prefix(number, &destinations, Utc::now());
        Ok(Some((account, allowance)))
    }

    /// Run a mutation on an account under its write lock
    ///
    /// The account is saved only when `mutation` returns `Ok`; every change
    /// made before an error is discarded with the working copy.
    pub async fn mutate<T, F>(&self, account_id: &str, mutation: F) -> AppResult<T>
    where
        F: FnOnce(&mut Account, &DebitContext<'_>) -> AppResult<T> + Send,
        T: Send,
    {
        let handle = self.lock_for(account_id);
        let _guard = handle.lock.write().await;

        let mut account = self.load(account_id).await?;
        let destinations = self
            .storage
            .get_destinations(&account.bucket_destination_ids())
            .await?;
        let catalog = self.load_catalog(&account).await?;
        let ctx = DebitContext::new(Utc::now(), &destinations).counting(&catalog);

        let result = mutation(&mut account, &ctx)?;
        self.storage.set_account(&account).await?;
        Ok(result)
    }

    /// Debit one balance category directly
    ///
    /// Minutes need the dialed `prefix` to select buckets.
    #[instrument(skip(self))]
    pub async fn debit(
        &self,
        account_id: &str,
        category: BalanceCategory,
        amount: Decimal,
        prefix: Option<&str>,
    ) -> AppResult<DebitOutcome> {
        let prefix = prefix.map(str::to_string);
        let outcome = self
            .mutate(account_id, move |account, ctx| {
                let balance = match category {
                    BalanceCategory::Money => Some(account.debit_money(amount, ctx)),
                    BalanceCategory::Sms => Some(account.debit_sms(amount, ctx)?),
                    BalanceCategory::Data => Some(account.debit_data(amount, ctx)?),
                    BalanceCategory::DataTime => Some(account.debit_data_time(amount, ctx)?),
                    BalanceCategory::Minutes => {
                        let prefix = prefix
                            .as_deref()
                            .ok_or_else(|| AppError::MissingField("prefix".to_string()))?;
                        account.debit_minutes(amount, prefix, ctx)?;
                        None
                    }
                };
                Ok(DebitOutcome {
                    account: account.clone(),
                    balance,
                })
            })
            .await?;

        debug!(account_id, %category, %amount, "Account debited");
        Ok(outcome)
    }

    pub async fn debit_money(&self, account_id: &str, amount: Decimal) -> AppResult<DebitOutcome> {
        self.debit(account_id, BalanceCategory::Money, amount, None).await
    }

    pub async fn debit_minutes(&self, account_id: &str, amount: Decimal, prefix: &str) -> AppResult<DebitOutcome> {
        self.debit(account_id, BalanceCategory::Minutes, amount, Some(prefix))
            .await
    }

    pub async fn debit_sms(&self, account_id: &str, amount: Decimal) -> AppResult<DebitOutcome> {
        self.debit(account_id, BalanceCategory::Sms, amount, None).await
    }

    pub async fn debit_data(&self, account_id: &str, amount: Decimal) -> AppResult<DebitOutcome> {
        self.debit(account_id, BalanceCategory::Data, amount, None).await
    }

    pub async fn debit_data_time(&self, account_id: &str, amount: Decimal) -> AppResult<DebitOutcome> {
        self.debit(account_id, BalanceCategory::DataTime, amount, None)
            .await
    }

    /// Apply a stored action list to one account
    #[instrument(skip(self))]
    pub async fn execute_actions(&self, account_id: &str, actions_id: &str) -> AppResult<Account> {
        let actions = self
            .storage
            .get_actions(actions_id)
            .await?
            .ok_or_else(|| AppError::ActionsNotFound(actions_id.to_string()))?;

        let account = self
            .mutate(account_id, |account, ctx| {
                apply_actions(&actions, account, ctx.now);
                Ok(account.clone())
            })
            .await?;

        info!(account_id, actions_id, "Actions executed");
        Ok(account)
    }

    /// Apply a timing's action list to each of its accounts
    ///
    /// Accounts are processed independently: one failing account is logged
    /// and does not stop the others. Returns how many accounts were updated.
    #[instrument(skip(self, timing), fields(timing_id = %timing.id, actions_id = %timing.actions_id))]
    pub async fn execute_timing(&self, timing: &ActionTiming) -> AppResult<usize> {
        let actions = self
            .storage
            .get_actions(&timing.actions_id)
            .await?
            .ok_or_else(|| AppError::ActionsNotFound(timing.actions_id.clone()))?;

        let mut applied = 0;
        for account_id in &timing.account_ids {
            let result = self
                .mutate(account_id, |account, ctx| {
                    apply_actions(&actions, account, ctx.now);
                    Ok(())
                })
                .await;
            match result {
                Ok(()) => applied += 1,
                Err(e) => warn!(account_id = %account_id, error = %e, "Scheduled actions failed"),
            }
        }

        info!(accounts = applied, "Scheduled actions executed");
        Ok(applied)
    }
}
