//! In-memory storage backend
//!
//! Used by tests and by the default configuration. Values are cloned in and
//! out, so callers never share state with the store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tollgate_core::error::AppError;
use tollgate_core::models::{Account, Action, ActionTiming, Destination, RatingProfile};
use tollgate_core::traits::DataStorage;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    rating_profiles: RwLock<HashMap<String, RatingProfile>>,
    destinations: RwLock<HashMap<String, Destination>>,
    prefix_index: RwLock<HashMap<String, Vec<String>>>,
    accounts: RwLock<HashMap<String, Account>>,
    actions: RwLock<HashMap<String, Vec<Action>>>,
    action_timings: RwLock<HashMap<String, Vec<ActionTiming>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStorage for MemoryStorage {
    async fn get_rating_profile(&self, key: &str) -> Result<Option<RatingProfile>, AppError> {
        Ok(self.rating_profiles.read().get(key).cloned())
    }

    async fn set_rating_profile(&self, profile: &RatingProfile) -> Result<(), AppError> {
        debug!(profile_id = %profile.id, "Storing rating profile");
        self.rating_profiles
            .write()
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn get_destination(&self, id: &str) -> Result<Option<Destination>, AppError> {
        Ok(self.destinations.read().get(id).cloned())
    }

    async fn set_destination(&self, destination: &Destination) -> Result<(), AppError> {
        debug!(destination_id = %destination.id, prefixes = destination.prefixes.len(), "Storing destination");
        let previous = self
            .destinations
            .write()
            .insert(destination.id.clone(), destination.clone());

        let mut index = self.prefix_index.write();
        if let Some(previous) = previous {
            for prefix in &previous.prefixes {
                if let Some(ids) = index.get_mut(prefix) {
                    ids.retain(|id| id != &previous.id);
                }
            }
            index.retain(|_, ids| !ids.is_empty());
        }
        for prefix in &destination.prefixes {
            let ids = index.entry(prefix.clone()).or_default();
            if !ids.contains(&destination.id) {
                ids.push(destination.id.clone());
            }
        }
        Ok(())
    }

    async fn destination_ids_for_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .prefix_index
            .read()
            .get(prefix)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.read().get(id).cloned())
    }

    async fn set_account(&self, account: &Account) -> Result<(), AppError> {
        self.accounts
            .write()
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_actions(&self, id: &str) -> Result<Option<Vec<Action>>, AppError> {
        Ok(self.actions.read().get(id).cloned())
    }

    async fn set_actions(&self, id: &str, actions: &[Action]) -> Result<(), AppError> {
        self.actions.write().insert(id.to_string(), actions.to_vec());
        Ok(())
    }

    async fn get_all_action_timings(&self) -> Result<HashMap<String, Vec<ActionTiming>>, AppError> {
        Ok(self.action_timings.read().clone())
    }

    async fn set_action_timings(&self, key: &str, timings: &[ActionTiming]) -> Result<(), AppError> {
        let mut groups = self.action_timings.write();
        if timings.is_empty() {
            groups.remove(key);
        } else {
            groups.insert(key.to_string(), timings.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::models::{AccountType, CalendarRule};

    #[tokio::test]
    async fn test_missing_items_are_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get_account("nobody").await.unwrap().is_none());
        assert!(storage.get_rating_profile("*out:x:0:y").await.unwrap().is_none());
        assert!(storage.get_actions("NONE").await.unwrap().is_none());
        assert!(storage.destination_ids_for_prefix("07").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_index_follows_updates() {
        let storage = MemoryStorage::new();
        storage
            .set_destination(&Destination::new("NAT", &["0256", "0723"]))
            .await
            .unwrap();
        storage
            .set_destination(&Destination::new("RET", &["0723"]))
            .await
            .unwrap();
        assert_eq!(
            storage.destination_ids_for_prefix("0723").await.unwrap(),
            vec!["NAT".to_string(), "RET".to_string()]
        );

        storage
            .set_destination(&Destination::new("NAT", &["0256"]))
            .await
            .unwrap();
        assert_eq!(
            storage.destination_ids_for_prefix("0723").await.unwrap(),
            vec!["RET".to_string()]
        );

        let found = storage
            .get_destinations(&["NAT".to_string(), "GONE".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let storage = MemoryStorage::new();
        let account = Account::new("rif", AccountType::Postpaid);
        storage.set_account(&account).await.unwrap();
        assert_eq!(storage.get_account("rif").await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_empty_timings_remove_group() {
        let storage = MemoryStorage::new();
        let timing = ActionTiming::new("m", CalendarRule::default(), "TOPUP", vec![]);
        storage.set_action_timings("g", &[timing]).await.unwrap();
        assert_eq!(storage.get_all_action_timings().await.unwrap().len(), 1);
        storage.set_action_timings("g", &[]).await.unwrap();
        assert!(storage.get_all_action_timings().await.unwrap().is_empty());
    }
}
