//! Seed documents
//!
//! A seed is a JSON document holding destinations, rating profiles,
//! accounts, action lists and action timing groups. It is loaded into any
//! backend at startup.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tollgate_core::error::AppError;
use tollgate_core::models::{Account, Action, ActionTiming, Destination, RatingProfile};
use tollgate_core::traits::DataStorage;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct StorageSeed {
    #[serde(default)]
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub rating_profiles: Vec<RatingProfile>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub actions: HashMap<String, Vec<Action>>,
    #[serde(default)]
    pub action_timings: HashMap<String, Vec<ActionTiming>>,
}

impl StorageSeed {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let mut seed: StorageSeed = serde_json::from_str(json)?;
        seed.normalize();
        Ok(seed)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Order activation periods by time and plan tiers by start
    fn normalize(&mut self) {
        for profile in &mut self.rating_profiles {
            for periods in profile.destination_map.values_mut() {
                periods.sort_by_key(|p| p.activation_time);
                for period in periods.iter_mut() {
                    period.sort_plan_rates();
                }
            }
        }
    }

    /// Write everything into the storage
    pub async fn apply<S: DataStorage + ?Sized>(&self, storage: &S) -> Result<(), AppError> {
        for destination in &self.destinations {
            storage.set_destination(destination).await?;
        }
        for profile in &self.rating_profiles {
            storage.set_rating_profile(profile).await?;
        }
        for account in &self.accounts {
            storage.set_account(account).await?;
        }
        for (id, actions) in &self.actions {
            storage.set_actions(id, actions).await?;
        }
        for (key, timings) in &self.action_timings {
            storage.set_action_timings(key, timings).await?;
        }

        info!(
            destinations = self.destinations.len(),
            rating_profiles = self.rating_profiles.len(),
            accounts = self.accounts.len(),
            action_lists = self.actions.len(),
            action_timing_groups = self.action_timings.len(),
            "Seed applied"
        );
        Ok(())
    }
}
