//! Storage contract
//!
//! Every backend (in-memory, Redis) implements [`DataStorage`]. Getters
//! return `Ok(None)` for a missing item; errors are reserved for the backend
//! itself failing.

use crate::error::AppError;
use crate::models::{Account, Action, ActionTiming, Destination, RatingProfile};
use async_trait::async_trait;
use std::collections::HashMap;

/// Persistence of rating data, accounts and scheduled actions
#[async_trait]
pub trait DataStorage: Send + Sync {
    /// Find a rating profile by its `direction:tenant:category:subject` key
    async fn get_rating_profile(&self, key: &str) -> Result<Option<RatingProfile>, AppError>;

    /// Store a rating profile under its id
    async fn set_rating_profile(&self, profile: &RatingProfile) -> Result<(), AppError>;

    /// Find a destination by id
    async fn get_destination(&self, id: &str) -> Result<Option<Destination>, AppError>;

    /// Store a destination and index its prefixes
    async fn set_destination(&self, destination: &Destination) -> Result<(), AppError>;

    /// Ids of the destinations owning exactly this prefix
    async fn destination_ids_for_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Find an account by id
    async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError>;

    /// Store an account under its id
    async fn set_account(&self, account: &Account) -> Result<(), AppError>;

    /// Find an action list by id
    async fn get_actions(&self, id: &str) -> Result<Option<Vec<Action>>, AppError>;

    /// Store an action list
    async fn set_actions(&self, id: &str, actions: &[Action]) -> Result<(), AppError>;

    /// All action timing groups keyed by their storage key
    async fn get_all_action_timings(&self) -> Result<HashMap<String, Vec<ActionTiming>>, AppError>;

    /// Replace an action timing group; an empty list removes the key
    async fn set_action_timings(&self, key: &str, timings: &[ActionTiming]) -> Result<(), AppError>;

    /// Fetch several destinations, skipping unknown ids
    async fn get_destinations(&self, ids: &[String]) -> Result<Vec<Destination>, AppError> {
        let mut destinations = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(destination) = self.get_destination(id).await? {
                destinations.push(destination);
            }
        }
        Ok(destinations)
    }
}
