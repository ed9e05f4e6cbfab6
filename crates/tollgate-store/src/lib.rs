//! Storage backends for Tollgate
//!
//! Implements the `DataStorage` trait from tollgate-core twice:
//!
//! - [`MemoryStorage`]: process-local maps, for tests and single-node runs
//! - [`RedisStorage`]: serde_json values in Redis through a ConnectionManager
//!
//! [`Storage`] picks one of them from the configuration, and
//! [`StorageSeed`] loads a JSON document into either.

pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod seed;

pub use memory::MemoryStorage;
pub use redis_store::RedisStorage;
pub use seed::StorageSeed;

use async_trait::async_trait;
use std::collections::HashMap;
use tollgate_core::config::{StorageBackend, StorageConfig};
use tollgate_core::error::AppError;
use tollgate_core::models::{Account, Action, ActionTiming, Destination, RatingProfile};
use tollgate_core::traits::DataStorage;
use tracing::info;

/// Backend selected at startup
pub enum Storage {
    Memory(MemoryStorage),
    Redis(RedisStorage),
}

impl Storage {
    /// Build the configured backend and apply the seed file, if any
    pub async fn connect(config: &StorageConfig) -> Result<Self, AppError> {
        let storage = match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Storage::Memory(MemoryStorage::new())
            }
            StorageBackend::Redis => {
                let url = config
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| AppError::MissingField("storage.redis_url".to_string()))?;
                let redis = RedisStorage::new(url, &config.key_prefix).await?;
                redis.ping().await?;
                info!("Using Redis storage");
                Storage::Redis(redis)
            }
        };

        if let Some(path) = &config.seed_file {
            info!(path = %path, "Loading seed");
            StorageSeed::from_file(path)?.apply(&storage).await?;
        }
        Ok(storage)
    }

    fn backend(&self) -> &dyn DataStorage {
        match self {
            Storage::Memory(memory) => memory,
            Storage::Redis(redis) => redis,
        }
    }
}

#[async_trait]
impl DataStorage for Storage {
    async fn get_rating_profile(&self, key: &str) -> Result<Option<RatingProfile>, AppError> {
        self.backend().get_rating_profile(key).await
    }

    async fn set_rating_profile(&self, profile: &RatingProfile) -> Result<(), AppError> {
        self.backend().set_rating_profile(profile).await
    }

    async fn get_destination(&self, id: &str) -> Result<Option<Destination>, AppError> {
        self.backend().get_destination(id).await
    }

    async fn set_destination(&self, destination: &Destination) -> Result<(), AppError> {
        self.backend().set_destination(destination).await
    }

    async fn destination_ids_for_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        self.backend().destination_ids_for_prefix(prefix).await
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        self.backend().get_account(id).await
    }

    async fn set_account(&self, account: &Account) -> Result<(), AppError> {
        self.backend().set_account(account).await
    }

    async fn get_actions(&self, id: &str) -> Result<Option<Vec<Action>>, AppError> {
        self.backend().get_actions(id).await
    }

    async fn set_actions(&self, id: &str, actions: &[Action]) -> Result<(), AppError> {
        self.backend().set_actions(id, actions).await
    }

    async fn get_all_action_timings(&self) -> Result<HashMap<String, Vec<ActionTiming>>, AppError> {
        self.backend().get_all_action_timings().await
    }

    async fn set_action_timings(&self, key: &str, timings: &[ActionTiming]) -> Result<(), AppError> {
        self.backend().set_action_timings(key, timings).await
    }
}
