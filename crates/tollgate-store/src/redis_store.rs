//! Redis storage backend
//!
//! Values are stored as serde_json strings under namespaced keys (see
//! [`crate::keys`]). Destinations also maintain one Redis set per prefix
//! holding the ids of the destinations that own it.

use crate::keys::KeySpace;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tollgate_core::error::AppError;
use tollgate_core::models::{Account, Action, ActionTiming, Destination, RatingProfile};
use tollgate_core::traits::DataStorage;
use tracing::{debug, error, warn};

/// Redis storage with a multiplexed connection manager
#[derive(Clone)]
pub struct RedisStorage {
    manager: ConnectionManager,
    keys: KeySpace,
}

impl RedisStorage {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns `AppError::CacheConnection` if the connection fails
    pub async fn new(url: &str, namespace: &str) -> Result<Self, AppError> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::CacheConnection(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::CacheConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established successfully");
        Ok(Self {
            manager,
            keys: KeySpace::new(namespace),
        })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn flush_db(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;
        Ok(())
    }

    /// Convert RedisError to AppError
    fn map_redis_error(err: RedisError) -> AppError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                AppError::CacheConnection(format!("I/O error: {}", err))
            }
            redis::ErrorKind::TypeError => {
                warn!("Redis type error: {}", err);
                AppError::Cache(format!("Type mismatch: {}", err))
            }
            _ => {
                error!("Redis error: {}", err);
                AppError::Cache(err.to_string())
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        debug!("GET {}", key);
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(key).await.map_err(Self::map_redis_error)?;
        raw.map(|json| {
            serde_json::from_str::<T>(&json).map_err(|e| {
                error!("Failed to deserialize value for key {}: {}", key, e);
                AppError::Serialization(format!("Deserialization failed: {}", e))
            })
        })
        .transpose()
    }

    async fn set_json<T: Serialize + ?Sized + Sync>(&self, key: &str, value: &T) -> Result<(), AppError> {
        debug!("SET {}", key);
        let json = serde_json::to_string(value).map_err(|e| {
            error!("Failed to serialize value for key {}: {}", key, e);
            AppError::Serialization(format!("Serialization failed: {}", e))
        })?;
        let mut conn = self.manager.clone();
        let _: () = conn.set(key, json).await.map_err(Self::map_redis_error)?;
        Ok(())
    }
}

#[async_trait]
impl DataStorage for RedisStorage {
    async fn get_rating_profile(&self, key: &str) -> Result<Option<RatingProfile>, AppError> {
        self.get_json(&self.keys.rating_profile(key)).await
    }

    async fn set_rating_profile(&self, profile: &RatingProfile) -> Result<(), AppError> {
        self.set_json(&self.keys.rating_profile(&profile.id), profile).await
    }

    async fn get_destination(&self, id: &str) -> Result<Option<Destination>, AppError> {
        self.get_json(&self.keys.destination(id)).await
    }

    async fn set_destination(&self, destination: &Destination) -> Result<(), AppError> {
        let previous: Option<Destination> = self.get_destination(&destination.id).await?;
        let mut conn = self.manager.clone();

        if let Some(previous) = previous {
            for prefix in &previous.prefixes {
                let _: i64 = conn
                    .srem(self.keys.prefix_index(prefix), &previous.id)
                    .await
                    .map_err(Self::map_redis_error)?;
            }
        }
        for prefix in &destination.prefixes {
            let _: i64 = conn
                .sadd(self.keys.prefix_index(prefix), &destination.id)
                .await
                .map_err(Self::map_redis_error)?;
        }
        self.set_json(&self.keys.destination(&destination.id), destination)
            .await
    }

    async fn destination_ids_for_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.manager.clone();
        let mut ids: Vec<String> = conn
            .smembers(self.keys.prefix_index(prefix))
            .await
            .map_err(Self::map_redis_error)?;
        ids.sort();
        Ok(ids)
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        self.get_json(&self.keys.account(id)).await
    }

    async fn set_account(&self, account: &Account) -> Result<(), AppError> {
        self.set_json(&self.keys.account(&account.id), account).await
    }

    async fn get_actions(&self, id: &str) -> Result<Option<Vec<Action>>, AppError> {
        self.get_json(&self.keys.actions(id)).await
    }

    async fn set_actions(&self, id: &str, actions: &[Action]) -> Result<(), AppError> {
        self.set_json(&self.keys.actions(id), actions).await
    }

    async fn get_all_action_timings(&self) -> Result<HashMap<String, Vec<ActionTiming>>, AppError> {
        let mut conn = self.manager.clone();
        let full_keys: Vec<String> = redis::cmd("KEYS")
            .arg(self.keys.action_timings_pattern())
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;

        let mut groups = HashMap::with_capacity(full_keys.len());
        for full_key in full_keys {
            if let Some(timings) = self.get_json::<Vec<ActionTiming>>(&full_key).await? {
                groups.insert(self.keys.strip_action_timings(&full_key).to_string(), timings);
            }
        }
        Ok(groups)
    }

    async fn set_action_timings(&self, key: &str, timings: &[ActionTiming]) -> Result<(), AppError> {
        let full_key = self.keys.action_timings(key);
        if timings.is_empty() {
            let mut conn = self.manager.clone();
            let _: i64 = conn.del(&full_key).await.map_err(Self::map_redis_error)?;
            return Ok(());
        }
        self.set_json(&full_key, timings).await
    }
}
