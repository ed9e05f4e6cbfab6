//! Storage key builders for Tollgate
//!
//! Provides standardized key naming patterns for every stored entity, under
//! a configurable namespace (`tollgate` by default).
//!
//! # Key Patterns
//!
//! - `{ns}:rp:{key}` - Rating profile by `direction:tenant:category:subject`
//! - `{ns}:dest:{id}` - Destination by id
//! - `{ns}:pfx:{prefix}` - Set of destination ids owning a prefix
//! - `{ns}:acc:{id}` - Account by id
//! - `{ns}:act:{id}` - Action list by id
//! - `{ns}:apl:{key}` - Action timing group by key
//!
//! # Example
//!
//! ```
//! use tollgate_store::keys::KeySpace;
//!
//! let keys = KeySpace::new("tollgate");
//! assert_eq!(keys.account("rif"), "tollgate:acc:rif");
//! assert_eq!(keys.prefix_index("0723"), "tollgate:pfx:0723");
//! ```

/// Rating profiles
pub const RATING_PROFILE_PREFIX: &str = "rp";

/// Destinations
pub const DESTINATION_PREFIX: &str = "dest";

/// Prefix index sets
pub const PREFIX_INDEX_PREFIX: &str = "pfx";

/// Accounts
pub const ACCOUNT_PREFIX: &str = "acc";

/// Action lists
pub const ACTIONS_PREFIX: &str = "act";

/// Action timing groups
pub const ACTION_TIMINGS_PREFIX: &str = "apl";

/// Default namespace
pub const DEFAULT_NAMESPACE: &str = "tollgate";

/// Namespaced key builder
#[derive(Debug, Clone)]
pub struct KeySpace {
    namespace: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn key(&self, kind: &str, id: &str) -> String {
        format!("{}:{}:{}", self.namespace, kind, id)
    }

    pub fn rating_profile(&self, key: &str) -> String {
        self.key(RATING_PROFILE_PREFIX, key)
    }

    pub fn destination(&self, id: &str) -> String {
        self.key(DESTINATION_PREFIX, id)
    }

    pub fn prefix_index(&self, prefix: &str) -> String {
        self.key(PREFIX_INDEX_PREFIX, prefix)
    }

    pub fn account(&self, id: &str) -> String {
        self.key(ACCOUNT_PREFIX, id)
    }

    pub fn actions(&self, id: &str) -> String {
        self.key(ACTIONS_PREFIX, id)
    }

    pub fn action_timings(&self, key: &str) -> String {
        self.key(ACTION_TIMINGS_PREFIX, key)
    }

    /// Pattern matching every action timing group
    pub fn action_timings_pattern(&self) -> String {
        self.key(ACTION_TIMINGS_PREFIX, "*")
    }

    /// Group key from a full action timing storage key
    pub fn strip_action_timings<'a>(&self, full: &'a str) -> &'a str {
        let prefix_len = self.namespace.len() + ACTION_TIMINGS_PREFIX.len() + 2;
        full.get(prefix_len..).unwrap_or(full)
    }
}
