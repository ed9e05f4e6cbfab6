//! Shared handler state

use std::sync::Arc;
use tollgate_core::traits::DataStorage;
use tollgate_services::{AccountService, RatingEngine, Scheduler};

/// Services shared by every worker
pub struct AppState<S: DataStorage + 'static> {
    pub rating: Arc<RatingEngine<S>>,
    pub accounts: Arc<AccountService<S>>,
    pub scheduler: Arc<Scheduler<S>>,
}

impl<S: DataStorage + 'static> AppState<S> {
    pub fn new(
        rating: Arc<RatingEngine<S>>,
        accounts: Arc<AccountService<S>>,
        scheduler: Arc<Scheduler<S>>,
    ) -> Self {
        Self {
            rating,
            accounts,
            scheduler,
        }
    }
}
