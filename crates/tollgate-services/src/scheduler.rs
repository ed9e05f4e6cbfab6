//! Action scheduler
//!
//! Keeps the stored action timings in a queue ordered by their next run and
//! fires each one when it is due. Executions are spawned and never awaited
//! by the loop; a reload rebuilds the queue and wakes the loop up.

use crate::accounts::AccountService;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tollgate_core::{models::ActionTiming, traits::DataStorage, AppResult};
use tracing::{debug, error, info, instrument, warn};

/// What the loop does next
enum Next {
    Fire(ActionTiming),
    Wait(chrono::Duration),
    Idle,
}

pub struct Scheduler<S: DataStorage + 'static> {
    storage: Arc<S>,
    accounts: Arc<AccountService<S>>,
    queue: Mutex<Vec<ActionTiming>>,
    restart: Notify,
}

impl<S: DataStorage + 'static> Scheduler<S> {
    pub fn new(storage: Arc<S>, accounts: Arc<AccountService<S>>) -> Self {
        Self {
            storage,
            accounts,
            queue: Mutex::new(Vec::new()),
            restart: Notify::new(),
        }
    }

    /// Rebuild the queue from storage
    ///
    /// `*asap` timings are pinned to now and saved back. One-time timings
    /// are executed right away and removed from their group. Returns the
    /// number of queued timings.
    #[instrument(skip(self))]
    pub async fn load_action_timings(&self) -> AppResult<usize> {
        let groups = self.storage.get_all_action_timings().await?;
        let now = Utc::now();
        let mut queue = Vec::new();

        for (key, timings) in groups {
            let mut kept = Vec::with_capacity(timings.len());
            let mut changed = false;

            for mut timing in timings {
                changed |= timing.check_for_asap(now);
                if timing.is_one_time() {
                    info!(group = %key, timing_id = %timing.id, "Running one time actions");
                    if let Err(e) = self.accounts.execute_timing(&timing).await {
                        error!(group = %key, timing_id = %timing.id, error = %e, "One time actions failed");
                    }
                    changed = true;
                    continue;
                }

                kept.push(timing.clone());
                if timing.next_start_time(now).is_some() {
                    queue.push(timing);
                } else {
                    debug!(group = %key, timing_id = %timing.id, "Timing never runs again");
                }
            }

            if changed {
                self.storage.set_action_timings(&key, &kept).await?;
            }
        }

        queue.sort_by(ActionTiming::queue_cmp);
        let queued = queue.len();
        *self.queue.lock() = queue;
        info!(queued, "Action timings loaded");
        Ok(queued)
    }

    /// Reload from storage and restart the loop
    pub async fn reload(&self) -> AppResult<usize> {
        let queued = self.load_action_timings().await?;
        self.restart.notify_one();
        Ok(queued)
    }

    /// Number of queued timings
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Pop the head if it is due, requeueing it at its next run
    fn next(&self) -> Next {
        let now = Utc::now();
        let mut queue = self.queue.lock();
        let Some(due) = queue.first().and_then(ActionTiming::cached_next_run) else {
            return Next::Idle;
        };
        if due > now {
            return Next::Wait(due - now);
        }

        let mut timing = queue.remove(0);
        let fired = timing.clone();
        if timing.advance(now).is_some() {
            queue.push(timing);
            queue.sort_by(ActionTiming::queue_cmp);
        } else {
            debug!(timing_id = %fired.id, "Timing dropped after its last run");
        }
        Next::Fire(fired)
    }

    /// Scheduler loop, runs until the task is dropped
    pub async fn run(self: Arc<Self>) {
        info!("Scheduler started");
        loop {
            match self.next() {
                Next::Fire(timing) => {
                    debug!(timing_id = %timing.id, tag = %timing.tag, "Firing action timing");
                    let accounts = self.accounts.clone();
                    tokio::spawn(async move {
                        if let Err(e) = accounts.execute_timing(&timing).await {
                            warn!(timing_id = %timing.id, error = %e, "Scheduled execution failed");
                        }
                    });
                }
                Next::Idle => {
                    debug!("Scheduler queue empty");
                    self.restart.notified().await;
                }
                Next::Wait(wait) => {
                    let wait = wait.to_std().unwrap_or_default();
                    debug!(wait_secs = wait.as_secs(), "Timer set");
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = self.restart.notified() => debug!("Scheduler restarted"),
                    }
                }
            }
        }
    }
}
