//! Business logic services for Tollgate
//!
//! This crate contains the services that orchestrate rating and charging on
//! top of a [`DataStorage`](tollgate_core::traits::DataStorage) backend.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service holds its storage as an `Arc<S>`
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - Account mutations are serialized per account, never globally
//! - All operations are instrumented with tracing
//!
//! # Services
//!
//! - `RatingEngine` - Profile resolution, call pricing, max session and debit
//! - `AccountService` - Locked account reads, debits and action execution
//! - `Scheduler` - Timed execution of action lists
//!
//! The time-span splitter lives in [`splitter`] and is pure.

pub mod accounts;
pub mod rating;
pub mod scheduler;
pub mod splitter;

pub use accounts::{AccountService, DebitOutcome};
pub use rating::{RatingEngine, Resolved, SessionLimit};
pub use scheduler::Scheduler;
