//! Tollgate Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Tollgate rating engine. It includes:
//!
//! - Domain models (CalendarRule, RatePlan, TimeSpan, Account, etc.)
//! - The storage contract shared by every backend
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
