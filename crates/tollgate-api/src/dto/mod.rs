//! Data Transfer Objects (DTOs) for API requests and responses

pub mod account;
pub mod common;
pub mod rating;

pub use account::*;
pub use common::*;
pub use rating::*;
