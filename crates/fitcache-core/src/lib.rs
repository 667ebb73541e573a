//! Core library for fitcache.
//!
//! In-memory read-through caches for a fitness-tracking client, the API
//! client that feeds them, the data models they hold, session handling and
//! the calorie calculator used during onboarding.

pub mod api;
pub mod auth;
pub mod cache;
pub mod calc;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResult};
pub use cache::AppCaches;
pub use config::Config;
