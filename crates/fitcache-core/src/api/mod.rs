//! REST API client module for the fitness backend.
//!
//! This module provides the `ApiClient` for fetching challenges, the food
//! diary, health numbers and the workout program, and the closed `ApiError`
//! taxonomy every failure is folded into.
//!
//! Requests carry a bearer token obtained from the identity provider.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
