//! # API Shared
//!
//! Shared utilities and definitions for the clinic API.
//!
//! Contains:
//! - Wire request/response types (`wire` module) and their conversions from core records
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`; the core crate never sees these types.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::HealthService;
pub use wire::*;
