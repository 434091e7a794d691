//! Backend access
//!
//! The console talks to a Laravel-style REST API. Screens depend on the
//! [`AdminBackend`] trait; [`ApiClient`] is the reqwest implementation.
//! Every call takes the credential explicitly, so the HTTP client carries no
//! mutable per-user state.

pub mod client;
pub mod errors;

pub use client::{AdminBackend, ApiClient};
pub use errors::ApiError;
