//! Civicport Backend - HTTP client for the managed backend (auth + tables)

pub mod auth;
pub mod client;
pub mod profiles;
pub mod table;

pub use auth::{AuthSession, AuthUser};
pub use client::BackendClient;
pub use profiles::resolve_profile;
