//! Civicport Core - Types, errors, and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::PortalConfig;
pub use error::{Error, Result};
pub use types::*;
