//! Civicport Gateway - HTTP API for the citizen services portal

pub mod error;
pub mod guard;
pub mod handlers;
pub mod server;
pub mod state;

pub use server::start_portal;
pub use state::AppState;
