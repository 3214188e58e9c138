//! Error types for Civicport

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    #[error("forbidden: {role} may not {action}")]
    Forbidden { role: String, action: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("notify error: {channel} - {message}")]
    Notify { channel: String, message: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn auth_failed(reason: impl Into<String>) -> Self {
        Self::AuthFailed {
            reason: reason.into(),
        }
    }

    pub fn forbidden(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Forbidden {
            role: role.into(),
            action: action.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn notify(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}
