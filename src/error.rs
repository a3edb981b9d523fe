//! Error handling for the MediLink Rust client

use std::fmt;
use thiserror::Error;

/// Unified error type for the MediLink Rust client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Live query errors
    #[error("Live query error: {0}")]
    Live(String),

    /// Client-side validation errors, raised before any network call
    #[error("{0}")]
    Validation(String),

    /// Device geolocation unavailable or denied
    #[error("Geolocation error: {0}")]
    Geolocation(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new document store error
    pub fn store<T: fmt::Display>(msg: T) -> Self {
        Error::Store(msg.to_string())
    }

    /// Create a new live query error
    pub fn live<T: fmt::Display>(msg: T) -> Self {
        Error::Live(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new geolocation error
    pub fn geolocation<T: fmt::Display>(msg: T) -> Self {
        Error::Geolocation(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}
