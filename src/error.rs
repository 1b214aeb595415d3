//! Error types for each layer.
//!
//! - [`CollectionError`]: the item collection was constructed with bad settings
//! - [`SourceError`]: a fetch from the timeline source failed
//! - [`ConfigError`]: startup configuration could not be loaded or validated
//!
//! Only the first and last are fatal. Source errors are logged by the poller
//! and retried on the next tick.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when building an [`ItemCollection`](crate::collection::ItemCollection).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("invalid configuration: capacity must be positive, got {0}")]
    InvalidCapacity(usize),
}

/// Errors from a [`DataSource`](crate::source::DataSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("rate limited")]
    RateLimited,

    #[error("unauthorized - check the OAuth credentials")]
    Unauthorized,

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Errors raised while loading [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
