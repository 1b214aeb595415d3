//! Timeline source abstraction layer.
//!
//! This module defines the [`DataSource`] trait and the common [`Item`]
//! type.  Concrete source implementations live in sub-modules (currently only
//! [`twitter`], which signs its requests with [`oauth`]).
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `mastodon.rs`).
//! 2. Define a struct and implement [`DataSource`] for it.  `fetch` must
//!    return items oldest-first and only those newer than `since_id` when
//!    the upstream API supports it.
//! 3. Add `mod mastodon;` below and re-export your struct.
//! 4. Construct it in `main.rs` instead of [`TwitterSource`].
//!
//! The poller, collection and presenters are all source-agnostic.

mod item;
pub mod oauth;
pub mod twitter;

pub use item::Item;
pub use twitter::TwitterSource;

use async_trait::async_trait;

use crate::error::SourceError;

/// Trait that every timeline source must implement.
///
/// The poller calls [`fetch()`](DataSource::fetch) from a background tokio
/// task, so implementations must be `Send + Sync`.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable label used in log output.
    fn name(&self) -> &str;

    /// Fetch items newer than `since_id` (everything available when `None`),
    /// oldest first.
    ///
    /// Errors are logged by the poller and the fetch is retried on the next
    /// tick.
    async fn fetch(&self, since_id: Option<&str>) -> Result<Vec<Item>, SourceError>;

    /// Check that the configured credentials are accepted.  Called once at
    /// startup; a failure aborts the process.
    async fn verify(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
