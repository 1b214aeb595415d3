//! The value type shared by every timeline source.
//!
//! `Item` represents a single post from the home timeline.  Sources convert
//! their native payloads into `Item`s so the collection, poller and
//! presenters never need to know which API produced them.
//!
//! ## For contributors
//!
//! Items are plain values: once a source has built one nothing mutates it.
//! The collection hands out clones, never references into its own state.

use std::fmt;

/// Base URL used to build permalinks and profile links.
const SITE_URL: &str = "https://twitter.com";

/// A single timeline entry.
///
/// Identity is [`id`](Item::id).  Ids are opaque strings compared
/// lexically when the collection tracks the newest one it has seen; the
/// upstream API issues fixed-width, increasing numeric strings so lexical
/// order matches posting order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Item {
    /// Account handle without the leading `@`.
    pub author_handle: String,

    /// Human-readable account name.  May be empty when the source omits it.
    pub author_display_name: String,

    /// Post text, unescaped.
    pub body: String,

    /// Timestamp exactly as the source reported it
    /// (e.g. `Wed Oct 10 20:19:24 +0000 2018`).
    pub created_at: String,

    /// Opaque, source-assigned identifier.
    pub id: String,
}

impl Item {
    pub fn new(
        author_handle: impl Into<String>,
        author_display_name: impl Into<String>,
        body: impl Into<String>,
        created_at: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            author_handle: author_handle.into(),
            author_display_name: author_display_name.into(),
            body: body.into(),
            created_at: created_at.into(),
            id: id.into(),
        }
    }

    /// Link to the post on the source site.
    ///
    /// Empty fields are not rejected: the result is still a well-formed URL,
    /// it just doesn't point anywhere useful.
    pub fn permalink(&self) -> String {
        format!("{SITE_URL}/{}/status/{}", self.author_handle, self.id)
    }

    /// Link to the author's profile.
    pub fn profile_url(&self) -> String {
        format!("{SITE_URL}/{}", self.author_handle)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t@{}\t{}", self.created_at, self.author_handle, self.body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
