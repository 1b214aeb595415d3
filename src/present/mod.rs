//! Read-only views over the item collection.
//!
//! * [`html`] renders the listing served at `/`.
//! * [`atom`] renders the Atom document served at `/atom.xml`.
//!
//! Both take a snapshot (`&[Item]`) rather than the collection itself, so
//! rendering never holds the collection's lock.

pub mod atom;
pub mod html;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Timestamp layout used by the timeline API,
/// e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Static metadata describing the published feed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedMeta {
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Link")]
    pub link: String,
    #[serde(alias = "Description")]
    pub description: String,
    #[serde(alias = "AuthorName")]
    pub author_name: String,
    #[serde(alias = "AuthorEmail")]
    pub author_email: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self {
            title: "Home timeline".into(),
            link: "http://localhost:8000/".into(),
            description: "Recent posts from my home timeline".into(),
            author_name: String::new(),
            author_email: String::new(),
        }
    }
}

/// Counters describing lossy rendering decisions.
#[derive(Debug, Default)]
pub struct RenderStats {
    timestamp_fallbacks: AtomicU64,
}

impl RenderStats {
    pub fn record_timestamp_fallback(&self) {
        self.timestamp_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// How many entries were dated with the fallback timestamp because their
    /// own timestamp would not parse.
    pub fn timestamp_fallbacks(&self) -> u64 {
        self.timestamp_fallbacks.load(Ordering::Relaxed)
    }
}

/// Parse an item's source-native timestamp.
pub fn parse_created_at(created_at: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(created_at, CREATED_AT_FORMAT).ok()
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
