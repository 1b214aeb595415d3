//! Startup configuration.
//!
//! Read once from a JSON file, overlaid with credentials from the
//! environment (a `.env` file is honoured), validated, and then shared
//! read-only for the life of the process.
//!
//! Keys are snake_case; the PascalCase names used by older config files
//! (`MaxTweets`, `PollInterval`, `Port`, `ConsumerKey`, ...) are accepted too.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::collection::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::error::ConfigError;
use crate::poll::{PollSettings, DEFAULT_FETCH_TIMEOUT, DEFAULT_INTERVAL};
use crate::present::FeedMeta;
use crate::source::oauth::Credentials;
use crate::source::twitter::DEFAULT_API_BASE;

const ENV_PREFIX: &str = "TWEET_RELAY_";

/// The file as written on disk, before validation.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    #[serde(alias = "ConsumerKey")]
    consumer_key: String,
    #[serde(alias = "ConsumerSecret")]
    consumer_secret: String,
    #[serde(alias = "OauthToken")]
    oauth_token: String,
    #[serde(alias = "OauthSecret")]
    oauth_secret: String,
    #[serde(alias = "MaxTweets")]
    max_items: usize,
    /// Seconds.
    #[serde(alias = "PollInterval")]
    poll_interval: u64,
    /// Seconds.
    fetch_timeout: u64,
    #[serde(alias = "Port")]
    listen: String,
    api_base: String,
    feed: FeedMeta,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            oauth_token: String::new(),
            oauth_secret: String::new(),
            max_items: DEFAULT_CAPACITY,
            poll_interval: DEFAULT_INTERVAL.as_secs(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT.as_secs(),
            listen: "0.0.0.0:8000".into(),
            api_base: DEFAULT_API_BASE.into(),
            feed: FeedMeta::default(),
        }
    }
}

/// Validated, immutable configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub max_items: usize,
    pub poll: PollSettings,
    /// `host:port`; the host may be a name, resolved when the listener binds.
    pub listen: String,
    pub api_base: String,
    pub feed: FeedMeta,
}

impl Config {
    /// Load `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, |key| env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Parse and validate a JSON document.  `lookup` supplies credential
    /// overrides by suffix (e.g. `CONSUMER_KEY`).
    pub fn from_json(
        text: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut raw: RawConfig = serde_json::from_str(text)?;

        for (key, slot) in [
            ("CONSUMER_KEY", &mut raw.consumer_key),
            ("CONSUMER_SECRET", &mut raw.consumer_secret),
            ("OAUTH_TOKEN", &mut raw.oauth_token),
            ("OAUTH_SECRET", &mut raw.oauth_secret),
        ] {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let credentials = Credentials {
            consumer_key: required("consumer_key", self.consumer_key)?,
            consumer_secret: required("consumer_secret", self.consumer_secret)?,
            token: required("oauth_token", self.oauth_token)?,
            token_secret: required("oauth_secret", self.oauth_secret)?,
        };

        if self.max_items == 0 {
            return Err(invalid("max_items", "must be at least 1"));
        }
        if self.max_items > MAX_CAPACITY {
            return Err(invalid(
                "max_items",
                &format!("must be at most {MAX_CAPACITY}"),
            ));
        }
        if self.poll_interval == 0 {
            return Err(invalid("poll_interval", "must be at least 1 second"));
        }
        if self.fetch_timeout == 0 {
            return Err(invalid("fetch_timeout", "must be at least 1 second"));
        }

        Ok(Config {
            credentials,
            max_items: self.max_items,
            poll: PollSettings {
                interval: Duration::from_secs(self.poll_interval),
                fetch_timeout: Duration::from_secs(self.fetch_timeout),
            },
            listen: parse_listen(&self.listen)?,
            api_base: self.api_base,
            feed: self.feed,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingCredential(field))
    } else {
        Ok(value)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Accepts `host:port` or a bare `:port` (all interfaces).  The host may be
/// an IP literal (`[::1]` for IPv6) or a name such as `localhost`.
pub fn parse_listen(listen: &str) -> Result<String, ConfigError> {
    let full = if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    };

    let Some((host, port)) = full.rsplit_once(':') else {
        return Err(invalid("listen", &format!("{listen:?}: expected host:port")));
    };
    if host.is_empty() {
        return Err(invalid("listen", &format!("{listen:?}: empty host")));
    }
    port.parse::<u16>()
        .map_err(|e| invalid("listen", &format!("{listen:?}: bad port: {e}")))?;
    Ok(full)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
