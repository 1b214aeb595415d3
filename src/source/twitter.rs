//! Home-timeline source backed by the Twitter v1.1 REST API.
//!
//! Requests are signed with OAuth 1.0a (see [`super::oauth`]).  The JSON
//! payload is mapped onto [`Item`] by [`TwitterSource::parse_timeline`], a
//! pure function so tests can exercise it without the network.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::oauth::Credentials;
use super::{DataSource, Item};
use crate::error::SourceError;

/// Default API root.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

/// Largest page the home timeline endpoint will return.
const PAGE_SIZE: &str = "200";

/// The account a raw post was written by.
#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One post as the API returns it.  Only the fields we use are decoded.
#[derive(Debug, Deserialize)]
pub struct RawTweet {
    pub id_str: String,
    pub created_at: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Present instead of `text` in extended mode.
    #[serde(default)]
    pub full_text: Option<String>,
    pub user: RawUser,
}

/// Polls the authenticated account's home timeline.
pub struct TwitterSource {
    http: Client,
    api_base: String,
    credentials: Credentials,
    label: String,
}

impl TwitterSource {
    pub fn new(api_base: impl Into<String>, credentials: Credentials) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            label: format!("home timeline ({api_base})"),
            api_base,
            credentials,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Convert an API page (newest first) into items, oldest first.
    pub fn parse_timeline(tweets: Vec<RawTweet>) -> Vec<Item> {
        tweets
            .into_iter()
            .rev()
            .map(|t| {
                Item::new(
                    t.user.screen_name,
                    t.user.name.unwrap_or_default(),
                    t.full_text.or(t.text).unwrap_or_default(),
                    t.created_at,
                    t.id_str,
                )
            })
            .collect()
    }

    /// Signed GET; returns the successful response or a classified error.
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Response, SourceError> {
        let url = self.api_url(path);
        let auth = self.credentials.authorization_header("GET", &url, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(SourceError::Unauthorized)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(SourceError::RateLimited)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(SourceError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl DataSource for TwitterSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, since_id: Option<&str>) -> Result<Vec<Item>, SourceError> {
        let mut params = vec![("count", PAGE_SIZE), ("tweet_mode", "extended")];
        if let Some(since) = since_id {
            params.push(("since_id", since));
        }

        let response = self.get("/statuses/home_timeline.json", &params).await?;
        let tweets: Vec<RawTweet> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(Self::parse_timeline(tweets))
    }

    async fn verify(&self) -> Result<(), SourceError> {
        self.get("/account/verify_credentials.json", &[("skip_status", "true")])
            .await
            .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
