//! OAuth 1.0a request signing (HMAC-SHA1), as required by the timeline API.
//!
//! Only the pieces a read-only client needs: building the signature base
//! string from the request method, URL and parameters, signing it with the
//! consumer and token secrets, and formatting the `Authorization` header.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use urlencoding::encode;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Consumer and access-token key pairs for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

// Keep secrets out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build the `Authorization` header value for a request.
    ///
    /// `params` are the query (or form) parameters that will be sent with
    /// the request; they take part in the signature.
    pub fn authorization_header(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, &nonce, &timestamp)
    }

    fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut all = params.to_vec();
        all.extend_from_slice(&oauth_params);
        let signature = self.sign(&signature_base_string(method, url, &all));

        let fields: Vec<String> = oauth_params
            .iter()
            .copied()
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }

    /// Base64 HMAC-SHA1 of `base_string`, keyed by both secrets.
    fn sign(&self, base_string: &str) -> String {
        let key = format!("{}&{}", encode(&self.consumer_secret), encode(&self.token_secret));
        let mut mac =
            HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
        mac.update(base_string.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

/// `METHOD&enc(url)&enc(sorted, encoded parameters)` as defined by RFC 5849.
pub fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
        .collect();
    encoded.sort();

    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&joined)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
