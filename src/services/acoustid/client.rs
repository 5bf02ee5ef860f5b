//! AcoustID HTTP client.
//!
//! See: https://acoustid.org/webservice
//!
//! The `meta` parameter uses literal `+` as its separator; percent-encoding
//! it as `%2B` makes the API silently drop the requested metadata. The URL
//! is built by hand so the `+` survives.

use crate::error::{Error, Result};
use crate::services::fingerprint::AudioFingerprint;

use super::dto;

const LOOKUP_URL: &str = "https://api.acoustid.org/v2/lookup";

/// AcoustID API client.
pub struct AcoustidClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl AcoustidClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .gzip(true)
            .user_agent(concat!("tunetag/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.into(),
            http,
            base_url: LOOKUP_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Looks a fingerprint up, requesting recording and release-group
    /// metadata alongside the match scores.
    pub async fn lookup(&self, fingerprint: &AudioFingerprint) -> Result<dto::LookupResponse> {
        // The + separators must stay literal; see module docs.
        let url = format!(
            "{}?client={}&duration={}&fingerprint={}&meta=recordings+releasegroups+compress",
            self.base_url,
            urlencoding::encode(&self.api_key),
            fingerprint.duration_secs,
            urlencoding::encode(&fingerprint.fingerprint)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fingerprint(format!("lookup request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::fingerprint(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<dto::LookupResponse>()
            .await
            .map_err(|e| Error::fingerprint(format!("failed to parse lookup response: {e}")))
    }
}
