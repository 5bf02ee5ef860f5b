//! Spotify Web API client.
//!
//! Auth uses the client-credentials grant. The token is cached on disk
//! between runs and refreshed behind an async mutex so concurrent workers
//! never stampede the auth endpoint. Search and lookup responses are
//! memoized in memory for the life of the run; a batch of files from one
//! album hits the API once per distinct query.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Track;
use crate::services::traits::CatalogApi;

use super::{adapter, dto};

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const AUTH_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = concat!("tunetag/", env!("CARGO_PKG_VERSION"));

/// Refresh the token when less than this much lifetime remains.
const TOKEN_EXPIRY_MARGIN: chrono::Duration = chrono::Duration::seconds(45);
/// Search page size; large enough that an exact match is almost always in
/// the first page.
const SEARCH_LIMIT: u32 = 25;
const RATE_LIMIT_RETRIES: u32 = 3;
const DEFAULT_RATE_LIMIT_PAUSE: Duration = Duration::from_secs(2);

/// Client-credentials pair for the catalog API.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Access token with its absolute expiry, persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self) -> bool {
        self.expires_at - Utc::now() > TOKEN_EXPIRY_MARGIN
    }
}

/// Spotify API client with auth, memoization, and rate-limit backoff.
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    auth_url: String,
    credentials: SpotifyCredentials,
    /// Serializes token refresh across workers
    token: tokio::sync::Mutex<Option<CachedToken>>,
    /// Per-run response memo, keyed by query
    memo: parking_lot::Mutex<HashMap<String, Option<Track>>>,
    /// On-disk token cache location, None to skip persistence
    token_cache: Option<PathBuf>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials, token_cache: Option<PathBuf>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::catalog(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: API_BASE_URL.to_string(),
            auth_url: AUTH_URL.to_string(),
            credentials,
            token: tokio::sync::Mutex::new(None),
            memo: parking_lot::Mutex::new(HashMap::new()),
            token_cache: token_cache.map(|dir| dir.join("catalog_token.json")),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(credentials: SpotifyCredentials, base_url: &str, auth_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            auth_url: auth_url.to_string(),
            credentials,
            token: tokio::sync::Mutex::new(None),
            memo: parking_lot::Mutex::new(HashMap::new()),
            token_cache: None,
        }
    }

    /// Returns a usable bearer token, refreshing (and persisting) if the
    /// cached one is absent or about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;

        if let Some(token) = slot.as_ref().filter(|t| t.is_usable()) {
            return Ok(token.access_token.clone());
        }

        if slot.is_none()
            && let Some(token) = self.load_cached_token()
            && token.is_usable()
        {
            let access = token.access_token.clone();
            *slot = Some(token);
            return Ok(access);
        }

        debug!("Requesting new catalog access token");
        let response = self
            .http
            .post(&self.auth_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::catalog(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::catalog(format!(
                "token request rejected: HTTP {}",
                response.status()
            )));
        }

        let granted: dto::TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::catalog(format!("failed to parse token response: {e}")))?;

        let token = CachedToken {
            access_token: granted.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(granted.expires_in),
        };
        self.store_cached_token(&token);
        let access = token.access_token.clone();
        *slot = Some(token);
        Ok(access)
    }

    fn load_cached_token(&self) -> Option<CachedToken> {
        let path = self.token_cache.as_ref()?;
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Best-effort persistence; a failure only costs one extra token grant
    /// next run.
    fn store_cached_token(&self, token: &CachedToken) {
        let Some(path) = self.token_cache.as_ref() else {
            return;
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, serde_json::to_string(token).unwrap_or_default())?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!(path = %path.display(), error = %e, "Failed to persist token cache");
        }
    }

    /// Authorized GET with rate-limit backoff. `Ok(None)` for 404 and for
    /// malformed-ID 400s.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        for attempt in 0..=RATE_LIMIT_RETRIES {
            let token = self.bearer_token().await?;
            let response = self
                .http
                .get(url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| Error::catalog(format!("request failed: {e}")))?;

            match response.status() {
                StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => return Ok(None),
                StatusCode::TOO_MANY_REQUESTS if attempt < RATE_LIMIT_RETRIES => {
                    let pause = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(DEFAULT_RATE_LIMIT_PAUSE);
                    warn!(url, pause_secs = pause.as_secs(), "Rate limited, backing off");
                    tokio::time::sleep(pause).await;
                    continue;
                }
                status if !status.is_success() => {
                    let message = match response.json::<dto::ApiError>().await {
                        Ok(body) => body.error.message,
                        Err(_) => status
                            .canonical_reason()
                            .unwrap_or("unknown error")
                            .to_string(),
                    };
                    return Err(Error::catalog(format!("HTTP {status}: {message}")));
                }
                _ => {
                    let body = response
                        .json::<T>()
                        .await
                        .map_err(|e| Error::catalog(format!("failed to parse response: {e}")))?;
                    return Ok(Some(body));
                }
            }
        }
        Err(Error::catalog("rate limit retries exhausted"))
    }

    /// Attaches audio features and primary-artist genres to a track dto.
    /// Either lookup failing degrades to an un-enriched track rather than
    /// failing the match.
    async fn enrich(&self, dto: dto::TrackDto) -> Track {
        let features = match self
            .get_json::<dto::AudioFeaturesDto>(&format!(
                "{}/audio-features/{}",
                self.base_url, dto.id
            ))
            .await
        {
            Ok(features) => features,
            Err(e) => {
                debug!(track_id = %dto.id, error = %e, "Audio-features lookup failed");
                None
            }
        };

        let genres = match adapter::primary_artist_id(&dto) {
            Some(artist_id) => match self
                .get_json::<dto::ArtistDetailDto>(&format!("{}/artists/{artist_id}", self.base_url))
                .await
            {
                Ok(detail) => detail.map(|d| d.genres).unwrap_or_default(),
                Err(e) => {
                    debug!(artist_id, error = %e, "Artist genre lookup failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        adapter::to_track(dto, features, genres)
    }

    fn memo_get(&self, key: &str) -> Option<Option<Track>> {
        self.memo.lock().get(key).cloned()
    }

    fn memo_put(&self, key: String, value: Option<Track>) {
        self.memo.lock().insert(key, value);
    }
}

#[async_trait::async_trait]
impl CatalogApi for SpotifyClient {
    async fn search_by_id(&self, track_id: &str) -> Result<Option<Track>> {
        let key = format!("id:{track_id}");
        if let Some(hit) = self.memo_get(&key) {
            return Ok(hit);
        }

        let url = format!("{}/tracks/{track_id}", self.base_url);
        let result = match self.get_json::<dto::TrackDto>(&url).await? {
            Some(dto) => Some(self.enrich(dto).await),
            None => None,
        };

        self.memo_put(key, result.clone());
        Ok(result)
    }

    async fn search_by_title_artist(
        &self,
        title: &str,
        artists: &[String],
    ) -> Result<Option<Track>> {
        let key = format!("search:{title}|{}", artists.join(","));
        if let Some(hit) = self.memo_get(&key) {
            return Ok(hit);
        }

        let query = format!("{} {}", artists.join(" "), title);
        let url = format!(
            "{}/search?q={}&type=track&limit={SEARCH_LIMIT}",
            self.base_url,
            urlencoding::encode(query.trim())
        );

        let result = match self.get_json::<dto::SearchResponse>(&url).await? {
            Some(response) => {
                let candidate = response
                    .tracks
                    .items
                    .into_iter()
                    .find(|c| adapter::candidate_matches(title, artists, c));
                match candidate {
                    Some(dto) => Some(self.enrich(dto).await),
                    None => None,
                }
            }
            None => None,
        };

        self.memo_put(key, result.clone());
        Ok(result)
    }
}
