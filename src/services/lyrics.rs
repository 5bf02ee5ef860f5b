//! LRCLIB lyrics client.
//!
//! Looks lyrics up by track title, primary artist, and album. Synced
//! (timestamped) lyrics win over plain text when both exist; the format
//! decides the sidecar file's extension.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::services::traits::LyricsApi;

const LRCLIB_BASE_URL: &str = "https://lrclib.net/api";
const USER_AGENT: &str = concat!("tunetag/", env!("CARGO_PKG_VERSION"));

/// Which kind of lyric text was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricFormat {
    /// Timestamped, synced lyrics
    Lrc,
    /// Plain unsynced text
    Txt,
}

impl LyricFormat {
    /// Sidecar file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            LyricFormat::Lrc => "lrc",
            LyricFormat::Txt => "txt",
        }
    }
}

/// Wire shape of an LRCLIB `get` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LyricsResponse {
    #[serde(default)]
    plain_lyrics: Option<String>,
    #[serde(default)]
    synced_lyrics: Option<String>,
    #[serde(default)]
    instrumental: bool,
}

impl LyricsResponse {
    fn into_lyrics(self) -> Option<(LyricFormat, String)> {
        if self.instrumental {
            return None;
        }
        if let Some(synced) = self.synced_lyrics.filter(|s| !s.trim().is_empty()) {
            return Some((LyricFormat::Lrc, synced));
        }
        self.plain_lyrics
            .filter(|s| !s.trim().is_empty())
            .map(|plain| (LyricFormat::Txt, plain))
    }
}

/// LRCLIB HTTP client.
pub struct LrclibClient {
    http: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::lyrics(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: LRCLIB_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LyricsApi for LrclibClient {
    async fn fetch_lyrics(
        &self,
        title: &str,
        artists: &[String],
        album: Option<&str>,
    ) -> Result<Option<(LyricFormat, String)>> {
        let artist = artists.first().map(String::as_str).unwrap_or_default();
        let url = format!("{}/get", self.base_url);
        let mut query = vec![("track_name", title), ("artist_name", artist)];
        if let Some(album) = album {
            query.push(("album_name", album));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::lyrics(format!("lyrics request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(title, artist, "No lyrics found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::lyrics(format!(
                "lyrics lookup for '{title}' returned {}",
                response.status()
            )));
        }

        let body: LyricsResponse = response
            .json()
            .await
            .map_err(|e| Error::lyrics(format!("failed to parse lyrics response: {e}")))?;
        Ok(body.into_lyrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extensions() {
        assert_eq!(LyricFormat::Lrc.extension(), "lrc");
        assert_eq!(LyricFormat::Txt.extension(), "txt");
    }

    #[test]
    fn test_client_with_custom_url() {
        let client = LrclibClient::with_base_url("http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_synced_lyrics_win_over_plain() {
        let response: LyricsResponse = serde_json::from_str(
            r#"{
                "plainLyrics": "hello world",
                "syncedLyrics": "[00:01.00] hello world",
                "instrumental": false
            }"#,
        )
        .unwrap();
        let (format, text) = response.into_lyrics().unwrap();
        assert_eq!(format, LyricFormat::Lrc);
        assert_eq!(text, "[00:01.00] hello world");
    }

    #[test]
    fn test_plain_lyrics_fall_back_to_txt() {
        let response: LyricsResponse = serde_json::from_str(
            r#"{"plainLyrics": "hello world", "syncedLyrics": null}"#,
        )
        .unwrap();
        let (format, text) = response.into_lyrics().unwrap();
        assert_eq!(format, LyricFormat::Txt);
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_instrumental_yields_no_lyrics() {
        let response: LyricsResponse = serde_json::from_str(
            r#"{"plainLyrics": "x", "syncedLyrics": "y", "instrumental": true}"#,
        )
        .unwrap();
        assert!(response.into_lyrics().is_none());
    }

    #[test]
    fn test_blank_lyrics_are_treated_as_absent() {
        let response: LyricsResponse =
            serde_json::from_str(r#"{"plainLyrics": "  ", "syncedLyrics": ""}"#).unwrap();
        assert!(response.into_lyrics().is_none());
    }
}
