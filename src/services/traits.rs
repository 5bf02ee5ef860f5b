//! Trait definitions for external service clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FingerprintOutcome, Track};
use crate::services::lyrics::LyricFormat;

/// Online catalog lookup.
///
/// The client applies its own auth, caching, and rate-limit backoff; the
/// core treats every call as potentially slow.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Resolve a catalog track ID to full metadata.
    async fn search_by_id(&self, track_id: &str) -> Result<Option<Track>>;

    /// Search by title and artist list; returns the first candidate that
    /// passes the match predicate, in provider order.
    async fn search_by_title_artist(
        &self,
        title: &str,
        artists: &[String],
    ) -> Result<Option<Track>>;
}

/// Acoustic fingerprint recognizer.
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    /// Recognizer name for logs.
    fn name(&self) -> &str;

    /// Fingerprint `path` and look it up. `Ok(None)` means the recognizer
    /// ran but found no match.
    async fn fingerprint(&self, path: &Path) -> Result<Option<FingerprintOutcome>>;
}

/// Lyrics lookup keyed by track metadata.
#[async_trait]
pub trait LyricsApi: Send + Sync {
    /// Fetch lyrics; `Ok(None)` means none were found.
    async fn fetch_lyrics(
        &self,
        title: &str,
        artists: &[String],
        album: Option<&str>,
    ) -> Result<Option<(LyricFormat, String)>>;
}
