//! Lyric sidecar files.
//!
//! Lyrics land next to the organized audio file, sharing its stem:
//! `.lrc` for synced lyrics, `.txt` for plain text. A later run that
//! finds better (synced) lyrics replaces the stale plain-text sidecar.
//! The sidecar write holds the path lock with the longer lyric timeout
//! since lookups and writes can overlap across workers on one album.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::locks::{LYRIC_LOCK_TIMEOUT, LockRegistry};
use crate::model::Track;
use crate::services::lyrics::LyricFormat;
use crate::services::traits::LyricsApi;

const FETCH_RETRIES: u32 = 5;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);
/// Extra attempts to take the sidecar lock before giving up on the file.
const LOCK_RETRIES: u32 = 2;

/// Fetches lyrics for `track` and writes them beside `destination`.
///
/// Returns true when a sidecar was written (or refreshed), false when no
/// lyrics exist for the track. Transient lookup failures are retried; a
/// track that still fails after the retries is an error the caller may
/// treat as non-fatal.
pub async fn attach_lyrics(
    registry: &LockRegistry,
    api: &dyn LyricsApi,
    destination: &Path,
    track: &Track,
) -> Result<bool> {
    let Some(title) = track.track_name.as_deref() else {
        return Ok(false);
    };
    if track.track_artists.is_empty() {
        return Ok(false);
    }

    let found = fetch_with_retries(api, title, &track.track_artists, track.album_name.as_deref())
        .await?;
    let Some((format, text)) = found else {
        debug!(title, "No lyrics available");
        return Ok(false);
    };

    write_sidecar(registry, destination, format, &text).await?;
    info!(path = %destination.display(), format = format.extension(), "Lyrics attached");
    Ok(true)
}

async fn fetch_with_retries(
    api: &dyn LyricsApi,
    title: &str,
    artists: &[String],
    album: Option<&str>,
) -> Result<Option<(LyricFormat, String)>> {
    let mut last_err = None;
    for attempt in 1..=FETCH_RETRIES {
        match api.fetch_lyrics(title, artists, album).await {
            Ok(found) => return Ok(found),
            Err(e) => {
                warn!(title, attempt, error = %e, "Lyrics lookup failed");
                last_err = Some(e);
                if attempt < FETCH_RETRIES {
                    tokio::time::sleep(FETCH_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| Error::lyrics("lyrics retries exhausted")))
}

/// Writes the sidecar under its path lock, replacing a stale sidecar of
/// the other format. Identical existing content is left untouched.
async fn write_sidecar(
    registry: &LockRegistry,
    destination: &Path,
    format: LyricFormat,
    text: &str,
) -> Result<()> {
    let sidecar = sidecar_path(destination, format);
    let stale = sidecar_path(
        destination,
        match format {
            LyricFormat::Lrc => LyricFormat::Txt,
            LyricFormat::Txt => LyricFormat::Lrc,
        },
    );

    let mut attempt = 0;
    let _guard = loop {
        match registry.acquire(&sidecar, LYRIC_LOCK_TIMEOUT).await {
            Ok(guard) => break guard,
            Err(Error::LockTimeout(path)) if attempt < LOCK_RETRIES => {
                attempt += 1;
                warn!(path = %path.display(), attempt, "Sidecar lock busy, retrying");
            }
            Err(e) => return Err(e),
        }
    };

    // Either format's sidecar may already hold exactly this text.
    for candidate in [&sidecar, &stale] {
        if let Ok(existing) = tokio::fs::read(candidate).await
            && existing == text.as_bytes()
        {
            debug!(path = %candidate.display(), "Sidecar already up to date");
            return Ok(());
        }
    }

    if tokio::fs::try_exists(&stale).await.unwrap_or(false) {
        debug!(path = %stale.display(), "Removing stale lyric sidecar");
        tokio::fs::remove_file(&stale).await?;
    }

    tokio::fs::write(&sidecar, text).await?;
    Ok(())
}

fn sidecar_path(destination: &Path, format: LyricFormat) -> PathBuf {
    destination.with_extension(format.extension())
}
