//! Converts AcoustID lookup responses into a [`Track`].
//!
//! The only place DTO types are turned into domain types; an API format
//! change touches this file and dto.rs, nothing else.

use crate::error::{Error, Result};
use crate::model::Track;

use super::dto;

/// Matches below this confidence are treated as misses.
pub const MIN_SCORE: f32 = 0.8;

/// Picks the best usable recording from a lookup response.
///
/// Results are scanned in descending score order; the first recording
/// with a title and at least one artist wins. Album info comes from the
/// recording's first release group when present.
pub fn best_track(response: dto::LookupResponse) -> Result<Option<Track>> {
    if response.status != "ok" {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Error::fingerprint(format!("lookup failed: {message}")));
    }

    let mut results = response.results;
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    for result in results {
        if result.score < MIN_SCORE {
            break;
        }
        for recording in result.recordings {
            if let Some(track) = to_track(recording) {
                return Ok(Some(track));
            }
        }
    }
    Ok(None)
}

fn to_track(recording: dto::Recording) -> Option<Track> {
    let title = recording.title.filter(|t| !t.trim().is_empty())?;
    if recording.artists.is_empty() {
        return None;
    }

    let track_artists: Vec<String> = recording.artists.into_iter().map(|a| a.name).collect();
    let release_group = recording.releasegroups.into_iter().next();
    let (album_name, album_artists) = match release_group {
        Some(rg) => {
            let artists: Vec<String> = rg.artists.into_iter().map(|a| a.name).collect();
            let artists = if artists.is_empty() {
                track_artists.clone()
            } else {
                artists
            };
            (rg.title, artists)
        }
        None => (None, track_artists.clone()),
    };

    Some(Track {
        track_name: Some(title),
        track_artists,
        album_name,
        album_artists,
        track_id: Some(recording.id),
        ..Default::default()
    })
}
