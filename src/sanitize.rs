//! Path sanitization and length budgeting.
//!
//! Destination paths are built from free-text metadata (artist, album,
//! title), which may contain filesystem-illegal characters or exceed the
//! OS path-length limit. This module guarantees every generated segment is
//! legal and that the four metadata segments together fit the budget left
//! after the store root.
//!
//! Layout being budgeted: `[store root][artist][album info][track info]`.
//! Each artist segment gets 20% of the remaining budget, each name segment
//! 30%, all additionally capped at half a typical 255-char filename limit.

use std::path::Path;

use crate::model::Track;

/// Characters never allowed in a generated path segment.
pub const INVALID_PATH_CHARS: &[char] = &[
    '<', '>', ':', '"', '/', '\\', '|', '?', '*', '.', '\0',
];

/// Per-segment hard cap: half of a 255-char filename, minus separator room.
const MAX_SEGMENT: usize = 255 / 2 - 7;

/// Safety buffer subtracted from the platform path maximum.
const PATH_MAX_BUFFER: usize = 5;

#[cfg(windows)]
const OS_PATH_MAX: usize = 260;
#[cfg(not(windows))]
const OS_PATH_MAX: usize = 4096;

/// The four sanitized, length-budgeted path segments for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSegments {
    pub album_artist: String,
    pub album_name: String,
    pub track_artist: String,
    pub track_name: String,
}

/// Deletes every filesystem-illegal character from `s`.
///
/// Deterministic and idempotent; never truncates.
pub fn remove_invalid_chars(s: &str) -> String {
    s.chars().filter(|c| !INVALID_PATH_CHARS.contains(c)).collect()
}

/// Cleans and truncates the four name segments of `track` so the combined
/// result fits the platform path budget below `store`.
pub fn sanitize_and_budget(store: &Path, track: &Track) -> SanitizedSegments {
    let path_max = OS_PATH_MAX
        .saturating_sub(PATH_MAX_BUFFER)
        .saturating_sub(store.as_os_str().len());

    // 20% of the budget per artist segment, 30% per name segment.
    let artist_max = MAX_SEGMENT.min(path_max.div_ceil(5));
    let name_max = MAX_SEGMENT.min((path_max * 3).div_ceil(10));

    let mut album_artist = clean_and_cap(&track.album_artists_display(), artist_max);
    let track_artist = clean_and_cap(&track.track_artists_display(), artist_max);
    let mut album_name = clean_and_cap(track.album_name.as_deref().unwrap_or(""), name_max);
    let mut track_name = clean_and_cap(track.track_name.as_deref().unwrap_or(""), name_max);

    // The per-segment caps can still add up past the budget when the store
    // root is long. Trim the longer of the two name segments one character
    // at a time, ties going to the track name.
    let mut total = char_len(&album_artist)
        + char_len(&track_artist)
        + char_len(&album_name)
        + char_len(&track_name);
    while total > path_max {
        if album_name.is_empty() && track_name.is_empty() {
            // Artists alone blew the budget; cap the album artist and stop.
            album_artist = clean_and_cap(&album_artist, path_max.saturating_sub(char_len(&track_artist)));
            break;
        }
        if char_len(&album_name) > char_len(&track_name) {
            album_name = drop_last_char(&album_name);
        } else {
            track_name = drop_last_char(&track_name);
        }
        total = char_len(&album_artist)
            + char_len(&track_artist)
            + char_len(&album_name)
            + char_len(&track_name);
    }

    SanitizedSegments {
        album_artist,
        album_name,
        track_artist,
        track_name,
    }
}

fn clean_and_cap(s: &str, cap: usize) -> String {
    let cleaned = remove_invalid_chars(s);
    cleaned.chars().take(cap).collect::<String>().trim().to_string()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn drop_last_char(s: &str) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    chars.pop();
    chars.into_iter().collect::<String>().trim_end().to_string()
}
