//! Destination path resolution.
//!
//! Each provenance has its own layout under the store root:
//!
//! - catalog:     `artist/year - album/N. - artist - title.ext`
//! - fingerprint: `artist/[year - ]album/artist - title.ext`
//! - embedded:    like catalog but tolerant of gaps, or
//!                `_TaggingImpossible/<file name>` when the tags cannot
//!                even name the track.
//!
//! All free-text segments pass through sanitization; catalog and
//! fingerprint layouts additionally go through the path-length budget.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::model::{Provenance, Track};
use crate::resolver::ResolvedMetadata;
use crate::sanitize::{remove_invalid_chars, sanitize_and_budget};

/// Directory for files whose tags cannot be organized at all.
pub const TAGGING_IMPOSSIBLE_DIR: &str = "_TaggingImpossible";

/// Computes the destination for `source` given its resolved metadata.
pub fn resolve_destination(store: &Path, source: &Path, resolved: &ResolvedMetadata) -> PathBuf {
    let ext = extension_suffix(source);
    match resolved.provenance {
        Provenance::Catalog => catalog_location(store, &resolved.track, &ext),
        Provenance::Fingerprinter => fingerprint_location(store, &resolved.track, &ext),
        Provenance::EmbeddedMetadata => embedded_location(store, &resolved.track, source, &ext),
    }
}

fn catalog_location(store: &Path, track: &Track, ext: &str) -> PathBuf {
    let s = sanitize_and_budget(store, track);
    let album_year = track.album_year.as_deref().unwrap_or_default();
    let track_number = track.track_number.unwrap_or(1);

    store
        .join(&s.album_artist)
        .join(format!("{album_year} - {}", s.album_name.trim()))
        .join(format!(
            "{track_number}. - {} - {}{ext}",
            s.track_artist, s.track_name
        ))
}

fn fingerprint_location(store: &Path, track: &Track, ext: &str) -> PathBuf {
    let s = sanitize_and_budget(store, track);
    let album_dir = match track.track_year.as_deref().filter(|y| !y.is_empty()) {
        Some(year) => format!("{year} - {}", s.album_name),
        None => s.album_name.clone(),
    };

    store
        .join(&s.album_artist)
        .join(album_dir)
        .join(format!("{} - {}{ext}", s.track_artist, s.track_name))
}

fn embedded_location(store: &Path, track: &Track, source: &Path, ext: &str) -> PathBuf {
    let title = track.track_name.as_deref().unwrap_or_default();
    let album = track.album_name.as_deref().unwrap_or_default();
    let has_artists = !track.track_artists.is_empty();

    if title.is_empty() || album.is_empty() || !has_artists {
        warn!(path = %source.display(), "Not enough metadata to organize, parking the file");
        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("unnamed"));
        return store.join(TAGGING_IMPOSSIBLE_DIR).join(file_name);
    }

    let track_artist = track.track_artists_display();
    let album_artist = if track.album_artists.is_empty() {
        track_artist.clone()
    } else {
        track.album_artists_display()
    };
    let year = track.track_year.as_deref().unwrap_or_default().trim();

    let album_dir = if year.is_empty() {
        remove_invalid_chars(album)
    } else {
        format!(
            "{} - {}",
            remove_invalid_chars(year),
            remove_invalid_chars(album)
        )
    };

    let mut parts = vec![format!("{}.", track.track_number.unwrap_or(1))];
    let track_artist = track_artist.trim();
    if !track_artist.is_empty() && track_artist != "Unknown" {
        parts.push(remove_invalid_chars(track_artist));
    }
    parts.push(remove_invalid_chars(title.trim()));

    store
        .join(remove_invalid_chars(album_artist.trim()))
        .join(album_dir)
        .join(format!("{}{ext}", parts.join(" - ")))
}

/// File extension with its dot, preserved as-is; empty for none.
fn extension_suffix(source: &Path) -> String {
    source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
