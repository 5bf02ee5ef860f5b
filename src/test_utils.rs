//! Shared test fixtures.
//!
//! The WAV writer produces the smallest file lofty will happily probe and
//! tag, so tag round-trip tests run against real containers instead of
//! mocked readers.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};

use crate::model::Track;

/// Writes a minimal valid PCM WAV file (mono, 16-bit, 44.1kHz, silence).
pub fn write_minimal_wav(path: &Path) {
    const DATA_LEN: u32 = 64;
    let mut bytes = Vec::new();

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(4 + 24 + 8 + DATA_LEN).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&44_100u32.to_le_bytes());
    bytes.extend_from_slice(&(44_100u32 * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&DATA_LEN.to_le_bytes());
    bytes.extend_from_slice(&[0u8; DATA_LEN as usize]);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dirs");
    }
    std::fs::write(path, bytes).expect("write wav fixture");
}

/// Tags a fixture file with title, artist, and album.
pub fn tag_file(path: &Path, title: &str, artist: &str, album: &str) {
    edit_tag(path, |tag| {
        tag.set_title(title.to_string());
        tag.set_artist(artist.to_string());
        tag.set_album(album.to_string());
    });
}

/// Writes a comment onto a fixture file, for embedded-URL scenarios.
pub fn tag_comment(path: &Path, comment: &str) {
    edit_tag(path, |tag| {
        tag.set_comment(comment.to_string());
    });
}

fn edit_tag(path: &Path, edit: impl FnOnce(&mut Tag)) {
    let mut tagged_file = Probe::open(path)
        .expect("open fixture")
        .read()
        .expect("read fixture");
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag_mut(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file.tag_mut(tag_type).expect("tag container");
    edit(tag);
    tag.save_to_path(path, WriteOptions::default())
        .expect("save fixture tags");
}

/// A fully-populated catalog-style track for assertions.
pub fn catalog_track() -> Track {
    Track {
        track_name: Some("Song 1".into()),
        track_number: Some(3),
        track_disk: Some(1),
        track_year: Some("2015".into()),
        track_artists: vec!["Artist 1".into()],
        track_url: Some("https://open.spotify.com/track/ABC123".into()),
        track_id: Some("ABC123".into()),
        track_bpm: Some("120.5".into()),
        track_key: Some("C#".into()),
        album_name: Some("Album 1".into()),
        album_artists: vec!["Artist 1".into()],
        album_year: Some("2015".into()),
        album_size: Some(12),
        album_id: Some("ALB456".into()),
        album_genres: Some("indie rock".into()),
    }
}

/// A minimal fingerprint-style track (no album, no catalog fields).
pub fn fingerprint_track() -> Track {
    Track {
        track_name: Some("Recognized Song".into()),
        track_artists: vec!["Recognized Artist".into()],
        album_artists: vec!["Recognized Artist".into()],
        track_id: Some("rec-mbid-1".into()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn test_wav_fixture_is_probeable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.wav");
        write_minimal_wav(&path);

        let tags = tags::read_embedded(&path).unwrap();
        assert!(tags.title.is_none());
    }

    #[test]
    fn test_comment_fixture_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comment.wav");
        write_minimal_wav(&path);
        tag_comment(&path, "https://open.spotify.com/track/XYZ");

        let tags = tags::read_embedded(&path).unwrap();
        assert_eq!(
            tags.comment.as_deref(),
            Some("https://open.spotify.com/track/XYZ")
        );
    }
}
