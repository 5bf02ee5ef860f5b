//! Provenance-driven tag rewriting.
//!
//! After a file is copied into the store, its embedded tags are rewritten
//! from the resolved [`Track`]. Which fields get written depends on where
//! the metadata came from: a catalog match carries the full field set
//! (disc, source URL, BPM, key, genre), a fingerprint match a reduced one.
//! The field sets are explicit tables so a missing optional field skips
//! that one write instead of aborting the whole update.

use std::path::Path;
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag, TagExt, TagItem};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::locks::{FILE_LOCK_TIMEOUT, LockRegistry};
use crate::model::{Provenance, Track};
use crate::tags::AudioFormat;

const SAVE_RETRIES: u32 = 3;

/// One writable tag field, with its value sourced from a [`Track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Artist,
    Album,
    AlbumArtist,
    /// Date taken from the album release year
    AlbumDate,
    /// Date taken from the track release year
    TrackDate,
    TrackNumber,
    DiscNumber,
    /// Catalog URL mirrored into the comment field
    Comment,
    /// Catalog URL in the audio-source (WOAS) field
    SourceUrl,
    Bpm,
    InitialKey,
    Genre,
}

/// Whether a missing value is worth a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// Field set written for catalog-resolved tracks.
pub const CATALOG_FIELDS: &[(Field, Requirement)] = &[
    (Field::Title, Requirement::Required),
    (Field::Artist, Requirement::Required),
    (Field::Album, Requirement::Required),
    (Field::AlbumDate, Requirement::Required),
    (Field::TrackNumber, Requirement::Required),
    (Field::DiscNumber, Requirement::Required),
    (Field::Comment, Requirement::Required),
    (Field::SourceUrl, Requirement::Required),
    (Field::AlbumArtist, Requirement::Required),
    (Field::Bpm, Requirement::Optional),
    (Field::InitialKey, Requirement::Optional),
    (Field::Genre, Requirement::Required),
];

/// Reduced field set written for fingerprint-resolved tracks.
pub const FINGERPRINT_FIELDS: &[(Field, Requirement)] = &[
    (Field::Title, Requirement::Required),
    (Field::Artist, Requirement::Required),
    (Field::AlbumArtist, Requirement::Required),
    (Field::Album, Requirement::Optional),
    (Field::TrackDate, Requirement::Optional),
    (Field::Genre, Requirement::Optional),
];

impl Field {
    /// Writes this field's value from `track` into `tag`.
    ///
    /// Returns false when the track carries no value for it.
    fn apply(&self, tag: &mut Tag, track: &Track) -> bool {
        match self {
            Field::Title => set_text(track.track_name.clone(), |v| tag.set_title(v)),
            Field::Artist => {
                let joined = track.track_artists.join(";");
                set_text((!joined.is_empty()).then_some(joined), |v| tag.set_artist(v))
            }
            Field::Album => set_text(track.album_name.clone(), |v| tag.set_album(v)),
            Field::AlbumArtist => {
                let joined = track.album_artists.join(";");
                set_text((!joined.is_empty()).then_some(joined), |v| {
                    tag.insert_text(ItemKey::AlbumArtist, v);
                })
            }
            Field::AlbumDate => set_year(tag, track.album_year.as_deref()),
            Field::TrackDate => set_year(tag, track.track_year.as_deref()),
            Field::TrackNumber => match track.track_number {
                Some(n) => {
                    tag.set_track(n);
                    true
                }
                None => false,
            },
            Field::DiscNumber => match track.track_disk {
                Some(n) => {
                    tag.set_disk(n);
                    true
                }
                None => false,
            },
            Field::Comment => set_text(track.track_url.clone(), |v| tag.set_comment(v)),
            Field::SourceUrl => set_text(track.track_url.clone(), |v| {
                // WOAS is a URL frame; a Text item makes the whole ID3v2 save invalid.
                tag.insert(TagItem::new(ItemKey::AudioSourceUrl, ItemValue::Locator(v)));
            }),
            Field::Bpm => {
                // Providers return BPM as a float-as-string; store it truncated.
                let bpm = track
                    .track_bpm
                    .as_deref()
                    .and_then(|b| b.parse::<f64>().ok())
                    .map(|b| (b as i64).to_string());
                set_text(bpm, |v| {
                    tag.insert_text(ItemKey::Bpm, v);
                })
            }
            Field::InitialKey => set_text(track.track_key.clone(), |v| {
                tag.insert_text(ItemKey::InitialKey, v);
            }),
            Field::Genre => set_text(track.album_genres.clone(), |v| tag.set_genre(v)),
        }
    }
}

fn set_text(value: Option<String>, setter: impl FnOnce(String)) -> bool {
    match value {
        Some(v) if !v.is_empty() => {
            setter(v);
            true
        }
        _ => false,
    }
}

fn set_year(tag: &mut Tag, year: Option<&str>) -> bool {
    match year {
        Some(y) if !y.is_empty() => {
            if let Ok(n) = y.parse::<u32>() {
                tag.set_year(n);
            } else {
                tag.insert_text(ItemKey::RecordingDate, y.to_string());
            }
            true
        }
        _ => false,
    }
}

/// Rewrites `location`'s embedded tags from `track` under the path lock.
///
/// Embedded-metadata provenance leaves the file's own tags in place.
/// Tag-library errors during save are retried with a short jittered pause;
/// if every retry fails, one last attempt's failure is only logged - a
/// file that cannot take tags is still organized.
pub async fn update_tags(
    registry: &LockRegistry,
    location: &Path,
    track: &Track,
    provenance: Provenance,
) -> Result<()> {
    let fields = match provenance {
        Provenance::Catalog => CATALOG_FIELDS,
        Provenance::Fingerprinter => FINGERPRINT_FIELDS,
        Provenance::EmbeddedMetadata => return Ok(()),
    };

    match AudioFormat::from_path(location) {
        Some(f) if f.supports_tag_rewrite() => {}
        Some(_) => {
            warn!(path = %location.display(), "Format has no tag-rewrite support, leaving tags as-is");
            return Ok(());
        }
        None => return Err(Error::UnsupportedFormat(location.to_path_buf())),
    }

    let _guard = registry.acquire(location, FILE_LOCK_TIMEOUT).await?;

    let location = location.to_path_buf();
    let track = track.clone();
    tokio::task::spawn_blocking(move || write_fields_blocking(&location, &track, fields))
        .await
        .map_err(|e| Error::organize(format!("tag update task failed: {e}")))?
}

fn write_fields_blocking(location: &Path, track: &Track, fields: &[(Field, Requirement)]) -> Result<()> {
    let mut tagged_file = Probe::open(location)
        .map_err(|e| Error::metadata(location, format!("failed to open for tag update: {e}")))?
        .read()
        .map_err(|e| Error::metadata(location, format!("failed to read for tag update: {e}")))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = match tagged_file.tag_mut(tag_type) {
        Some(tag) => tag,
        None => {
            tagged_file.insert_tag(Tag::new(tag_type));
            tagged_file
                .tag_mut(tag_type)
                .ok_or_else(|| Error::metadata(location, "failed to insert tag container"))?
        }
    };

    for (field, requirement) in fields {
        if !field.apply(tag, track) {
            match requirement {
                Requirement::Required => {
                    warn!(path = %location.display(), field = ?field, "Missing value for tag field")
                }
                Requirement::Optional => {
                    debug!(path = %location.display(), field = ?field, "Skipping absent optional field")
                }
            }
        }
    }

    for _ in 0..SAVE_RETRIES {
        match tag.save_to_path(location, WriteOptions::default()) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(path = %location.display(), error = %e, "Error saving tags, retrying");
                let pause = rand::rng().random_range(1..=3);
                std::thread::sleep(Duration::from_secs(pause));
            }
        }
    }

    // Last chance; a failure here is logged and swallowed.
    if let Err(e) = tag.save_to_path(location, WriteOptions::default()) {
        tracing::error!(path = %location.display(), error = %e, "Giving up saving tags");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{catalog_track, write_minimal_wav};
    use tempfile::tempdir;

    #[test]
    fn test_catalog_table_carries_full_field_set() {
        let fields: Vec<Field> = CATALOG_FIELDS.iter().map(|(f, _)| *f).collect();
        assert!(fields.contains(&Field::DiscNumber));
        assert!(fields.contains(&Field::Comment));
        assert!(fields.contains(&Field::SourceUrl));
        assert!(fields.contains(&Field::Bpm));
        assert!(fields.contains(&Field::InitialKey));
    }

    #[test]
    fn test_fingerprint_table_is_reduced() {
        let fields: Vec<Field> = FINGERPRINT_FIELDS.iter().map(|(f, _)| *f).collect();
        assert!(!fields.contains(&Field::DiscNumber));
        assert!(!fields.contains(&Field::Comment));
        assert!(!fields.contains(&Field::Bpm));
        assert!(fields.contains(&Field::Title));
    }

    #[test]
    fn test_bpm_and_key_are_optional_in_catalog_set() {
        for (field, requirement) in CATALOG_FIELDS {
            if matches!(field, Field::Bpm | Field::InitialKey) {
                assert_eq!(*requirement, Requirement::Optional);
            }
        }
    }

    #[tokio::test]
    async fn test_update_tags_writes_catalog_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_minimal_wav(&path);

        let registry = LockRegistry::new();
        let track = catalog_track();
        update_tags(&registry, &path, &track, Provenance::Catalog)
            .await
            .unwrap();

        let tags = crate::tags::read_embedded(&path).unwrap();
        assert_eq!(tags.title.as_deref(), Some("Song 1"));
        assert_eq!(tags.artists, vec!["Artist 1"]);
        assert_eq!(tags.album.as_deref(), Some("Album 1"));
        assert_eq!(tags.date.as_deref(), Some("2015"));
        assert_eq!(tags.track_number, Some(3));
        assert_eq!(
            tags.comment.as_deref(),
            Some("https://open.spotify.com/track/ABC123")
        );
    }

    #[tokio::test]
    async fn test_update_tags_embedded_provenance_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_minimal_wav(&path);

        let registry = LockRegistry::new();
        let track = catalog_track();
        update_tags(&registry, &path, &track, Provenance::EmbeddedMetadata)
            .await
            .unwrap();

        let tags = crate::tags::read_embedded(&path).unwrap();
        assert!(tags.title.is_none());
    }

    #[tokio::test]
    async fn test_update_tags_fingerprint_tolerates_missing_optionals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_minimal_wav(&path);

        let registry = LockRegistry::new();
        let track = Track {
            track_name: Some("Only Title".into()),
            track_artists: vec!["Only Artist".into()],
            album_artists: vec!["Only Artist".into()],
            ..Default::default()
        };
        update_tags(&registry, &path, &track, Provenance::Fingerprinter)
            .await
            .unwrap();

        let tags = crate::tags::read_embedded(&path).unwrap();
        assert_eq!(tags.title.as_deref(), Some("Only Title"));
        assert!(tags.album.is_none());
        assert!(tags.date.is_none());
    }
}
