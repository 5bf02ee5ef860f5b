//! Audio file tag reading and writing.
//!
//! Uses the lofty crate for format-independent tag access. The supported
//! source formats form a closed set ([`AudioFormat`]); everything else is
//! rejected up front. Reads normalize provider quirks (null-byte corruption,
//! `;`-joined lists, MP4 `/`-separated artist strings) into [`EmbeddedTags`]
//! so the rest of the pipeline never sees raw tag values.

pub mod writer;

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey};

use crate::error::{Error, Result};

/// The closed set of source formats the organizer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Wma,
    Flac,
    Ogg,
    Oga,
}

impl AudioFormat {
    /// Maps a file extension (case-insensitive) to a format, or None for
    /// anything outside the supported set.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            "wav" => Some(Self::Wav),
            "wma" => Some(Self::Wma),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "oga" => Some(Self::Oga),
            _ => None,
        }
    }

    /// Whether lofty can rewrite this format's tags.
    ///
    /// ASF/WMA has no lofty support; those files are still organized but
    /// their embedded tags are left as-is.
    pub fn supports_tag_rewrite(&self) -> bool {
        !matches!(self, Self::Wma)
    }
}

/// Normalized view of a file's own embedded tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: Option<String>,
    /// Artist list after `;` and MP4 `/` splitting
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    /// Release date or year as stored
    pub date: Option<String>,
    pub track_number: Option<u32>,
    pub comment: Option<String>,
    /// WOAS / audio-source URL field
    pub source: Option<String>,
    /// Generic audio-file URL field
    pub url: Option<String>,
}

impl EmbeddedTags {
    /// Tag fields that may carry an embedded catalog URL, in lookup order.
    pub fn catalog_url_candidates(&self) -> [Option<&str>; 3] {
        [
            self.comment.as_deref(),
            self.source.as_deref(),
            self.url.as_deref(),
        ]
    }

    /// Artists joined into one display string ("A, B").
    pub fn artists_display(&self) -> String {
        self.artists.join(", ")
    }
}

/// Reads and normalizes a file's embedded tags.
///
/// Blocking; callers on the async path should wrap this in
/// `spawn_blocking`. A file with no readable tag container yields an
/// error - the pipeline treats that the same as an empty tag set.
pub fn read_embedded(path: &Path) -> Result<EmbeddedTags> {
    if AudioFormat::from_path(path).is_none() {
        return Err(Error::UnsupportedFormat(path.to_path_buf()));
    }

    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("failed to open for probing: {e}")))?
        .read()
        .map_err(|e| Error::metadata(path, format!("failed to read tags: {e}")))?;

    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let Some(tag) = tag else {
        return Ok(EmbeddedTags::default());
    };

    let title = tag.title().map(|s| normalize(&s)).filter(|s| !s.is_empty());
    let album = tag.album().map(|s| normalize(&s)).filter(|s| !s.is_empty());
    let artists = tag
        .artist()
        .map(|s| split_artists(&normalize(&s)))
        .unwrap_or_default();
    let album_artist = tag
        .get_string(&ItemKey::AlbumArtist)
        .map(normalize)
        .filter(|s| !s.is_empty());
    let date = tag
        .year()
        .map(|y| y.to_string())
        .or_else(|| tag.get_string(&ItemKey::RecordingDate).map(normalize))
        .filter(|s| !s.is_empty());

    Ok(EmbeddedTags {
        title,
        artists,
        album,
        album_artist,
        date,
        track_number: tag.track(),
        comment: tag.comment().map(|s| normalize(&s)).filter(|s| !s.is_empty()),
        source: tag
            .get_string(&ItemKey::AudioSourceUrl)
            .map(normalize)
            .filter(|s| !s.is_empty()),
        url: tag
            .get_string(&ItemKey::AudioFileUrl)
            .map(normalize)
            .filter(|s| !s.is_empty()),
    })
}

/// Strips null-byte corruption seen in tags written by broken encoders.
fn normalize(s: &str) -> String {
    s.replace('\0', "").trim().to_string()
}

/// Splits a raw artist string on `;` (multi-value join) and `/` (MP4
/// multi-artist quirk), dropping empty pieces.
fn split_artists(raw: &str) -> Vec<String> {
    raw.split([';', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_path() {
        assert_eq!(AudioFormat::from_path(Path::new("a.mp3")), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path(Path::new("a.FLAC")), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_path(Path::new("a.oga")), Some(AudioFormat::Oga));
        assert_eq!(AudioFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(AudioFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_wma_is_copy_only() {
        let wma = AudioFormat::from_path(Path::new("a.wma")).unwrap();
        assert!(!wma.supports_tag_rewrite());
        assert!(AudioFormat::Mp3.supports_tag_rewrite());
    }

    #[test]
    fn test_read_unsupported_extension_is_rejected() {
        let result = read_embedded(Path::new("/tmp/file.aiff"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::with_suffix(".mp3").expect("temp file");
        writeln!(file, "This is just some text, not music.").unwrap();

        let result = read_embedded(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_strips_null_bytes() {
        assert_eq!(normalize("Song\0 One\0"), "Song One");
    }

    #[test]
    fn test_split_artists() {
        assert_eq!(split_artists("A; B"), vec!["A", "B"]);
        assert_eq!(split_artists("A/B"), vec!["A", "B"]);
        assert_eq!(split_artists("Solo"), vec!["Solo"]);
        assert_eq!(split_artists(";;"), Vec::<String>::new());
    }

    #[test]
    fn test_catalog_url_candidates_order() {
        let tags = EmbeddedTags {
            comment: Some("c".into()),
            source: Some("s".into()),
            url: Some("u".into()),
            ..Default::default()
        };
        assert_eq!(tags.catalog_url_candidates(), [Some("c"), Some("s"), Some("u")]);
    }

    #[test]
    fn test_round_trip_on_wav_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("fixture.wav");
        crate::test_utils::write_minimal_wav(&path);
        crate::test_utils::tag_file(
            &path,
            "Fixture Title",
            "Fixture Artist",
            "Fixture Album",
        );

        let tags = read_embedded(&path).unwrap();
        assert_eq!(tags.title.as_deref(), Some("Fixture Title"));
        assert_eq!(tags.artists, vec!["Fixture Artist"]);
        assert_eq!(tags.album.as_deref(), Some("Fixture Album"));
    }
}
