//! Internal domain models for track resolution.
//!
//! These types are OUR types - they don't change when external APIs change.
//! All external API responses get converted into these types via adapters.

/// Canonical track metadata resolved for one file.
///
/// Every field is optional: the destination templates enforce what they
/// need, not the type. Immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    /// Track title
    pub track_name: Option<String>,
    /// Track number on album
    pub track_number: Option<u32>,
    /// Release year of the track (YYYY)
    pub track_year: Option<String>,
    /// Musical key (e.g. "C♯/D♭")
    pub track_key: Option<String>,
    /// Beats per minute, kept as text (providers disagree on the type)
    pub track_bpm: Option<String>,
    /// Disc number
    pub track_disk: Option<u32>,
    /// Performing artists, in provider order
    pub track_artists: Vec<String>,
    /// Album title
    pub album_name: Option<String>,
    /// Album artists, in provider order
    pub album_artists: Vec<String>,
    /// Album release year (YYYY)
    pub album_year: Option<String>,
    /// Total tracks on the album
    pub album_size: Option<u32>,
    /// Canonical catalog URL for the track
    pub track_url: Option<String>,
    /// Semicolon-joined genre list
    pub album_genres: Option<String>,
    /// Catalog track ID
    pub track_id: Option<String>,
    /// Catalog album ID
    pub album_id: Option<String>,
}

impl Track {
    /// Track artists joined for display ("A, B").
    pub fn track_artists_display(&self) -> String {
        self.track_artists.join(", ")
    }

    /// Album artists joined for display ("A, B").
    pub fn album_artists_display(&self) -> String {
        self.album_artists.join(", ")
    }
}

/// Where a file's resolved metadata came from.
///
/// Decides which destination template and which tag field-set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Resolved through the online catalog (by embedded URL or title/artist search)
    Catalog,
    /// Resolved by an acoustic fingerprint recognizer returning full metadata
    Fingerprinter,
    /// No external match; the file's own tags are used verbatim
    EmbeddedMetadata,
}

/// Successful payload of a fingerprint recognizer.
///
/// A failed recognition is an error or a skipped recognizer, never a variant.
#[derive(Debug, Clone)]
pub enum FingerprintOutcome {
    /// The recognizer produced full track metadata directly
    Track(Track),
    /// The recognizer produced a catalog track ID to resolve separately
    CatalogId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_display_join() {
        let track = Track {
            track_artists: vec!["Daft Punk".into(), "Pharrell Williams".into()],
            ..Default::default()
        };
        assert_eq!(track.track_artists_display(), "Daft Punk, Pharrell Williams");
    }

    #[test]
    fn test_default_track_is_empty() {
        let track = Track::default();
        assert!(track.track_name.is_none());
        assert!(track.track_artists.is_empty());
        assert_eq!(track.album_artists_display(), "");
    }
}
