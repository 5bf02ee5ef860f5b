//! Converts Spotify wire types into [`Track`] and decides which search
//! candidates count as a match.

use crate::model::Track;

use super::dto;

/// Pitch-class names for the audio-features `key` integer.
pub const PITCH_CODES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Whether a search candidate matches the queried title and artists.
///
/// The title must be equal ignoring case, and every queried artist must
/// equal one of the candidate's artist names ignoring case. A query that
/// is only a prefix or fragment of a candidate name is not a match.
pub fn candidate_matches(title: &str, artists: &[String], candidate: &dto::TrackDto) -> bool {
    if !candidate.name.eq_ignore_ascii_case(title.trim()) {
        return false;
    }
    let candidate_names: Vec<String> = candidate
        .artists
        .iter()
        .map(|a| a.name.to_lowercase())
        .collect();
    artists.iter().all(|queried| {
        let queried = queried.trim().to_lowercase();
        !queried.is_empty() && candidate_names.iter().any(|name| name == &queried)
    })
}

/// Builds a [`Track`] from the track payload plus the optional enrichment
/// lookups (audio features, primary-artist genres).
pub fn to_track(
    dto: dto::TrackDto,
    features: Option<dto::AudioFeaturesDto>,
    genres: Vec<String>,
) -> Track {
    let album_year = release_year(&dto.album.release_date);
    let (bpm, key) = features
        .map(|f| (f.tempo.map(format_bpm), pitch_name(f.key)))
        .unwrap_or((None, None));

    Track {
        track_name: Some(dto.name),
        track_number: Some(dto.track_number),
        track_disk: Some(dto.disc_number),
        track_artists: dto.artists.into_iter().map(|a| a.name).collect(),
        track_url: dto.external_urls.spotify,
        track_id: Some(dto.id),
        track_bpm: bpm,
        track_key: key,
        album_name: Some(dto.album.name),
        album_artists: dto.album.artists.into_iter().map(|a| a.name).collect(),
        album_year: album_year.clone(),
        track_year: album_year,
        album_size: Some(dto.album.total_tracks),
        album_id: Some(dto.album.id),
        album_genres: (!genres.is_empty()).then(|| genres.join(";")),
    }
}

/// First artist ID, used for the genre lookup.
pub fn primary_artist_id(dto: &dto::TrackDto) -> Option<&str> {
    dto.artists.first().map(|a| a.id.as_str())
}

fn release_year(release_date: &str) -> Option<String> {
    let year: String = release_date.chars().take(4).collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

fn format_bpm(tempo: f64) -> String {
    tempo.to_string()
}

fn pitch_name(key: i32) -> Option<String> {
    usize::try_from(key)
        .ok()
        .and_then(|k| PITCH_CODES.get(k))
        .map(|p| p.to_string())
}
