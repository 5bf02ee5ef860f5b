//! Spotify Web API wire types.
//!
//! These mirror the JSON responses exactly; domain conversion lives in
//! the adapter. Collections default to empty so a sparse payload never
//! fails deserialization.

use serde::Deserialize;

/// Client-credentials token grant response.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds from issue
    pub expires_in: i64,
}

/// `/search?type=track` response envelope.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackDto>,
}

/// A full track object, as returned by `/tracks/{id}` and search items.
#[derive(Debug, Deserialize)]
pub struct TrackDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistDto>,
    pub album: AlbumDto,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub disc_number: u32,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
pub struct ArtistDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistDto>,
    /// "YYYY", "YYYY-MM", or "YYYY-MM-DD" depending on precision
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_tracks: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// `/audio-features/{id}` response (tempo and key only).
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesDto {
    #[serde(default)]
    pub tempo: Option<f64>,
    /// Pitch-class integer, -1 when undetected
    #[serde(default = "default_key")]
    pub key: i32,
}

fn default_key() -> i32 {
    -1
}

/// `/artists/{id}` response (genres only).
#[derive(Debug, Deserialize)]
pub struct ArtistDetailDto {
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Error envelope the API wraps failures in.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_payload() {
        let json = r#"{
            "id": "6rqhFgbbKwnb9MLmUQDhG6",
            "name": "Speed of Sound",
            "artists": [{"id": "4gzpq5DPGxSnKTe4SA8HAU", "name": "Coldplay"}],
            "album": {
                "id": "0X9l9BcCxqdf3cCGS3dY7N",
                "name": "X&Y",
                "artists": [{"id": "4gzpq5DPGxSnKTe4SA8HAU", "name": "Coldplay"}],
                "release_date": "2005-06-06",
                "total_tracks": 13
            },
            "track_number": 7,
            "disc_number": 1,
            "external_urls": {"spotify": "https://open.spotify.com/track/6rqhFgbbKwnb9MLmUQDhG6"}
        }"#;

        let track: TrackDto = serde_json::from_str(json).unwrap();
        assert_eq!(track.name, "Speed of Sound");
        assert_eq!(track.artists[0].name, "Coldplay");
        assert_eq!(track.album.release_date, "2005-06-06");
        assert_eq!(track.track_number, 7);
        assert!(track.external_urls.spotify.is_some());
    }

    #[test]
    fn test_sparse_payload_still_parses() {
        let json = r#"{
            "id": "x",
            "name": "Untitled",
            "album": {"id": "y", "name": "Unknown"}
        }"#;

        let track: TrackDto = serde_json::from_str(json).unwrap();
        assert!(track.artists.is_empty());
        assert_eq!(track.track_number, 0);
        assert!(track.external_urls.spotify.is_none());
        assert_eq!(track.album.release_date, "");
    }

    #[test]
    fn test_audio_features_missing_key_defaults_to_undetected() {
        let features: AudioFeaturesDto = serde_json::from_str(r#"{"tempo": 120.5}"#).unwrap();
        assert_eq!(features.key, -1);
        assert_eq!(features.tempo, Some(120.5));
    }

    #[test]
    fn test_parse_api_error() {
        let json = r#"{"error": {"status": 429, "message": "rate limit exceeded"}}"#;
        let error: ApiError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.status, 429);
        assert_eq!(error.error.message, "rate limit exceeded");
    }
}
