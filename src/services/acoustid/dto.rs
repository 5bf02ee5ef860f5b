//! AcoustID API wire types.
//!
//! These match the lookup response exactly; conversion to [`crate::model::Track`]
//! lives in the adapter.
//!
//! API reference: https://acoustid.org/webservice#lookup

use serde::Deserialize;

/// Top-level lookup response.
#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<LookupResult>,
    /// Error info if status != "ok"
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

/// A single fingerprint match.
#[derive(Debug, Deserialize)]
pub struct LookupResult {
    /// Match confidence (0.0 to 1.0)
    pub score: f32,
    /// Associated MusicBrainz recordings (meta=recordings)
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
pub struct Recording {
    /// MusicBrainz recording ID
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// Album groupings (meta=releasegroups)
    #[serde(default)]
    pub releasegroups: Vec<ReleaseGroup>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseGroup {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}
