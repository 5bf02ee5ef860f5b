//! Metadata resolution.
//!
//! A file's metadata is resolved through four steps, stopping at the
//! first that yields a track:
//!
//! 1. An embedded catalog URL (comment, source, or URL tag) is stripped
//!    to its track ID and looked up directly.
//! 2. Embedded title plus artists drive a catalog search.
//! 3. Each configured fingerprint recognizer runs in order; a recognizer
//!    may answer with full metadata or with a catalog ID to look up.
//! 4. The file's own embedded tags are used as-is.
//!
//! Steps never abort the chain: a failed lookup logs and falls through,
//! so a file with a stale catalog URL still gets a search and a
//! fingerprint attempt before settling for its own tags.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{FingerprintOutcome, Provenance, Track};
use crate::services::traits::{CatalogApi, Fingerprinter};
use crate::tags::{self, EmbeddedTags};

const CATALOG_TRACK_URL_PREFIX: &str = "https://open.spotify.com/track/";

/// A resolved track and where its metadata came from.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    pub track: Track,
    pub provenance: Provenance,
}

/// Runs the resolution chain for one file at a time.
pub struct MetadataResolver {
    catalog: Option<Arc<dyn CatalogApi>>,
    fingerprinters: Vec<Arc<dyn Fingerprinter>>,
}

impl MetadataResolver {
    pub fn new(
        catalog: Option<Arc<dyn CatalogApi>>,
        fingerprinters: Vec<Arc<dyn Fingerprinter>>,
    ) -> Self {
        Self {
            catalog,
            fingerprinters,
        }
    }

    /// Resolves metadata for `path`.
    ///
    /// Unreadable tags count as an empty tag set; only an unsupported
    /// extension is an error here.
    pub async fn resolve(&self, path: &Path) -> Result<ResolvedMetadata> {
        let embedded = read_tags(path).await?;

        if let Some(resolved) = self.try_embedded_url(path, &embedded).await {
            return Ok(resolved);
        }
        if let Some(resolved) = self.try_title_search(path, &embedded).await {
            return Ok(resolved);
        }
        if let Some(resolved) = self.try_fingerprints(path).await {
            return Ok(resolved);
        }

        debug!(path = %path.display(), "Falling back to embedded tags");
        Ok(ResolvedMetadata {
            track: track_from_embedded(embedded),
            provenance: Provenance::EmbeddedMetadata,
        })
    }

    /// Step 1: embedded catalog URL lookup.
    async fn try_embedded_url(
        &self,
        path: &Path,
        embedded: &EmbeddedTags,
    ) -> Option<ResolvedMetadata> {
        let catalog = self.catalog.as_ref()?;
        let track_id = embedded
            .catalog_url_candidates()
            .into_iter()
            .flatten()
            .find_map(extract_catalog_id)?;

        match catalog.search_by_id(&track_id).await {
            Ok(Some(track)) => {
                info!(path = %path.display(), track_id, "Matched via embedded catalog URL");
                Some(ResolvedMetadata {
                    track,
                    provenance: Provenance::Catalog,
                })
            }
            Ok(None) => {
                debug!(path = %path.display(), track_id, "Embedded catalog URL had no match");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), track_id, error = %e, "Catalog ID lookup failed");
                None
            }
        }
    }

    /// Step 2: title plus artist search.
    async fn try_title_search(
        &self,
        path: &Path,
        embedded: &EmbeddedTags,
    ) -> Option<ResolvedMetadata> {
        let catalog = self.catalog.as_ref()?;
        let title = embedded.title.as_deref()?;
        if embedded.artists.is_empty() {
            return None;
        }

        match catalog
            .search_by_title_artist(title, &embedded.artists)
            .await
        {
            Ok(Some(track)) => {
                info!(path = %path.display(), title, "Matched via catalog search");
                Some(ResolvedMetadata {
                    track,
                    provenance: Provenance::Catalog,
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(path = %path.display(), title, error = %e, "Catalog search failed");
                None
            }
        }
    }

    /// Step 3: fingerprint recognizers, in configured order.
    async fn try_fingerprints(&self, path: &Path) -> Option<ResolvedMetadata> {
        for recognizer in &self.fingerprinters {
            match recognizer.fingerprint(path).await {
                Ok(Some(FingerprintOutcome::Track(track))) => {
                    info!(
                        path = %path.display(),
                        recognizer = recognizer.name(),
                        "Matched via fingerprint"
                    );
                    return Some(ResolvedMetadata {
                        track,
                        provenance: Provenance::Fingerprinter,
                    });
                }
                Ok(Some(FingerprintOutcome::CatalogId(track_id))) => {
                    // A recognizer that answers with a catalog ID promotes
                    // the match to full catalog provenance.
                    if let Some(catalog) = self.catalog.as_ref() {
                        match catalog.search_by_id(&track_id).await {
                            Ok(Some(track)) => {
                                info!(
                                    path = %path.display(),
                                    recognizer = recognizer.name(),
                                    track_id,
                                    "Fingerprint resolved to catalog track"
                                );
                                return Some(ResolvedMetadata {
                                    track,
                                    provenance: Provenance::Catalog,
                                });
                            }
                            Ok(None) => {
                                debug!(track_id, "Fingerprint catalog ID had no match")
                            }
                            Err(e) => {
                                warn!(track_id, error = %e, "Fingerprint catalog ID lookup failed")
                            }
                        }
                    }
                }
                Ok(None) => {
                    debug!(
                        path = %path.display(),
                        recognizer = recognizer.name(),
                        "No fingerprint match"
                    );
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        recognizer = recognizer.name(),
                        error = %e,
                        "Fingerprint recognizer failed"
                    );
                }
            }
        }
        None
    }
}

/// Extracts a track ID from the first catalog share URL found in `text`.
/// The URL may sit anywhere in the field ("Downloaded from https://...");
/// the ID runs until the first non-alphanumeric character (query string,
/// trailing slash, or surrounding prose).
pub fn extract_catalog_id(text: &str) -> Option<String> {
    let start = text.find(CATALOG_TRACK_URL_PREFIX)? + CATALOG_TRACK_URL_PREFIX.len();
    let id: String = text[start..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    (!id.is_empty()).then_some(id)
}

async fn read_tags(path: &Path) -> Result<EmbeddedTags> {
    let owned = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || tags::read_embedded(&owned))
        .await
        .map_err(|e| Error::organize(format!("tag read task failed: {e}")))?;

    match result {
        Ok(tags) => Ok(tags),
        Err(Error::UnsupportedFormat(path)) => Err(Error::UnsupportedFormat(path)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable tags, treating as empty");
            Ok(EmbeddedTags::default())
        }
    }
}

fn track_from_embedded(embedded: EmbeddedTags) -> Track {
    Track {
        track_name: embedded.title,
        track_artists: embedded.artists,
        track_number: embedded.track_number,
        track_year: embedded.date,
        album_name: embedded.album,
        album_artists: embedded.album_artist.into_iter().collect(),
        ..Default::default()
    }
}
