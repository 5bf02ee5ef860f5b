//! AcoustID fingerprint recognition.
//!
//! Ties the Chromaprint fingerprint generator to the AcoustID lookup
//! service and exposes the pair as a [`Fingerprinter`].

pub mod adapter;
pub mod client;
pub mod dto;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::FingerprintOutcome;
use crate::services::fingerprint;
use crate::services::traits::Fingerprinter;

pub use client::AcoustidClient;

/// Fingerprint recognizer backed by fpcalc plus the AcoustID web service.
pub struct AcoustidRecognizer {
    client: AcoustidClient,
}

impl AcoustidRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: AcoustidClient::new(api_key),
        }
    }
}

#[async_trait]
impl Fingerprinter for AcoustidRecognizer {
    fn name(&self) -> &str {
        "acoustid"
    }

    async fn fingerprint(&self, path: &Path) -> Result<Option<FingerprintOutcome>> {
        let fingerprint = fingerprint::generate_fingerprint(path).await?;
        let response = self.client.lookup(&fingerprint).await?;
        Ok(adapter::best_track(response)?.map(FingerprintOutcome::Track))
    }
}
