//! Locked, idempotent file copying.
//!
//! The copy is the only step that materializes a destination file, so it
//! holds both the source and destination locks for its whole duration.
//! An already-existing destination is a no-op, which makes re-runs and
//! near-duplicate source files safe.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Result, ResultExt};
use crate::locks::{FILE_LOCK_TIMEOUT, LockRegistry};

const COPY_RETRIES: u32 = 3;
const COPY_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What a [`copy`] call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Bytes were copied to a fresh destination
    Copied,
    /// Destination already existed; nothing was touched
    SkippedExisting,
}

/// Copies `source` to `destination` under both paths' locks.
///
/// No-ops if the destination already exists. Transient I/O errors are
/// retried up to 3 times with a 1 second pause; the final error is
/// returned so the caller can fail this file without failing the batch.
pub async fn copy(
    registry: &LockRegistry,
    source: &Path,
    destination: &Path,
) -> Result<CopyOutcome> {
    let _guards = registry
        .acquire_all(&[source, destination], FILE_LOCK_TIMEOUT)
        .await?;

    if tokio::fs::try_exists(destination).await.unwrap_or(false) {
        info!(
            source = %source.display(),
            destination = %destination.display(),
            "Destination already exists, skipping copy"
        );
        return Ok(CopyOutcome::SkippedExisting);
    }

    info!(source = %source.display(), destination = %destination.display(), "Copying");

    let mut last_err = None;
    for attempt in 1..=COPY_RETRIES {
        match try_copy(source, destination).await {
            Ok(()) => return Ok(CopyOutcome::Copied),
            Err(e) => {
                warn!(
                    source = %source.display(),
                    attempt,
                    error = %e,
                    "Error copying file"
                );
                last_err = Some(e);
                if attempt < COPY_RETRIES {
                    tokio::time::sleep(COPY_RETRY_DELAY).await;
                }
            }
        }
    }

    let err = last_err.unwrap_or_else(|| {
        std::io::Error::other("copy failed with no recorded error")
    });
    tracing::error!(
        source = %source.display(),
        retries = COPY_RETRIES,
        "Failed to copy file after retries"
    );
    Err(err).with_context(format!(
        "copying {} failed after {COPY_RETRIES} attempts",
        source.display()
    ))
}

async fn try_copy(source: &Path, destination: &Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source, destination).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_copy_creates_destination_and_parents() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.mp3");
        let destination = dir.path().join("Artist/Album/01. - Artist - Song.mp3");
        std::fs::write(&source, b"audio bytes").unwrap();

        let registry = LockRegistry::new();
        let outcome = copy(&registry, &source, &destination).await.unwrap();

        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(std::fs::read(&destination).unwrap(), b"audio bytes");
        // Source is untouched; this is a copy, not a move.
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_copy_is_idempotent() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.mp3");
        let destination = dir.path().join("out/song.mp3");
        std::fs::write(&source, b"original").unwrap();

        let registry = LockRegistry::new();
        assert_eq!(
            copy(&registry, &source, &destination).await.unwrap(),
            CopyOutcome::Copied
        );

        // Mutate the source; a second copy must not clobber the destination.
        std::fs::write(&source, b"changed").unwrap();
        assert_eq!(
            copy(&registry, &source, &destination).await.unwrap(),
            CopyOutcome::SkippedExisting
        );
        assert_eq!(std::fs::read(&destination).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails_after_retries() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("missing.mp3");
        let destination = dir.path().join("out/missing.mp3");

        let registry = LockRegistry::new();
        let result = copy(&registry, &source, &destination).await;
        let message = result.unwrap_err().to_string();
        assert!(message.contains("missing.mp3"));
        assert!(message.contains("3 attempts"));
        assert!(!destination.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_copies_to_same_destination() {
        let dir = tempdir().unwrap();
        let source_a = dir.path().join("a/dup.mp3");
        let source_b = dir.path().join("b/dup.mp3");
        std::fs::create_dir_all(source_a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(source_b.parent().unwrap()).unwrap();
        std::fs::write(&source_a, b"first").unwrap();
        std::fs::write(&source_b, b"second").unwrap();

        let destination = dir.path().join("store/dup.mp3");
        let registry = std::sync::Arc::new(LockRegistry::new());

        let t1 = tokio::spawn({
            let registry = registry.clone();
            let (source, destination) = (source_a.clone(), destination.clone());
            async move { copy(&registry, &source, &destination).await.unwrap() }
        });
        let t2 = tokio::spawn({
            let registry = registry.clone();
            let (source, destination) = (source_b.clone(), destination.clone());
            async move { copy(&registry, &source, &destination).await.unwrap() }
        });

        let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());

        // Exactly one copy happened; the other observed the existing file.
        let copied = [r1, r2]
            .iter()
            .filter(|o| **o == CopyOutcome::Copied)
            .count();
        assert_eq!(copied, 1);
        let contents = std::fs::read(&destination).unwrap();
        assert!(contents == b"first" || contents == b"second");
    }
}
