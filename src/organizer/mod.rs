//! The organizing pipeline.
//!
//! One run scans the search tree for supported audio files, then pushes
//! each file through resolve, locate, copy, retag, and (optionally)
//! lyrics. Files are processed by a bounded pool of tasks; one file
//! failing is recorded in the report and never stops the batch.

pub mod lyrics;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::copier::{self, CopyOutcome};
use crate::error::{Error, Result};
use crate::location::{self, TAGGING_IMPOSSIBLE_DIR};
use crate::locks::LockRegistry;
use crate::resolver::MetadataResolver;
use crate::services::traits::LyricsApi;
use crate::tags::{AudioFormat, writer};

/// Concurrent lyric lookups allowed across the whole run.
const LYRIC_PERMITS: usize = 5;

/// Outcome summary for one run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Supported files found under the search root
    pub scanned: usize,
    /// Files passed over by the extension and pattern filters
    pub skipped: usize,
    /// Files copied into the store this run
    pub organized: usize,
    /// Files whose destination already existed
    pub skipped_existing: usize,
    /// Per-file failures, none of which aborted the run
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl OrganizeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a full organize run.
pub struct Organizer {
    store: PathBuf,
    search: PathBuf,
    registry: Arc<LockRegistry>,
    resolver: Arc<MetadataResolver>,
    lyrics: Option<Arc<dyn LyricsApi>>,
    lyric_permits: Arc<Semaphore>,
    jobs: usize,
    /// File-name substrings; empty means every supported file
    patterns: Vec<String>,
}

impl Organizer {
    pub fn new(
        store: PathBuf,
        search: PathBuf,
        resolver: MetadataResolver,
        lyrics: Option<Arc<dyn LyricsApi>>,
        jobs: usize,
        patterns: Vec<String>,
    ) -> Self {
        Self {
            store,
            search,
            registry: Arc::new(LockRegistry::new()),
            resolver: Arc::new(resolver),
            lyrics,
            lyric_permits: Arc::new(Semaphore::new(LYRIC_PERMITS)),
            jobs: jobs.max(1),
            patterns,
        }
    }

    /// Runs the whole pipeline over the search tree.
    ///
    /// A missing or non-directory search root aborts before any work.
    pub async fn run(self: Arc<Self>) -> Result<OrganizeReport> {
        if !self.search.is_dir() {
            return Err(Error::organize(format!(
                "search path '{}' is not a directory",
                self.search.display()
            )));
        }

        let (files, skipped) = self.scan();
        let total = files.len();
        info!(total, skipped, search = %self.search.display(), "Found files to organize");

        let mut report = OrganizeReport {
            scanned: total,
            skipped,
            ..Default::default()
        };

        let pool = Arc::new(Semaphore::new(self.jobs));
        let progress = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for path in files {
            let organizer = self.clone();
            let pool = pool.clone();
            let progress = progress.clone();
            tasks.spawn(async move {
                let _permit = pool.acquire_owned().await.expect("pool semaphore closed");
                let outcome = organizer.process_file(&path).await;
                let done = progress.fetch_add(1, Ordering::SeqCst) + 1;
                info!(done, total, path = %path.display(), "Processed");
                (path, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(CopyOutcome::Copied))) => report.organized += 1,
                Ok((_, Ok(CopyOutcome::SkippedExisting))) => report.skipped_existing += 1,
                Ok((path, Err(e))) => {
                    warn!(path = %path.display(), error = %e, "Failed to organize file");
                    report.failures.push(FileFailure {
                        path,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    report.failures.push(FileFailure {
                        path: PathBuf::new(),
                        message: format!("worker task panicked: {e}"),
                    });
                }
            }
        }

        info!(
            organized = report.organized,
            already_in_place = report.skipped_existing,
            filtered_out = report.skipped,
            failed = report.failures.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Collects supported files under the search root, honoring the
    /// file-name patterns. Also returns how many files the filters
    /// rejected, so the report can account for every file seen.
    fn scan(&self) -> (Vec<PathBuf>, usize) {
        let mut skipped = 0;
        let files = WalkDir::new(&self.search)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let wanted =
                    AudioFormat::from_path(path).is_some() && self.matches_patterns(path);
                if !wanted {
                    skipped += 1;
                }
                wanted
            })
            .collect();
        (files, skipped)
    }

    fn matches_patterns(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|p| name.contains(&p.to_lowercase()))
    }

    /// Resolve, locate, copy, retag, lyrics. Per-file entry point.
    async fn process_file(&self, path: &Path) -> Result<CopyOutcome> {
        let resolved = self.resolver.resolve(path).await?;
        let destination = location::resolve_destination(&self.store, path, &resolved);

        let outcome = copier::copy(&self.registry, path, &destination).await?;
        writer::update_tags(
            &self.registry,
            &destination,
            &resolved.track,
            resolved.provenance,
        )
        .await?;

        if let Some(api) = self.lyrics.as_ref()
            && !is_parked(&self.store, &destination)
        {
            let _permit = self
                .lyric_permits
                .acquire()
                .await
                .expect("lyric semaphore closed");
            // Missing lyrics never fail an otherwise organized file.
            if let Err(e) = lyrics::attach_lyrics(
                &self.registry,
                api.as_ref(),
                &destination,
                &resolved.track,
            )
            .await
            {
                warn!(path = %destination.display(), error = %e, "Lyrics attachment failed");
            }
        }

        Ok(outcome)
    }
}

fn is_parked(store: &Path, destination: &Path) -> bool {
    destination
        .strip_prefix(store)
        .ok()
        .and_then(|rest| rest.components().next())
        .is_some_and(|first| first.as_os_str() == TAGGING_IMPOSSIBLE_DIR)
}
