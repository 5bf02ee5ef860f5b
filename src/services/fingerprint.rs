//! Chromaprint fingerprint generation via the `fpcalc` tool.
//!
//! Shelling out to fpcalc is more reliable than binding Chromaprint
//! directly and works wherever the tool is installed. The async wrapper
//! uses `tokio::process` so a slow decode never blocks a worker thread.
//!
//! Install fpcalc:
//! - Windows: `winget install AcoustID.Chromaprint`
//! - macOS: `brew install chromaprint`
//! - Linux: `apt install libchromaprint-tools` or equivalent

use std::path::Path;

use crate::error::{Error, Result};

/// Common installation paths for fpcalc on Windows
#[cfg(windows)]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc", // In PATH
    r"C:\Program Files\Chromaprint\fpcalc.exe",
    r"C:\Program Files\MusicBrainz Picard\fpcalc.exe",
    r"C:\Program Files (x86)\Chromaprint\fpcalc.exe",
    r"C:\Program Files (x86)\MusicBrainz Picard\fpcalc.exe",
];

#[cfg(not(windows))]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc", // In PATH
    "/usr/bin/fpcalc",
    "/usr/local/bin/fpcalc",
    "/opt/homebrew/bin/fpcalc",
];

/// A Chromaprint fingerprint plus the track duration AcoustID wants
/// alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFingerprint {
    pub fingerprint: String,
    pub duration_secs: u32,
}

/// Find the fpcalc executable, checking common installation paths.
fn find_fpcalc() -> Option<&'static str> {
    FPCALC_PATHS
        .iter()
        .find(|&path| {
            std::process::Command::new(path)
                .arg("-version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
        .map(|v| v as _)
}

/// Whether fpcalc can be found on this system.
pub fn is_fpcalc_available() -> bool {
    find_fpcalc().is_some()
}

/// Fingerprint an audio file.
pub async fn generate_fingerprint(path: &Path) -> Result<AudioFingerprint> {
    let fpcalc = find_fpcalc().ok_or_else(|| {
        Error::fingerprint(
            "fpcalc not found. Install Chromaprint: https://acoustid.org/chromaprint",
        )
    })?;

    let output = tokio::process::Command::new(fpcalc)
        .arg("-json")
        .arg(path)
        .output()
        .await
        .map_err(|e| Error::fingerprint(format!("failed to run fpcalc: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::fingerprint(format!(
            "fpcalc failed: {}",
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_fpcalc_json(&stdout)
}

fn parse_fpcalc_json(json: &str) -> Result<AudioFingerprint> {
    let parsed: FpcalcOutput = serde_json::from_str(json)
        .map_err(|e| Error::fingerprint(format!("failed to parse fpcalc output: {e}")))?;

    Ok(AudioFingerprint {
        fingerprint: parsed.fingerprint,
        duration_secs: parsed.duration.round() as u32,
    })
}

/// fpcalc JSON output structure
#[derive(serde::Deserialize)]
struct FpcalcOutput {
    fingerprint: String,
    duration: f64,
}
