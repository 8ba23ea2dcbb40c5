// src/core/downloads.rs
//! Saving generated artifacts (enhanced resume, cover letter, report).
//!
//! Bytes are first written to a transient staging handle inside the download
//! directory and then published under their final name. The handle is a drop
//! guard, so the staging file is released whether publishing succeeds or not.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::gateway::{AnalysisGateway, GatewayError};
use crate::utils::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Resume,
    CoverLetter,
    Report,
}

impl ArtifactKind {
    /// Path segment under `/download/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "coverletter",
            Self::Report => "report",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Resume => "resume-enhanced",
            Self::CoverLetter => "cover-letter",
            Self::Report => "analysis-report",
        }
    }

    /// Fallback message when the backend gives no reason for a failed download.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Resume => "Failed to download resume",
            Self::CoverLetter => "Failed to download cover letter",
            Self::Report => "Failed to download report",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Resume => "enhanced resume",
            Self::CoverLetter => "cover letter",
            Self::Report => "analysis report",
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resume" | "enhanced-resume" => Ok(Self::Resume),
            "cover-letter" | "coverletter" | "letter" => Ok(Self::CoverLetter),
            "report" => Ok(Self::Report),
            other => Err(format!(
                "Unknown artifact: {}. Use resume, cover-letter or report",
                other
            )),
        }
    }
}

/// `<prefix>-<timestamp>.md`, or `<prefix>-<role>-<timestamp>.md` with a role.
pub fn artifact_file_name(kind: ArtifactKind, role: Option<&str>, timestamp_ms: i64) -> String {
    match role.map(slugify).filter(|r| !r.is_empty()) {
        Some(role) => format!("{}-{}-{}.md", kind.file_prefix(), role, timestamp_ms),
        None => format!("{}-{}.md", kind.file_prefix(), timestamp_ms),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Failed to save {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(e) => e.user_message(),
            Self::Io { .. } => self.to_string(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const MAX_NAME_ATTEMPTS: usize = 100;

/// `report.md`, then `report-1.md`, `report-2.md`, ...
fn numbered_name(file_name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, attempt, ext),
        None => format!("{}-{}", stem, attempt),
    }
}

/// Transient resource holding artifact bytes until they are published.
/// Dropping it removes the staging file.
struct StagedArtifact {
    path: PathBuf,
    live: Arc<AtomicUsize>,
}

impl StagedArtifact {
    async fn create(dir: &Path, bytes: &[u8], live: &Arc<AtomicUsize>) -> Result<Self, ArtifactError> {
        let path = dir.join(format!(".artifact_{}.part", uuid::Uuid::new_v4()));
        live.fetch_add(1, Ordering::SeqCst);
        let staged = Self {
            path,
            live: Arc::clone(live),
        };

        tokio::fs::write(&staged.path, bytes)
            .await
            .map_err(|e| ArtifactError::io(&staged.path, e))?;
        debug!("Staged {} bytes at {}", bytes.len(), staged.path.display());
        Ok(staged)
    }

    /// Link the staged bytes under `file_name`, or a numbered variant when
    /// the name is taken. Existing files are never replaced.
    async fn publish(&self, dir: &Path, file_name: &str) -> Result<PathBuf, ArtifactError> {
        let mut attempt = 0;
        loop {
            let destination = dir.join(numbered_name(file_name, attempt));
            match tokio::fs::hard_link(&self.path, &destination).await {
                Ok(()) => return Ok(destination),
                Err(e)
                    if e.kind() == std::io::ErrorKind::AlreadyExists
                        && attempt < MAX_NAME_ATTEMPTS =>
                {
                    debug!("{} exists, trying another name", destination.display());
                    attempt += 1;
                }
                Err(e) => return Err(ArtifactError::io(&destination, e)),
            }
        }
    }
}

impl Drop for StagedArtifact {
    // Drop cannot await; staging files are small enough for a blocking remove.
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Released staging file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to release staging file {}: {}",
                self.path.display(),
                e
            ),
        }
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactSaver {
    dir: PathBuf,
    live: Arc<AtomicUsize>,
}

impl ArtifactSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staging handles that have not been released yet.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Write `bytes` under `file_name` in the download directory.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ArtifactError::io(&self.dir, e))?;

        let staged = StagedArtifact::create(&self.dir, bytes, &self.live).await?;
        let destination = staged.publish(&self.dir, file_name).await?;
        drop(staged);

        info!("Saved artifact {}", destination.display());
        Ok(destination)
    }

    /// Fetch one artifact for an analysis and save it.
    pub async fn download(
        &self,
        gateway: &dyn AnalysisGateway,
        kind: ArtifactKind,
        analysis_id: &str,
        role: Option<&str>,
    ) -> Result<PathBuf, ArtifactError> {
        let bytes = gateway.fetch_artifact(kind, analysis_id).await?;
        let file_name =
            artifact_file_name(kind, role, chrono::Utc::now().timestamp_millis());
        self.save(&file_name, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("part"))
            .collect()
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(
            artifact_file_name(ArtifactKind::Resume, None, 1700000000000),
            "resume-enhanced-1700000000000.md"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::CoverLetter, None, 5),
            "cover-letter-5.md"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::Report, Some("Data Scientist"), 7),
            "analysis-report-data-scientist-7.md"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::Resume, Some("  "), 7),
            "resume-enhanced-7.md"
        );
    }

    #[test]
    fn test_parse_artifact_kind() {
        assert_eq!("resume".parse::<ArtifactKind>(), Ok(ArtifactKind::Resume));
        assert_eq!(
            "Cover-Letter".parse::<ArtifactKind>(),
            Ok(ArtifactKind::CoverLetter)
        );
        assert!("invoice".parse::<ArtifactKind>().is_err());
        assert_eq!(ArtifactKind::CoverLetter.endpoint(), "coverletter");
    }

    #[tokio::test]
    async fn test_save_publishes_and_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        let saver = ArtifactSaver::new(dir.path().join("downloads"));

        let path = saver.save("resume-enhanced-1.md", b"# Jane").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "# Jane");
        assert_eq!(saver.live_handles(), 0);
        assert!(staging_files(saver.dir()).is_empty());
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("report-7.md", 0), "report-7.md");
        assert_eq!(numbered_name("report-7.md", 2), "report-7-2.md");
        assert_eq!(numbered_name("notes", 1), "notes-1");
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let saver = ArtifactSaver::new(dir.path());

        let first = saver.save("cover-letter-1.md", b"first").await.unwrap();
        let second = saver.save("cover-letter-1.md", b"second").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("cover-letter-1-1.md"));
        assert_eq!(tokio::fs::read_to_string(&first).await.unwrap(), "first");
        assert_eq!(tokio::fs::read_to_string(&second).await.unwrap(), "second");

        // A directory holding the name is skipped the same way.
        std::fs::create_dir(dir.path().join("report-3.md")).unwrap();
        let path = saver.save("report-3.md", b"r").await.unwrap();
        assert_eq!(path, dir.path().join("report-3-1.md"));
        assert!(staging_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_publish_still_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        let saver = ArtifactSaver::new(dir.path());

        // The link target sits under a directory that does not exist.
        for _ in 0..3 {
            let err = saver
                .save("missing/cover-letter-1.md", b"Dear")
                .await
                .unwrap_err();
            assert!(matches!(err, ArtifactError::Io { .. }));
            assert_eq!(saver.live_handles(), 0);
        }
        saver.save("cover-letter-2.md", b"Dear").await.unwrap();

        assert_eq!(saver.live_handles(), 0);
        assert!(staging_files(dir.path()).is_empty());
    }
}
