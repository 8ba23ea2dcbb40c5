// src/input.rs
//! Resume input: pasted text or an uploaded file, plus the target role.
//!
//! `InputForm` is the state behind the upload screen. Text and file content
//! share one slot (`ResumeContent`), so only one of them can be staged at a
//! time.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::types::analysis::{InputType, PASTED_RESUME_LABEL};
use crate::utils::get_file_extension;

/// Upload size ceiling (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

/// Preset roles offered by the role picker. Free-form roles are accepted too.
pub const JOB_ROLES: &[&str] = &[
    "Software Engineer",
    "Senior Developer",
    "Full Stack Developer",
    "Frontend Developer",
    "Backend Developer",
    "Data Scientist",
    "Product Manager",
    "UX Designer",
    "DevOps Engineer",
    "Mobile Developer",
    "Cloud Architect",
    "Business Analyst",
    "Project Manager",
    "Marketing Manager",
    "Sales Executive",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FileValidationError {
    #[error("Unsupported file type: {0}. Please upload a PDF, DOC, DOCX or TXT file")]
    UnsupportedType(String),
    #[error("File is too large: {size:.1}MB (max 10MB)")]
    TooLarge { size: f64 },
    #[error("File has no name")]
    MissingName,
}

impl FileValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "INVALID_FORMAT",
            Self::TooLarge { .. } => "FILE_TOO_LARGE",
            Self::MissingName => "MISSING_NAME",
        }
    }
}

/// Check a candidate upload before it is staged.
pub fn validate_resume_file(file_name: &str, size: u64) -> Result<(), FileValidationError> {
    if file_name.trim().is_empty() {
        return Err(FileValidationError::MissingName);
    }

    match get_file_extension(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        Some(ext) => return Err(FileValidationError::UnsupportedType(format!(".{}", ext))),
        None => return Err(FileValidationError::UnsupportedType(file_name.to_string())),
    }

    if size > MAX_FILE_SIZE {
        return Err(FileValidationError::TooLarge {
            size: size as f64 / 1024.0 / 1024.0,
        });
    }

    Ok(())
}

/// Content type sent with a multipart upload.
pub fn content_type_for(file_name: &str) -> &'static str {
    match get_file_extension(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = content_type_for(&name).to_string();
        Self { name, mime, bytes }
    }

    /// Read a resume from disk. Size is checked from metadata before reading.
    pub async fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        validate_resume_file(&name, metadata.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeContent {
    Text(String),
    File(ResumeFile),
}

impl ResumeContent {
    pub fn input_type(&self) -> InputType {
        match self {
            Self::Text(_) => InputType::Text,
            Self::File(_) => InputType::File,
        }
    }

    /// Name shown in history for this content.
    pub fn label(&self) -> &str {
        match self {
            Self::Text(_) => PASTED_RESUME_LABEL,
            Self::File(file) => &file.name,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::File(file) => file.bytes.is_empty(),
        }
    }
}

/// One analyze call's worth of input. Consumed by a single gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub content: ResumeContent,
    pub target_role: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    File,
}

#[derive(Debug, Clone, Default)]
pub struct InputForm {
    mode: InputMode,
    content: Option<ResumeContent>,
    role: String,
    error: Option<String>,
}

impl InputForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn content(&self) -> Option<&ResumeContent> {
        self.content.as_ref()
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Local, non-fatal validation message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(ResumeContent::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&ResumeFile> {
        match &self.content {
            Some(ResumeContent::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Switch between paste and upload. Content of the other kind is dropped.
    pub fn select_mode(&mut self, mode: InputMode) {
        if self.mode == mode {
            return;
        }
        debug!("Input mode switched to {:?}", mode);
        self.mode = mode;
        self.content = None;
        self.error = None;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.mode = InputMode::Text;
        self.error = None;
        self.content = Some(ResumeContent::Text(text.into()));
    }

    /// Stage a file if it passes validation. A rejected file leaves the
    /// previously staged content in place and records the error.
    pub fn stage_file(&mut self, file: ResumeFile) -> Result<(), FileValidationError> {
        if let Err(e) = validate_resume_file(&file.name, file.size()) {
            warn!(code = e.code(), "Rejected resume file {}: {}", file.name, e);
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.mode = InputMode::File;
        self.error = None;
        self.content = Some(ResumeContent::File(file));
        Ok(())
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
    }

    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_role(&self) -> bool {
        !self.role.trim().is_empty()
    }

    /// Whether the analyze action is enabled.
    pub fn can_analyze(&self, in_flight: bool) -> bool {
        !in_flight && self.has_content() && self.has_role()
    }

    /// Build the request for the current selections, if they are complete.
    pub fn to_request(&self, user_id: Option<String>) -> Option<AnalysisRequest> {
        if !self.has_role() {
            return None;
        }
        let content = self.content.clone().filter(|c| !c.is_empty())?;

        Some(AnalysisRequest {
            content,
            target_role: self.role.trim().to_string(),
            user_id,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> ResumeFile {
        ResumeFile::new(name, b"%PDF-1.7".to_vec())
    }

    #[test]
    fn test_validate_resume_file_extensions() {
        for name in ["cv.pdf", "cv.DOC", "cv.docx", "notes.txt"] {
            assert!(validate_resume_file(name, 1024).is_ok(), "{name}");
        }
        assert_eq!(
            validate_resume_file("photo.png", 10),
            Err(FileValidationError::UnsupportedType(".png".to_string()))
        );
        assert!(validate_resume_file("resume", 10).is_err());
        assert_eq!(
            validate_resume_file("", 10),
            Err(FileValidationError::MissingName)
        );
    }

    #[test]
    fn test_validate_resume_file_size_limit() {
        assert!(validate_resume_file("cv.pdf", MAX_FILE_SIZE).is_ok());
        let err = validate_resume_file("cv.pdf", MAX_FILE_SIZE + 1).unwrap_err();
        assert_eq!(err.code(), "FILE_TOO_LARGE");
        assert!(err.to_string().contains("max 10MB"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("a.txt"), "text/plain");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }

    #[test]
    fn test_text_then_file_clears_text() {
        let mut form = InputForm::new();
        form.set_text("Experienced engineer");
        form.stage_file(pdf("cv.pdf")).unwrap();

        assert_eq!(form.mode(), InputMode::File);
        assert_eq!(form.text(), None);
        assert_eq!(form.file().map(|f| f.name.as_str()), Some("cv.pdf"));
    }

    #[test]
    fn test_file_then_text_clears_file() {
        let mut form = InputForm::new();
        form.stage_file(pdf("cv.pdf")).unwrap();
        form.set_text("Pasted");

        assert_eq!(form.mode(), InputMode::Text);
        assert!(form.file().is_none());
        assert_eq!(form.text(), Some("Pasted"));
    }

    #[test]
    fn test_mode_toggles_keep_content_exclusive() {
        let mut form = InputForm::new();
        form.set_text("hello");

        form.select_mode(InputMode::File);
        assert!(form.content().is_none());

        form.stage_file(pdf("cv.pdf")).unwrap();
        form.select_mode(InputMode::File);
        assert!(form.file().is_some());

        form.select_mode(InputMode::Text);
        assert!(form.file().is_none());
        assert!(form.text().is_none());

        for mode in [InputMode::File, InputMode::Text, InputMode::File] {
            form.select_mode(mode);
            assert!(!(form.text().is_some() && form.file().is_some()));
        }
    }

    #[test]
    fn test_rejected_file_is_not_staged() {
        let mut form = InputForm::new();
        form.set_text("keep me");

        let big = ResumeFile::new("cv.pdf", vec![0; (MAX_FILE_SIZE + 1) as usize]);
        assert!(form.stage_file(big).is_err());
        assert!(form.file().is_none());
        assert_eq!(form.text(), Some("keep me"));
        assert!(form.error().is_some());

        assert!(form.stage_file(ResumeFile::new("cv.exe", vec![1])).is_err());
        assert!(form.file().is_none());

        form.stage_file(pdf("ok.pdf")).unwrap();
        assert!(form.error().is_none());
    }

    #[test]
    fn test_can_analyze_requires_role_content_and_idle() {
        let mut form = InputForm::new();
        assert!(!form.can_analyze(false));

        form.set_text("   ");
        form.set_role("Data Scientist");
        assert!(!form.can_analyze(false));

        form.set_text("Resume body");
        assert!(form.can_analyze(false));
        assert!(!form.can_analyze(true));

        form.set_role(" ");
        assert!(!form.can_analyze(false));
    }

    #[test]
    fn test_empty_upload_does_not_enable_analyze() {
        let mut form = InputForm::new();
        form.set_role("Data Scientist");
        form.stage_file(ResumeFile::new("cv.pdf", Vec::new())).unwrap();

        assert!(form.file().is_some());
        assert!(!form.has_content());
        assert!(!form.can_analyze(false));
        assert!(form.to_request(None).is_none());
    }

    #[test]
    fn test_to_request() {
        let mut form = InputForm::new();
        form.stage_file(pdf("cv.pdf")).unwrap();
        assert!(form.to_request(None).is_none());

        form.set_role(" Backend Developer ");
        let request = form.to_request(Some("user_1".to_string())).unwrap();
        assert_eq!(request.target_role, "Backend Developer");
        assert_eq!(request.user_id.as_deref(), Some("user_1"));
        assert_eq!(request.content.input_type(), InputType::File);
        assert_eq!(request.content.label(), "cv.pdf");
    }

    #[tokio::test]
    async fn test_load_checks_extension_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("resume.txt");
        tokio::fs::write(&good, "Jane Doe\nRust engineer").await.unwrap();
        let file = ResumeFile::load(&good).await.unwrap();
        assert_eq!(file.name, "resume.txt");
        assert_eq!(file.mime, "text/plain");

        let bad = dir.path().join("resume.png");
        tokio::fs::write(&bad, [0u8; 4]).await.unwrap();
        assert!(ResumeFile::load(&bad).await.is_err());
    }
}
