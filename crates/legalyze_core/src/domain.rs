//! crates/legalyze_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any transport or terminal surface.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Largest accepted upload, inclusive.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Labels shown while an analysis job runs, indexed by `phase_index`.
pub const ANALYSIS_STEPS: [&str; 5] = [
    "Extracting text from PDF",
    "Chunking document",
    "Generating embeddings",
    "Analyzing with AI",
    "Generating summary",
];

/// Maps a progress percentage onto an index into `ANALYSIS_STEPS`.
pub fn phase_index(progress: u8) -> usize {
    (usize::from(progress) / 25).min(ANALYSIS_STEPS.len() - 1)
}

//=========================================================================================
// Upload Candidates
//=========================================================================================

/// The document types the Analysis API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Pdf, DocumentKind::Docx, DocumentKind::PlainText];

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::PlainText => "text/plain",
        }
    }

    /// Matches a declared MIME type, ignoring case and any `;` parameters.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime_type().eq_ignore_ascii_case(essence))
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Reasons a candidate is rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported file type '{0}'")]
    UnsupportedType(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl ValidationError {
    /// The message shown to the user for this rejection.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedType(_) => "Please upload a PDF, DOCX, or TXT file",
            ValidationError::TooLarge { .. } => "File size should be less than 50MB",
        }
    }
}

/// A user-selected file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub file_name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl UploadCandidate {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Checks the declared type first, then the size.
    pub fn validate(&self) -> Result<DocumentKind, ValidationError> {
        validate_declared(&self.mime_type, self.size())
    }
}

/// The same checks as `UploadCandidate::validate`, for a file whose content
/// has not been read yet.
pub fn validate_declared(mime_type: &str, size: u64) -> Result<DocumentKind, ValidationError> {
    let kind = DocumentKind::from_mime(mime_type)
        .ok_or_else(|| ValidationError::UnsupportedType(mime_type.to_string()))?;
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(kind)
}

//=========================================================================================
// Server-assigned Identifiers
//=========================================================================================

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Identifies an uploaded file.
    FileId
);
opaque_id!(
    /// Identifies a server-side analysis job.
    JobId
);
opaque_id!(
    /// Identifies an analyzed document for chat, reports and sharing.
    DocumentId
);

impl From<JobId> for DocumentId {
    fn from(job_id: JobId) -> Self {
        DocumentId(job_id.0)
    }
}

//=========================================================================================
// Analysis Jobs
//=========================================================================================

/// One status report for a job, as received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobStatus {
    pub progress: f64,
}

impl JobStatus {
    /// Progress clamped into 0..=100.
    pub fn percent(&self) -> u8 {
        if !self.progress.is_finite() || self.progress <= 0.0 {
            0
        } else if self.progress >= 100.0 {
            100
        } else {
            self.progress.floor() as u8
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }
}

/// A job being tracked by the upload workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub file_id: FileId,
    pub job_id: JobId,
    pub progress: u8,
    pub current_step: usize,
}

impl AnalysisJob {
    pub fn new(file_id: FileId, job_id: JobId) -> Self {
        Self {
            file_id,
            job_id,
            progress: 0,
            current_step: 0,
        }
    }

    pub fn apply(&mut self, status: &JobStatus) {
        self.progress = status.percent();
        self.current_step = phase_index(self.progress);
    }

    pub fn step_label(&self) -> &'static str {
        ANALYSIS_STEPS[self.current_step]
    }
}

//=========================================================================================
// Chat
//=========================================================================================

/// The answer to one question, as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<String>,
}

/// Who wrote a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
    pub citations: Vec<String>,
    pub asked_at: DateTime<Utc>,
}

impl ChatExchange {
    pub fn new(question: impl Into<String>, answer: Answer) -> Self {
        Self {
            question: question.into(),
            answer: answer.answer,
            citations: answer.citations,
            asked_at: Utc::now(),
        }
    }

    /// The text placed in the transcript for this exchange.
    pub fn rendered_answer(&self) -> String {
        let mut text = if self.answer.trim().is_empty() {
            "Sorry, I could not process your question.".to_string()
        } else {
            self.answer.clone()
        };
        if !self.citations.is_empty() {
            text.push_str("\n\n📚 Sources: ");
            text.push_str(&self.citations.join(", "));
        }
        text
    }
}

//=========================================================================================
// Reports, Sessions and Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Docx,
    Json,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "docx" => Ok(ReportFormat::Docx),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// Result of validating a stored auth token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub valid: bool,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// A dismissible notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub ttl: Duration,
}

impl Notification {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            ttl: Self::DEFAULT_TTL,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }
}

/// Human-readable size, base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
