//! crates/legalyze_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client logic depends on.
//! The Analysis API and every user-facing surface sit behind these traits, so the
//! workflow and chat logic never touch HTTP or the terminal directly.

use crate::domain::{
    Answer, DocumentId, FileId, JobId, JobStatus, Notification, ReportFormat, SessionInfo,
    Speaker, UploadCandidate,
};
use crate::links::ResultsView;
use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all Analysis API operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The server answered with a non-2xx status.
    #[error("{context}: {status}")]
    Http { status: u16, context: String },
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote Analysis API.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Succeeds when the API root answers with a JSON body.
    async fn health(&self) -> PortResult<()>;

    async fn upload(&self, candidate: &UploadCandidate) -> PortResult<FileId>;

    async fn start_analysis(&self, file_id: &FileId) -> PortResult<JobId>;

    async fn status(&self, job_id: &JobId) -> PortResult<JobStatus>;

    async fn ask(&self, document_id: &DocumentId, question: &str) -> PortResult<Answer>;

    async fn download_report(
        &self,
        document_id: &DocumentId,
        format: ReportFormat,
    ) -> PortResult<Bytes>;

    async fn validate_session(&self, token: &str) -> PortResult<SessionInfo>;
}

//=========================================================================================
// Display Ports
//=========================================================================================

/// The progress view that replaces the drop-zone while an upload runs.
pub trait ProgressSurface: Send + Sync {
    /// Hides the drop-zone and shows the progress view.
    fn show_progress(&self);
    /// Hides the progress view and restores the drop-zone.
    fn hide_progress(&self);
    fn update_progress(&self, percent: u8, status: &str);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, view: &ResultsView);
}

/// Handle for one "typing" placeholder in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypingId(pub u64);

/// The chat transcript.
pub trait Transcript: Send + Sync {
    fn append(&self, speaker: Speaker, text: &str);
    fn show_typing(&self) -> TypingId;
    fn hide_typing(&self, id: TypingId);
}
