pub mod chat;
pub mod domain;
pub mod links;
pub mod ports;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use chat::{ChatError, ChatQueryComponent};
pub use domain::{
    AnalysisJob, Answer, ChatExchange, DocumentId, DocumentKind, FileId, JobId, JobStatus,
    Notification, ReportFormat, SessionInfo, Severity, Speaker, UploadCandidate, UserProfile,
    validate_declared, ValidationError, ANALYSIS_STEPS, MAX_UPLOAD_BYTES,
};
pub use links::{resolve_document_id, share_link, ResultsView};
pub use ports::{
    AnalysisApi, Navigator, Notifier, PortError, PortResult, ProgressSurface, Transcript,
    TypingId,
};
pub use workflow::{
    FailureReason, UploadWorkflowController, WorkflowOutcome, WorkflowSettings, WorkflowState,
};
