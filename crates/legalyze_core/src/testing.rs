//! In-memory fakes of the ports, shared by the unit tests.

use crate::domain::{
    Answer, DocumentId, FileId, JobId, JobStatus, Notification, ReportFormat, SessionInfo,
    Severity, Speaker, UploadCandidate,
};
use crate::links::ResultsView;
use crate::ports::{
    AnalysisApi, Navigator, Notifier, PortError, PortResult, ProgressSurface, Transcript,
    TypingId,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

type Hook = Box<dyn Fn() + Send + Sync>;

/// Scripted Analysis API. Status responses and answers are consumed in call
/// order, each after its own delay in milliseconds. Once the answer script is
/// exhausted every question gets the fixed answer.
pub struct FakeApi {
    upload: PortResult<FileId>,
    start: PortResult<JobId>,
    statuses: Mutex<VecDeque<(u64, PortResult<f64>)>>,
    answer: PortResult<Answer>,
    answers: Mutex<VecDeque<(u64, PortResult<Answer>)>>,
    upload_hook: OnceLock<Hook>,
    upload_calls: AtomicUsize,
    start_calls: AtomicUsize,
    status_calls: AtomicUsize,
    ask_calls: AtomicUsize,
    asked: Mutex<Vec<(DocumentId, String)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            upload: Ok(FileId::new("file-1")),
            start: Ok(JobId::new("job-1")),
            statuses: Mutex::new(VecDeque::new()),
            answer: Ok(Answer::default()),
            answers: Mutex::new(VecDeque::new()),
            upload_hook: OnceLock::new(),
            upload_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            ask_calls: AtomicUsize::new(0),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn with_upload(mut self, result: PortResult<FileId>) -> Self {
        self.upload = result;
        self
    }

    pub fn with_start(mut self, result: PortResult<JobId>) -> Self {
        self.start = result;
        self
    }

    pub fn with_statuses(self, statuses: Vec<(u64, PortResult<f64>)>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_answer(mut self, result: PortResult<Answer>) -> Self {
        self.answer = result;
        self
    }

    pub fn with_answers(self, answers: Vec<(u64, PortResult<Answer>)>) -> Self {
        *self.answers.lock().unwrap() = answers.into();
        self
    }

    /// Runs `hook` inside every upload call, before the scripted result is returned.
    pub fn on_upload(&self, hook: impl Fn() + Send + Sync + 'static) {
        let _ = self.upload_hook.set(Box::new(hook));
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.upload_calls() + self.start_calls() + self.status_calls() + self.ask_calls()
    }

    pub fn asked(&self) -> Vec<(DocumentId, String)> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisApi for FakeApi {
    async fn health(&self) -> PortResult<()> {
        Ok(())
    }

    async fn upload(&self, _candidate: &UploadCandidate) -> PortResult<FileId> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.upload_hook.get() {
            hook();
        }
        self.upload.clone()
    }

    async fn start_analysis(&self, _file_id: &FileId) -> PortResult<JobId> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start.clone()
    }

    async fn status(&self, _job_id: &JobId) -> PortResult<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let (delay_ms, result) =
            next.unwrap_or_else(|| (0, Err(PortError::Transport("script exhausted".to_string()))));
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        result.map(|progress| JobStatus { progress })
    }

    async fn ask(&self, document_id: &DocumentId, question: &str) -> PortResult<Answer> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        self.asked
            .lock()
            .unwrap()
            .push((document_id.clone(), question.to_string()));
        let next = self.answers.lock().unwrap().pop_front();
        let (delay_ms, result) = next.unwrap_or_else(|| (0, self.answer.clone()));
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        result
    }

    async fn download_report(
        &self,
        _document_id: &DocumentId,
        _format: ReportFormat,
    ) -> PortResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn validate_session(&self, _token: &str) -> PortResult<SessionInfo> {
        Ok(SessionInfo {
            valid: false,
            user: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Shown,
    Hidden,
    Progress(u8, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Message(Speaker, String),
    TypingShown(TypingId),
    TypingHidden(TypingId),
}

/// Records everything written to the display ports.
#[derive(Default)]
pub struct Recorder {
    surface: Mutex<Vec<SurfaceEvent>>,
    notifications: Mutex<Vec<Notification>>,
    navigations: Mutex<Vec<JobId>>,
    transcript: Mutex<Vec<TranscriptEvent>>,
    next_typing: AtomicUsize,
}

impl Recorder {
    pub fn surface_events(&self) -> Vec<SurfaceEvent> {
        self.surface.lock().unwrap().clone()
    }

    fn messages(&self, severity: Severity) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.severity == severity)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn success_messages(&self) -> Vec<String> {
        self.messages(Severity::Success)
    }

    pub fn navigations(&self) -> Vec<JobId> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEvent> {
        self.transcript.lock().unwrap().clone()
    }

    pub fn assistant_messages(&self) -> Vec<String> {
        self.transcript()
            .into_iter()
            .filter_map(|event| match event {
                TranscriptEvent::Message(Speaker::Assistant, text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSurface for Recorder {
    fn show_progress(&self) {
        self.surface.lock().unwrap().push(SurfaceEvent::Shown);
    }

    fn hide_progress(&self) {
        self.surface.lock().unwrap().push(SurfaceEvent::Hidden);
    }

    fn update_progress(&self, percent: u8, status: &str) {
        self.surface
            .lock()
            .unwrap()
            .push(SurfaceEvent::Progress(percent, status.to_string()));
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl Navigator for Recorder {
    fn navigate(&self, view: &ResultsView) {
        self.navigations.lock().unwrap().push(view.job_id.clone());
    }
}

impl Transcript for Recorder {
    fn append(&self, speaker: Speaker, text: &str) {
        self.transcript
            .lock()
            .unwrap()
            .push(TranscriptEvent::Message(speaker, text.to_string()));
    }

    fn show_typing(&self) -> TypingId {
        let id = TypingId(self.next_typing.fetch_add(1, Ordering::SeqCst) as u64);
        self.transcript
            .lock()
            .unwrap()
            .push(TranscriptEvent::TypingShown(id));
        id
    }

    fn hide_typing(&self, id: TypingId) {
        self.transcript
            .lock()
            .unwrap()
            .push(TranscriptEvent::TypingHidden(id));
    }
}
