//! crates/legalyze_core/src/workflow.rs
//!
//! The upload -> analyze -> poll -> redirect state machine.
//!
//! One controller drives at most one run at a time. Each run owns a
//! `CancellationToken`; starting a new run cancels the previous one, and the
//! polling loop stops as soon as its token fires.

use crate::domain::{
    format_file_size, AnalysisJob, JobId, JobStatus, Notification, UploadCandidate,
    ValidationError,
};
use crate::links::ResultsView;
use crate::ports::{AnalysisApi, Navigator, Notifier, PortError, PortResult, ProgressSurface};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

//=========================================================================================
// States and Outcomes
//=========================================================================================

/// Where the current run is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Uploading,
    Starting,
    Polling(AnalysisJob),
    Complete(JobId),
    Failed(FailureReason),
}

/// Why a run failed. Every variant maps to exactly one user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("validation failed: {0}")]
    Validation(ValidationError),
    #[error("upload failed: {0}")]
    Upload(PortError),
    #[error("analysis start failed: {0}")]
    Start(PortError),
    #[error("status poll failed: {0}")]
    Poll(PortError),
}

impl FailureReason {
    pub fn user_message(&self) -> String {
        match self {
            FailureReason::Validation(e) => e.user_message().to_string(),
            FailureReason::Upload(e) => {
                format!("Error: Upload failed: {}. Please try again.", failure_detail(e))
            }
            FailureReason::Start(e) => format!(
                "Error: Analysis start failed: {}. Please try again.",
                failure_detail(e)
            ),
            FailureReason::Poll(_) => "Error checking progress. Please check dashboard.".to_string(),
        }
    }
}

/// The status code for HTTP failures, the full error otherwise.
fn failure_detail(error: &PortError) -> String {
    match error {
        PortError::Http { status, .. } => status.to_string(),
        other => other.to_string(),
    }
}

/// How a call to `run` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed { job_id: JobId, link: String },
    Failed(FailureReason),
    /// Superseded by a newer run or cancelled explicitly.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub poll_interval: Duration,
    pub redirect_delay: Duration,
    pub results_page: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            redirect_delay: Duration::from_millis(1500),
            results_page: "dashboard.html".to_string(),
        }
    }
}

enum PollEnd {
    Complete(AnalysisJob),
    Failed(PortError),
    Cancelled,
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct UploadWorkflowController {
    api: Arc<dyn AnalysisApi>,
    surface: Arc<dyn ProgressSurface>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    settings: WorkflowSettings,
    state: watch::Sender<WorkflowState>,
    active: Mutex<Option<(Uuid, CancellationToken)>>,
}

impl UploadWorkflowController {
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        surface: Arc<dyn ProgressSurface>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        settings: WorkflowSettings,
    ) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self {
            api,
            surface,
            notifier,
            navigator,
            settings,
            state,
            active: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Receives every state transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.active_run().is_some()
    }

    /// Takes one file through the whole workflow. A run already in flight is
    /// cancelled first.
    pub async fn run(&self, candidate: UploadCandidate) -> WorkflowOutcome {
        let run_id = Uuid::new_v4();
        let token = self.begin_run(run_id);
        let span = info_span!("upload_workflow", %run_id, file = %candidate.file_name);
        let outcome = self.drive(candidate, &token).instrument(span).await;
        self.finish_run(run_id);
        outcome
    }

    /// Reports a file that failed validation before its content was read, the
    /// same way `run` reports it. A run in flight is left alone.
    pub fn reject(&self, error: ValidationError) -> WorkflowOutcome {
        let token = CancellationToken::new();
        self.publish(&token, WorkflowState::Validating);
        warn!("Rejected before reading: {}", error);
        self.fail(&token, FailureReason::Validation(error), false)
    }

    /// Cancels the run in flight, if any, and restores the drop-zone.
    pub fn cancel(&self) -> bool {
        let Some((run_id, token)) = self.active_run().take() else {
            return false;
        };
        info!(%run_id, "Upload workflow cancelled.");
        token.cancel();
        self.surface.hide_progress();
        self.state.send_replace(WorkflowState::Idle);
        true
    }

    async fn drive(&self, candidate: UploadCandidate, token: &CancellationToken) -> WorkflowOutcome {
        self.publish(token, WorkflowState::Idle);
        self.publish(token, WorkflowState::Validating);
        if let Err(e) = candidate.validate() {
            warn!("Rejected '{}': {}", candidate.file_name, e);
            return self.fail(token, FailureReason::Validation(e), false);
        }

        info!(
            "Uploading '{}' ({}).",
            candidate.file_name,
            format_file_size(candidate.size())
        );
        self.publish(token, WorkflowState::Uploading);
        self.surface.show_progress();
        self.surface.update_progress(10, "Uploading file...");

        let file_id = match guarded(token, self.api.upload(&candidate)).await {
            None => return WorkflowOutcome::Cancelled,
            Some(Err(e)) => return self.fail(token, FailureReason::Upload(e), true),
            Some(Ok(file_id)) => file_id,
        };
        drop(candidate);
        info!(%file_id, "Upload succeeded.");

        self.surface.update_progress(30, "File uploaded, starting analysis...");
        self.publish(token, WorkflowState::Starting);
        let job_id = match guarded(token, self.api.start_analysis(&file_id)).await {
            None => return WorkflowOutcome::Cancelled,
            Some(Err(e)) => return self.fail(token, FailureReason::Start(e), true),
            Some(Ok(job_id)) => job_id,
        };
        info!(%job_id, "Analysis started.");

        let job = AnalysisJob::new(file_id, job_id);
        self.publish(token, WorkflowState::Polling(job.clone()));
        match self.poll_until_complete(job, token).await {
            PollEnd::Complete(job) => self.complete(job.job_id, token).await,
            PollEnd::Failed(e) => self.fail(token, FailureReason::Poll(e), true),
            PollEnd::Cancelled => WorkflowOutcome::Cancelled,
        }
    }

    /// Issues a status request every interval until the job reports 100%.
    ///
    /// Requests may overlap. Each carries a sequence number and a response is
    /// only applied if it is newer than the last one applied.
    async fn poll_until_complete(
        &self,
        mut job: AnalysisJob,
        token: &CancellationToken,
    ) -> PollEnd {
        let period = self.settings.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: JoinSet<(u64, PortResult<JobStatus>)> = JoinSet::new();
        let mut next_seq: u64 = 0;
        let mut last_applied: Option<u64> = None;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return PollEnd::Cancelled,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let (seq, result) = match joined {
                        Ok(pair) => pair,
                        Err(e) => {
                            return PollEnd::Failed(PortError::Transport(format!(
                                "status request aborted: {}",
                                e
                            )))
                        }
                    };
                    if token.is_cancelled() {
                        return PollEnd::Cancelled;
                    }
                    if last_applied.is_some_and(|last| seq <= last) {
                        debug!(seq, "Discarding out-of-order status response.");
                        continue;
                    }
                    last_applied = Some(seq);

                    let status = match result {
                        Ok(status) => status,
                        Err(e) => return PollEnd::Failed(e),
                    };
                    job.apply(&status);
                    debug!(seq, progress = job.progress, "Status applied.");
                    self.surface.update_progress(job.progress, job.step_label());
                    if status.is_complete() {
                        return PollEnd::Complete(job);
                    }
                    self.publish(token, WorkflowState::Polling(job.clone()));
                }
                _ = ticker.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    let api = Arc::clone(&self.api);
                    let job_id = job.job_id.clone();
                    in_flight.spawn(async move { (seq, api.status(&job_id).await) });
                }
            }
        }
    }

    async fn complete(&self, job_id: JobId, token: &CancellationToken) -> WorkflowOutcome {
        if token.is_cancelled() {
            return WorkflowOutcome::Cancelled;
        }
        info!(%job_id, "Analysis complete.");
        self.publish(token, WorkflowState::Complete(job_id.clone()));
        self.surface.update_progress(100, "Analysis complete!");

        if guarded(token, time::sleep(self.settings.redirect_delay))
            .await
            .is_none()
        {
            return WorkflowOutcome::Cancelled;
        }

        self.surface.hide_progress();
        self.notifier.notify(Notification::success(
            "Analysis complete! Redirecting to dashboard...",
        ));
        let view = ResultsView::new(job_id.clone());
        let link = view.link(&self.settings.results_page);
        self.navigator.navigate(&view);
        WorkflowOutcome::Completed { job_id, link }
    }

    fn fail(
        &self,
        token: &CancellationToken,
        reason: FailureReason,
        progress_shown: bool,
    ) -> WorkflowOutcome {
        if token.is_cancelled() {
            debug!("Dropping failure of a cancelled run: {}", reason);
            return WorkflowOutcome::Cancelled;
        }
        error!("Upload workflow failed: {}", reason);
        self.notifier.notify(Notification::error(reason.user_message()));
        if progress_shown {
            self.surface.hide_progress();
        }
        self.publish(token, WorkflowState::Failed(reason.clone()));
        WorkflowOutcome::Failed(reason)
    }

    /// State updates from a cancelled run are dropped.
    fn publish(&self, token: &CancellationToken, state: WorkflowState) {
        if !token.is_cancelled() {
            self.state.send_replace(state);
        }
    }

    fn begin_run(&self, run_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some((previous_id, previous)) = self.active_run().replace((run_id, token.clone())) {
            warn!(%previous_id, "A new upload supersedes the one in flight.");
            previous.cancel();
        }
        token
    }

    fn finish_run(&self, run_id: Uuid) {
        let mut active = self.active_run();
        if active.as_ref().is_some_and(|(id, _)| *id == run_id) {
            *active = None;
        }
    }

    fn active_run(&self) -> MutexGuard<'_, Option<(Uuid, CancellationToken)>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Runs `future` unless `token` fires first. A result that arrives after the
/// token fired is dropped as well.
async fn guarded<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    let output = tokio::select! {
        biased;
        _ = token.cancelled() => return None,
        output = future => output,
    };
    (!token.is_cancelled()).then_some(output)
}
