//! services/cli/src/context.rs
//!
//! Defines the application context, created once per process and passed to
//! every command. It owns the Analysis API client, the console surfaces and
//! the upload workflow.

use crate::adapters::{
    ConsoleNavigator, ConsoleNotifier, ConsoleOut, ConsoleProgress, ConsoleTranscript,
    HttpAnalysisApi,
};
use crate::config::Config;
use crate::error::CliError;
use legalyze_core::ports::{AnalysisApi, Notifier};
use legalyze_core::{ChatQueryComponent, UploadWorkflowController};
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for one run of the client.
pub struct AppContext {
    pub config: Arc<Config>,
    pub api: Arc<dyn AnalysisApi>,
    pub out: ConsoleOut,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<ConsoleNavigator>,
    pub workflow: Arc<UploadWorkflowController>,
}

impl AppContext {
    /// Builds the context with the real HTTP adapter.
    pub fn from_config(config: Config, out: ConsoleOut) -> Result<Self, CliError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("legalyze/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let api = Arc::new(HttpAnalysisApi::new(client, config.api_base_url.clone()));
        Ok(Self::with_api(config, api, out))
    }

    /// Builds the context around any `AnalysisApi` implementation.
    pub fn with_api(config: Config, api: Arc<dyn AnalysisApi>, out: ConsoleOut) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(out.clone()));
        let navigator = Arc::new(ConsoleNavigator::new(
            out.clone(),
            config.results_page.clone(),
        ));
        let progress = Arc::new(ConsoleProgress::new(out.clone()));
        let workflow = Arc::new(UploadWorkflowController::new(
            api.clone(),
            progress,
            notifier.clone(),
            navigator.clone(),
            config.workflow_settings(),
        ));

        Self {
            config: Arc::new(config),
            api,
            out,
            notifier,
            navigator,
            workflow,
        }
    }

    /// A chat component for the document named by `link`.
    pub fn chat(&self, link: &str) -> ChatQueryComponent {
        let transcript = Arc::new(ConsoleTranscript::new(self.out.clone()));
        ChatQueryComponent::from_link(self.api.clone(), transcript, link)
    }

    /// Tears the context down. Any upload still in flight is cancelled.
    pub fn shutdown(&self) {
        if self.workflow.cancel() {
            info!("Cancelled the upload in flight during shutdown.");
        }
    }
}

/// Reports any panic as a generic notice instead of a raw backtrace.
pub fn install_panic_hook(out: ConsoleOut) {
    std::panic::set_hook(Box::new(move |panic_info| {
        error!("Unexpected fault: {}", panic_info);
        out.line("[✖ error] An error occurred. Please try again.");
    }));
}
