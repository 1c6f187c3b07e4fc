//! crates/legalyze_core/src/chat.rs
//!
//! Question answering about an already-analyzed document.

use crate::domain::{ChatExchange, DocumentId, Speaker};
use crate::links::resolve_document_id;
use crate::ports::{AnalysisApi, PortError, Transcript};
use std::sync::Arc;
use tracing::{error, info, warn};

const NO_DOCUMENT_MESSAGE: &str = "Please upload a contract first.";
const FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("the question is empty")]
    EmptyQuestion,
    /// No document identifier could be resolved, so nothing was sent.
    #[error("no analyzed document is selected")]
    EmptyContext,
    #[error(transparent)]
    Transport(#[from] PortError),
}

/// Sends questions about one document and renders the answers into a transcript.
///
/// Submissions are independent. Nothing stops a second question from being sent
/// before the first is answered; answers are rendered as they arrive.
pub struct ChatQueryComponent {
    api: Arc<dyn AnalysisApi>,
    transcript: Arc<dyn Transcript>,
    document_id: Option<DocumentId>,
}

impl ChatQueryComponent {
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        transcript: Arc<dyn Transcript>,
        document_id: Option<DocumentId>,
    ) -> Self {
        Self {
            api,
            transcript,
            document_id,
        }
    }

    /// Builds a component for the document named in a results link.
    pub fn from_link(
        api: Arc<dyn AnalysisApi>,
        transcript: Arc<dyn Transcript>,
        link: &str,
    ) -> Self {
        Self::new(api, transcript, resolve_document_id(link))
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    pub async fn submit(&self, question: &str) -> Result<ChatExchange, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        self.transcript.append(Speaker::User, question);
        let typing = self.transcript.show_typing();

        let Some(document_id) = &self.document_id else {
            warn!("Chat question submitted without a document.");
            self.transcript.hide_typing(typing);
            self.transcript.append(Speaker::Assistant, NO_DOCUMENT_MESSAGE);
            return Err(ChatError::EmptyContext);
        };

        info!(%document_id, "Asking: '{}'", question);
        let result = self.api.ask(document_id, question).await;
        self.transcript.hide_typing(typing);

        match result {
            Ok(answer) => {
                let exchange = ChatExchange::new(question, answer);
                self.transcript
                    .append(Speaker::Assistant, &exchange.rendered_answer());
                Ok(exchange)
            }
            Err(e) => {
                error!(%document_id, "Chat request failed: {}", e);
                self.transcript.append(Speaker::Assistant, FAILURE_MESSAGE);
                Err(e.into())
            }
        }
    }
}
