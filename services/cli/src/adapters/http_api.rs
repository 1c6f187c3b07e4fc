//! services/cli/src/adapters/http_api.rs
//!
//! This module contains the adapter for the remote Analysis API.
//! It implements the `AnalysisApi` port from the `core` crate over HTTP.

use crate::protocol::{
    AnalyzeResponse, AskRequest, AskResponse, StatusResponse, UploadResponse, ValidateResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use legalyze_core::ports::{AnalysisApi, PortError, PortResult};
use legalyze_core::{
    Answer, DocumentId, FileId, JobId, JobStatus, ReportFormat, SessionInfo, UploadCandidate,
};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AnalysisApi` port with `reqwest`.
#[derive(Clone)]
pub struct HttpAnalysisApi {
    client: Client,
    base_url: Url,
}

impl HttpAnalysisApi {
    /// Creates a new `HttpAnalysisApi` rooted at `base_url`.
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PortError::Transport(format!("'{}' cannot be used as an API base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(request: RequestBuilder) -> PortResult<Response> {
        request
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::InvalidResponse(e.to_string()))
    }

    /// Turns any non-2xx status into `PortError::Http`.
    async fn expect_success(response: Response, context: &str) -> PortResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("{} with status {}: {}", context, status, body);
        Err(PortError::Http {
            status: status.as_u16(),
            context: context.to_string(),
        })
    }
}

//=========================================================================================
// `AnalysisApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    /// Any JSON body counts as connected, whatever the status code.
    async fn health(&self) -> PortResult<()> {
        let url = self.endpoint(&[])?;
        let response = Self::send(self.client.get(url)).await?;
        let status = response.status();
        let body: serde_json::Value = Self::decode(response).await?;
        info!(%status, "Backend connected: {}", body);
        Ok(())
    }

    async fn upload(&self, candidate: &UploadCandidate) -> PortResult<FileId> {
        let url = self.endpoint(&["api", "upload"])?;
        debug!("Uploading to {}", url);
        let part = multipart::Part::stream(candidate.content.clone())
            .file_name(candidate.file_name.clone())
            .mime_str(&candidate.mime_type)
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = Self::send(self.client.post(url).multipart(form)).await?;
        let response = Self::expect_success(response, "Upload failed").await?;
        let body: UploadResponse = Self::decode(response).await?;
        Ok(FileId::new(body.file_id))
    }

    async fn start_analysis(&self, file_id: &FileId) -> PortResult<JobId> {
        let url = self.endpoint(&["api", "analyze", file_id.as_str()])?;
        let response = Self::send(self.client.post(url)).await?;
        let response = Self::expect_success(response, "Analysis start failed").await?;
        let body: AnalyzeResponse = Self::decode(response).await?;
        Ok(JobId::new(body.job_id))
    }

    async fn status(&self, job_id: &JobId) -> PortResult<JobStatus> {
        let url = self.endpoint(&["api", "status", job_id.as_str()])?;
        let response = Self::send(self.client.get(url)).await?;
        let response = Self::expect_success(response, "Status check failed").await?;
        let body: StatusResponse = Self::decode(response).await?;
        debug!(%job_id, progress = body.progress, "Progress received.");
        Ok(JobStatus {
            progress: body.progress,
        })
    }

    async fn ask(&self, document_id: &DocumentId, question: &str) -> PortResult<Answer> {
        let url = self.endpoint(&["api", "ask", document_id.as_str()])?;
        let request = AskRequest {
            question: question.to_string(),
        };
        let response = Self::send(self.client.post(url).json(&request)).await?;
        let response = Self::expect_success(response, "API error").await?;
        let body: AskResponse = Self::decode(response).await?;
        Ok(body.into())
    }

    async fn download_report(
        &self,
        document_id: &DocumentId,
        format: ReportFormat,
    ) -> PortResult<Bytes> {
        let mut url = self.endpoint(&["api", "download", document_id.as_str()])?;
        url.query_pairs_mut().append_pair("format", format.as_str());
        let response = Self::send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!(
                "{} report for {}",
                format.as_str(),
                document_id
            )));
        }
        let response = Self::expect_success(response, "Report download failed").await?;
        response
            .bytes()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))
    }

    async fn validate_session(&self, token: &str) -> PortResult<SessionInfo> {
        let url = self.endpoint(&["api", "auth", "validate"])?;
        let response = Self::send(self.client.get(url).bearer_auth(token)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(PortError::Unauthorized);
        }
        let response = Self::expect_success(response, "Session validation failed").await?;
        let body: ValidateResponse = Self::decode(response).await?;
        Ok(body.into())
    }
}
