//! services/cli/src/protocol.rs
//!
//! Defines the JSON bodies exchanged with the Analysis API, and the OpenAPI
//! description of them.
//!
//! Only the fields the client consumes are modelled; anything else the server
//! sends is ignored.

use legalyze_core::{Answer, SessionInfo, UserProfile};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Legalyze Analysis API (client view)",
        description = "The request and response bodies the Legalyze client sends and consumes."
    ),
    components(schemas(
        UploadResponse,
        AnalyzeResponse,
        StatusResponse,
        AskRequest,
        AskResponse,
        ValidateResponse,
        UserDto
    )),
    tags(
        (name = "Legalyze Analysis API", description = "Upload, analysis, polling and question answering.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Response and Payload Structs
//=========================================================================================

/// `POST /api/upload`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct UploadResponse {
    pub file_id: String,
}

/// `POST /api/analyze/{file_id}`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct AnalyzeResponse {
    pub job_id: String,
}

/// `GET /api/status/{job_id}`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StatusResponse {
    /// Percentage complete; 100 or more means done.
    pub progress: f64,
}

/// `POST /api/ask/{document_id}`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize, Deserialize, Debug, Default, ToSchema)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub citations: Option<Vec<String>>,
}

impl From<AskResponse> for Answer {
    fn from(response: AskResponse) -> Self {
        Answer {
            answer: response.answer,
            citations: response.citations.unwrap_or_default(),
        }
    }
}

/// `GET /api/auth/validate`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct UserDto {
    pub name: String,
    pub email: String,
}

impl From<ValidateResponse> for SessionInfo {
    fn from(response: ValidateResponse) -> Self {
        SessionInfo {
            valid: response.valid,
            user: response.user.map(|u| UserProfile {
                name: u.name,
                email: u.email,
            }),
        }
    }
}
