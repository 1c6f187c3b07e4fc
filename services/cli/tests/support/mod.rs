//! A fake Analysis API served by axum on an ephemeral port, plus an in-memory
//! console sink.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use legalyze_cli::adapters::ConsoleOut;
use legalyze_cli::protocol::{
    AnalyzeResponse, AskRequest, AskResponse, StatusResponse, UploadResponse, UserDto,
    ValidateResponse,
};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GOOD_TOKEN: &str = "good-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
pub struct FakeState {
    requests: AtomicUsize,
    paths: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<ReceivedUpload>>,
    pub upload_failure: Mutex<Option<u16>>,
    pub root_status: Mutex<Option<u16>>,
    pub root_serves_html: Mutex<bool>,
    pub progress: Mutex<VecDeque<f64>>,
    pub answer: Mutex<AskResponse>,
    pub asked: Mutex<Vec<(String, String)>>,
}

impl FakeState {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn count_path_prefix(&self, prefix: &str) -> usize {
        self.paths().iter().filter(|p| p.starts_with(prefix)).count()
    }

    pub fn script_progress(&self, values: &[f64]) {
        self.progress.lock().unwrap().extend(values.iter().copied());
    }

    pub fn set_answer(&self, answer: &str, citations: Option<Vec<&str>>) {
        *self.answer.lock().unwrap() = AskResponse {
            answer: answer.to_string(),
            citations: citations.map(|c| c.into_iter().map(str::to_string).collect()),
        };
    }
}

/// Starts the fake API and returns its base URL.
pub async fn spawn_fake_api(state: Arc<FakeState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", address)
}

/// A base URL nothing is listening on.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", address)
}

fn router(state: Arc<FakeState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/upload", post(upload))
        .route("/api/analyze/{file_id}", post(analyze))
        .route("/api/status/{job_id}", get(status))
        .route("/api/ask/{document_id}", post(ask))
        .route("/api/download/{document_id}", get(download))
        .route("/api/auth/validate", get(validate))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

async fn record_request(State(state): State<Arc<FakeState>>, req: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    state.paths.lock().unwrap().push(req.uri().to_string());
    next.run(req).await
}

async fn root(State(state): State<Arc<FakeState>>) -> Response {
    let status = state
        .root_status
        .lock()
        .unwrap()
        .map(|code| StatusCode::from_u16(code).unwrap())
        .unwrap_or(StatusCode::OK);
    if *state.root_serves_html.lock().unwrap() {
        return (status, "<html>bad gateway</html>").into_response();
    }
    (
        status,
        Json(serde_json::json!({ "message": "Legal Contract Analyzer Backend Running" })),
    )
        .into_response()
}

async fn upload(State(state): State<Arc<FakeState>>, mut multipart: Multipart) -> Response {
    if let Some(code) = *state.upload_failure.lock().unwrap() {
        let status = StatusCode::from_u16(code).unwrap();
        return (status, "upload rejected").into_response();
    }
    let Some(field) = multipart.next_field().await.unwrap() else {
        return (StatusCode::BAD_REQUEST, "Multipart form must include a file").into_response();
    };
    let received = ReceivedUpload {
        field: field.name().unwrap_or_default().to_string(),
        file_name: field.file_name().unwrap_or_default().to_string(),
        content_type: field.content_type().unwrap_or_default().to_string(),
        size: field.bytes().await.unwrap().len(),
    };
    let mut uploads = state.uploads.lock().unwrap();
    uploads.push(received);
    Json(UploadResponse {
        file_id: format!("file-{}", uploads.len()),
    })
    .into_response()
}

async fn analyze(Path(file_id): Path<String>) -> impl IntoResponse {
    Json(AnalyzeResponse {
        job_id: format!("job-for-{}", file_id),
    })
}

async fn status(State(state): State<Arc<FakeState>>, Path(job_id): Path<String>) -> Response {
    match job_id.as_str() {
        "broken" => (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response(),
        "garbage" => (StatusCode::OK, "definitely not json").into_response(),
        _ => {
            let progress = state.progress.lock().unwrap().pop_front().unwrap_or(100.0);
            Json(StatusResponse { progress }).into_response()
        }
    }
}

async fn ask(
    State(state): State<Arc<FakeState>>,
    Path(document_id): Path<String>,
    Json(request): Json<AskRequest>,
) -> Response {
    state
        .asked
        .lock()
        .unwrap()
        .push((document_id.clone(), request.question));
    if document_id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model offline").into_response();
    }
    let answer = state.answer.lock().unwrap();
    Json(AskResponse {
        answer: answer.answer.clone(),
        citations: answer.citations.clone(),
    })
    .into_response()
}

#[derive(Deserialize)]
struct DownloadQuery {
    format: String,
}

async fn download(Path(document_id): Path<String>, Query(query): Query<DownloadQuery>) -> Response {
    if document_id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    format!("REPORT {} {}", document_id, query.format).into_response()
}

async fn validate(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", GOOD_TOKEN));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(ValidateResponse {
        valid: true,
        user: Some(UserDto {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
        }),
    })
    .into_response()
}

/// Console sink that keeps every line in memory.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn console(&self) -> ConsoleOut {
        ConsoleOut::new(Box::new(self.clone()))
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines_containing(&self, needle: &str) -> usize {
        self.text().lines().filter(|l| l.contains(needle)).count()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Variables for a client pointed at `base_url` with fast timers.
pub fn test_env(base_url: &str) -> HashMap<String, String> {
    HashMap::from([
        ("LEGALYZE_API_URL".to_string(), base_url.to_string()),
        ("POLL_INTERVAL_MS".to_string(), "10".to_string()),
        ("REDIRECT_DELAY_MS".to_string(), "10".to_string()),
        ("APP_ORIGIN".to_string(), "https://legalyze.test".to_string()),
    ])
}
