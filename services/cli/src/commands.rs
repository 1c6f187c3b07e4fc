//! services/cli/src/commands.rs
//!
//! Parses the command line and runs each command against an `AppContext`.

use crate::context::AppContext;
use crate::error::CliError;
use futures::stream::{FuturesUnordered, StreamExt};
use legalyze_core::domain::format_file_size;
use legalyze_core::{
    resolve_document_id, share_link, validate_declared, ChatError, DocumentId, DocumentKind,
    Notification, PortError, ReportFormat, UploadCandidate, WorkflowOutcome,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const USAGE: &str = "\
Usage: legalyze <command> [arguments]

Commands:
  health                                 Check that the Analysis API is reachable
  upload <file>                          Upload a PDF, DOCX or TXT file and wait for its analysis
  ask <document|link> <question>...      Ask questions about an analyzed document
  report <document|link> <format> [out]  Download a report (pdf, docx or json)
  share <document|link>                  Print a shareable link
  whoami                                 Validate the configured auth token
  help                                   Show this message

A <document|link> is either a document identifier or a results link such as
'dashboard.html?contract_id=<id>'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Health,
    Upload { path: PathBuf },
    Ask { target: String, questions: Vec<String> },
    Report {
        target: String,
        format: ReportFormat,
        out: Option<PathBuf>,
    },
    Share { target: String },
    Whoami,
}

impl Command {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match (name.as_str(), rest) {
            ("help" | "-h" | "--help", _) => Ok(Command::Help),
            ("health", []) => Ok(Command::Health),
            ("whoami", []) => Ok(Command::Whoami),
            ("upload", [path]) => Ok(Command::Upload {
                path: PathBuf::from(path),
            }),
            ("ask", [target, questions @ ..]) if !questions.is_empty() => Ok(Command::Ask {
                target: target.clone(),
                questions: questions.to_vec(),
            }),
            ("report", [target, format, out @ ..]) if out.len() <= 1 => Ok(Command::Report {
                target: target.clone(),
                format: format.parse().map_err(CliError::Usage)?,
                out: out.first().map(PathBuf::from),
            }),
            ("share", [target]) => Ok(Command::Share {
                target: target.clone(),
            }),
            ("health" | "whoami" | "upload" | "ask" | "report" | "share", _) => Err(
                CliError::Usage(format!("Wrong number of arguments for '{}'.", name)),
            ),
            _ => Err(CliError::Usage(format!("Unknown command '{}'.", name))),
        }
    }

    /// Whether the API health check runs before this command.
    pub fn wants_health_check(&self) -> bool {
        !matches!(self, Command::Help | Command::Health | Command::Share { .. })
    }
}

/// Runs one parsed command.
pub async fn execute(ctx: &AppContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Help => {
            ctx.out.line(USAGE);
            Ok(())
        }
        Command::Health => {
            if check_api_health(ctx).await {
                Ok(())
            } else {
                Err(CliError::Unreachable)
            }
        }
        Command::Upload { path } => upload(ctx, &path).await,
        Command::Ask { target, questions } => ask(ctx, &target, &questions).await,
        Command::Report {
            target,
            format,
            out,
        } => report(ctx, &target, format, out).await,
        Command::Share { target } => share(ctx, &target),
        Command::Whoami => whoami(ctx).await,
    }
}

/// Pings the API root and reports the result as a notification.
pub async fn check_api_health(ctx: &AppContext) -> bool {
    match ctx.api.health().await {
        Ok(()) => {
            ctx.notifier
                .notify(Notification::success("Backend connected successfully!"));
            true
        }
        Err(e) => {
            warn!("Backend connection failed: {}", e);
            ctx.notifier.notify(Notification::warning(
                "Warning: Backend connection failed. Please check API URL.",
            ));
            false
        }
    }
}

/// The MIME type declared for a local file, from its extension.
pub fn declared_mime_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentKind::from_extension)
        .map(DocumentKind::mime_type)
        .unwrap_or("application/octet-stream")
}

/// Checks type and size from the file's metadata first, so an oversized file
/// is never read into memory.
async fn upload(ctx: &AppContext, path: &Path) -> Result<(), CliError> {
    let mime_type = declared_mime_type(path);
    let size = tokio::fs::metadata(path).await?.len();
    let outcome = match validate_declared(mime_type, size) {
        Err(e) => ctx.workflow.reject(e),
        Ok(_) => {
            let content = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            info!(
                "Read '{}' ({}).",
                path.display(),
                format_file_size(content.len() as u64)
            );
            let candidate = UploadCandidate::new(file_name, mime_type, content);
            ctx.workflow.run(candidate).await
        }
    };

    match outcome {
        WorkflowOutcome::Completed { link, .. } => {
            ctx.out.line(&format!(
                "Ask about it with: legalyze ask '{}' \"<question>\"",
                link
            ));
            Ok(())
        }
        WorkflowOutcome::Failed(reason) => Err(reason.into()),
        WorkflowOutcome::Cancelled => {
            Err(CliError::Internal("the upload was cancelled".to_string()))
        }
    }
}

/// Submits every question at once; answers print as they arrive.
async fn ask(ctx: &AppContext, target: &str, questions: &[String]) -> Result<(), CliError> {
    let chat = ctx.chat(target);
    let mut pending: FuturesUnordered<_> =
        questions.iter().map(|question| chat.submit(question)).collect();

    let mut first_error: Option<ChatError> = None;
    while let Some(result) = pending.next().await {
        match result {
            Ok(exchange) => debug!(
                citations = exchange.citations.len(),
                "Answered '{}'.", exchange.question
            ),
            Err(ChatError::EmptyQuestion) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn document_id(ctx: &AppContext, target: &str) -> Result<DocumentId, CliError> {
    resolve_document_id(target).ok_or_else(|| {
        ctx.notifier
            .notify(Notification::error("Please upload a contract first."));
        CliError::Chat(ChatError::EmptyContext)
    })
}

async fn report(
    ctx: &AppContext,
    target: &str,
    format: ReportFormat,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let document_id = document_id(ctx, target)?;
    let bytes = match ctx.api.download_report(&document_id, format).await {
        Ok(bytes) => bytes,
        Err(e) => {
            ctx.notifier.notify(Notification::error(match &e {
                PortError::NotFound(_) => "That report is not available yet.".to_string(),
                _ => "Failed to download the report. Please try again.".to_string(),
            }));
            return Err(e.into());
        }
    };

    let out = out.unwrap_or_else(|| default_report_path(&document_id, format));
    tokio::fs::write(&out, &bytes).await?;
    ctx.notifier.notify(Notification::success(format!(
        "Report saved to {} ({}).",
        out.display(),
        format_file_size(bytes.len() as u64)
    )));
    Ok(())
}

/// `<id>-report.<ext>`, with anything but ASCII letters, digits, `-` and `_`
/// in the identifier replaced.
pub fn default_report_path(document_id: &DocumentId, format: ReportFormat) -> PathBuf {
    let safe: String = document_id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    PathBuf::from(format!("{}-report.{}", safe, format.as_str()))
}

fn share(ctx: &AppContext, target: &str) -> Result<(), CliError> {
    let document_id = document_id(ctx, target)?;
    let link = share_link(&ctx.config.app_origin, &document_id);
    ctx.out.line(&link);
    ctx.notifier
        .notify(Notification::success("Share link ready."));
    Ok(())
}

async fn whoami(ctx: &AppContext) -> Result<(), CliError> {
    let Some(token) = ctx.config.auth_token.as_deref() else {
        ctx.notifier
            .notify(Notification::info("Not signed in. Running as a guest."));
        return Ok(());
    };

    match ctx.api.validate_session(token).await {
        Ok(session) if session.valid => {
            let who = session
                .user
                .map(|user| format!("{} <{}>", user.name, user.email))
                .unwrap_or_else(|| "an unnamed user".to_string());
            ctx.notifier
                .notify(Notification::success(format!("Signed in as {}.", who)));
            Ok(())
        }
        Ok(_) | Err(PortError::Unauthorized) => {
            ctx.notifier.notify(Notification::warning(
                "Your session has expired. Please sign in again.",
            ));
            Err(PortError::Unauthorized.into())
        }
        Err(e) => {
            ctx.notifier.notify(Notification::error(
                "Could not validate your session. Please try again.",
            ));
            Err(e.into())
        }
    }
}
