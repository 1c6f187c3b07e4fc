//! services/cli/src/adapters/console.rs
//!
//! Terminal implementations of the display ports.
//!
//! Every adapter writes through a shared `ConsoleOut`, which is stdout in the
//! binary and an in-memory buffer in tests.

use chrono::Local;
use legalyze_core::ports::{Navigator, Notifier, ProgressSurface, Transcript, TypingId};
use legalyze_core::{Notification, ResultsView, Severity, Speaker};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const BAR_WIDTH: usize = 20;

/// Where console adapters write their lines.
#[derive(Clone)]
pub struct ConsoleOut {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleOut {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Writes one line. Terminal write errors are ignored.
    pub fn line(&self, text: &str) {
        let mut sink = self.lock();
        let _ = writeln!(sink, "{}", text);
        let _ = sink.flush();
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Renders `percent` as a fixed-width bar.
pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

//=========================================================================================
// Progress
//=========================================================================================

pub struct ConsoleProgress {
    out: ConsoleOut,
    last: Mutex<Option<(u8, String)>>,
}

impl ConsoleProgress {
    pub fn new(out: ConsoleOut) -> Self {
        Self {
            out,
            last: Mutex::new(None),
        }
    }
}

impl ProgressSurface for ConsoleProgress {
    fn show_progress(&self) {
        self.out.line("Analyzing your document...");
    }

    fn hide_progress(&self) {
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    /// Repeated identical updates print nothing.
    fn update_progress(&self, percent: u8, status: &str) {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let current = (percent, status.to_string());
        if last.as_ref() == Some(&current) {
            return;
        }
        self.out
            .line(&format!("{} {:>3}% {}", progress_bar(percent), percent, status));
        *last = Some(current);
    }
}

//=========================================================================================
// Notifications and Navigation
//=========================================================================================

pub struct ConsoleNotifier {
    out: ConsoleOut,
}

impl ConsoleNotifier {
    pub fn new(out: ConsoleOut) -> Self {
        Self { out }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.severity {
            Severity::Success => "✔ success",
            Severity::Error => "✖ error",
            Severity::Warning => "! warning",
            Severity::Info => "i info",
        };
        self.out.line(&format!("[{}] {}", tag, notification.message));
    }
}

/// Prints the results link and remembers the last one.
pub struct ConsoleNavigator {
    out: ConsoleOut,
    results_page: String,
    last_link: Mutex<Option<String>>,
}

impl ConsoleNavigator {
    pub fn new(out: ConsoleOut, results_page: String) -> Self {
        Self {
            out,
            results_page,
            last_link: Mutex::new(None),
        }
    }

    pub fn last_link(&self) -> Option<String> {
        self.last_link
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, view: &ResultsView) {
        let link = view.link(&self.results_page);
        self.out.line(&format!("Results: {}", link));
        *self.last_link.lock().unwrap_or_else(|p| p.into_inner()) = Some(link);
    }
}

//=========================================================================================
// Chat Transcript
//=========================================================================================

pub struct ConsoleTranscript {
    out: ConsoleOut,
    next_typing: AtomicU64,
}

impl ConsoleTranscript {
    pub fn new(out: ConsoleOut) -> Self {
        Self {
            out,
            next_typing: AtomicU64::new(0),
        }
    }
}

impl Transcript for ConsoleTranscript {
    fn append(&self, speaker: Speaker, text: &str) {
        let who = match speaker {
            Speaker::User => "you",
            Speaker::Assistant => "assistant",
        };
        let stamp = Local::now().format("%H:%M:%S");
        self.out.line(&format!("[{}] {}> {}", stamp, who, text));
    }

    fn show_typing(&self) -> TypingId {
        self.out.line("assistant is typing...");
        TypingId(self.next_typing.fetch_add(1, Ordering::Relaxed))
    }

    // A printed line cannot be taken back.
    fn hide_typing(&self, _id: TypingId) {}
}
