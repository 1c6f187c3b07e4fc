pub mod console;
pub mod http_api;

pub use console::{ConsoleNavigator, ConsoleNotifier, ConsoleOut, ConsoleProgress, ConsoleTranscript};
pub use http_api::HttpAnalysisApi;
