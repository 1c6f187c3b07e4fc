//! services/cli/src/bin/legalyze.rs

use legalyze_cli::{
    adapters::ConsoleOut,
    commands::{self, Command, USAGE},
    config::Config,
    context::{install_panic_hook, AppContext},
    error::CliError,
};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if !e.already_shown() {
                eprintln!("{}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Analysis API at {}", config.api_base_url);

    // --- 2. Build the Application Context ---
    let out = ConsoleOut::stdout();
    install_panic_hook(out.clone());
    let ctx = AppContext::from_config(config, out)?;

    // --- 3. Run the Command ---
    if command.wants_health_check() {
        commands::check_api_health(&ctx).await;
    }
    let result = tokio::select! {
        result = commands::execute(&ctx, command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted.");
            Err(CliError::Internal("interrupted".to_string()))
        }
    };

    // --- 4. Tear Down ---
    ctx.shutdown();
    result
}
