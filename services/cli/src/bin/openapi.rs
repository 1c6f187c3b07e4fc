//! services/cli/src/bin/openapi.rs
//!
//! Writes the OpenAPI description of the Analysis API bodies the client
//! consumes. The configured API base URL is recorded as the server entry.
//!
//! Usage: `openapi [path | -]`, defaulting to `openapi.json`; `-` prints to stdout.

use legalyze_cli::{config::Config, protocol::ApiDoc};
use utoipa::openapi::{OpenApi as OpenApiDocument, Server};
use utoipa::OpenApi;

fn describe(config: &Config) -> OpenApiDocument {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(config.api_base_url.as_str())]);
    doc
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let json = describe(&config).to_pretty_json()?;

    match std::env::args().nth(1).as_deref() {
        Some("-") => println!("{}", json),
        target => {
            let path = target.unwrap_or("openapi.json");
            std::fs::write(path, json)?;
            eprintln!("Wrote the Analysis API description for {} to {}", config.api_base_url, path);
        }
    }
    Ok(())
}
