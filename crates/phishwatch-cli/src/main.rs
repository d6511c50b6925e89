mod commands;
mod config;
mod display;
mod shell;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use phishwatch_client::HttpAnalysisClient;
use phishwatch_session::Session;

use crate::config::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("phishwatch v{}", env!("CARGO_PKG_VERSION"));

    let client = HttpAnalysisClient::new(cli.client_config()).context("configuring HTTP client")?;
    tracing::info!(base_url = client.base_url(), "using analysis service");

    let json = cli.json;
    let session = Session::with_limits(client, cli.session_limits());
    let ok = match cli.command {
        Command::AnalyzeText { text, file } => {
            let raw = read_text_input(text, file.as_deref())?;
            commands::analyze_text(&session, &raw, json).await
        }
        Command::AnalyzeEml { path } => {
            let (name, bytes) = read_eml(&path)?;
            commands::analyze_eml(&session, &name, bytes, json).await
        }
        Command::Recent => commands::recent(&session, json).await,
        Command::Scan { id } => commands::select_scan(&session, id, json).await,
        Command::Trends => commands::trends(&session, json).await,
        Command::Dashboard => commands::dashboard(&session, json).await,
        Command::Shell => {
            shell::run(&session, json).await?;
            true
        }
        Command::Health => health(session.api()).await,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn health(client: &HttpAnalysisClient) -> bool {
    match client.health().await {
        Ok(status) => {
            println!("{} is {status}", client.base_url());
            true
        }
        Err(err) => {
            eprintln!("Health check failed: {err}");
            false
        }
    }
}

/// Email text from the positional argument, a file, or stdin, in that order.
fn read_text_input(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading email text from {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading email text from stdin")?;
    Ok(buf)
}

/// Read an `.eml` file, returning its display name and contents.
pub(crate) fn read_eml(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, bytes))
}
