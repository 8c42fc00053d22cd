//! voice-router CLI
//!
//! Routes utterances given on the command line (or one per stdin line) and
//! prints each result as JSON.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use voice_router::services::credentials::EnvCredentialStore;
use voice_router::services::llm::HttpGateway;
use voice_router::{CommandEngine, EngineConfig, UserRole};

/// Route spoken commands to app actions
#[derive(Parser, Debug)]
#[command(name = "voice-router")]
#[command(about = "Interpret a transcribed voice command and print the routed result as JSON")]
struct Args {
    /// Caller role: student, teacher or principal
    #[arg(long, short = 'r')]
    role: UserRole,

    /// Model used when no rule matches (defaults to the configured model)
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// TOML configuration file; VOICE_ROUTER_* env vars are used otherwise
    #[arg(long, short = 'c')]
    config: Option<std::path::PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Utterance to route. Reads stdin line by line when omitted.
    text: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::from_env().context("reading VOICE_ROUTER_* environment")?,
    };
    let model = args.model.clone().unwrap_or_else(|| config.default_model.clone());

    let engine = CommandEngine::with_services(
        Arc::new(HttpGateway::new()),
        Arc::new(EnvCredentialStore::new()),
        config,
    );
    tracing::info!(role = %args.role, model = %model, "voice-router ready");

    if !args.text.is_empty() {
        let utterance = args.text.join(" ");
        return emit(&engine, &utterance, &args, &model).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        emit(&engine, &line, &args, &model).await?;
    }
    Ok(())
}

async fn emit(engine: &CommandEngine, utterance: &str, args: &Args, model: &str) -> anyhow::Result<()> {
    let outcome = engine.process_traced(utterance, args.role, model).await;
    tracing::info!(command_type = %outcome.command_type, route = ?outcome.route, "routed");
    let json = if args.pretty {
        serde_json::to_string_pretty(&outcome.result)?
    } else {
        serde_json::to_string(&outcome.result)?
    };
    println!("{}", json);
    Ok(())
}
