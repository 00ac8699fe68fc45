//! Legal Lens server and command-line entry point.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use legal_lens::AppState;
use legal_lens::config::{AppConfig, Cli, Command};
use legal_lens::server::{self, AnalysisReport};
use legal_lens::speech::{CommandAudioOutput, SpeechPlayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads the environment
    let _ = dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Arc::new(AppConfig::from_cli(&cli).context("Configuration error")?);

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => server::start_server(config).await,
        Command::Analyze {
            file,
            language,
            speak,
        } => analyze_file(config, &file, language.as_deref(), speak).await,
    }
}

// Initialize tracing (M-LOG-STRUCTURED). Logs go to stderr; `analyze` prints its report on stdout.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true).with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(true).with_writer(std::io::stderr)))
        .init();
}

/// `legal-lens analyze <FILE>`: print the report as JSON, optionally read it aloud.
async fn analyze_file(
    config: Arc<AppConfig>,
    path: &Path,
    language: Option<&str>,
    speak: bool,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let mime = mime_guess::from_path(path).first_raw();

    let state = AppState::from_config(Arc::clone(&config));
    let document = state
        .intake
        .process(file_name, mime, &data)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let report = server::analyze_document(&state, &document, language)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if speak {
        read_aloud(&state, &config, &report).await;
    }
    Ok(())
}

async fn read_aloud(state: &AppState, config: &AppConfig, report: &AnalysisReport) {
    let output = Arc::new(CommandAudioOutput::new(&config.speech.player_command));
    let player = SpeechPlayer::new(Arc::clone(&state.speech), output);

    player
        .toggle(&report.result.simple_summary, report.language_code)
        .await;

    tokio::select! {
        () = player.wait_until_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            player.toggle(&report.result.simple_summary, report.language_code).await;
            info!(name: "speech.playback.interrupted", "Reading interrupted");
        }
    }
}
