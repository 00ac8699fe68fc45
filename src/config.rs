use crate::analysis::{GenerationSettings, ModelEndpoint};
use crate::intake::{AdmissionPolicy, DEFAULT_MAX_UPLOAD_MB, KreuzbergSettings, MIN_TEXT_CHARS};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Default Google Cloud Text-to-Speech endpoint.
pub const DEFAULT_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    /// Google Cloud Text-to-Speech API key
    #[arg(long, env = "GOOGLE_TTS_API_KEY", hide_env_values = true, global = true)]
    pub tts_api_key: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Analyze a single document and print the report as JSON
    Analyze {
        /// Document to analyze (.txt, .pdf, .docx, .doc, .png, .jpg)
        file: PathBuf,

        /// Response language (English, Tamil, Hindi); detected when omitted
        #[arg(short, long)]
        language: Option<String>,

        /// Read the summary aloud once the analysis is done
        #[arg(long)]
        speak: bool,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub extraction: KreuzbergSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IntakeConfig {
    pub max_upload_mb: u64,
    pub min_text_chars: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            min_text_chars: MIN_TEXT_CHARS,
        }
    }
}

impl IntakeConfig {
    pub fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            max_upload_mb: self.max_upload_mb,
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub max_input_chars: usize,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Tried in this order; the first usable answer wins.
    pub endpoints: Vec<ModelEndpoint>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let generation = GenerationSettings::default();
        Self {
            api_key: None,
            max_input_chars: crate::analysis::prompt::MAX_INPUT_CHARS,
            temperature: generation.temperature,
            top_k: generation.top_k,
            top_p: generation.top_p,
            max_output_tokens: generation.max_output_tokens,
            endpoints: ModelEndpoint::defaults(),
        }
    }
}

impl std::fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_input_chars", &self.max_input_chars)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl AnalysisConfig {
    pub fn generation(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    /// Speaking rate requested from the remote voice.
    pub remote_rate: f32,
    /// Speaking rate of the local fallback voice.
    pub fallback_rate: f32,
    /// Player for remote MP3 audio; reads the audio from stdin.
    pub player_command: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_TTS_URL.to_string(),
            remote_rate: 0.9,
            fallback_rate: 0.85,
            player_command: "mpg123 -q -".to_string(),
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("remote_rate", &self.remote_rate)
            .field("fallback_rate", &self.fallback_rate)
            .field("player_command", &self.player_command)
            .finish()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layer defaults, config file, `LEGAL_LENS_*` environment and CLI flags,
    /// in increasing priority.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. LEGAL_LENS_SERVER__PORT=8000, LEGAL_LENS_ANALYSIS__MAX_INPUT_CHARS=20000
        builder = builder.add_source(
            Environment::with_prefix("LEGAL_LENS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(key) = non_blank(cli.gemini_api_key.as_deref()) {
            builder = builder.set_override("analysis.api_key", key)?;
        }
        if let Some(key) = non_blank(cli.tts_api_key.as_deref()) {
            builder = builder.set_override("speech.api_key", key)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        for endpoint in &self.analysis.endpoints {
            let url = Url::parse(&endpoint.url).map_err(|e| {
                config::ConfigError::Message(format!(
                    "analysis endpoint '{}' has an invalid url: {e}",
                    endpoint.name
                ))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(config::ConfigError::Message(format!(
                    "analysis endpoint '{}' must use http or https",
                    endpoint.name
                )));
            }
        }
        if self.analysis.max_input_chars == 0 {
            return Err(config::ConfigError::Message(
                "analysis.max_input_chars must be greater than zero".to_string(),
            ));
        }
        Url::parse(&self.speech.api_url).map_err(|e| {
            config::ConfigError::Message(format!("speech.api_url is invalid: {e}"))
        })?;
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
