use crate::llm::GenerationSettings;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Path of the persisted identity blob
    #[arg(long, env = "AUTH_STORE_PATH")]
    pub auth_store: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// File holding the serialized logged-in user between restarts.
    pub store_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
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

        let mut builder = Config::builder();

        // Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("auth.store_path", "gadget-chat.user.json")?
            .set_default("resilience.timeout_disabled", false)?;

        // Config file: explicit path wins, otherwise ./config.{yaml,toml,...}
        // if one exists.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // Environment variables (prefixed with GADGET_), e.g. GADGET_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("GADGET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI overrides (clap also resolves the un-prefixed env vars above).
        // Priority: CLI flag > CLI env var > GADGET_ env var > file > defaults.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(path) = cli.auth_store {
            builder = builder.set_override("auth.store_path", path)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Default public endpoint of the Google generative language API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model, matching the one the web client shipped with.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub fn load_generation_settings() -> Result<GenerationSettings, String> {
    let api_key = env::var("GEMINI_API_KEY")
        .map_err(|_| "Missing required env var: GEMINI_API_KEY".to_string())?;
    if api_key.trim().is_empty() {
        return Err("GEMINI_API_KEY cannot be empty".to_string());
    }

    let base_url = env::var("GEMINI_BASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

    let model = env::var("GEMINI_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

    Ok(GenerationSettings {
        base_url,
        api_key,
        model,
    })
}
