use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://cloud.iexapis.com/stable";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// env var that overrides the file token (also read from .env)
pub const TOKEN_ENV: &str = "STONKS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no API token: set [api].token in the config file or STONKS_TOKEN")]
    MissingToken,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Replaces the file token with `token` when it is present and non-blank.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api.token = token;
        }
        self
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.api.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(self)
    }
}

// read .toml at `path`; a missing file falls back to defaults so a token from
// the environment alone is enough
pub fn load_toml(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("no config file at {}, using defaults", path.display());
        return Ok(Config { api: Api::default() });
    }

    let io_err = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(io_err)?;

    Config::from_toml_str(&contents)
}

// full load: .env, then the file, then the env override, then validation
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    // .env is optional
    let _ = dotenv::dotenv();

    load_toml(path)?
        .with_token_override(std::env::var(TOKEN_ENV).ok())
        .validate()
}
