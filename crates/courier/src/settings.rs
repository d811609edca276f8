//! Client settings
//!
//! Defaults, then an optional TOML file, then `COURIER_*` environment
//! variables through [`Settings::from_env`].

use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::client::ClientBuilder;
use crate::environment::BaseUrl;
use crate::error::Error;
use crate::Client;

/// Base URL
pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
/// Application name
pub const ENV_APP_NAME: &str = "COURIER_APP_NAME";
/// Comma separated list of trusted hosts
pub const ENV_TRUSTED_HOSTS: &str = "COURIER_TRUSTED_HOSTS";
/// Upload session id
pub const ENV_BACKGROUND_SESSION_ID: &str = "COURIER_BACKGROUND_SESSION_ID";
/// Log filter
pub const ENV_LOG_LEVEL: &str = "COURIER_LOG_LEVEL";

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL every endpoint path is joined to
    pub base_url: String,
    /// Application name
    pub app_name: String,
    /// Hosts whose certificates are accepted without evaluation
    #[serde(default)]
    pub trusted_hosts: Vec<String>,
    /// Fixed upload session id, generated when unset
    pub background_session_id: Option<String>,
    /// Log filter, as accepted by `tracing_subscriber::EnvFilter`
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            app_name: "courier".to_string(),
            trusted_hosts: Vec::new(),
            background_session_id: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `config_file_name`, or `~/.courier/config.toml`
    ///
    /// Falls back to the defaults if the file cannot be read.
    #[must_use]
    pub fn new<P>(config_file_name: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        match Self::load(config_file_name) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(
                    "Error reading config file, falling back to defaults. Error: {e}"
                );
                Self::default()
            }
        }
    }

    /// Like [`Settings::new`], but reports a missing or invalid file
    pub fn load<P>(config_file_name: Option<P>) -> Result<Self, Error>
    where
        P: Into<PathBuf>,
    {
        Ok(Self::new_from_default(&Self::default(), config_file_name)?)
    }

    fn new_from_default<P>(
        default: &Settings,
        config_file_name: Option<P>,
    ) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let config_file_name = match config_file_name {
            Some(value) => value.into(),
            None => home::home_dir()
                .ok_or(ConfigError::NotFound("Config Path".to_string()))?
                .join(".courier")
                .join("config.toml"),
        };

        let config = Config::builder()
            // use defaults
            .add_source(Config::try_from(default)?)
            // override with file contents
            .add_source(File::from(config_file_name))
            .build()?;

        config.try_deserialize()
    }

    /// Override fields from `COURIER_*` environment variables
    pub fn from_env(mut self) -> Self {
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            self.base_url = base_url;
        }

        if let Ok(app_name) = env::var(ENV_APP_NAME) {
            self.app_name = app_name;
        }

        if let Ok(hosts) = env::var(ENV_TRUSTED_HOSTS) {
            self.trusted_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(id) = env::var(ENV_BACKGROUND_SESSION_ID) {
            self.background_session_id = Some(id);
        }

        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }

        self
    }

    /// Install the stdout subscriber with [`Settings::log_level`]
    pub fn init_logging(&self) {
        crate::logging::init_logging(&self.log_level);
    }

    /// Client builder carrying these settings
    pub fn into_builder(self) -> ClientBuilder {
        let builder = Client::builder(BaseUrl::new(self.base_url))
            .app_name(self.app_name)
            .trusted_hosts(self.trusted_hosts);

        match self.background_session_id {
            Some(id) => builder.background_session_id(id),
            None => builder,
        }
    }
}
