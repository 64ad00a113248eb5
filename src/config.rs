use crate::client::{ClientConfig, DEFAULT_BASE_URL};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Invalid arguments: {0}")]
    Arguments(String),
}

pub const DEFAULT_LOG_FILE: &str = "reservas.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// What the command line asked for.
#[derive(Debug)]
pub enum Startup {
    Run(Box<Config>),
    /// `--help` or `--version`: print the text and exit successfully.
    Exit(String),
}

/// Parses `args` without exiting the process on bad input.
pub fn load<I, T>(args: I) -> Result<Startup, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Config::try_parse_from(args) {
        Ok(config) => Ok(Startup::Run(Box::new(config))),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(Startup::Exit(e.render().to_string()))
        }
        Err(e) => Err(ConfigError::Arguments(e.render().to_string().trim_end().to_string())),
    }
}

/// Runtime settings. Credentials come from `API_KEY` and `COOKIE`, which may be
/// set in a `.env` file next to the binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "host-reservations-export", version, about = "Export a host's reservations to JSON and iCalendar")]
pub struct Config {
    /// API key sent as the x-airbnb-api-key header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Session cookie of the authenticated host
    #[arg(long, env = "COOKIE", hide_env_values = true)]
    pub cookie: String,

    #[arg(long, env = "RESERVATIONS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = "pt")]
    pub locale: String,

    #[arg(long, default_value = "BRL")]
    pub currency: String,

    /// Reservations requested per page
    #[arg(long, default_value_t = 40)]
    pub page_size: usize,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long, default_value = "reservas.json")]
    pub json_output: PathBuf,

    #[arg(long, default_value = "reservas.ics")]
    pub calendar_output: PathBuf,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("API_KEY"));
        }
        if self.cookie.trim().is_empty() {
            return Err(ConfigError::Missing("COOKIE"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "base_url",
                reason: format!("{} is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.trim().to_string(),
            cookie: self.cookie.trim().to_string(),
            locale: self.locale.clone(),
            currency: self.currency.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
