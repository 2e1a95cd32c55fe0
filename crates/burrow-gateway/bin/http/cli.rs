use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const DELETE_TIMEOUT_SECS_ENV: &str = "DELETE_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow-gateway")]
pub struct CLI {
    /// Address the HTTP server binds to.
    #[arg(short = 'a', long, env = SERVER_ADDRESS_ENV, default_value = DEFAULT_SERVER_ADDRESS)]
    pub server_address: String,

    /// Public prefix of generated short URLs.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL, value_parser = parse_base_url)]
    pub base_url: String,

    /// Append-only storage file. Empty disables file storage.
    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV, default_value = "")]
    pub file_storage_path: String,

    /// PostgreSQL DSN. Empty disables database storage.
    #[arg(short = 'd', long, env = DATABASE_DSN_ENV, default_value = "")]
    pub database_dsn: String,

    /// Deadline for background batch deletes, in seconds.
    #[arg(long, env = DELETE_TIMEOUT_SECS_ENV, default_value_t = DEFAULT_DELETE_TIMEOUT_SECS)]
    pub delete_timeout_secs: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn file_storage_path(&self) -> Option<PathBuf> {
        non_empty(&self.file_storage_path).map(PathBuf::from)
    }

    pub fn database_dsn(&self) -> Option<String> {
        non_empty(&self.database_dsn).map(str::to_owned)
    }

    pub fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn parse_base_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid base url '{raw}': {e}"))?;
    if !url.has_host() {
        return Err(format!("base url must have a host: '{raw}'"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
