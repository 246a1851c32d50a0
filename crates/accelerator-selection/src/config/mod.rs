use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::selection::format::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use crate::workflows::selection::{EntityKind, InvalidDateFormat, SpreadsheetFormatter};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the selection console.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub selection: SelectionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let entity_kind =
            env::var("SELECTION_ENTITY_KIND").unwrap_or_else(|_| "company".to_string());
        if entity_kind.trim().is_empty() {
            return Err(ConfigError::EmptyEntityKind);
        }

        let date_format = env::var("SELECTION_DATE_FORMAT")
            .unwrap_or_else(|_| DEFAULT_DATE_FORMAT.to_string());
        if !is_valid_date_format(&date_format) {
            return Err(ConfigError::InvalidDateFormat { value: date_format });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            selection: SelectionConfig {
                entity_kind: entity_kind.trim().to_string(),
                date_format,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filter and output styling.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Which submissions the board loads and how their values are displayed.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub entity_kind: String,
    pub date_format: String,
}

impl SelectionConfig {
    pub fn entity_kind(&self) -> EntityKind {
        EntityKind(self.entity_kind.clone())
    }

    pub fn formatter(&self) -> Result<SpreadsheetFormatter, ConfigError> {
        SpreadsheetFormatter::new(self.date_format.clone()).map_err(ConfigError::from)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyEntityKind,
    InvalidDateFormat { value: String },
}

impl From<InvalidDateFormat> for ConfigError {
    fn from(value: InvalidDateFormat) -> Self {
        Self::InvalidDateFormat { value: value.0 }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyEntityKind => {
                write!(f, "SELECTION_ENTITY_KIND must not be empty")
            }
            ConfigError::InvalidDateFormat { value } => {
                write!(f, "SELECTION_DATE_FORMAT '{value}' is not a valid strftime pattern")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::EmptyEntityKind
            | ConfigError::InvalidDateFormat { .. } => None,
        }
    }
}
