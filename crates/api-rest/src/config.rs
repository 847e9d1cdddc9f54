//! REST server configuration.
//!
//! Values are read from the environment once at startup and passed in; request handling never
//! touches the process environment.

use std::net::SocketAddr;

pub const REST_ADDR_ENV: &str = "PATHOLOGY_REST_ADDR";
pub const ENABLE_DOCS_ENV: &str = "PATHOLOGY_ENABLE_DOCS";
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a socket address such as 0.0.0.0:8080, got '{value}'")]
    InvalidAddr { name: &'static str, value: String },
    #[error("{name} must be true or false, got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for the REST server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestConfig {
    addr: SocketAddr,
    enable_docs: bool,
}

impl RestConfig {
    pub fn new(addr: SocketAddr, enable_docs: bool) -> Self {
        Self { addr, enable_docs }
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_values(
            std::env::var(REST_ADDR_ENV).ok(),
            std::env::var(ENABLE_DOCS_ENV).ok(),
        )
    }

    /// Resolve configuration from raw optional environment values.
    ///
    /// Unset or blank values fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is set but cannot be parsed.
    pub fn from_env_values(
        addr: Option<String>,
        enable_docs: Option<String>,
    ) -> ConfigResult<Self> {
        let addr = match non_blank(addr) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAddr {
                name: REST_ADDR_ENV,
                value: value.clone(),
            })?,
            None => default_addr(),
        };

        let enable_docs = match non_blank(enable_docs) {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                name: ENABLE_DOCS_ENV,
                value,
            })?,
            None => true,
        };

        Ok(Self { addr, enable_docs })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the OpenAPI document and Swagger UI are mounted.
    pub fn enable_docs(&self) -> bool {
        self.enable_docs
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::new(default_addr(), true)
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
