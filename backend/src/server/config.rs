//! HTTP server configuration loaded from the environment.
//!
//! `ServerConfig::from_env` reads `DATABASE_URL`, `BIND_ADDR`, `API_TOKEN`
//! or `API_TOKEN_FILE`, and `MAX_FILE_BYTES`, validating everything up
//! front so a misconfigured deployment fails at startup instead of on the
//! first request. Debug builds tolerate a missing token secret and fall
//! back to a fixed development token; release builds refuse to start.

use std::net::SocketAddr;

use tracing::warn;

use crate::domain::DEFAULT_MAX_FILE_BYTES;

/// Token handed out in debug builds when no secret is configured.
const DEV_TOKEN: &str = "dev-token";

/// Errors raised while loading the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("required environment variable {name} is not set")]
    MissingEnv { name: &'static str },

    /// An environment variable holds an unparseable value.
    #[error("invalid value for {name}: {message}")]
    InvalidEnv { name: &'static str, message: String },

    /// The API token file could not be read.
    #[error("failed to read API token file {path}: {message}")]
    TokenRead { path: String, message: String },

    /// The API token file exists but holds nothing.
    #[error("API token file {path} is empty")]
    TokenEmpty { path: String },

    /// No token source is configured in a release build.
    #[error("no API token configured; set API_TOKEN or API_TOKEN_FILE")]
    TokenMissing,
}

/// Build flavour the configuration is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// The mode matching the current compilation profile.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Runtime configuration for the HTTP server.
///
/// Deliberately not `Debug`: the API token must not end up in logs.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct ServerConfig {
    database_url: String,
    bind_addr: SocketAddr,
    api_token: String,
    max_file_bytes: usize,
}

impl ServerConfig {
    /// Construct a configuration with defaults for everything optional.
    #[must_use]
    pub fn new(database_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: default_bind_addr(),
            api_token: api_token.into(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Override the listen address.
    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Override the upload size ceiling.
    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Load the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `DATABASE_URL` is absent, a variable
    /// fails to parse, or no API token is configured in a release build.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(BuildMode::current(), |name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    ///
    /// Exposed so tests can exercise both build modes without touching the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ServerConfig::from_env`].
    pub fn from_lookup(
        mode: BuildMode,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv {
            name: "DATABASE_URL",
        })?;

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::InvalidEnv {
                    name: "BIND_ADDR",
                    message: e.to_string(),
                })?,
            None => default_bind_addr(),
        };

        let max_file_bytes = match lookup("MAX_FILE_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::InvalidEnv {
                name: "MAX_FILE_BYTES",
                message: e.to_string(),
            })?,
            None => DEFAULT_MAX_FILE_BYTES,
        };

        let api_token = resolve_token(mode, &lookup)?;

        Ok(Self {
            database_url,
            bind_addr,
            api_token,
            max_file_bytes,
        })
    }

    /// The database URL migrations and the pool connect to.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// The socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// The bearer token mutating requests must present.
    #[must_use]
    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Upload size ceiling in bytes.
    #[must_use]
    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Resolve the API token from `API_TOKEN`, then `API_TOKEN_FILE`.
fn resolve_token(
    mode: BuildMode,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if let Some(token) = lookup("API_TOKEN") {
        let token = token.trim().to_owned();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    if let Some(path) = lookup("API_TOKEN_FILE") {
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::TokenRead {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let token = contents.trim().to_owned();
        if token.is_empty() {
            return Err(ConfigError::TokenEmpty { path });
        }
        return Ok(token);
    }

    match mode {
        BuildMode::Debug => {
            warn!("no API token configured; using the fixed development token");
            Ok(DEV_TOKEN.to_owned())
        }
        BuildMode::Release => Err(ConfigError::TokenMissing),
    }
}
