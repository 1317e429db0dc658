//! Server configuration
//!
//! Sources are layered, later ones winning:
//! 1. built-in defaults
//! 2. TOML file given by `--config`
//! 3. environment variables
//! 4. command-line flags
//!
//! # Example file
//!
//! ```toml
//! bind = "127.0.0.1:8080"
//! database_url = "sqlite://wall.db"
//! body_limit_bytes = 10485760
//!
//! [imagen]
//! project_id = "my-project"
//! location = "europe-west4"
//! ```

use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use wall_imagen::ImagenConfig;

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite://wall.db";

/// Default request body limit, large enough for inline data-URI images
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ServerConfig`]
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held an unusable value
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Rejected value
        value: String,
    },
}

/// Command-line flags
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "wall-server", version, about = "Community wall HTTP server")]
pub struct CliArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// SQLite database URL
    #[arg(long)]
    pub database_url: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// Runtime configuration for the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// SQLite database URL
    pub database_url: String,
    /// Store pool size
    pub max_connections: u32,
    /// Maximum accepted request body
    pub body_limit_bytes: usize,
    /// Image provider settings
    pub imagen: ImagenConfig,
}

impl ServerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With listen address
    #[inline]
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// With database URL
    #[inline]
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// With body limit
    #[inline]
    #[must_use]
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }

    /// With image provider settings
    #[inline]
    #[must_use]
    pub fn with_imagen(mut self, imagen: ImagenConfig) -> Self {
        self.imagen = imagen;
        self
    }

    /// Resolve configuration from every source
    ///
    /// # Errors
    /// See [`ConfigError`]
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Parse a TOML file over the defaults
    ///
    /// # Errors
    /// `ConfigError::Read` or `ConfigError::Parse`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Overlay environment variables read through `lookup`
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` if `BIND_ADDR` is not a socket address
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("BIND_ADDR") {
            self.bind = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "BIND_ADDR",
                    value,
                })?;
        }
        if let Some(value) = get("DATABASE_URL") {
            self.database_url = value;
        }
        if let Some(value) = get("GOOGLE_CLOUD_PROJECT_ID") {
            self.imagen.project_id = Some(value);
        }
        if let Some(value) = get("GOOGLE_CLOUD_LOCATION") {
            self.imagen.location = value;
        }
        if let Some(value) = get("IMAGEN_MODEL") {
            self.imagen.model = value;
        }
        if let Some(value) = get("GOOGLE_ACCESS_TOKEN") {
            self.imagen.access_token = Some(value);
        }
        if let Some(value) =
            get("GOOGLE_SERVICE_ACCOUNT_KEY_FILE").or_else(|| get("GOOGLE_APPLICATION_CREDENTIALS"))
        {
            self.imagen.service_account_key_file = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Overlay command-line flags
    pub fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(url) = &cli.database_url {
            self.database_url.clone_from(url);
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            imagen: ImagenConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(config.imagen.project(), None);
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = ServerConfig::default();
        config
            .apply_env_with(env(&[
                ("BIND_ADDR", "127.0.0.1:9000"),
                ("DATABASE_URL", "sqlite::memory:"),
                ("GOOGLE_CLOUD_PROJECT_ID", "wall-prod"),
                ("GOOGLE_CLOUD_LOCATION", "europe-west4"),
                ("IMAGEN_MODEL", "imagen-2"),
                ("GOOGLE_ACCESS_TOKEN", "tok"),
            ]))
            .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.imagen.project(), Some("wall-prod"));
        assert_eq!(config.imagen.location, "europe-west4");
        assert_eq!(config.imagen.model, "imagen-2");
        assert_eq!(config.imagen.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn key_file_env_prefers_explicit_variable() {
        let mut config = ServerConfig::default();
        config
            .apply_env_with(env(&[
                ("GOOGLE_SERVICE_ACCOUNT_KEY_FILE", "/etc/wall/key.json"),
                ("GOOGLE_APPLICATION_CREDENTIALS", "/etc/adc.json"),
            ]))
            .unwrap();
        assert_eq!(
            config.imagen.service_account_key_file.as_deref(),
            Some(Path::new("/etc/wall/key.json"))
        );

        let mut config = ServerConfig::default();
        config
            .apply_env_with(env(&[("GOOGLE_APPLICATION_CREDENTIALS", "/etc/adc.json")]))
            .unwrap();
        assert_eq!(
            config.imagen.service_account_key_file.as_deref(),
            Some(Path::new("/etc/adc.json"))
        );
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = ServerConfig::default();
        config
            .apply_env_with(env(&[("DATABASE_URL", "  "), ("IMAGEN_MODEL", "")]))
            .unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env_with(env(&[("BIND_ADDR", "not-an-address")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "BIND_ADDR", .. }));
    }

    #[test]
    fn file_then_env_then_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_url = "sqlite://from-file.db"
body_limit_bytes = 1024

[imagen]
project_id = "file-project"
model = "file-model"
"#
        )
        .unwrap();

        let mut config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_url, "sqlite://from-file.db");
        assert_eq!(config.body_limit_bytes, 1024);
        assert_eq!(config.imagen.location, "us-central1");

        config
            .apply_env_with(env(&[("IMAGEN_MODEL", "env-model")]))
            .unwrap();
        assert_eq!(config.imagen.model, "env-model");
        assert_eq!(config.imagen.project(), Some("file-project"));

        let cli = CliArgs {
            database_url: Some("sqlite://from-cli.db".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli(&cli);
        assert_eq!(config.database_url, "sqlite://from-cli.db");
        assert_eq!(config.body_limit_bytes, 1024);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/wall.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn cli_flags_parse() {
        let cli = CliArgs::parse_from([
            "wall-server",
            "--bind",
            "127.0.0.1:4000",
            "--database-url",
            "sqlite::memory:",
            "--log-json",
        ]);
        assert_eq!(cli.bind.map(|b| b.port()), Some(4000));
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert!(cli.log_json);
    }
}
