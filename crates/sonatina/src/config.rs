//! Config file discovery, loading, and environment variable overlay.
//!
//! Load order (later wins):
//! 1. Compiled defaults
//! 2. `./sonatina.toml`, or the `--config` path when given
//! 3. Environment variables (`SONATINA_*`, `PORT`, `RUST_LOG`)
//!
//! CLI flags are applied by the binary after this module runs.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
    /// Tracing filter directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally from a CLI-supplied file path, and
    /// return information about sources.
    pub fn load_from(config_path: Option<&Path>) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ServerConfig::default();

        for path in discover_config_files(config_path) {
            let file_config = load_from_file(&path)?;
            config = merge_configs(config, file_config);
            sources.files.push(path);
        }

        apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }
}

/// Discover config files, optionally with a CLI override path.
///
/// The CLI path replaces the local `./sonatina.toml` override.
/// Only returns files that exist.
pub fn discover_config_files(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
        }
        return files;
    }

    let local = PathBuf::from("sonatina.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<ServerConfig, ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut config = ServerConfig::default();

    if let Some(server) = table.get("server").and_then(|v| v.as_table()) {
        if let Some(v) = server.get("bind").and_then(|v| v.as_str()) {
            config.bind = v.to_string();
        }
        if let Some(v) = server.get("port").and_then(|v| v.as_integer()) {
            config.port = v as u16;
        }
        if let Some(v) = server.get("max_upload_bytes").and_then(|v| v.as_integer()) {
            config.max_upload_bytes = v as usize;
        }
    }

    if let Some(log) = table.get("log").and_then(|v| v.as_table()) {
        if let Some(v) = log.get("filter").and_then(|v| v.as_str()) {
            config.log_filter = v.to_string();
        }
    }

    Ok(config)
}

/// Merge two configs, with `overlay` taking precedence.
///
/// An overlay field equal to the compiled default is treated as unset.
fn merge_configs(base: ServerConfig, overlay: ServerConfig) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        bind: if overlay.bind != defaults.bind {
            overlay.bind
        } else {
            base.bind
        },
        port: if overlay.port != defaults.port {
            overlay.port
        } else {
            base.port
        },
        max_upload_bytes: if overlay.max_upload_bytes != defaults.max_upload_bytes {
            overlay.max_upload_bytes
        } else {
            base.max_upload_bytes
        },
        log_filter: if overlay.log_filter != defaults.log_filter {
            overlay.log_filter
        } else {
            base.log_filter
        },
    }
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut ServerConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("SONATINA_BIND") {
        config.bind = v;
        sources.env_overrides.push("SONATINA_BIND".to_string());
    }

    // PORT is what container platforms set; SONATINA_PORT wins over it
    if let Ok(v) = env::var("PORT") {
        if let Ok(port) = v.parse() {
            config.port = port;
            sources.env_overrides.push("PORT".to_string());
        }
    }
    if let Ok(v) = env::var("SONATINA_PORT") {
        if let Ok(port) = v.parse() {
            config.port = port;
            sources.env_overrides.push("SONATINA_PORT".to_string());
        }
    }

    if let Ok(v) = env::var("SONATINA_MAX_UPLOAD_BYTES") {
        if let Ok(bytes) = v.parse() {
            config.max_upload_bytes = bytes;
            sources.env_overrides.push("SONATINA_MAX_UPLOAD_BYTES".to_string());
        }
    }

    if let Ok(v) = env::var("SONATINA_LOG") {
        config.log_filter = v;
        sources.env_overrides.push("SONATINA_LOG".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.log_filter = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}
