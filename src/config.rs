//! Configuration management

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before processing config.
    /// Loaded in order, later files override earlier. Variables are set into
    /// the process environment for `env:VAR` resolution.
    #[serde(default)]
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Server bind configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Enable the access-control gate on protected route groups
    pub enabled: bool,

    /// Token signing secret.
    /// Supports: literal value, `env:VAR_NAME`, or `auto` (generates a random
    /// secret at startup — issued tokens die with the process).
    pub secret_key: String,

    /// Session token validity window
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Interval between blacklist sweeps
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Entity route groups whose mutating methods require authentication.
    /// `users` is left open by default so the first account can be created.
    #[serde(default = "default_protected")]
    pub protected: Vec<String>,
}

fn default_protected() -> Vec<String> {
    ["university", "course", "ielts", "pte", "requirements"]
        .map(String::from)
        .to_vec()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_key: "auto".to_string(),
            token_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
            protected: default_protected(),
        }
    }
}

impl AuthConfig {
    /// Resolve the signing secret (expand env vars, generate if `auto`)
    #[must_use]
    pub fn resolve_secret_key(&self) -> String {
        if self.secret_key == "auto" {
            use rand::RngExt;
            let random_bytes: [u8; 32] = rand::rng().random();
            base64::Engine::encode(
                &base64::engine::general_purpose::URL_SAFE_NO_PAD,
                random_bytes,
            )
        } else if let Some(var_name) = self.secret_key.strip_prefix("env:") {
            env::var(var_name).unwrap_or_else(|_| self.secret_key.clone())
        } else {
            self.secret_key.clone()
        }
    }

    /// Check whether an entity route group is wrapped by the gate
    #[must_use]
    pub fn is_protected(&self, entity_path: &str) -> bool {
        self.enabled && self.protected.iter().any(|p| p == entity_path)
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (UNIHUB_ prefix)
        figment = figment.merge(Env::prefixed("UNIHUB_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Load env files into process environment (before env:VAR expansion)
        config.load_env_files();

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let path = Path::new(path_str);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => {
                        tracing::info!("Loaded env file: {path_str}");
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load env file {path_str}: {e}");
                    }
                }
            } else {
                tracing::debug!("Env file not found (skipped): {path_str}");
            }
        }
    }
}
