//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `config.toml` and applies environment overrides.
//!
//! Priority: environment variables > config file > defaults

use anyhow::{Context, Result};
use blockbuilders_core::config::AppConfig;
use blockbuilders_core::validation::Validate;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::paths::BlockbuildersPaths;

pub const CONFIG_PATH_ENV: &str = "BLOCKBUILDERS_CONFIG";
pub const API_BASE_URL_ENV: &str = "BLOCKBUILDERS_API_BASE_URL";
pub const AUTH_URL_ENV: &str = "BLOCKBUILDERS_AUTH_URL";
pub const AUTH_ANON_KEY_ENV: &str = "BLOCKBUILDERS_AUTH_ANON_KEY";
pub const AUTH_REDIRECT_BASE_URL_ENV: &str = "BLOCKBUILDERS_AUTH_REDIRECT_BASE_URL";
pub const AUTH_COOKIE_DOMAIN_ENV: &str = "BLOCKBUILDERS_AUTH_COOKIE_DOMAIN";

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service reading `path`, or the default location when `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Honors `BLOCKBUILDERS_CONFIG` when set.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Gets the configuration, loading it on first access.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Ok(read_lock) = self.config.read()
            && let Some(cached) = read_lock.as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = self.load_with(|key| std::env::var(key).ok())?;

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }
        Ok(loaded)
    }

    /// Loads the configuration using `env` for overrides.
    pub fn load_with<F>(&self, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => BlockbuildersPaths::config_file()
                .map_err(|e| anyhow::anyhow!("Failed to resolve config path: {}", e))?,
        };

        let mut config = Self::read_file(&path)?;
        Self::apply_env_overrides(&mut config, env);

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {}", path.display(), e))?;

        tracing::debug!("[ConfigService] Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            tracing::info!(
                "[ConfigService] No config file at {}, using defaults",
                path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn apply_env_overrides<F>(config: &mut AppConfig, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env(API_BASE_URL_ENV) {
            config.api_base_url = value;
        }
        if let Some(value) = env(AUTH_URL_ENV) {
            config.auth.url = value;
        }
        if let Some(value) = env(AUTH_ANON_KEY_ENV) {
            config.auth.anon_key = value;
        }
        if let Some(value) = env(AUTH_REDIRECT_BASE_URL_ENV) {
            config.auth_redirect_base_url = Some(value);
        }
        if let Some(value) = env(AUTH_COOKIE_DOMAIN_ENV) {
            config.cookie.domain = Some(value);
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::from_env()
    }
}
