//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.escriba/config.toml` (user)
//! 3. `/etc/escriba/config.toml` (system)
//! 4. built-in defaults
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.escriba/secrets.toml` (user, must be 0600)
//! 2. `/etc/escriba/secrets.toml` (system, must be 0600)
//! 3. `GEMINI_API_KEY` environment variable

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::gateway::{DEFAULT_TEMPERATURE, DEFAULT_TEMPLATE};
use crate::providers::candidates::DEFAULT_MODELS;
use crate::providers::gemini::DEFAULT_BASE_URL;
use crate::report::ValidationRules;
use crate::{EscribaError, Result};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub validation: ValidationRules,
}

/// Remote generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Candidate models, tried in order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Sampling temperature (default: 0.2).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completions requested per call (default: 1).
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u32,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prompt with `{nature}` and `{draft}` slots.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            temperature: default_temperature(),
            candidate_count: default_candidate_count(),
            request_timeout_secs: default_timeout(),
            base_url: default_base_url(),
            prompt_template: default_prompt_template(),
        }
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_candidate_count() -> u32 {
    1
}

fn default_timeout() -> u64 {
    60
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_prompt_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Result cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Maximum cached rewrites (default: 100).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_entries() -> usize {
    100
}

/// Report store settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding saved reports. A leading `~/` expands to the
    /// home directory. Without a path, reports are kept in memory only.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured path with `~/` expanded.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        match path.strip_prefix("~") {
            Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
            Err(_) => Some(path.clone()),
        }
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[("gemini", "GEMINI_API_KEY")];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; an error if it does not exist)
    /// 2. `~/.escriba/config.toml`
    /// 3. `/etc/escriba/config.toml`
    /// 4. [`Config::default()`]
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EscribaError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            EscribaError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(EscribaError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".escriba").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/escriba/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.escriba/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/escriba/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".escriba").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/escriba/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load secrets from a specific file after checking its permissions.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            EscribaError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            EscribaError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            EscribaError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(EscribaError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Get API key for a provider, falling back to the corresponding environment variable.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        let from_file = match provider {
            "gemini" => self.gemini.as_ref(),
            _ => None,
        }
        .map(|s| s.api_key.clone())
        .filter(|k| !k.trim().is_empty());

        from_file.or_else(|| {
            PROVIDER_ENV_VARS
                .iter()
                .find(|(name, _)| *name == provider)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
                .filter(|k| !k.trim().is_empty())
        })
    }
}
