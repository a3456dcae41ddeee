// Keysafe — Configuration
//
// Tunables for the secret manager. Resolution order, lowest to highest:
//   1. Built-in defaults
//   2. TOML file (`--config`, or `<config_dir>/keysafe/config.toml` if present)
//   3. `KEYSAFE_*` environment variables
//
// The encryption key is deliberately absent: it is supplied through
// `--encryption-key` / `KEYSAFE_ENCRYPTION_KEY` and never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cache lifetime: 6 hours.
const DEFAULT_CACHE_TTL_SECS: u64 = 21_600;

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

const ENV_USE_CACHE: &str = "KEYSAFE_USE_CACHE";
const ENV_USE_LOG: &str = "KEYSAFE_USE_LOG";
const ENV_CACHE_PREFIX: &str = "KEYSAFE_CACHE_PREFIX";
const ENV_CACHE_TTL: &str = "KEYSAFE_CACHE_TTL";
const ENV_DATABASE: &str = "KEYSAFE_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which `RecordStore` adapter backs the secret manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Serve reads from the cache and refresh it on writes.
    pub use_cache: bool,
    /// Write audit entries for every secret operation.
    pub use_log: bool,
    /// Prepended to every secret key to form its cache key.
    pub cache_prefix: String,
    /// Cache entry lifetime in seconds.
    pub cache_ttl: u64,
    /// Upper bound on cached entries.
    pub cache_capacity: u64,
    pub store_backend: StoreBackend,
    /// SQLite file; defaults to `<data_dir>/keysafe/keysafe.db`.
    pub database_path: Option<PathBuf>,
    /// Salt label for passphrase-derived keys.
    pub key_salt: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            use_log: true,
            cache_prefix: "secrets_".to_string(),
            cache_ttl: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            store_backend: StoreBackend::Sqlite,
            database_path: None,
            key_salt: "keysafe".to_string(),
        }
    }
}

impl SecretsConfig {
    /// Resolve the full configuration from defaults, file and environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply `KEYSAFE_*` overrides. `lookup` abstracts the environment for tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_USE_CACHE) {
            self.use_cache = parse_bool(ENV_USE_CACHE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_USE_LOG) {
            self.use_log = parse_bool(ENV_USE_LOG, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_PREFIX) {
            self.cache_prefix = raw;
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            self.cache_ttl = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_CACHE_TTL.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_cache && self.cache_ttl == 0 {
            return Err(ConfigError::Invalid(
                "cache_ttl must be greater than zero when use_cache is enabled".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.key_salt.is_empty() {
            return Err(ConfigError::Invalid("key_salt must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// The configured database path, or the per-user default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join("keysafe.db"))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Default directory for Keysafe data files.
pub fn data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keysafe")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keysafe")
        .join("config.toml")
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SecretsConfig::default();
        assert!(config.use_cache);
        assert!(config.use_log);
        assert_eq!(config.cache_prefix, "secrets_");
        assert_eq!(config.cache_ttl(), Duration::from_secs(6 * 60 * 60));
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "use_cache = false\ncache_prefix = \"app_\"\n").unwrap();

        let config = SecretsConfig::from_file(&path).unwrap();
        assert!(!config.use_cache);
        assert_eq!(config.cache_prefix, "app_");
        assert!(config.use_log);
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn test_store_backend_parses_lowercase() {
        let config: SecretsConfig = toml::from_str("store_backend = \"memory\"").unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "use_cache = \"sometimes\"").unwrap();

        assert!(matches!(
            SecretsConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SecretsConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = SecretsConfig::default();
        config
            .apply_env_overrides(env(&[
                (ENV_USE_CACHE, "off"),
                (ENV_USE_LOG, "0"),
                (ENV_CACHE_PREFIX, "ci_"),
                (ENV_CACHE_TTL, "60"),
                (ENV_DATABASE, "/tmp/ci.db"),
            ]))
            .unwrap();

        assert!(!config.use_cache);
        assert!(!config.use_log);
        assert_eq!(config.cache_prefix, "ci_");
        assert_eq!(config.cache_ttl, 60);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/ci.db"));
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        let mut config = SecretsConfig::default();
        assert!(matches!(
            config.apply_env_overrides(env(&[(ENV_USE_CACHE, "maybe")])),
            Err(ConfigError::InvalidEnv { .. })
        ));
        assert!(matches!(
            config.apply_env_overrides(env(&[(ENV_CACHE_TTL, "-5")])),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn test_zero_ttl_only_invalid_with_cache_enabled() {
        let mut config = SecretsConfig {
            cache_ttl: 0,
            ..SecretsConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.use_cache = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SecretsConfig {
            cache_prefix: "svc_".to_string(),
            store_backend: StoreBackend::Memory,
            ..SecretsConfig::default()
        };
        let rendered = config.to_toml_string().unwrap();
        let parsed: SecretsConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
