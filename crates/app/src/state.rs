use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::crypto::DEFAULT_KEY_BITS;

pub const APP_NAME: &str = "postcrypt";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default secret name, or key file path in local mode
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Namespace of the default secret
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Write decrypted values as text rather than base64
    #[serde(default)]
    pub plain: bool,
    /// Modulus size for `init`
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

fn default_secret() -> String {
    APP_NAME.to_string()
}

fn default_namespace() -> String {
    APP_NAME.to_string()
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            namespace: default_namespace(),
            plain: false,
            key_bits: default_key_bits(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path the config was (or would have been) read from
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Default config path, ~/.postcrypt/config.toml
    pub fn default_config_path() -> Result<PathBuf, StateError> {
        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let explicit = custom_path.is_some();
        let config_path = match custom_path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            if explicit {
                return Err(StateError::MissingFile(config_path.display().to_string()));
            }
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self {
                config_path,
                config: AppConfig::default(),
            });
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        tracing::debug!(path = %config_path.display(), "loaded config");

        Ok(Self {
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("config file not found: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppState::load(Some(dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, StateError::MissingFile(_)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "namespace = \"kube-system\"\nplain = true\n").unwrap();

        let state = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(state.config_path, path);
        assert_eq!(
            state.config,
            AppConfig {
                namespace: "kube-system".to_string(),
                plain: true,
                ..AppConfig::default()
            }
        );
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "key_bits = \"many\"\n").unwrap();
        assert!(matches!(
            AppState::load(Some(path)),
            Err(StateError::TomlDe(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.secret, "postcrypt");
        assert_eq!(config.namespace, "postcrypt");
        assert_eq!(config.key_bits, 4096);
        assert!(!config.plain);
    }
}
