//! Defines the top level configuration for the batch attestor.
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::Address;
use thiserror::Error;
use tracing::Level;
use url::Url;

use crate::batch::DEFAULT_RESOLVE_CONCURRENCY;

/// Directory holding the local keystore.
pub const EAS_BATCH_DIR: &str = ".eas-batch";

/// File name of the keystore inside [`EAS_BATCH_DIR`].
pub const DEFAULT_KEYSTORE_NAME: &str = "keystore";

/// Environment variable read for the keystore password by default.
pub const DEFAULT_PASSWORD_ENV: &str = "EAS_BATCH_KEYSTORE_PASSWORD";

pub use eas_batch_solidity_types::ens::ENS_REGISTRY_ADDRESS as DEFAULT_ENS_REGISTRY;

/// `~/.eas-batch`, falling back to the working directory without a home.
#[must_use]
pub fn eas_batch_dir() -> PathBuf {
    env::home_dir().map_or_else(|| PathBuf::from(EAS_BATCH_DIR), |home| home.join(EAS_BATCH_DIR))
}

/// The top level configuration for the batch attestor.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct BatchAttestorConfig {
    /// The log level, `info` when missing or unknown.
    #[serde(default)]
    pub log_level: String,
    pub network: NetworkConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    /// Enables Safe multisig proposals when present.
    pub safe: Option<SafeConfig>,
    pub analytics: Option<AnalyticsConfig>,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl BatchAttestorConfig {
    /// Load a `BatchAttestorConfig` from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        let cfg: Self = toml::from_str(&contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.resolve_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch.resolve_concurrency must be at least 1".to_string(),
            ));
        }
        if self.network.eas_address == Address::ZERO {
            return Err(ConfigError::Invalid(
                "network.eas_address must not be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the configured log level.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: Url,
    pub eas_address: Address,
    pub schema_registry_address: Address,
    #[serde(default = "default_ens_registry")]
    pub ens_registry_address: Address,
    /// Resolve non-literal recipients as ENS names.
    #[serde(default = "default_true")]
    pub resolve_ens: bool,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct SignerConfig {
    #[serde(default = "default_keystore_path")]
    pub keystore_path: PathBuf,
    /// Name of the environment variable holding the keystore password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            keystore_path: default_keystore_path(),
            password_env: default_password_env(),
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct SafeConfig {
    pub address: Address,
    pub service_url: Url,
    #[serde(default = "default_origin")]
    pub origin: String,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct AnalyticsConfig {
    pub endpoint: Url,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub ref_uid: bool,
    #[serde(default)]
    pub has_header: bool,
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            ref_uid: false,
            has_header: false,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }
}

/// Errors that can occur loading the batch attestor config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

const fn default_true() -> bool {
    true
}

const fn default_ens_registry() -> Address {
    DEFAULT_ENS_REGISTRY
}

const fn default_resolve_concurrency() -> usize {
    DEFAULT_RESOLVE_CONCURRENCY
}

fn default_keystore_path() -> PathBuf {
    eas_batch_dir().join(DEFAULT_KEYSTORE_NAME)
}

fn default_password_env() -> String {
    DEFAULT_PASSWORD_ENV.to_string()
}

fn default_origin() -> String {
    crate::builder::DEFAULT_PROPOSAL_ORIGIN.to_string()
}
