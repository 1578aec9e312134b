use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::crypto::rsa_generator::MIN_KEY_BITS;
use crate::adapters::kube::csr_gateway::{
    DEFAULT_EXPIRATION_SECONDS, DEFAULT_SIGNER_NAME, MIN_EXPIRATION_SECONDS,
};
use crate::core::errors::{KonfigError, Result};
use crate::core::services::bundle_assembler::DEFAULT_NAMESPACE;

/// Top-level konfig configuration, read from `<config dir>/konfig/config.toml`.
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub cert: CertSection,
}

/// The `[cert]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CertSection {
    pub signer_name: String,
    pub expiration_seconds: i32,
    pub key_bits: usize,
    pub namespace: String,
    pub wait_timeout_secs: u64,
    pub poll_interval_millis: u64,
}

impl Default for CertSection {
    fn default() -> Self {
        Self {
            signer_name: DEFAULT_SIGNER_NAME.into(),
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            key_bits: MIN_KEY_BITS,
            namespace: DEFAULT_NAMESPACE.into(),
            wait_timeout_secs: 30,
            poll_interval_millis: 500,
        }
    }
}

impl CertSection {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    /// Reject values the API server or the key generator would refuse
    /// anyway, before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.signer_name.trim().is_empty() {
            return Err(invalid("cert.signer_name must not be empty"));
        }
        if self.expiration_seconds < MIN_EXPIRATION_SECONDS {
            return Err(invalid(format!(
                "cert.expiration_seconds must be at least {MIN_EXPIRATION_SECONDS}, got {}",
                self.expiration_seconds
            )));
        }
        if self.key_bits < MIN_KEY_BITS {
            return Err(invalid(format!(
                "cert.key_bits must be at least {MIN_KEY_BITS}, got {}",
                self.key_bits
            )));
        }
        if self.namespace.trim().is_empty() {
            return Err(invalid("cert.namespace must not be empty"));
        }
        if self.poll_interval_millis == 0 {
            return Err(invalid("cert.poll_interval_millis must be greater than 0"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and silently skipped if absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            if required {
                return Err(invalid(format!(
                    "{} not found",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config = Self::parse(&content).map_err(|e| match e {
            KonfigError::InvalidConfig { detail } => invalid(format!(
                "{}: {detail}",
                config_path.display()
            )),
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| invalid(format!("failed to parse config: {e}")))?;
        config.cert.validate()?;
        Ok(config)
    }
}

/// `~/.config/konfig/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("konfig").join("config.toml"))
}

fn invalid(detail: impl Into<String>) -> KonfigError {
    KonfigError::InvalidConfig {
        detail: detail.into(),
    }
}
