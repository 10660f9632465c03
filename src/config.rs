use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock, PoisonError},
};

use anyhow::Context;
use log::{debug, error, info};
use serde::Deserialize;

/// Location of the relay settings, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "src/main/resources/maildetails.json";

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MailConfig {
    /// User to authenticate to the relay as
    pub username: String,

    pub password: String,

    /// SMTP relay to connect to
    pub hostname: String,

    /// Port on the relay that accepts STARTTLS connections
    #[serde(rename = "portnmbr")]
    pub port: u16,
}

impl MailConfig {
    pub fn load_from(config_path: &Path) -> anyhow::Result<MailConfig> {
        debug!("Loading mail config from: {config_path:?}");
        let file_contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read contents of {config_path:?}"))?;
        let result = serde_json::from_str(&file_contents)
            .with_context(|| format!("Failed to parse contents of {config_path:?}"))?;
        Ok(result)
    }
}

impl Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .finish()
    }
}

/// Loads the [`MailConfig`] on first use and keeps it for the rest of the process.
///
/// The config is either absent or fully loaded. Once loaded it is never
/// replaced, and failed loads leave the loader ready to try again.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: PathBuf,
    config: OnceLock<MailConfig>,
    init_guard: Mutex<()>,
}

impl ConfigLoader {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            config: OnceLock::new(),
            init_guard: Mutex::new(()),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn is_loaded(&self) -> bool {
        self.config.get().is_some()
    }

    /// Returns the cached config, reading the file only if nothing is cached yet
    pub fn load(&self) -> anyhow::Result<&MailConfig> {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }

        // Only one caller reads the file at a time, the rest wait and reuse its result
        let _guard = self
            .init_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = self.config.get() {
            return Ok(config);
        }

        let loaded = MailConfig::load_from(&self.config_path)
            .context("Failed to load mail configuration")?;
        info!(
            "Mail configuration loaded from {:?} for relay {}:{}",
            self.config_path, loaded.hostname, loaded.port
        );
        Ok(self.config.get_or_init(|| loaded))
    }

    /// Same as [`Self::load`] but failures are logged instead of returned
    pub fn ensure_loaded(&self) -> Option<&MailConfig> {
        match self.load() {
            Ok(config) => Some(config),
            Err(e) => {
                error!("{e:?}");
                None
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}
