//! Configuration management for the daybook application.
//!
//! Two layers of configuration exist:
//!
//! - [`Config`]: process configuration from environment variables, resolved once
//!   at startup (where data lives, which API endpoint and model to use).
//! - [`Settings`]: user settings persisted in the blob store (API key, analysis
//!   thresholds, diagnostic mode), changed through the `key` and `settings`
//!   commands.
//!
//! # Environment Variables
//!
//! - `DAYBOOK_DIR`: Path to the data directory (defaults to ~/.daybook)
//! - `DAYBOOK_API_BASE`: Base URL of the OpenAI-compatible API
//! - `DAYBOOK_MODEL`: Chat model used for analysis and suggestions
//! - `HOME`: Used for expanding the default data directory path

use crate::constants::{
    API_KEY_MASK_PREFIX_LEN, DEFAULT_API_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_DATA_SUBDIR,
    ENV_VAR_DAYBOOK_API_BASE, ENV_VAR_DAYBOOK_DIR, ENV_VAR_DAYBOOK_MODEL, ENV_VAR_HOME,
    KEY_API_KEY, KEY_TEST_MODE,
};
use crate::errors::{AppError, AppResult};
use crate::scheduler::AnalysisConfig;
use crate::storage::BlobStore;
use chrono::Duration;
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Process configuration for the daybook application.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use daybook::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     data_dir: PathBuf::from("/path/to/data"),
///     api_base: "https://api.openai.com".to_string(),
///     model: "gpt-4o".to_string(),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the blob store.
    pub data_dir: PathBuf,
    /// Base URL of the OpenAI-compatible API, without a trailing `/v1`.
    pub api_base: String,
    /// Chat model name.
    pub model: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &"[REDACTED_PATH]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(""),
            api_base: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// The data directory path is expanded with `shellexpand` to handle `~` and
    /// environment variable references.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if path expansion fails or the resulting
    /// configuration does not pass [`Config::validate`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use daybook::Config;
    ///
    /// match Config::load() {
    ///     Ok(config) => println!("Using model {}", config.model),
    ///     Err(err) => eprintln!("Failed to load config: {}", err),
    /// }
    /// ```
    pub fn load() -> AppResult<Self> {
        let data_dir_str = env::var(ENV_VAR_DAYBOOK_DIR).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DATA_SUBDIR)
        });

        let expanded_path = shellexpand::full(&data_dir_str)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;

        let api_base = env::var(ENV_VAR_DAYBOOK_API_BASE)
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let model = env::var(ENV_VAR_DAYBOOK_MODEL)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let config = Config {
            data_dir: PathBuf::from(expanded_path.into_owned()),
            api_base,
            model,
        };
        config.validate()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` with one of the following messages:
    /// - "Data directory path is empty"
    /// - "Data directory must be an absolute path"
    /// - "API base URL must start with http:// or https://"
    ///
    /// # Examples
    ///
    /// ```
    /// use daybook::Config;
    /// use std::path::PathBuf;
    ///
    /// let config = Config {
    ///     data_dir: PathBuf::from("relative/path"),
    ///     ..Config::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> AppResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        if !self.data_dir.is_absolute() {
            return Err(AppError::Config(
                "Data directory must be an absolute path".to_string(),
            ));
        }

        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(AppError::Config(
                "API base URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}

/// User settings stored in the blob store.
#[derive(Clone, Default)]
pub struct Settings {
    api_key: Option<String>,
    /// Thresholds for automatic analysis.
    pub analysis: AnalysisConfig,
    /// Diagnostic mode; unlocks destructive maintenance commands.
    pub test_mode: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.masked_api_key())
            .field("analysis", &self.analysis)
            .field("test_mode", &self.test_mode)
            .finish()
    }
}

impl Settings {
    /// Reads every setting from the blob store.
    ///
    /// Unreadable values are logged and replaced by their defaults.
    pub fn load(blobs: &dyn BlobStore) -> Self {
        let api_key = match blobs.get(KEY_API_KEY) {
            Ok(value) => value.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            Err(e) => {
                warn!("Failed to read API key: {}", e);
                None
            }
        };

        let test_mode = match blobs.get(KEY_TEST_MODE) {
            Ok(Some(raw)) => raw.trim() == "true",
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read test mode flag: {}", e);
                false
            }
        };

        Settings {
            api_key,
            analysis: AnalysisConfig::load(blobs),
            test_mode,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key cut to its first characters, for display and export.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_api_key)
    }

    /// Stores a new API key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a blank key, or the storage error.
    pub fn set_api_key(&mut self, blobs: &dyn BlobStore, key: &str) -> AppResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::Config("API key cannot be empty".to_string()));
        }
        blobs.set(KEY_API_KEY, key)?;
        self.api_key = Some(key.to_string());
        info!("API key updated");
        Ok(())
    }

    /// Deletes the stored API key.
    pub fn clear_api_key(&mut self, blobs: &dyn BlobStore) -> AppResult<()> {
        blobs.remove(KEY_API_KEY)?;
        self.api_key = None;
        info!("API key removed");
        Ok(())
    }

    /// Updates one or both analysis thresholds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a threshold is zero, or the storage error.
    pub fn set_thresholds(
        &mut self,
        blobs: &dyn BlobStore,
        chars: Option<usize>,
        time_secs: Option<u64>,
    ) -> AppResult<()> {
        let mut analysis = self.analysis;
        if let Some(chars) = chars {
            analysis.char_threshold = chars;
        }
        if let Some(secs) = time_secs {
            analysis.time_threshold = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or_else(|| AppError::Config(format!("Time threshold too large: {}", secs)))?;
        }
        analysis.save(blobs)?;
        self.analysis = analysis;
        Ok(())
    }

    /// Turns diagnostic mode on or off.
    pub fn set_test_mode(&mut self, blobs: &dyn BlobStore, enabled: bool) -> AppResult<()> {
        blobs.set(KEY_TEST_MODE, if enabled { "true" } else { "false" })?;
        self.test_mode = enabled;
        Ok(())
    }
}

/// Keeps the first characters of a credential followed by `...`.
///
/// # Examples
///
/// ```
/// use daybook::config::mask_api_key;
///
/// assert_eq!(mask_api_key("sk-abcdefghijklmnop"), "sk-abcdefg...");
/// ```
pub fn mask_api_key(key: &str) -> String {
    let prefix: String = key.chars().take(API_KEY_MASK_PREFIX_LEN).collect();
    format!("{}...", prefix)
}
