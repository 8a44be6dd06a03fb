//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Main configuration manager
///
/// Resolves file paths, loads and saves the config file, and applies
/// environment overrides.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// The default directory follows the platform conventions:
    /// - Linux: `~/.config/hearlearn/`
    /// - macOS: `~/Library/Application Support/hearlearn/`
    /// - Windows: `%APPDATA%\hearlearn\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let config_path = config_dir.join("config.toml");
        let persistence = ConfigPersistence::new(config_path);

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "hearlearn")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolves the data directory, anchoring relative paths at the config dir
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        if config.app.data_dir.is_absolute() {
            config.app.data_dir.clone()
        } else {
            self.config_dir.join(&config.app.data_dir)
        }
    }

    /// Resolves the cached document directory, anchoring relative paths at the data dir
    pub fn documents_dir(&self, config: &Config) -> PathBuf {
        if config.library.documents_dir.is_absolute() {
            config.library.documents_dir.clone()
        } else {
            self.data_dir(config).join(&config.library.documents_dir)
        }
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    ///
    /// Errors are logged but the function always returns a valid config.
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Saves the configuration to file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Updates the configuration using a closure
    ///
    /// ```rust,no_run
    /// # use hearlearn_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.remote.page_timeout_secs = 90;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Resets the configuration to defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current configuration file
    ///
    /// Returns all validation errors found, or an empty list if valid.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config (or defaults) and applies environment overrides
    ///
    /// Recognised variables:
    /// - `HEARLEARN_REMOTE_BASE_URL`
    /// - `HEARLEARN_REMOTE_PAGE_TIMEOUT_SECS`
    /// - `HEARLEARN_APP_DATA_DIR`
    /// - `HEARLEARN_APP_LOG_LEVEL`
    pub fn load_with_env_overrides(&self) -> Config {
        let mut config = self.load_or_default();
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        config
    }
}

/// Applies overrides looked up through `lookup`; unparsable values are ignored
fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("HEARLEARN_REMOTE_BASE_URL") {
        config.remote.base_url = url;
    }

    if let Some(secs) = lookup("HEARLEARN_REMOTE_PAGE_TIMEOUT_SECS") {
        match secs.parse::<u64>() {
            Ok(s) => config.remote.page_timeout_secs = s,
            Err(_) => log::warn!("Ignoring invalid page timeout override '{}'", secs),
        }
    }

    if let Some(dir) = lookup("HEARLEARN_APP_DATA_DIR") {
        config.app.data_dir = PathBuf::from(dir);
    }

    if let Some(level) = lookup("HEARLEARN_APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(l) => config.app.log_level = l,
            Err(e) => log::warn!("Ignoring log level override: {}", e),
        }
    }
}
