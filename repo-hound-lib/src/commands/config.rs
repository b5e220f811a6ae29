use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "hound.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Search phrases, in the order they are searched
    pub terms: Vec<String>,

    /// Substrings that exclude a repository when found in its URL
    pub exclude_keywords: Vec<String>,

    /// File name extensions of candidate files and assets, with the leading dot
    pub extensions: Vec<String>,

    /// Directory names that are never entered
    pub skip_dirs: Vec<String>,

    /// Search hits requested per term and provider
    pub max_results: u8,

    /// Largest repository file that is fetched, in bytes
    pub max_file_size: u64,

    /// Largest release asset that is fetched, in bytes
    pub max_asset_size: u64,

    /// Number of most recent releases inspected per repository
    pub max_releases: usize,

    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub file_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub asset_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub fetch_pause: Duration,

    #[serde(with = "humantime_serde")]
    pub repository_pause: Duration,

    #[serde(with = "humantime_serde")]
    pub term_pause: Duration,
}

impl Config {
    /// The built-in configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded defaults are malformed
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG_TOML).into_app_err("parsing the built-in configuration")
    }

    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `hound.toml` in `base_dir` is used if present. Settings missing
    /// from the file keep their built-in values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repo-hound configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Self::builtin();
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-hound configuration file '{path}'")),
            }
        };

        let config = Self::parse(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Parse TOML text, filling missing settings from the built-in defaults
    fn parse(text: &str) -> core::result::Result<Self, toml::de::Error> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let overrides: toml::Table = toml::from_str(text)?;
        merged.extend(overrides);
        toml::Value::Table(merged).try_into()
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a list is empty or a value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.terms.is_empty() {
            return Err(app_err!("terms must contain at least one search phrase"));
        }

        if let Some(term) = self.terms.iter().find(|t| t.trim().is_empty()) {
            return Err(app_err!("terms must not contain blank entries, got '{term}'"));
        }

        if !(1..=100).contains(&self.max_results) {
            return Err(app_err!("max_results must be between 1 and 100, got {}", self.max_results));
        }

        if self.extensions.is_empty() {
            return Err(app_err!("extensions must contain at least one file extension"));
        }

        if let Some(ext) = self.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            return Err(app_err!("extensions must start with a dot followed by a name, got '{ext}'"));
        }

        if self.exclude_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(app_err!("exclude_keywords must not contain blank entries"));
        }

        if self.skip_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(app_err!("skip_dirs must not contain blank entries"));
        }

        Ok(())
    }
}
