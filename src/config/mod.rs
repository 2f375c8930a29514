use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::session::TrackFilter;
use crate::SubexError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript service settings
    pub service: ServiceConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header, decides the language of track display names
    pub accept_language: String,

    /// Optional request timeout; by default requests wait for the service to answer or fail
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that saved subtitle files are written to
    pub output_dir: Option<PathBuf>,

    /// Default output format
    pub default_format: String,

    /// Which tracks are offered for selection
    pub track_filter: TrackFilter,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            accept_language: "en-US".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_format: "text".to_string(),
            track_filter: TrackFilter::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when none exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            tracing::debug!("Loading configuration from {}", config_path.display());
            Self::load_from(&config_path)
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            Ok(Self::default())
        }
    }

    /// Read and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("subex").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.service.user_agent.trim().is_empty() {
            return Err(SubexError::ConfigError("service.user_agent must not be empty".to_string()).into());
        }

        if self.service.timeout_secs == Some(0) {
            return Err(SubexError::ConfigError("service.timeout_secs must be positive".to_string()).into());
        }

        self.output_format()?;

        if !self.app.track_filter.admits_anything() {
            return Err(SubexError::ConfigError(
                "app.track_filter excludes both manual and auto-generated tracks".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Default output format as the CLI enum
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_name(&self.app.default_format).ok_or_else(|| {
            SubexError::ConfigError(format!(
                "unknown output format '{}'",
                self.app.default_format
            ))
            .into()
        })
    }

    /// Directory for saved subtitle files
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.app.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Could not determine current directory"),
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  User Agent: {}", self.service.user_agent);
        println!("  Accept-Language: {}", self.service.accept_language);
        match self.service.timeout_secs {
            Some(secs) => println!("  Request Timeout: {}s", secs),
            None => println!("  Request Timeout: none"),
        }
        if let Some(dir) = &self.app.output_dir {
            println!("  Output Directory: {}", dir.display());
        }
        println!("  Default Format: {}", self.app.default_format);
        println!("  Track Filter: {}", self.app.track_filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(matches!(config.output_format().unwrap(), OutputFormat::Text));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.service.timeout_secs = Some(30);
        config.app.default_format = "srt".to_string();
        config.app.track_filter.include_generated = false;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "app:\n  default_format: vtt\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.app.default_format, "vtt");
        assert_eq!(loaded.service, ServiceConfig::default());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let mut config = Config::default();
        config.app.default_format = "docx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_filter_that_admits_nothing() {
        let mut config = Config::default();
        config.app.track_filter.include_generated = false;
        config.app.track_filter.include_manual = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
