//! Configuration management for vessel-tally
//!
//! Config stored at: ~/.config/vessel-tally/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tally_infra::{GeminiOptions, DEFAULT_API_BASE};
use tally_types::{ConfigError, OutputFormat, Result};
use tally_vision::{ClientOptions, DEFAULT_JPEG_QUALITY};

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider API key (prefer the environment secret)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider REST base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Pinned candidate models, tried in order (empty = discover)
    #[serde(default)]
    pub models: Vec<String>,

    /// Candidates used when discovery is unavailable (empty = built-in)
    #[serde(default)]
    pub fallback_models: Vec<String>,

    /// How long a discovered candidate list is reused
    #[serde(default = "default_discovery_ttl_secs")]
    pub discovery_ttl_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// JPEG quality for normalized images (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Default output format (table, json, tsv)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Append the granular recon columns to exports
    #[serde(default)]
    pub include_recon: bool,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_discovery_ttl_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            models: Vec::new(),
            fallback_models: Vec::new(),
            discovery_ttl_secs: default_discovery_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            jpeg_quality: default_jpeg_quality(),
            output_format: default_output_format(),
            include_recon: false,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("vessel-tally");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a file, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Credential lookup: explicit value, then the environment, then the file
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        self.resolve_api_key_with(explicit, std::env::var(API_KEY_ENV).ok())
    }

    pub fn resolve_api_key_with(
        &self,
        explicit: Option<&str>,
        from_env: Option<String>,
    ) -> Result<String> {
        explicit
            .map(str::to_string)
            .or(from_env)
            .or_else(|| self.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey.into())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_pinned_models(self.models.clone())
            .with_fallback_models(self.fallback_models.clone())
            .with_discovery_ttl(Duration::from_secs(self.discovery_ttl_secs))
    }

    pub fn gemini_options(&self) -> GeminiOptions {
        GeminiOptions {
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", visible)
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Vessel Tally Configuration")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(
            f,
            "API key:        {}",
            self.api_key
                .as_deref()
                .map(mask_key)
                .unwrap_or_else(|| format!("(not set, uses {})", API_KEY_ENV))
        )?;
        writeln!(f, "API base:       {}", self.api_base)?;
        writeln!(
            f,
            "Models:         {}",
            if self.models.is_empty() {
                "(discover)".to_string()
            } else {
                self.models.join(", ")
            }
        )?;
        writeln!(
            f,
            "Fallback:       {}",
            if self.fallback_models.is_empty() {
                "(built-in)".to_string()
            } else {
                self.fallback_models.join(", ")
            }
        )?;
        writeln!(f, "Discovery TTL:  {} s", self.discovery_ttl_secs)?;
        writeln!(f, "Timeout:        {} s", self.request_timeout_secs)?;
        writeln!(f, "JPEG quality:   {}", self.jpeg_quality)?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Recon columns:  {}", self.include_recon)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::Error;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            models: vec!["gemini-1.5-flash".into()],
            jpeg_quality: 75,
            include_recon: true,
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "jpeg_quality = 60\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.jpeg_quality, 60);
        assert_eq!(config.discovery_ttl_secs, 300);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "jpeg_quality = \"high\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_api_key_precedence() {
        let config = Config {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_api_key_with(Some("cli"), Some("env".into())).unwrap(),
            "cli"
        );
        assert_eq!(config.resolve_api_key_with(None, Some("env".into())).unwrap(), "env");
        assert_eq!(config.resolve_api_key_with(None, None).unwrap(), "from-file");

        let empty = Config::default();
        assert!(matches!(
            empty.resolve_api_key_with(Some("  "), None),
            Err(Error::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn test_display_masks_key() {
        let config = Config {
            api_key: Some("AIzaSySECRET1234".into()),
            ..Default::default()
        };
        let shown = config.to_string();
        assert!(shown.contains("****1234"));
        assert!(!shown.contains("SECRET"));
    }
}
