use crate::catalogue::{Language, DEFAULT_SERVICE_URL};
use crate::error::{CoreError, Result};
use crate::listing::{
    PageSizes, DEFAULT_SCROLL_PAGE_SIZE, DEFAULT_SCROLL_THRESHOLD, DEFAULT_TABLE_PAGE_SIZE,
};
use crate::sync::LyricLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

const LOG_TARGET: &str = "seedwave::config";

/// Environment variable that overrides `service.base_url`
pub const API_URL_ENV: &str = "SEEDWAVE_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeedwaveConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout for catalogue calls. Song generation can be slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueConfig {
    #[serde(default = "default_table_page_size")]
    pub table_page_size: u32,
    #[serde(default = "default_scroll_page_size")]
    pub scroll_page_size: u32,
    /// Distance from the bottom (px) at which the next scroll page loads
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f64,
    #[serde(default = "default_like_filter_debounce_ms")]
    pub like_filter_debounce_ms: u64,
    #[serde(default)]
    pub default_language: Language,
}

const fn default_table_page_size() -> u32 {
    DEFAULT_TABLE_PAGE_SIZE
}

const fn default_scroll_page_size() -> u32 {
    DEFAULT_SCROLL_PAGE_SIZE
}

const fn default_scroll_threshold() -> f64 {
    DEFAULT_SCROLL_THRESHOLD
}

const fn default_like_filter_debounce_ms() -> u64 {
    500
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            table_page_size: default_table_page_size(),
            scroll_page_size: default_scroll_page_size(),
            scroll_threshold: default_scroll_threshold(),
            like_filter_debounce_ms: default_like_filter_debounce_ms(),
            default_language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsConfig {
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default = "default_container_height")]
    pub container_height: f64,
}

const fn default_line_height() -> f64 {
    32.0
}

const fn default_container_height() -> f64 {
    160.0
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            container_height: default_container_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file_enabled: bool,
}

impl SeedwaveConfig {
    /// Load config from the default location, writing a template on first run.
    ///
    /// Unlike a missing file, a file that exists but does not parse is an
    /// error. `SEEDWAVE_API_URL` overrides the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        let path = crate::paths::config_path();
        let mut config = Self::load_or_create_at(&path)?;
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from `path`, writing the template there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or parsed.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            info!(target: LOG_TARGET, "Wrote config template to {:?}", path);
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Parse an existing config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        info!(target: LOG_TARGET, "Loaded config from {:?}", path);
        Ok(config)
    }

    /// Replace the base URL with a non-empty override value.
    pub fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            info!(target: LOG_TARGET, "Using service URL from {}: {}", API_URL_ENV, url);
            self.service.base_url = url;
        }
    }

    /// Check values the types alone cannot rule out.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.catalogue.table_page_size == 0 || self.catalogue.scroll_page_size == 0 {
            return Err(invalid("catalogue page sizes must be at least 1"));
        }
        if !(self.catalogue.scroll_threshold.is_finite() && self.catalogue.scroll_threshold >= 0.0)
        {
            return Err(invalid("catalogue.scroll_threshold must be a non-negative number"));
        }
        if !(self.lyrics.line_height.is_finite() && self.lyrics.line_height > 0.0) {
            return Err(invalid("lyrics.line_height must be positive"));
        }
        if !(self.lyrics.container_height.is_finite() && self.lyrics.container_height >= 0.0) {
            return Err(invalid("lyrics.container_height must be a non-negative number"));
        }
        Ok(())
    }

    /// Parsed service base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] if `service.base_url` is not an
    /// absolute http(s) URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.service.base_url).map_err(|e| {
            invalid(format!("service.base_url {:?}: {e}", self.service.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "service.base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    #[must_use]
    pub const fn page_sizes(&self) -> PageSizes {
        PageSizes {
            table: self.catalogue.table_page_size,
            scroll: self.catalogue.scroll_page_size,
        }
    }

    #[must_use]
    pub const fn like_filter_debounce(&self) -> Duration {
        Duration::from_millis(self.catalogue.like_filter_debounce_ms)
    }

    #[must_use]
    pub const fn lyric_layout(&self) -> LyricLayout {
        LyricLayout::new(self.lyrics.container_height, self.lyrics.line_height)
    }

    /// Where the log file goes when `logging.file_enabled` is set.
    #[must_use]
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.logging
            .file_enabled
            .then(crate::paths::log_file_path)
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

const CONFIG_TEMPLATE: &str = r#"# Seedwave Configuration
# ~/.config/seedwave/config.toml

[service]
# Catalogue service; SEEDWAVE_API_URL overrides this
base_url = "http://localhost:5000"
timeout_secs = 120

[catalogue]
table_page_size = 10
scroll_page_size = 15
# Load the next scroll page within this many pixels of the bottom
scroll_threshold = 50.0
like_filter_debounce_ms = 500
# "en" or "ru"
default_language = "en"

[lyrics]
line_height = 32.0
container_height = 160.0

[logging]
# Also write logs to ~/.config/seedwave/seedwave.log
file_enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed: SeedwaveConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, SeedwaveConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: SeedwaveConfig = toml::from_str(
            r#"
            [catalogue]
            scroll_page_size = 30
            default_language = "ru"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.catalogue.scroll_page_size, 30);
        assert_eq!(parsed.catalogue.table_page_size, 10);
        assert_eq!(parsed.catalogue.default_language, Language::Ru);
        assert_eq!(parsed.service.base_url, "http://localhost:5000");
        assert_eq!(parsed.like_filter_debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_first_run_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seedwave").join("config.toml");

        let config = SeedwaveConfig::load_or_create_at(&path).unwrap();
        assert_eq!(config, SeedwaveConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);

        fs::write(&path, "[service]\nbase_url = \"https://music.example\"\n").unwrap();
        let config = SeedwaveConfig::load_or_create_at(&path).unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "https://music.example/");
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SeedwaveConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service\nbase_url = 1").unwrap();
        assert!(matches!(
            SeedwaveConfig::load_or_create_at(&path),
            Err(CoreError::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_api_url_override() {
        let mut config = SeedwaveConfig::default();
        config.apply_api_url_override(Some("  ".to_string()));
        assert_eq!(config.service.base_url, DEFAULT_SERVICE_URL);
        config.apply_api_url_override(None);
        assert_eq!(config.service.base_url, DEFAULT_SERVICE_URL);
        config.apply_api_url_override(Some("http://10.0.0.2:8080/api-proxy".to_string()));
        assert_eq!(config.service.base_url, "http://10.0.0.2:8080/api-proxy");
    }

    #[test]
    fn test_validate() {
        assert!(SeedwaveConfig::default().validate().is_ok());

        let mut config = SeedwaveConfig::default();
        config.service.base_url = "ftp://files.example".to_string();
        assert!(matches!(config.validate(), Err(CoreError::ConfigInvalid { .. })));

        let mut config = SeedwaveConfig::default();
        config.service.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = SeedwaveConfig::default();
        config.catalogue.table_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = SeedwaveConfig::default();
        config.lyrics.line_height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_settings() {
        let config = SeedwaveConfig::default();
        assert_eq!(
            config.page_sizes(),
            PageSizes {
                table: 10,
                scroll: 15
            }
        );
        assert_eq!(config.lyric_layout(), LyricLayout::new(160.0, 32.0));
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.log_file_path().is_none());
    }
}
