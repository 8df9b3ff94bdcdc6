//! Panel configuration
//!
//! Every element id and protocol name the panel depends on lives here so a
//! host with a different layout only needs a config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wy_core::{EngineConfig, LogLevel, PanelError, RegionIds, DEFAULT_TITLE_WIDTH};
use wy_preview::FetcherSettings;

/// Environment variable overriding the content locale
pub const LOCALE_ENV: &str = "WY_LOCALE";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid panel config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for PanelError {
    fn from(err: ConfigError) -> Self {
        PanelError::Config(err.to_string())
    }
}

/// Ids of the panel's field controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldIds {
    /// Focus keyword input, read directly
    pub keyword: String,
    /// Controls naming the underlying form input in `data-field`
    pub title: String,
    pub description: String,
    pub slug: String,
}

impl Default for FieldIds {
    fn default() -> Self {
        Self {
            keyword: "yoast_keywords".to_string(),
            title: "yoast_title".to_string(),
            description: "yoast_search_description".to_string(),
            slug: "yoast_slug".to_string(),
        }
    }
}

/// Panel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Content locale passed to the analysis engine
    pub locale: String,
    /// Quiescence interval in milliseconds
    pub debounce_ms: u64,
    /// Assumed title display width in pixels
    pub title_width: u32,
    /// Id of the host edit form
    pub form_id: String,
    /// Id of the panel region
    pub panel_id: String,
    pub fields: FieldIds,
    pub regions: RegionIds,
    pub csrf_cookie: String,
    pub csrf_header: String,
    /// Tab controls whose `aria-controls` contains this marker refresh the panel
    pub tab_marker: String,
    pub content_analysis_active: bool,
    pub keyword_analysis_active: bool,
    pub log_level: LogLevel,
    /// Preview request timeout in seconds
    pub request_timeout_secs: u64,
}

impl PanelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With locale
    #[inline]
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// With quiescence interval
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, interval: Duration) -> Self {
        self.debounce_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_title_width(mut self, width: u32) -> Self {
        self.title_width = width;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_panel_id(mut self, panel_id: impl Into<String>) -> Self {
        self.panel_id = panel_id.into();
        self
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?.with_env_overrides();
        tracing::debug!(path = %path.display(), locale = %config.locale, "loaded panel config");
        Ok(config)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(locale) = lookup(LOCALE_ENV).filter(|v| !v.trim().is_empty()) {
            self.locale = locale.trim().to_string();
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "debounce_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.locale.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "locale",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Engine initialization config
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            locale: self.locale.clone(),
            content_analysis_active: self.content_analysis_active,
            keyword_analysis_active: self.keyword_analysis_active,
            log_level: self.log_level,
        }
    }

    /// Settings for the HTTP preview fetcher
    #[must_use]
    pub fn fetcher_settings(&self) -> FetcherSettings {
        FetcherSettings {
            form_id: self.form_id.clone(),
            csrf_cookie: self.csrf_cookie.clone(),
            csrf_header: self.csrf_header.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        let fetcher = FetcherSettings::default();
        Self {
            locale: "en_US".to_string(),
            debounce_ms: 300,
            title_width: DEFAULT_TITLE_WIDTH,
            form_id: fetcher.form_id,
            panel_id: "yoast_panel".to_string(),
            fields: FieldIds::default(),
            regions: RegionIds::default(),
            csrf_cookie: fetcher.csrf_cookie,
            csrf_header: fetcher.csrf_header,
            tab_marker: "yoast".to_string(),
            content_analysis_active: true,
            keyword_analysis_active: true,
            log_level: LogLevel::Error,
            request_timeout_secs: fetcher.timeout_secs,
        }
    }
}

/// Where the host serves the panel's static assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetContext {
    /// Package version; empty in development checkouts
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub static_url: String,
}

fn default_locale() -> String {
    "en_US".to_string()
}

impl AssetContext {
    #[must_use]
    pub fn new(version: impl Into<String>, static_url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            locale: default_locale(),
            static_url: static_url.into(),
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Path of the analysis worker script; the version is part of the file name
    #[must_use]
    pub fn worker_path(&self) -> String {
        format!(
            "{}wagtailyoast/dist/js/yoastworker{}.js",
            self.static_url, self.version
        )
    }

    /// Cache-busting query suffix, empty for unversioned builds
    #[must_use]
    pub fn version_suffix(&self) -> String {
        if self.version.is_empty() {
            String::new()
        } else {
            format!("?v={}", self.version)
        }
    }

    /// Versioned URL path of a static asset
    #[must_use]
    pub fn asset_path(&self, file: &str) -> String {
        format!("{}{}{}", self.static_url, file, self.version_suffix())
    }
}
