//! Core types for the panel pipeline
//!
//! Defines the values that flow through one cycle:
//! - the content snapshot handed to the analysis engine
//! - assessment results and their categories
//! - the engine initialization config

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Title width assumed when the real rendered width is unknown
pub const DEFAULT_TITLE_WIDTH: u32 = 500;

/// Rendered preview plus the metadata fields of one cycle
///
/// Built fresh for every cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    html: String,
    keyword: String,
    title: String,
    description: String,
    slug: String,
    title_width: u32,
}

impl ContentSnapshot {
    /// Create a snapshot of rendered HTML with empty metadata
    #[inline]
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            keyword: String::new(),
            title: String::new(),
            description: String::new(),
            slug: String::new(),
            title_width: DEFAULT_TITLE_WIDTH,
        }
    }

    /// With focus keyword
    #[inline]
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// With title text
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With description text
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With slug text
    #[inline]
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// With assumed title display width in pixels
    #[inline]
    #[must_use]
    pub fn with_title_width(mut self, width: u32) -> Self {
        self.title_width = width;
        self
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title_width(&self) -> u32 {
        self.title_width
    }
}

/// One scored feedback item produced by the analysis engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Engine identifier of the check
    #[serde(alias = "_identifier")]
    pub identifier: String,
    /// Score on the engine's 0-10 scale, 0 meaning not applicable
    pub score: i32,
    /// Human-readable message
    pub text: String,
}

impl AssessmentResult {
    /// Create new assessment result
    #[inline]
    #[must_use]
    pub fn new(identifier: impl Into<String>, score: i32, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            score,
            text: text.into(),
        }
    }
}

/// Feedback category rendered by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Readability of the content
    Readability,
    /// Discoverability (search optimisation) of the content
    #[serde(rename = "seo", alias = "discoverability")]
    Discoverability,
}

impl Category {
    /// Every category, in render order
    pub const ALL: [Category; 2] = [Category::Readability, Category::Discoverability];

    /// Wire name of the category
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Readability => "readability",
            Category::Discoverability => "seo",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All assessment results of one cycle, grouped by category
///
/// Replaces the previous cycle's set wholesale; there is no merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorizedResultSet {
    categories: BTreeMap<Category, Vec<AssessmentResult>>,
}

impl CategorizedResultSet {
    /// Create empty result set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With the ordered results of a category
    #[inline]
    #[must_use]
    pub fn with(mut self, category: Category, results: Vec<AssessmentResult>) -> Self {
        self.categories.insert(category, results);
        self
    }

    /// Results of a category, empty when the engine returned none
    #[must_use]
    pub fn results(&self, category: Category) -> &[AssessmentResult] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of results across categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Minimum severity the analysis engine logs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

/// Analysis engine initialization config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Content locale, e.g. `en_US`
    pub locale: String,
    /// Whether readability analysis runs
    pub content_analysis_active: bool,
    /// Whether keyword analysis runs
    pub keyword_analysis_active: bool,
    /// Minimum engine log severity
    pub log_level: LogLevel,
}

impl EngineConfig {
    /// Create config for a locale with both analyses active
    #[inline]
    #[must_use]
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            content_analysis_active: true,
            keyword_analysis_active: true,
            log_level: LogLevel::Error,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("en_US")
    }
}
