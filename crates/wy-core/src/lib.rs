//! wy Core - model and pipeline stages of the content-quality panel
//!
//! Provides the pieces one synchronization cycle is made of:
//! - content snapshots, assessment results and result sets
//! - the host page and render target seams, plus an in-memory page
//! - the debouncer that coalesces edit bursts
//! - the lifecycle-checked analysis client
//! - the result renderer and its classification policy
//!
//! # Example
//!
//! ```rust
//! use wy_core::{AssessmentResult, CategorizedResultSet, Category, Outcome, ResultRenderer, StaticPage};
//!
//! let page = StaticPage::new("https://cms.example.com".parse().unwrap(), "/admin/pages/3/edit/")
//!     .with_region("yoast_results_readability")
//!     .with_region("yoast_results_seo");
//!
//! let results = CategorizedResultSet::new()
//!     .with(Category::Readability, vec![AssessmentResult::new("a", 10, "Good")]);
//! ResultRenderer::default().sync(&page, &results);
//!
//! assert_eq!(page.texts("yoast_results_readability", Outcome::Success), vec!["Good"]);
//! ```

#![warn(unreachable_pub)]

pub mod analysis;
pub mod debounce;
pub mod error;
pub mod memory;
pub mod page;
pub mod preview;
pub mod render;
pub mod types;

// Re-exports for convenience
pub use analysis::{AnalysisClient, AnalysisEngine};
pub use debounce::Debouncer;
pub use error::{ErrorKind, PanelError, ProtocolStep};
pub use memory::{PageDescription, RegionContent, StaticPage};
pub use page::{
    ElementSnapshot, FormSnapshot, HostPage, Icon, ListItem, Outcome, PreviewControl, RenderTarget,
};
pub use preview::PreviewSource;
pub use render::{classify, RegionIds, RenderStats, ResultRenderer, DENYLIST, PASS_THRESHOLD};
pub use types::{
    AssessmentResult, CategorizedResultSet, Category, ContentSnapshot, EngineConfig, LogLevel,
    DEFAULT_TITLE_WIDTH,
};
pub use url::Url;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
