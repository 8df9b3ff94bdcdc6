//! wy Preview - rendered preview retrieval
//!
//! Finds the live-preview endpoint of the page being edited and runs the
//! two-step preview protocol against it:
//! - [`PreviewResolver`]: ordered, pure resolution strategies
//! - [`PreviewFetcher`]: POST the form state, then GET the rendered HTML
//!
//! # Example
//!
//! ```rust,ignore
//! use wy_core::PreviewSource;
//! use wy_preview::{FetcherSettings, PreviewFetcher};
//!
//! # async fn example(page: &dyn wy_core::HostPage) -> Result<(), wy_core::PanelError> {
//! let fetcher = PreviewFetcher::new(FetcherSettings::default())?;
//! let html = fetcher.fetch(page).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cookies;
pub mod fetcher;
pub mod resolver;

pub use cookies::read_cookie;
pub use fetcher::{FetcherSettings, PreviewFetcher};
pub use resolver::{
    from_form_attributes, from_location_path, from_preview_control, infer_preview_path,
    normalize, PreviewResolver, ResolverInput, Strategy, FORM_ATTRIBUTES,
};
