//! Preview seam
//!
//! A [`PreviewSource`] turns the current state of the host page into the
//! rendered HTML of the page being edited. The HTTP implementation lives in
//! `wy-preview`.

use crate::error::PanelError;
use crate::page::HostPage;
use async_trait::async_trait;

/// Source of rendered preview HTML
#[async_trait]
pub trait PreviewSource: Send + Sync {
    /// Render the page's current form state
    ///
    /// # Errors
    /// - `HostFormMissing` if the edit form is absent
    /// - `PreviewEndpointUnresolved` if no endpoint can be found
    /// - `NetworkFailure` if either protocol step fails
    async fn fetch(&self, page: &dyn HostPage) -> Result<String, PanelError>;
}
