//! Error types for the panel pipeline
//!
//! One taxonomy covers every stage of a cycle:
//! - host page lookups (form, panel region)
//! - preview endpoint resolution and the two-step preview protocol
//! - the analysis engine lifecycle

use std::fmt;

/// Step of the preview protocol that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolStep {
    /// POST of the current form state
    Submit,
    /// GET of the rendered preview
    Retrieve,
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolStep::Submit => f.write_str("submit"),
            ProtocolStep::Retrieve => f.write_str("retrieve"),
        }
    }
}

/// Main panel error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// The page-edit form is not present in the host page
    #[error("host form not found: #{form_id}")]
    HostFormMissing { form_id: String },

    /// No resolver strategy produced a usable preview endpoint
    #[error("preview endpoint not found")]
    PreviewEndpointUnresolved,

    /// A preview request failed at the transport level
    #[error("network failure during preview {step}: {message}")]
    NetworkFailure { step: ProtocolStep, message: String },

    /// `analyze` was called before `initialize` completed
    #[error("analysis engine used before initialization")]
    AnalysisNotInitialized,

    /// The panel host region is not present in the host page
    #[error("panel region not found: #{region_id}")]
    PanelRegionMissing { region_id: String },

    /// The analysis engine reported a failure
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`PanelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host page structure (form, panel region)
    HostPage,
    /// Preview resolution or transport
    Preview,
    /// Analysis engine lifecycle
    Analysis,
    /// Configuration
    Config,
}

impl PanelError {
    /// Build a network failure for a protocol step
    #[inline]
    pub fn network(step: ProtocolStep, message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            step,
            message: message.into(),
        }
    }

    /// Classification of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HostFormMissing { .. } | Self::PanelRegionMissing { .. } => ErrorKind::HostPage,
            Self::PreviewEndpointUnresolved | Self::NetworkFailure { .. } => ErrorKind::Preview,
            Self::AnalysisNotInitialized | Self::AnalysisFailed(_) => ErrorKind::Analysis,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Soft errors leave the panel inert instead of surfacing as failures
    #[inline]
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::PanelRegionMissing { .. })
    }

    /// Whether this error ends the current cycle without rendering
    #[inline]
    #[must_use]
    pub fn aborts_cycle(&self) -> bool {
        !matches!(self, Self::PanelRegionMissing { .. } | Self::Config(_))
    }
}
