//! Analysis client
//!
//! [`AnalysisEngine`] is the seam to the out-of-process analysis capability.
//! [`AnalysisClient`] wraps one engine instance and enforces its lifecycle:
//! one initialization per instance, no analysis before it completes.

use crate::error::PanelError;
use crate::types::{CategorizedResultSet, ContentSnapshot, EngineConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// An analysis capability
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Prepare the engine; called once per client
    async fn initialize(&self, config: &EngineConfig) -> Result<(), PanelError>;

    /// Assess a snapshot
    async fn analyze(&self, snapshot: &ContentSnapshot)
        -> Result<CategorizedResultSet, PanelError>;
}

/// Lifecycle-checked wrapper around an engine
pub struct AnalysisClient {
    engine: Arc<dyn AnalysisEngine>,
    config: OnceCell<EngineConfig>,
}

impl AnalysisClient {
    /// Wrap an engine; it is not initialized yet
    #[must_use]
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            engine,
            config: OnceCell::new(),
        }
    }

    /// Initialize the wrapped engine
    ///
    /// Only the first successful call reaches the engine; later calls return
    /// immediately. A failed initialization may be attempted again.
    pub async fn initialize(&self, config: EngineConfig) -> Result<(), PanelError> {
        let active = self
            .config
            .get_or_try_init(|| async {
                tracing::debug!(locale = %config.locale, "initializing analysis engine");
                self.engine.initialize(&config).await?;
                Ok::<_, PanelError>(config.clone())
            })
            .await?;

        if *active != config {
            tracing::debug!("analysis engine already initialized, new config ignored");
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config.initialized()
    }

    /// Config the engine was initialized with
    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<&EngineConfig> {
        self.config.get()
    }

    /// Assess a snapshot; the engine's output is returned unchanged
    pub async fn analyze(
        &self,
        snapshot: &ContentSnapshot,
    ) -> Result<CategorizedResultSet, PanelError> {
        if !self.is_initialized() {
            return Err(PanelError::AnalysisNotInitialized);
        }
        self.engine.analyze(snapshot).await
    }
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("config", &self.config.get())
            .finish_non_exhaustive()
    }
}
