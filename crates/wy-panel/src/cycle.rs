//! One synchronization cycle
//!
//! fetch preview -> snapshot -> analyze -> render. Any stage failing ends
//! the cycle before rendering, so the previous render stays in place.

use crate::session::PanelSession;
use std::sync::Arc;
use wy_core::{
    AnalysisClient, HostPage, PanelError, PreviewSource, RenderStats, RenderTarget, ResultRenderer,
};

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Results were rendered
    Rendered(RenderStats),
    /// A later cycle already rendered; results were discarded
    Superseded,
}

/// Everything a cycle needs, shared by every run
pub struct SyncCycle {
    page: Arc<dyn HostPage>,
    target: Arc<dyn RenderTarget>,
    preview: Arc<dyn PreviewSource>,
    client: Arc<AnalysisClient>,
    renderer: ResultRenderer,
    session: Arc<PanelSession>,
}

impl SyncCycle {
    #[must_use]
    pub fn new(
        page: Arc<dyn HostPage>,
        target: Arc<dyn RenderTarget>,
        preview: Arc<dyn PreviewSource>,
        client: Arc<AnalysisClient>,
        renderer: ResultRenderer,
        session: Arc<PanelSession>,
    ) -> Self {
        Self {
            page,
            target,
            preview,
            client,
            renderer,
            session,
        }
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &PanelSession {
        &self.session
    }

    /// Run one cycle
    pub async fn run(&self) -> Result<CycleOutcome, PanelError> {
        let generation = self.session.begin_cycle();
        tracing::debug!(generation, "sync start");

        let html = self.preview.fetch(self.page.as_ref()).await?;
        let snapshot = self.session.snapshot(self.page.as_ref(), html);
        let results = self.client.analyze(&snapshot).await?;

        let Some(stats) = self
            .session
            .render_if_newest(generation, || self.renderer.sync(self.target.as_ref(), &results))
        else {
            tracing::warn!(generation, "newer cycle already rendered, discarding results");
            return Ok(CycleOutcome::Superseded);
        };
        tracing::debug!(
            generation,
            passing = stats.passing,
            failing = stats.failing,
            skipped = stats.skipped,
            "sync done"
        );
        Ok(CycleOutcome::Rendered(stats))
    }

    /// Run one cycle, logging instead of returning its failure
    pub async fn run_logged(&self) {
        if let Err(e) = self.run().await {
            tracing::error!(error = %e, kind = ?e.kind(), "sync cycle failed");
        }
    }
}

impl std::fmt::Debug for SyncCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCycle")
            .field("client", &self.client)
            .field("renderer", &self.renderer)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
