//! Panel controller
//!
//! Binds to the host page once, then turns field input and tab activation
//! into debounced synchronization cycles.
//!
//! # Lifecycle
//! `Uninitialized` -> [`PanelController::bind`] -> `Bound`, or `Inert` when the
//! panel region cannot be located. There is no terminal state; a bound panel
//! keeps reacting to events for as long as it is driven.

use crate::config::PanelConfig;
use crate::cycle::{CycleOutcome, SyncCycle};
use crate::session::{BindingReport, PanelSession};
use std::sync::Arc;
use tokio::sync::mpsc;
use wy_core::{
    AnalysisClient, AnalysisEngine, Debouncer, HostPage, PanelError, PreviewSource, RenderTarget,
    ResultRenderer,
};

/// Page events the panel reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// The value of an input changed
    Input { element_id: String },
    /// A control was clicked; carries its `aria-controls` attribute
    Activate { aria_controls: String },
}

impl PanelEvent {
    #[must_use]
    pub fn input(element_id: impl Into<String>) -> Self {
        Self::Input {
            element_id: element_id.into(),
        }
    }

    #[must_use]
    pub fn activate(aria_controls: impl Into<String>) -> Self {
        Self::Activate {
            aria_controls: aria_controls.into(),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Uninitialized,
    Bound,
    /// Panel region missing; events are ignored for good
    Inert,
}

enum Binding {
    Uninitialized,
    Bound {
        cycle: Arc<SyncCycle>,
        debouncer: Debouncer,
    },
    Inert,
}

/// Drives one panel
pub struct PanelController {
    config: PanelConfig,
    page: Arc<dyn HostPage>,
    target: Arc<dyn RenderTarget>,
    preview: Arc<dyn PreviewSource>,
    client: Arc<AnalysisClient>,
    binding: Binding,
}

impl PanelController {
    /// Create an unbound controller
    #[must_use]
    pub fn new(
        config: PanelConfig,
        page: Arc<dyn HostPage>,
        target: Arc<dyn RenderTarget>,
        preview: Arc<dyn PreviewSource>,
        engine: Arc<dyn AnalysisEngine>,
    ) -> Self {
        Self {
            config,
            page,
            target,
            preview,
            client: Arc::new(AnalysisClient::new(engine)),
            binding: Binding::Uninitialized,
        }
    }

    #[must_use]
    pub fn state(&self) -> PanelState {
        match self.binding {
            Binding::Uninitialized => PanelState::Uninitialized,
            Binding::Bound { .. } => PanelState::Bound,
            Binding::Inert => PanelState::Inert,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    /// Fields located at bind time
    #[must_use]
    pub fn report(&self) -> Option<&BindingReport> {
        match &self.binding {
            Binding::Bound { cycle, .. } => Some(cycle.session().report()),
            _ => None,
        }
    }

    /// Initialize the engine, then locate the panel
    ///
    /// On success an initial cycle is scheduled. A missing panel leaves the
    /// controller inert and is not an error. Binding again is a no-op.
    ///
    /// # Errors
    /// Engine initialization failure; the controller stays unbound and
    /// binding may be attempted again.
    pub async fn bind(&mut self) -> Result<(), PanelError> {
        if !matches!(self.binding, Binding::Uninitialized) {
            tracing::debug!(state = ?self.state(), "panel already bound");
            return Ok(());
        }

        self.client.initialize(self.config.engine_config()).await?;

        let session = match PanelSession::locate(self.page.as_ref(), &self.config) {
            Ok(session) => session,
            Err(e) if e.is_soft() => {
                tracing::warn!(error = %e, "panel inert");
                self.binding = Binding::Inert;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        tracing::info!(
            panel = %self.config.panel_id,
            located = ?session.report().located(),
            "panel bound"
        );

        let cycle = Arc::new(SyncCycle::new(
            Arc::clone(&self.page),
            Arc::clone(&self.target),
            Arc::clone(&self.preview),
            Arc::clone(&self.client),
            ResultRenderer::new(self.config.regions.clone()),
            Arc::new(session),
        ));
        let scheduled = Arc::clone(&cycle);
        let debouncer = Debouncer::new(self.config.debounce_interval(), move || {
            let cycle = Arc::clone(&scheduled);
            async move { cycle.run_logged().await }
        });

        // Initial render
        debouncer.trigger();
        self.binding = Binding::Bound { cycle, debouncer };
        Ok(())
    }

    /// React to one event; returns whether a cycle was scheduled
    pub fn handle(&self, event: &PanelEvent) -> bool {
        let Binding::Bound { cycle, debouncer } = &self.binding else {
            return false;
        };

        let relevant = match event {
            PanelEvent::Input { element_id } => cycle.session().watches(element_id),
            PanelEvent::Activate { aria_controls } => {
                aria_controls.contains(self.config.tab_marker.as_str())
            }
        };
        if relevant {
            debouncer.trigger();
        }
        relevant
    }

    /// Run a cycle now, bypassing the debouncer
    ///
    /// # Errors
    /// `AnalysisNotInitialized` unless bound, otherwise the cycle's failure
    pub async fn sync_now(&self) -> Result<CycleOutcome, PanelError> {
        match &self.binding {
            Binding::Bound { cycle, .. } => cycle.run().await,
            _ => Err(PanelError::AnalysisNotInitialized),
        }
    }

    /// Handle events until the sender side closes
    pub async fn run(self, mut events: mpsc::Receiver<PanelEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
        tracing::debug!("panel event stream closed");
    }
}

impl std::fmt::Debug for PanelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelController")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
