//! wy Panel - keeps content-quality feedback in step with the edit form
//!
//! - [`PanelController`]: binding, event handling, debounced cycles
//! - [`SyncCycle`]: one fetch -> analyze -> render pass
//! - [`PanelSession`]: located fields and the cycle generation counter
//! - [`PanelConfig`]: element ids, intervals and engine settings
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wy_panel::{PanelConfig, PanelController, PanelEvent};
//!
//! let mut controller = PanelController::new(PanelConfig::default(), page.clone(), page, preview, engine);
//! controller.bind().await?;
//! controller.handle(&PanelEvent::input("id_title"));
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod controller;
pub mod cycle;
pub mod session;

pub use config::{AssetContext, ConfigError, FieldIds, PanelConfig, LOCALE_ENV};
pub use controller::{PanelController, PanelEvent, PanelState};
pub use cycle::{CycleOutcome, SyncCycle};
pub use session::{BindingReport, FieldBinding, FieldRole, PanelSession};
