//! wy Worker - out-of-process analysis engine
//!
//! Runs the analysis capability in a child process and talks to it with
//! newline-delimited JSON over stdio. See [`protocol`] for the line format.

#![warn(unreachable_pub)]

pub mod engine;
pub mod protocol;

pub use engine::{WorkerCommand, WorkerEngine};
pub use protocol::{decode_analysis, Reply, Request, RequestKind};
