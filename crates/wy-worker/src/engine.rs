//! Child-process analysis engine
//!
//! Requests are written to the child's stdin, one per line. A reader task
//! routes each reply line to the waiting caller by request id. Once the
//! child's stdout closes, every pending and future call fails.

use crate::protocol::{decode_analysis, Reply, Request, RequestKind};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use wy_core::{AnalysisEngine, CategorizedResultSet, ContentSnapshot, EngineConfig, PanelError};

type Pending = DashMap<u64, oneshot::Sender<Reply>>;

/// How to launch a worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl WorkerCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// [`AnalysisEngine`] backed by a child process
#[derive(Debug)]
pub struct WorkerEngine {
    stdin: Mutex<ChildStdin>,
    pending: Arc<Pending>,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    timeout: Duration,
    // Held so the child is killed when the engine is dropped
    _child: Child,
}

impl WorkerEngine {
    /// Launch the worker
    ///
    /// # Errors
    /// `AnalysisFailed` if the process cannot be started
    pub fn spawn(command: &WorkerCommand) -> Result<Self, PanelError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PanelError::AnalysisFailed(format!("cannot start {}: {e}", command.program))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PanelError::AnalysisFailed("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PanelError::AnalysisFailed("worker stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "wy_worker::stderr", "{line}");
                }
            });
        }

        let pending = Arc::new(Pending::new());
        let closed = Arc::new(AtomicBool::new(false));
        tokio::spawn(read_replies(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&closed),
        ));

        tracing::info!(program = %command.program, pid = ?child.id(), "analysis worker started");

        Ok(Self {
            stdin: Mutex::new(stdin),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            timeout: Duration::from_secs(command.timeout_secs),
            _child: child,
        })
    }

    /// Whether the worker's output has closed
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn call(&self, kind: RequestKind, payload: Value) -> Result<Value, PanelError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        // The reader clears pending after setting closed, so checking here
        // cannot leave a waiter behind
        if self.is_closed() {
            self.pending.remove(&id);
            return Err(PanelError::AnalysisFailed("worker exited".to_string()));
        }

        let request = Request { id, kind, payload };
        let mut line = serde_json::to_vec(&request)
            .map_err(|e| PanelError::AnalysisFailed(format!("encode request: {e}")))?;
        line.push(b'\n');

        {
            let mut stdin = self.stdin.lock().await;
            let written = async {
                stdin.write_all(&line).await?;
                stdin.flush().await
            }
            .await;
            if let Err(e) = written {
                self.pending.remove(&id);
                return Err(PanelError::AnalysisFailed(format!("write to worker: {e}")));
            }
        }

        let reply = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(PanelError::AnalysisFailed("worker exited".to_string())),
            Err(_) => {
                self.pending.remove(&id);
                return Err(PanelError::AnalysisFailed(format!(
                    "worker did not answer {kind:?} within {:?}",
                    self.timeout
                )));
            }
        };

        if reply.ok {
            Ok(reply.result)
        } else {
            Err(PanelError::AnalysisFailed(
                reply.error.unwrap_or_else(|| "unspecified worker error".to_string()),
            ))
        }
    }
}

async fn read_replies(stdout: ChildStdout, pending: Arc<Pending>, closed: Arc<AtomicBool>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<Reply>(&line) {
                Ok(reply) => match pending.remove(&reply.id) {
                    Some((_, tx)) => {
                        let _ = tx.send(reply);
                    }
                    None => tracing::warn!(id = reply.id, "reply for unknown request"),
                },
                Err(e) => tracing::warn!(error = %e, "unreadable worker output"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "worker output failed");
                break;
            }
        }
    }

    closed.store(true, Ordering::Release);
    // Dropping the senders wakes every waiter with an error
    pending.clear();
    tracing::info!("analysis worker output closed");
}

#[async_trait]
impl AnalysisEngine for WorkerEngine {
    async fn initialize(&self, config: &EngineConfig) -> Result<(), PanelError> {
        let payload = serde_json::to_value(config)
            .map_err(|e| PanelError::AnalysisFailed(format!("encode config: {e}")))?;
        self.call(RequestKind::Initialize, payload).await?;
        Ok(())
    }

    async fn analyze(
        &self,
        snapshot: &ContentSnapshot,
    ) -> Result<CategorizedResultSet, PanelError> {
        let payload = serde_json::to_value(snapshot)
            .map_err(|e| PanelError::AnalysisFailed(format!("encode snapshot: {e}")))?;
        let result = self.call(RequestKind::Analyze, payload).await?;
        decode_analysis(result)
            .map_err(|e| PanelError::AnalysisFailed(format!("malformed analysis result: {e}")))
    }
}
