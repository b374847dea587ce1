//! Per-operation execution context
//!
//! Every coordinator operation builds one `ExecutionContext` and threads it
//! through its downstream calls. The context carries the task identifier used
//! for log correlation, the progress reporter the caller injected, and an
//! optional progress estimator. It is immutable after construction and never
//! shared across concurrent task_ids.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::info;

/// Progress reporting capability
///
/// Accepts structured progress payloads during a single operation. The
/// coordinator may invoke it repeatedly, so implementations must be safe to
/// call without external synchronization.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, payload: Value);
}

/// Reporter that emits each payload to the operational log
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, payload: Value) {
        info!(payload = %payload, "progress report");
    }
}

/// Reporter that records every payload, for tests and tooling
#[derive(Default)]
pub struct CollectingReporter {
    payloads: Mutex<Vec<Value>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap().clone()
    }
}

impl ProgressReporter for CollectingReporter {
    fn report(&self, payload: Value) {
        self.payloads.lock().unwrap().push(payload);
    }
}

/// Per-node completion estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProgress {
    pub uid: String,
    pub percent: u8,
}

/// Progress estimation capability
///
/// Deployment engines may consult this to enrich their progress reports with
/// per-node completion estimates. The estimation source (log tailing on the
/// agents) is implemented elsewhere; the coordinator only carries the
/// capability through the context.
pub trait ProgressEstimator: Send + Sync {
    /// Best-effort per-node completion estimates, keyed by uid. May return
    /// fewer entries than requested, or none at all.
    fn estimate(&self, uids: &[String]) -> Vec<NodeProgress>;
}

/// No-op estimator used when progress estimation is disabled
pub struct NoEstimation;

impl ProgressEstimator for NoEstimation {
    fn estimate(&self, _uids: &[String]) -> Vec<NodeProgress> {
        Vec::new()
    }
}

/// Immutable per-operation bundle of task identity and reporting capabilities
#[derive(Clone)]
pub struct ExecutionContext {
    task_id: String,
    reporter: Arc<dyn ProgressReporter>,
    progress: Arc<dyn ProgressEstimator>,
}

impl ExecutionContext {
    /// Build a context with progress estimation disabled
    pub fn new(task_id: impl Into<String>, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self::with_estimator(task_id, reporter, Arc::new(NoEstimation))
    }

    /// Build a context carrying a progress estimator
    pub fn with_estimator(
        task_id: impl Into<String>,
        reporter: Arc<dyn ProgressReporter>,
        progress: Arc<dyn ProgressEstimator>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            reporter,
            progress,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter.as_ref()
    }

    pub fn progress(&self) -> &dyn ProgressEstimator {
        self.progress.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_accessors() {
        let reporter = Arc::new(CollectingReporter::new());
        let ctx = ExecutionContext::new("task-1", reporter.clone());

        assert_eq!(ctx.task_id(), "task-1");
        ctx.reporter().report(json!({"step": 1}));
        ctx.reporter().report(json!({"step": 2}));
        assert_eq!(reporter.payloads(), vec![json!({"step": 1}), json!({"step": 2})]);
    }

    #[test]
    fn test_default_estimator_is_noop() {
        let ctx = ExecutionContext::new("task-2", Arc::new(CollectingReporter::new()));
        assert!(ctx.progress().estimate(&["1".to_string()]).is_empty());
    }
}
