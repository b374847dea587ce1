//! Network verification abstraction
//!
//! Topology validation is implemented elsewhere; the coordinator only
//! delegates to this capability with the built execution context and returns
//! whatever the checker produces.

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::node::NodeRef;
use crate::{Error, Result};

/// Network verification capability consumed by the coordinator
pub trait NetworkChecker: Send + Sync {
    fn check_network(
        &self,
        ctx: &ExecutionContext,
        nodes: &[NodeRef],
        networks: &Value,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Placeholder checker for callers that never verify networks
pub struct NoChecker;

impl NetworkChecker for NoChecker {
    async fn check_network(
        &self,
        _ctx: &ExecutionContext,
        _nodes: &[NodeRef],
        _networks: &Value,
    ) -> Result<Value> {
        Err(Error::Network("no network checker configured".to_string()))
    }
}

/// Record of one verification request for test verification
#[derive(Debug, Clone)]
pub struct CheckRecord {
    pub task_id: String,
    pub uids: Vec<String>,
    pub networks: Value,
}

/// Mock network checker that echoes a scripted verdict
#[derive(Clone, Default)]
pub struct MockNetworkChecker {
    checks: Arc<Mutex<Vec<CheckRecord>>>,
    verdict: Arc<Mutex<Value>>,
}

impl MockNetworkChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_verdict(&self, verdict: Value) {
        *self.verdict.lock().unwrap() = verdict;
    }

    pub fn checks(&self) -> Vec<CheckRecord> {
        self.checks.lock().unwrap().clone()
    }
}

impl NetworkChecker for MockNetworkChecker {
    async fn check_network(
        &self,
        ctx: &ExecutionContext,
        nodes: &[NodeRef],
        networks: &Value,
    ) -> Result<Value> {
        self.checks.lock().unwrap().push(CheckRecord {
            task_id: ctx.task_id().to_string(),
            uids: crate::node::uids(nodes),
            networks: networks.clone(),
        });
        Ok(self.verdict.lock().unwrap().clone())
    }
}
