//! Deployment engine abstraction
//!
//! The coordinator does not participate in deployment's own retry or ordering
//! logic; it hands the execution context, node list, and free-form attributes
//! to an engine chosen when the coordinator was constructed. Which engine to
//! use is a construction-time decision, never a per-call one.

use std::future::Future;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::node::NodeRef;
use crate::{Error, Result};

pub mod mock;

pub use mock::MockDeploymentEngine;

/// Deployment capability consumed by the coordinator
pub trait DeploymentEngine: Send + Sync {
    /// Engine name, used in the operational log when a deployment starts
    fn name(&self) -> &str;

    /// Run the full deployment for the given nodes
    ///
    /// The context carries the task identifier, the caller's progress
    /// reporter, and the progress estimator; engines are expected to stream
    /// incremental status through the reporter.
    fn deploy(
        &self,
        ctx: &ExecutionContext,
        nodes: &[NodeRef],
        attrs: &Value,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Placeholder engine for callers that never deploy
///
/// Discovery and removal tooling builds a coordinator without a real engine;
/// any deploy attempt through this one fails immediately.
pub struct NoEngine;

impl DeploymentEngine for NoEngine {
    fn name(&self) -> &str {
        "none"
    }

    async fn deploy(
        &self,
        _ctx: &ExecutionContext,
        _nodes: &[NodeRef],
        _attrs: &Value,
    ) -> Result<()> {
        Err(Error::Deploy("no deployment engine configured".to_string()))
    }
}
