//! Mock deployment engine for testing
//!
//! Records every deployment request so tests can verify what the coordinator
//! handed over, and can be configured to fail.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::engine::DeploymentEngine;
use crate::node::NodeRef;
use crate::{Error, Result};

/// Record of one deployment request for test verification
#[derive(Debug, Clone)]
pub struct DeployRecord {
    pub task_id: String,
    pub uids: Vec<String>,
    pub attrs: Value,
}

/// Mock deployment engine
#[derive(Clone, Default)]
pub struct MockDeploymentEngine {
    deploys: Arc<Mutex<Vec<DeployRecord>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockDeploymentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent deployment fail with the given message
    pub fn set_failure(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn deploys(&self) -> Vec<DeployRecord> {
        self.deploys.lock().unwrap().clone()
    }

    pub fn deploy_count(&self) -> usize {
        self.deploys.lock().unwrap().len()
    }
}

impl DeploymentEngine for MockDeploymentEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deploy(
        &self,
        ctx: &ExecutionContext,
        nodes: &[NodeRef],
        attrs: &Value,
    ) -> Result<()> {
        self.deploys.lock().unwrap().push(DeployRecord {
            task_id: ctx.task_id().to_string(),
            uids: crate::node::uids(nodes),
            attrs: attrs.clone(),
        });

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Deploy(message));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CollectingReporter;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_deployments() {
        let engine = MockDeploymentEngine::new();
        let ctx = ExecutionContext::new("task-1", Arc::new(CollectingReporter::new()));
        let nodes = vec![NodeRef::new("1"), NodeRef::new("2")];

        engine.deploy(&ctx, &nodes, &json!({"role": "compute"})).await.unwrap();

        let deploys = engine.deploys();
        assert_eq!(deploys.len(), 1);
        assert_eq!(deploys[0].task_id, "task-1");
        assert_eq!(deploys[0].uids, vec!["1", "2"]);
        assert_eq!(deploys[0].attrs, json!({"role": "compute"}));
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let engine = MockDeploymentEngine::new();
        engine.set_failure("disk layout rejected");
        let ctx = ExecutionContext::new("task-2", Arc::new(CollectingReporter::new()));

        let err = engine
            .deploy(&ctx, &[NodeRef::new("1")], &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Deploy(_)));
    }
}
