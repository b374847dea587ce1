//! Dispatch-and-reconcile coordinator
//!
//! The façade over the fleet: four operations, each building its own
//! execution context, issuing a fan-out call or delegating to a pluggable
//! collaborator, and - for removal - reconciling every requested node into an
//! aggregate result with explicit partial-failure semantics.
//!
//! Transport- and agent-level failures are never raised out of the
//! partial-failure operations (`node_type`, `remove_nodes`); they are data,
//! folded into the returned result. Only caller-contract violations and
//! catastrophic transport faults terminate a call abnormally.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::context::{ExecutionContext, NoEstimation, ProgressEstimator, ProgressReporter};
use crate::engine::DeploymentEngine;
use crate::network::NetworkChecker;
use crate::node::{self, NodeRef};
use crate::reconcile::{reconcile, RemovalReport, SuccessRule};
use crate::rpc::{CheckMode, FleetClient};
use crate::{Error, Result};

/// Discovery service answering with each node's system type
const SYSTEMTYPE_SERVICE: &str = "systemtype";
const SYSTEMTYPE_METHOD: &str = "get_type";

/// Erase service wiping a node's disks and rebooting it
const ERASE_SERVICE: &str = "erase_node";
const ERASE_METHOD: &str = "erase_node";

/// Payload contract for a successful erase: the agent confirms the reboot
/// and reports its own message in `error_msg` when it could not.
const ERASE_RULE: SuccessRule = SuccessRule {
    flag: "rebooted",
    error_field: "error_msg",
};

/// Discovered type of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub uid: String,
    pub node_type: String,
}

/// Coordination façade for a fleet of provisioning agents
///
/// The fleet client, deployment engine, and network checker are injected at
/// construction time; every operation builds a fresh [`ExecutionContext`]
/// around the reporter and task id the caller passes in.
pub struct Coordinator<C, E, N> {
    client: C,
    engine: E,
    network: N,
    progress: Arc<dyn ProgressEstimator>,
}

impl<C, E, N> Coordinator<C, E, N>
where
    C: FleetClient,
    E: DeploymentEngine,
    N: NetworkChecker,
{
    /// Build a coordinator with progress estimation disabled
    pub fn new(client: C, engine: E, network: N) -> Self {
        Self::with_estimator(client, engine, network, Arc::new(NoEstimation))
    }

    /// Build a coordinator carrying a progress estimator for deployments
    pub fn with_estimator(
        client: C,
        engine: E,
        network: N,
        progress: Arc<dyn ProgressEstimator>,
    ) -> Self {
        Self {
            client,
            engine,
            network,
            progress,
        }
    }

    /// Discover the system type of each node
    ///
    /// Best-effort: nodes that do not answer within the timeout are silently
    /// omitted from the output, so the result may have fewer entries than the
    /// request. Reported type strings have trailing whitespace trimmed.
    pub async fn node_type(
        &self,
        reporter: Arc<dyn ProgressReporter>,
        task_id: &str,
        nodes: &[NodeRef],
        timeout: Option<Duration>,
    ) -> Result<Vec<NodeType>> {
        let ctx = ExecutionContext::new(task_id, reporter);
        let uids = node::uids(nodes);

        let results = self
            .client
            .call(
                &ctx,
                SYSTEMTYPE_SERVICE,
                SYSTEMTYPE_METHOD,
                &uids,
                json!({}),
                CheckMode::Skip,
                timeout,
            )
            .await?;

        Ok(results
            .into_iter()
            .map(|r| {
                let node_type = r
                    .data
                    .get("node_type")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim_end()
                    .to_string();
                NodeType {
                    uid: r.sender,
                    node_type,
                }
            })
            .collect())
    }

    /// Deploy the given nodes through the configured engine
    ///
    /// An empty node list is a caller error, surfaced immediately without any
    /// RPC. The façade only builds the context and hands off; the engine owns
    /// retry and ordering.
    pub async fn deploy(
        &self,
        reporter: Arc<dyn ProgressReporter>,
        task_id: &str,
        nodes: &[NodeRef],
        attrs: Value,
    ) -> Result<()> {
        if nodes.is_empty() {
            return Err(Error::EmptyNodeList);
        }

        let ctx = ExecutionContext::with_estimator(task_id, reporter, self.progress.clone());
        info!(
            task_id = %ctx.task_id(),
            engine = self.engine.name(),
            "Using deployment engine"
        );
        self.engine.deploy(&ctx, nodes, &attrs).await
    }

    /// Erase and reboot the given nodes, reconciling every requested node
    ///
    /// An empty node list is a no-op, not an error. Otherwise every requested
    /// node ends up in the report exactly once: in `nodes` when the agent
    /// confirmed the reboot, in `error_nodes` when it reported a failure or
    /// never answered.
    pub async fn remove_nodes(
        &self,
        reporter: Arc<dyn ProgressReporter>,
        task_id: &str,
        nodes: &[NodeRef],
    ) -> Result<RemovalReport> {
        let ctx = ExecutionContext::new(task_id, reporter);

        if nodes.is_empty() {
            info!(task_id = %ctx.task_id(), "Nodes to remove are not provided. Do nothing.");
            return Ok(RemovalReport::empty());
        }

        let uids = node::uids(nodes);
        info!(task_id = %ctx.task_id(), nodes = ?uids, "Starting removing of nodes");

        let results = self
            .client
            .call(
                &ctx,
                ERASE_SERVICE,
                ERASE_METHOD,
                &uids,
                json!({"reboot": true}),
                CheckMode::Skip,
                None,
            )
            .await?;
        debug!(task_id = %ctx.task_id(), results = ?results, "Data received from nodes");

        let outcomes = reconcile(ERASE_METHOD, &uids, &results, &ERASE_RULE);
        let report = RemovalReport::from_outcomes(outcomes);

        if let Some(error_nodes) = &report.error_nodes {
            error!(
                task_id = %ctx.task_id(),
                nodes = ?uids,
                error_nodes = ?error_nodes,
                "Removing of nodes ended with errors"
            );
        }
        info!(task_id = %ctx.task_id(), nodes = ?uids, "Finished removing of nodes");

        Ok(report)
    }

    /// Verify network connectivity between the given nodes
    ///
    /// Pure delegation: the façade builds the context and returns whatever
    /// the configured checker produces.
    pub async fn verify_networks(
        &self,
        reporter: Arc<dyn ProgressReporter>,
        task_id: &str,
        nodes: &[NodeRef],
        networks: Value,
    ) -> Result<Value> {
        let ctx = ExecutionContext::new(task_id, reporter);
        self.network.check_network(&ctx, nodes, &networks).await
    }
}
