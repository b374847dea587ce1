//! Outcome reconciliation
//!
//! Turns "requested uids" plus "agent results received" into an exhaustive,
//! disjoint classification. Every requested node lands in exactly one of
//! three buckets, decided in a fixed order per node:
//!
//! 1. no result for the uid -> unreachable (transport-level failure)
//! 2. nonzero status code -> failed, full result dump preserved
//! 3. success predicate on the payload false -> failed, narrower message
//! 4. otherwise -> succeeded
//!
//! The three tiers carry different, non-interchangeable error messages:
//! callers and operators distinguish a node that never answered from an agent
//! that reported a failure from an agent that answered cleanly but did not do
//! the thing it was asked to do.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::AgentResult;

/// Error message for nodes that produced no reply within the call's deadline
pub const UNREACHABLE_MESSAGE: &str = "Node not answered by RPC.";

/// Classification of one requested node
///
/// Produced exclusively by [`reconcile`]; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Succeeded { uid: String },
    Failed { uid: String, error: String },
    Unreachable { uid: String },
}

impl NodeOutcome {
    pub fn uid(&self) -> &str {
        match self {
            NodeOutcome::Succeeded { uid }
            | NodeOutcome::Failed { uid, .. }
            | NodeOutcome::Unreachable { uid } => uid,
        }
    }
}

/// Payload-level success contract for one RPC method
///
/// The flag name and error field are pinned per method rather than re-derived
/// from payloads at runtime; tests assert the resulting messages verbatim.
#[derive(Debug, Clone)]
pub struct SuccessRule {
    /// Payload key that must hold a truthy value for the node to count as
    /// succeeded
    pub flag: &'static str,
    /// Payload key carrying the agent's own error message for the
    /// predicate-false case
    pub error_field: &'static str,
}

/// Classify every requested node into exactly one outcome
///
/// Responded nodes are classified in result appearance order; unreachable
/// entries (requested minus responded) are appended afterwards in requested
/// order. The union of the outcome uids always equals the requested set.
pub fn reconcile(
    method: &str,
    requested: &[String],
    results: &[AgentResult],
    rule: &SuccessRule,
) -> Vec<NodeOutcome> {
    let responded: HashSet<&str> = results.iter().map(|r| r.sender.as_str()).collect();

    let mut outcomes = Vec::with_capacity(requested.len());
    for result in results {
        if result.status_code != 0 {
            outcomes.push(NodeOutcome::Failed {
                uid: result.sender.clone(),
                error: format!("RPC agent '{}' failed. Result: {}", method, dump(result)),
            });
        } else if !truthy(result.data.get(rule.flag)) {
            outcomes.push(NodeOutcome::Failed {
                uid: result.sender.clone(),
                error: format!(
                    "RPC method '{}' failed with message: {}",
                    method,
                    message_text(result.data.get(rule.error_field))
                ),
            });
        } else {
            outcomes.push(NodeOutcome::Succeeded {
                uid: result.sender.clone(),
            });
        }
    }

    for uid in requested {
        if !responded.contains(uid.as_str()) {
            outcomes.push(NodeOutcome::Unreachable { uid: uid.clone() });
        }
    }

    outcomes
}

/// Full result dump for agent-reported failures. Diagnostic detail is
/// preserved rather than summarized.
fn dump(result: &AgentResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| format!("{result:?}"))
}

/// Truthiness of a payload value: present and neither null nor false
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    }
}

fn message_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// One failed or unreachable node in a removal report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNode {
    pub uid: String,
    pub error: String,
}

/// Aggregate result of a node removal operation
///
/// The shape is asymmetric and integrated against field-for-field by other
/// systems: a fully successful removal carries only `nodes`, with no `status`
/// key at all; any failure adds `status = "error"` and `error_nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Uids of nodes that were erased successfully
    pub nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_nodes: Option<Vec<ErrorNode>>,
}

impl RemovalReport {
    /// Trivial success report for an empty node list
    pub fn empty() -> Self {
        Self {
            status: None,
            nodes: Vec::new(),
            error_nodes: None,
        }
    }

    /// Assemble the report from a full set of outcomes
    pub fn from_outcomes(outcomes: Vec<NodeOutcome>) -> Self {
        let mut nodes = Vec::new();
        let mut errors = Vec::new();

        for outcome in outcomes {
            match outcome {
                NodeOutcome::Succeeded { uid } => nodes.push(uid),
                NodeOutcome::Failed { uid, error } => errors.push(ErrorNode { uid, error }),
                NodeOutcome::Unreachable { uid } => errors.push(ErrorNode {
                    uid,
                    error: UNREACHABLE_MESSAGE.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Self {
                status: None,
                nodes,
                error_nodes: None,
            }
        } else {
            Self {
                status: Some("error".to_string()),
                nodes,
                error_nodes: Some(errors),
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.is_some()
    }
}
