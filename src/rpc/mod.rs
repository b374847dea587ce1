//! Fleet RPC client abstraction
//!
//! A fleet client performs one fan-out call: "invoke RPC method M on agent
//! service S for node set U, within a deadline". It returns one result per
//! node that answered in time. Partial response is the expected steady state
//! at fleet scale, so individual non-response is represented by absence from
//! the result list, never by an error.
//!
//! The client does not log business outcomes and does not reconcile;
//! classification of per-node failure is deferred to the caller.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::Result;

pub mod mock;
pub mod protocol;
pub mod tcp;

pub use mock::MockFleetClient;
pub use tcp::TcpFleetClient;

/// Deadline applied when the caller does not pass an explicit timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// One agent's answer to a fan-out call
///
/// The set of results for a call is a subset of the requested uids; a
/// requested uid with no entry did not answer within the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Uid of the node that answered
    pub sender: String,
    /// Agent-reported status; zero means the agent executed the method
    /// without error
    pub status_code: i32,
    /// Method-specific response payload
    pub data: serde_json::Map<String, Value>,
}

/// Whether the client should flag agent-reported failures as it collects them
///
/// Under `Enforce`, a nonzero status is logged by the client but still
/// surfaced in the returned result as-is, status preserved, so the caller can
/// classify it. Results are never dropped on either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Enforce,
    Skip,
}

/// Fan-out RPC capability
///
/// `uids` must be non-empty and already string-normalized; violating this is
/// a caller bug, not a runtime fault of the client.
pub trait FleetClient: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn call(
        &self,
        ctx: &ExecutionContext,
        service: &str,
        method: &str,
        uids: &[String],
        args: Value,
        check: CheckMode,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Vec<AgentResult>>> + Send;
}
