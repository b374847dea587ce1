//! TCP fan-out fleet client
//!
//! Resolves node uids through a fleet inventory (uid -> agent address), dials
//! every requested node in parallel, and collects the replies that arrive
//! before the shared deadline. A node that cannot be dialed, answers late, or
//! answers garbage is simply absent from the result list; only failures of
//! the fan-out machinery itself error out.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::rpc::protocol::{
    read_message, write_message, CallReply, CallRequest, Message, PROTOCOL_VERSION,
};
use crate::rpc::{AgentResult, CheckMode, FleetClient, DEFAULT_CALL_TIMEOUT};
use crate::{Error, Result};

/// Fleet client speaking the length-prefixed MessagePack protocol over TCP
#[derive(Debug, Clone)]
pub struct TcpFleetClient {
    /// Node uid -> agent address ("host:port")
    agents: HashMap<String, String>,
}

impl TcpFleetClient {
    pub fn new(agents: HashMap<String, String>) -> Self {
        Self { agents }
    }
}

impl FleetClient for TcpFleetClient {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        service: &str,
        method: &str,
        uids: &[String],
        args: Value,
        check: CheckMode,
        timeout: Option<Duration>,
    ) -> Result<Vec<AgentResult>> {
        debug_assert!(!uids.is_empty(), "fan-out call with empty uid list");

        let deadline = timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);
        let mut tasks = JoinSet::new();

        for uid in uids {
            let Some(addr) = self.agents.get(uid) else {
                // Not in the inventory: indistinguishable from a node that
                // never answers, so it is omitted rather than raised.
                debug!(
                    task_id = %ctx.task_id(),
                    uid = %uid,
                    "node has no agent address, treating as unreachable"
                );
                continue;
            };

            let request = CallRequest {
                protocol_version: PROTOCOL_VERSION,
                task_id: ctx.task_id().to_string(),
                service: service.to_string(),
                method: method.to_string(),
                args: args.clone(),
            };
            let uid = uid.clone();
            let addr = addr.clone();
            let task_id = ctx.task_id().to_string();

            tasks.spawn(async move {
                match tokio::time::timeout(deadline, call_one(&addr, request)).await {
                    // A reply only counts for the node that was dialed. An
                    // agent claiming another node's uid would corrupt the
                    // requested-set accounting downstream, so it is dropped
                    // like any other bad answer.
                    Ok(Ok(reply)) if reply.sender != uid => {
                        debug!(task_id = %task_id, uid = %uid, addr = %addr,
                            sender = %reply.sender,
                            "reply sender does not match the dialed node, dropping");
                        None
                    }
                    Ok(Ok(reply)) => Some(AgentResult {
                        sender: reply.sender,
                        status_code: reply.status_code,
                        data: reply.data,
                    }),
                    Ok(Err(e)) => {
                        debug!(task_id = %task_id, uid = %uid, addr = %addr, error = %e,
                            "agent call failed");
                        None
                    }
                    Err(_) => {
                        debug!(task_id = %task_id, uid = %uid, addr = %addr,
                            timeout_secs = deadline.as_secs_f64(),
                            "agent call timed out");
                        None
                    }
                }
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| Error::Transport(format!("fan-out task failed: {e}")))?;
            if let Some(result) = outcome {
                if check == CheckMode::Enforce && result.status_code != 0 {
                    warn!(
                        task_id = %ctx.task_id(),
                        uid = %result.sender,
                        method = %method,
                        status_code = result.status_code,
                        "agent reported nonzero status"
                    );
                }
                results.push(result);
            }
        }

        Ok(results)
    }
}

/// Perform one call/reply exchange with a single agent
async fn call_one(addr: &str, request: CallRequest) -> Result<CallReply> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::Transport(format!("failed to connect to {addr}: {e}")))?;

    write_message(&mut stream, &Message::Call(request)).await?;

    match read_message(&mut stream).await? {
        Message::Reply(reply) => {
            if reply.protocol_version != PROTOCOL_VERSION {
                return Err(Error::Protocol(format!(
                    "protocol version mismatch: coordinator={}, agent={}",
                    PROTOCOL_VERSION, reply.protocol_version
                )));
            }
            Ok(reply)
        }
        other => Err(Error::Protocol(format!("expected Reply, got {other:?}"))),
    }
}
