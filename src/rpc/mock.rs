//! Mock fleet client for testing
//!
//! Simulates fan-out calls without any network activity. Replies are scripted
//! per uid; a uid with no scripted reply behaves like a node that never
//! answers. Every call is recorded so tests can assert what was (or was not)
//! dispatched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::rpc::{AgentResult, CheckMode, FleetClient};
use crate::{Error, Result};

/// Record of one fan-out call for test verification
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task_id: String,
    pub service: String,
    pub method: String,
    pub uids: Vec<String>,
    pub args: Value,
    pub check: CheckMode,
    pub timeout: Option<Duration>,
}

/// Mock fleet client with scripted per-uid replies
#[derive(Clone, Default)]
pub struct MockFleetClient {
    replies: Arc<Mutex<HashMap<String, AgentResult>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    transport_failure: Arc<Mutex<Option<String>>>,
}

impl MockFleetClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply for one uid. `data` must be a JSON object.
    pub fn set_reply(&self, uid: &str, status_code: i32, data: Value) {
        let data = data.as_object().cloned().unwrap_or_default();
        self.replies.lock().unwrap().insert(
            uid.to_string(),
            AgentResult {
                sender: uid.to_string(),
                status_code,
                data,
            },
        );
    }

    /// Make every subsequent call fail catastrophically
    pub fn set_transport_failure(&self, message: &str) {
        *self.transport_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl FleetClient for MockFleetClient {
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
        self.calls.lock().unwrap().push(RecordedCall {
            task_id: ctx.task_id().to_string(),
            service: service.to_string(),
            method: method.to_string(),
            uids: uids.to_vec(),
            args,
            check,
            timeout,
        });

        if let Some(message) = self.transport_failure.lock().unwrap().clone() {
            return Err(Error::Transport(message));
        }

        let replies = self.replies.lock().unwrap();
        Ok(uids
            .iter()
            .filter_map(|uid| replies.get(uid).cloned())
            .collect())
    }
}
