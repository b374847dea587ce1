//! Fan-out integration tests
//!
//! Runs fake agents on ephemeral ports speaking the wire protocol and drives
//! the TCP fleet client (and the coordinator on top of it) against them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use provisor::context::{CollectingReporter, ExecutionContext};
use provisor::engine::NoEngine;
use provisor::network::NoChecker;
use provisor::rpc::protocol::{read_message, write_message, CallReply, Message, PROTOCOL_VERSION};
use provisor::rpc::{CheckMode, FleetClient, TcpFleetClient};
use provisor::{Coordinator, NodeRef};

/// Spawn a fake agent that answers one call after an optional delay.
/// Returns the address it listens on.
async fn spawn_agent(uid: &str, status_code: i32, data: Value, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let uid = uid.to_string();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let request = match read_message(&mut stream).await.unwrap() {
            Message::Call(request) => request,
            other => panic!("expected Call, got {other:?}"),
        };
        assert_eq!(request.protocol_version, PROTOCOL_VERSION);

        tokio::time::sleep(delay).await;

        let reply = CallReply {
            protocol_version: PROTOCOL_VERSION,
            sender: uid,
            status_code,
            data: data.as_object().cloned().unwrap_or_default(),
        };
        write_message(&mut stream, &Message::Reply(reply)).await.unwrap();
    });

    addr
}

fn ctx(task_id: &str) -> ExecutionContext {
    ExecutionContext::new(task_id, Arc::new(CollectingReporter::new()))
}

#[tokio::test]
async fn fan_out_collects_all_responders() {
    let mut agents = HashMap::new();
    agents.insert(
        "1".to_string(),
        spawn_agent("1", 0, json!({"rebooted": true}), Duration::ZERO).await,
    );
    agents.insert(
        "2".to_string(),
        spawn_agent("2", 0, json!({"rebooted": true}), Duration::ZERO).await,
    );

    let client = TcpFleetClient::new(agents);
    let uids = vec!["1".to_string(), "2".to_string()];
    let mut results = client
        .call(
            &ctx("task-1"),
            "erase_node",
            "erase_node",
            &uids,
            json!({"reboot": true}),
            CheckMode::Skip,
            Some(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    results.sort_by(|a, b| a.sender.cmp(&b.sender));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].sender, "1");
    assert_eq!(results[1].sender, "2");
    assert_eq!(results[0].data.get("rebooted"), Some(&json!(true)));
}

#[tokio::test]
async fn silent_and_unknown_nodes_are_omitted() {
    let mut agents = HashMap::new();
    agents.insert(
        "1".to_string(),
        spawn_agent("1", 0, json!({"node_type": "target\n"}), Duration::ZERO).await,
    );
    // Node 2 answers well past the deadline; node 3 has no agent address.
    agents.insert(
        "2".to_string(),
        spawn_agent("2", 0, json!({"node_type": "target"}), Duration::from_secs(2)).await,
    );

    let client = TcpFleetClient::new(agents);
    let uids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    let results = client
        .call(
            &ctx("task-2"),
            "systemtype",
            "get_type",
            &uids,
            json!({}),
            CheckMode::Skip,
            Some(Duration::from_millis(300)),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sender, "1");
}

#[tokio::test]
async fn enforce_mode_preserves_nonzero_status() {
    let mut agents = HashMap::new();
    agents.insert(
        "1".to_string(),
        spawn_agent("1", 2, json!({"detail": "scrub failed"}), Duration::ZERO).await,
    );

    let client = TcpFleetClient::new(agents);
    let uids = vec!["1".to_string()];
    let results = client
        .call(
            &ctx("task-4"),
            "erase_node",
            "erase_node",
            &uids,
            json!({"reboot": true}),
            CheckMode::Enforce,
            Some(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sender, "1");
    assert_eq!(results[0].status_code, 2);
    assert_eq!(results[0].data.get("detail"), Some(&json!("scrub failed")));
}

#[tokio::test]
async fn mismatched_sender_counts_as_unreachable() {
    // The agent registered for uid "1" answers claiming to be node "999".
    let mut agents = HashMap::new();
    agents.insert(
        "1".to_string(),
        spawn_agent("999", 0, json!({"rebooted": true}), Duration::ZERO).await,
    );

    let coordinator = Coordinator::new(TcpFleetClient::new(agents), NoEngine, NoChecker);
    let report = coordinator
        .remove_nodes(Arc::new(CollectingReporter::new()), "task-5", &[NodeRef::new("1")])
        .await
        .unwrap();

    assert_eq!(report.status.as_deref(), Some("error"));
    assert!(report.nodes.is_empty());

    let error_nodes = report.error_nodes.unwrap();
    assert_eq!(error_nodes.len(), 1);
    assert_eq!(error_nodes[0].uid, "1");
    assert_eq!(error_nodes[0].error, "Node not answered by RPC.");
}

#[tokio::test]
async fn remove_nodes_reconciles_over_the_wire() {
    let mut agents = HashMap::new();
    agents.insert(
        "1".to_string(),
        spawn_agent("1", 0, json!({"rebooted": true}), Duration::ZERO).await,
    );
    agents.insert(
        "2".to_string(),
        spawn_agent("2", 1, json!({"detail": "wipe refused"}), Duration::ZERO).await,
    );

    let coordinator = Coordinator::new(TcpFleetClient::new(agents), NoEngine, NoChecker);
    let nodes = vec![NodeRef::new("1"), NodeRef::new("2"), NodeRef::new("3")];
    let report = coordinator
        .remove_nodes(Arc::new(CollectingReporter::new()), "task-3", &nodes)
        .await
        .unwrap();

    assert_eq!(report.status.as_deref(), Some("error"));
    assert_eq!(report.nodes, vec!["1"]);

    let error_nodes = report.error_nodes.unwrap();
    assert_eq!(error_nodes.len(), 2);
    assert_eq!(error_nodes[0].uid, "2");
    assert!(error_nodes[0]
        .error
        .starts_with("RPC agent 'erase_node' failed. Result:"));
    assert_eq!(error_nodes[1].uid, "3");
    assert_eq!(error_nodes[1].error, "Node not answered by RPC.");
}
