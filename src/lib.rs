//! Provisor - Fleet provisioning coordination façade
//!
//! Provisor dispatches fleet-wide operations (type discovery, deployment,
//! removal, network verification) to a set of remote provisioning agents over
//! an RPC fabric and reconciles the per-node responses - including nodes that
//! never respond - into a single aggregate result.
//!
//! # Architecture
//!
//! - **Coordinator façade**: four fleet operations, one execution context each
//! - **Fleet RPC client**: fan-out call to N agents bounded by a deadline
//! - **Reconciler**: classifies every requested node as succeeded, failed, or
//!   unreachable with explicit partial-failure semantics
//! - **Pluggable collaborators**: deployment engine and network checker are
//!   capability traits selected at coordinator construction time

pub mod config;
pub mod context;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod network;
pub mod node;
pub mod reconcile;
pub mod rpc;

// Re-export commonly used types
pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use node::NodeRef;
pub use reconcile::RemovalReport;
