//! Error taxonomy for coordinator operations
//!
//! Partial failure is data, not an error: a node that never answers a fan-out
//! call is folded into the operation's result as unreachable and never
//! surfaces here. The variants below cover the cases that do terminate a call
//! abnormally - caller contract violations, catastrophic transport faults,
//! and failures of the pluggable collaborators.

use thiserror::Error;

/// Result type used throughout provisor
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller passed an empty node list to an operation that requires one.
    /// Fatal and never retried.
    #[error("Nodes to deploy are not provided!")]
    EmptyNodeList,

    /// The fan-out transport failed as a whole. Individual node non-response
    /// is represented by absence from the result list, never by this variant.
    #[error("fleet RPC transport failure: {0}")]
    Transport(String),

    /// Wire-level frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Fleet inventory could not be loaded or parsed.
    #[error("fleet config error: {0}")]
    Config(String),

    /// The deployment engine reported a failure.
    #[error("deployment failed: {0}")]
    Deploy(String),

    /// The network checker reported a failure.
    #[error("network verification failed: {0}")]
    Network(String),
}
