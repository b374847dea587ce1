//! Agent wire protocol
//!
//! Messages between the coordinator and agents are MessagePack-serialized
//! (rmp-serde) and framed with a 4-byte little-endian length prefix:
//!
//! ```text
//! [4 bytes: message length (little-endian u32)][N bytes: MessagePack message]
//! ```
//!
//! # Message Flow
//!
//! ```text
//! Coordinator                     Agent
//!     |                             |
//!     |-------- CALL -------------->|
//!     |                             |
//!     |<------- REPLY --------------|
//! ```
//!
//! One connection carries one call/reply exchange; the fan-out client opens a
//! connection per node per call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::{Error, Result};

/// Protocol version
///
/// Increment on breaking changes. Coordinator and agents must match.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single frame; larger frames are rejected before reading
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Protocol message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Method invocation (Coordinator -> Agent)
    Call(CallRequest),
    /// Method result (Agent -> Coordinator)
    Reply(CallReply),
}

/// Method invocation addressed to one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// Protocol version (must match on both ends)
    pub protocol_version: u32,
    /// Task identifier of the operation this call belongs to
    pub task_id: String,
    /// Agent service that owns the method
    pub service: String,
    /// Method to invoke
    pub method: String,
    /// Free-form method arguments
    pub args: Value,
}

/// Agent's answer to a call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReply {
    /// Protocol version
    pub protocol_version: u32,
    /// Uid of the answering node
    pub sender: String,
    /// Agent-reported status; zero means success
    pub status_code: i32,
    /// Method-specific response payload
    pub data: serde_json::Map<String, Value>,
}

/// Serialize a message with its length prefix
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>> {
    let body = rmp_serde::to_vec(msg)
        .map_err(|e| Error::Protocol(format!("failed to serialize message: {e}")))?;

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Deserialize one message from a buffer
///
/// Returns the message and the number of bytes consumed, length prefix
/// included.
fn decode_frame(buf: &[u8]) -> Result<(Message, usize)> {
    if buf.len() < 4 {
        return Err(Error::Protocol(format!(
            "buffer too small for frame length (need 4 bytes, got {})",
            buf.len()
        )));
    }

    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() < 4 + len {
        return Err(Error::Protocol(format!(
            "incomplete frame (need {} bytes, got {})",
            4 + len,
            buf.len()
        )));
    }

    let msg = rmp_serde::from_slice(&buf[4..4 + len])
        .map_err(|e| Error::Protocol(format!("failed to deserialize message: {e}")))?;
    Ok((msg, 4 + len))
}

/// Read one complete message from a TCP stream
pub async fn read_message(stream: &mut TcpStream) -> Result<Message> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| Error::Transport(format!("failed to read frame length: {e}")))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(Error::Protocol(format!(
            "frame too large: {len} bytes (max {MAX_FRAME_BYTES})"
        )));
    }

    let mut body = vec![0u8; len];
    stream
        .read_exact(&mut body)
        .await
        .map_err(|e| Error::Transport(format!("failed to read frame body: {e}")))?;

    rmp_serde::from_slice(&body)
        .map_err(|e| Error::Protocol(format!("failed to deserialize message: {e}")))
}

/// Write one message to a TCP stream and flush it
pub async fn write_message(stream: &mut TcpStream, msg: &Message) -> Result<()> {
    let framed = encode_frame(msg)?;
    stream
        .write_all(&framed)
        .await
        .map_err(|e| Error::Transport(format!("failed to write frame: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| Error::Transport(format!("failed to flush stream: {e}")))?;
    Ok(())
}
