//! Target node identity
//!
//! Node documents arrive from upstream systems that are sloppy about uid
//! types: the same field may carry `42` or `"42"`. Uids are compared and
//! hashed as strings throughout the coordinator, so normalization happens
//! once, at deserialization time.

use serde::{Deserialize, Deserializer, Serialize};

/// Minimal identity of a target node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Unique node identifier, always a string regardless of input type
    #[serde(deserialize_with = "uid_from_number_or_string")]
    pub uid: String,
}

impl NodeRef {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// Extract the normalized uid list from a node set
pub fn uids(nodes: &[NodeRef]) -> Vec<String> {
    nodes.iter().map(|n| n.uid.clone()).collect()
}

fn uid_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_from_string() {
        let node: NodeRef = serde_json::from_str(r#"{"uid": "7"}"#).unwrap();
        assert_eq!(node.uid, "7");
    }

    #[test]
    fn test_uid_from_number() {
        let node: NodeRef = serde_json::from_str(r#"{"uid": 7}"#).unwrap();
        assert_eq!(node.uid, "7");
    }

    #[test]
    fn test_uids_preserve_order() {
        let nodes = vec![NodeRef::new("3"), NodeRef::new("1"), NodeRef::new("2")];
        assert_eq!(uids(&nodes), vec!["3", "1", "2"]);
    }
}
