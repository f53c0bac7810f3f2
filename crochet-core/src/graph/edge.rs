//! Directed relationships between nodes.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default edge weight.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Kind of relationship an edge expresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    /// The target answers the source.
    #[default]
    Reply,
    /// Any other relationship label.
    Other(String),
}

impl EdgeType {
    /// The wire name of the edge type.
    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Reply => "reply",
            EdgeType::Other(label) => label,
        }
    }
}

impl From<&str> for EdgeType {
    fn from(label: &str) -> Self {
        match label {
            "reply" => EdgeType::Reply,
            other => EdgeType::Other(other.to_string()),
        }
    }
}

impl From<String> for EdgeType {
    fn from(label: String) -> Self {
        if label == "reply" {
            EdgeType::Reply
        } else {
            EdgeType::Other(label)
        }
    }
}

impl From<EdgeType> for String {
    fn from(edge_type: EdgeType) -> Self {
        match edge_type {
            EdgeType::Reply => "reply".to_string(),
            EdgeType::Other(label) => label,
        }
    }
}

/// A directed edge between two nodes of the same thread.
///
/// Edges hold identifiers only; the owning thread guarantees both endpoints
/// existed when the edge was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEdge {
    /// Node the relationship starts from.
    pub source_id: NodeId,
    /// Node the relationship points to.
    pub target_id: NodeId,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Relevance weight, not consumed by current queries.
    pub weight: f64,
    /// Free-form attributes.
    #[serde(rename = "metadata")]
    pub attributes: Map<String, Value>,
}

impl MemoryEdge {
    /// Create an edge with the default weight.
    pub fn new(source_id: NodeId, target_id: NodeId, edge_type: EdgeType) -> Self {
        Self {
            source_id,
            target_id,
            edge_type,
            weight: DEFAULT_WEIGHT,
            attributes: Map::new(),
        }
    }

    /// Create a reply edge.
    pub fn reply(source_id: NodeId, target_id: NodeId) -> Self {
        Self::new(source_id, target_id, EdgeType::Reply)
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Check if this edge touches a node.
    pub fn involves(&self, node_id: NodeId) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}
