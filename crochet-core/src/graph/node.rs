//! Nodes of the conversation graph.

use crate::id::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Author role of a message node.
///
/// Roles other than user and assistant are kept verbatim. They are stored in
/// the graph but never attached to context and never linearized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// A message typed by the human.
    User,
    /// A message produced by the assistant, usually on behalf of a character.
    Assistant,
    /// Any other role string.
    Other(String),
}

impl Role {
    /// The wire name of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(role) => role,
        }
    }

    /// Whether this role takes part in the linear conversation view.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(role),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A conversational message.
    Message {
        /// Who wrote it.
        role: Role,
        /// The speaking character, for assistant messages.
        character_id: Option<String>,
    },
    /// A non-message occurrence recorded in the thread.
    Event {
        /// Short machine-readable label.
        label: String,
    },
}

impl NodeKind {
    /// The `type` field used in stored documents.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Message { .. } => "message",
            NodeKind::Event { .. } => "event",
        }
    }
}

/// A node in the memory graph representing a message or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct MemoryNode {
    /// Unique identifier.
    pub id: NodeId,
    /// Opaque text payload.
    pub content: String,
    /// Message or event.
    pub kind: NodeKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Free-form attributes beyond the typed ones.
    pub attributes: Map<String, Value>,
}

impl MemoryNode {
    /// Create a message node stamped with the current time.
    pub fn message(role: Role, content: impl Into<String>, character_id: Option<String>) -> Self {
        Self {
            id: NodeId::new(),
            content: content.into(),
            kind: NodeKind::Message { role, character_id },
            timestamp: Utc::now(),
            attributes: Map::new(),
        }
    }

    /// Create an event node stamped with the current time.
    pub fn event(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            content: content.into(),
            kind: NodeKind::Event {
                label: label.into(),
            },
            timestamp: Utc::now(),
            attributes: Map::new(),
        }
    }

    /// Override the creation time (backdated or imported nodes).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach an extra attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The message role, if this is a message.
    pub fn role(&self) -> Option<&Role> {
        match &self.kind {
            NodeKind::Message { role, .. } => Some(role),
            NodeKind::Event { .. } => None,
        }
    }

    /// The speaking character, if any.
    pub fn character_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Message { character_id, .. } => character_id.as_deref(),
            NodeKind::Event { .. } => None,
        }
    }

    /// Check if this is an assistant message spoken by `character_id`.
    pub fn is_response_from(&self, character_id: &str) -> bool {
        matches!(self.role(), Some(Role::Assistant)) && self.character_id() == Some(character_id)
    }

    /// Check if this node belongs in the linear conversation view.
    pub fn is_conversational(&self) -> bool {
        self.role().is_some_and(Role::is_conversational)
    }
}

/// Error decoding a stored node.
#[derive(Debug, Error)]
#[error("node {id}: {reason}")]
pub struct NodeDecodeError {
    id: NodeId,
    reason: String,
}

/// Stored shape of a node: `{id, content, type, timestamp, metadata}`.
#[derive(Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    content: String,
    #[serde(rename = "type")]
    node_type: String,
    timestamp: DateTime<Utc>,
    metadata: Map<String, Value>,
}

impl From<MemoryNode> for NodeRecord {
    fn from(node: MemoryNode) -> Self {
        let node_type = node.kind.type_name().to_string();
        let mut metadata = node.attributes;
        match node.kind {
            NodeKind::Message { role, character_id } => {
                metadata.insert("role".to_string(), Value::String(role.into()));
                if let Some(character_id) = character_id {
                    metadata.insert("character_id".to_string(), Value::String(character_id));
                }
            }
            NodeKind::Event { label } => {
                metadata.insert("label".to_string(), Value::String(label));
            }
        }

        Self {
            id: node.id,
            content: node.content,
            node_type,
            timestamp: node.timestamp,
            metadata,
        }
    }
}

impl TryFrom<NodeRecord> for MemoryNode {
    type Error = NodeDecodeError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let fail = |reason: &str| NodeDecodeError {
            id,
            reason: reason.to_string(),
        };

        let mut metadata = record.metadata;
        let kind = match record.node_type.as_str() {
            "message" => {
                let role = match metadata.remove("role") {
                    Some(Value::String(role)) => Role::from(role),
                    Some(_) => return Err(fail("role is not a string")),
                    None => return Err(fail("message has no role")),
                };
                let character_id = match metadata.remove("character_id") {
                    Some(Value::String(character_id)) => Some(character_id),
                    Some(Value::Null) | None => None,
                    Some(_) => return Err(fail("character_id is not a string")),
                };
                NodeKind::Message { role, character_id }
            }
            "event" => match metadata.remove("label") {
                Some(Value::String(label)) => NodeKind::Event { label },
                _ => return Err(fail("event has no label")),
            },
            other => return Err(fail(&format!("unknown node type '{other}'"))),
        };

        Ok(Self {
            id,
            content: record.content,
            kind,
            timestamp: record.timestamp,
            attributes: metadata,
        })
    }
}
