//! Stored form of a crochet thread.

use super::edge::MemoryEdge;
use super::node::MemoryNode;
use super::thread::CrochetThread;
use crate::id::NodeId;
use crate::persist::PersistError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// The thread document written to storage.
///
/// `nodes` is a JSON object keyed by node id; entries are written and read in
/// insertion order so a reloaded thread linearizes ties identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadDocument {
    /// Thread identifier, also the storage key
    pub thread_id: String,

    /// Display name
    pub name: String,

    /// Every node, keyed by its id
    pub nodes: NodeMap,

    /// Edges in insertion order
    pub edges: Vec<MemoryEdge>,

    /// Characters that have spoken, sorted
    pub characters: Vec<String>,

    /// Nodes the next character response replies to
    pub current_context_nodes: Vec<NodeId>,
}

/// Ordered `node_id → node` object.
#[derive(Debug, Clone, Default)]
pub struct NodeMap(pub Vec<(String, MemoryNode)>);

impl Serialize for NodeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, node) in &self.0 {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NodeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeMapVisitor;

        impl<'de> Visitor<'de> for NodeMapVisitor {
            type Value = NodeMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of nodes keyed by id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NodeMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, MemoryNode>()? {
                    entries.push(entry);
                }
                Ok(NodeMap(entries))
            }
        }

        deserializer.deserialize_map(NodeMapVisitor)
    }
}

impl CrochetThread {
    /// Snapshot this thread as a storable document.
    pub fn to_document(&self) -> ThreadDocument {
        ThreadDocument {
            thread_id: self.thread_id().to_string(),
            name: self.name().to_string(),
            nodes: NodeMap(
                self.nodes()
                    .iter()
                    .map(|node| (node.id.to_string(), node.clone()))
                    .collect(),
            ),
            edges: self.edges().to_vec(),
            characters: self.characters().iter().cloned().collect(),
            current_context_nodes: self.current_context().to_vec(),
        }
    }

    /// Rebuild a thread from a document, replacing nothing partially.
    ///
    /// Fails when a node is filed under a key other than its id, an id
    /// repeats, or an edge or context entry points at a missing node.
    pub fn from_document(doc: ThreadDocument) -> Result<Self, PersistError> {
        let malformed = |reason: String| PersistError::Malformed {
            key: doc.thread_id.clone(),
            reason,
        };

        let mut known = HashSet::with_capacity(doc.nodes.0.len());
        for (key, node) in &doc.nodes.0 {
            if *key != node.id.to_string() {
                return Err(malformed(format!("node {} stored under key '{key}'", node.id)));
            }
            if !known.insert(node.id) {
                return Err(malformed(format!("duplicate node {}", node.id)));
            }
        }
        for edge in &doc.edges {
            if !known.contains(&edge.source_id) || !known.contains(&edge.target_id) {
                return Err(malformed(format!(
                    "edge {} -> {} references a missing node",
                    edge.source_id, edge.target_id
                )));
            }
        }
        if let Some(missing) = doc.current_context_nodes.iter().find(|id| !known.contains(*id)) {
            return Err(malformed(format!("context node {missing} is missing")));
        }

        Ok(CrochetThread::from_parts(
            doc.thread_id,
            doc.name,
            doc.nodes.0.into_iter().map(|(_, node)| node).collect(),
            doc.edges,
            doc.characters.into_iter().collect::<BTreeSet<_>>(),
            doc.current_context_nodes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CrochetThread {
        let mut thread = CrochetThread::new("thread_doc", "Doc Thread");
        thread.add_message("user", "What is entropy?", None);
        thread.add_character_response("theorist", "Entropy measures uncertainty.", None);
        thread.add_character_response("tutor", "Think of surprise.", None);
        thread.add_event("note", "side remark");
        thread
    }

    #[test]
    fn test_document_round_trip() {
        let thread = sample();
        let json = serde_json::to_string_pretty(&thread.to_document()).unwrap();
        let doc: ThreadDocument = serde_json::from_str(&json).unwrap();
        let restored = CrochetThread::from_document(doc).unwrap();

        assert_eq!(restored, thread);
        assert_eq!(restored.nodes(), thread.nodes());
        assert_eq!(restored.edges(), thread.edges());
    }

    #[test]
    fn test_document_field_names() {
        let value = serde_json::to_value(sample().to_document()).unwrap();
        for field in [
            "thread_id",
            "name",
            "nodes",
            "edges",
            "characters",
            "current_context_nodes",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["characters"], serde_json::json!(["theorist", "tutor"]));
    }

    #[test]
    fn test_dangling_edge_is_rejected() {
        let mut doc = sample().to_document();
        doc.edges.push(MemoryEdge::reply(NodeId::new(), NodeId::new()));
        let err = CrochetThread::from_document(doc).unwrap_err();
        assert!(matches!(err, PersistError::Malformed { .. }));
    }

    #[test]
    fn test_missing_context_node_is_rejected() {
        let mut doc = sample().to_document();
        doc.current_context_nodes = vec![NodeId::new()];
        assert!(CrochetThread::from_document(doc).is_err());
    }

    #[test]
    fn test_mismatched_key_is_rejected() {
        let mut doc = sample().to_document();
        doc.nodes.0[0].0 = NodeId::new().to_string();
        assert!(CrochetThread::from_document(doc).is_err());
    }

    #[test]
    fn test_missing_field_fails_to_parse() {
        let mut value = serde_json::to_value(sample().to_document()).unwrap();
        value.as_object_mut().unwrap().remove("current_context_nodes");
        assert!(serde_json::from_value::<ThreadDocument>(value).is_err());
    }
}
