//! The crochet thread: a conversation stored as a directed graph.

use super::edge::{EdgeType, MemoryEdge};
use super::node::{MemoryNode, Role};
use crate::id::NodeId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// Position of a node in the thread's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeIndex(usize);

/// One entry of the linear conversation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearMessage {
    /// Source node.
    pub id: NodeId,
    /// User or assistant.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Speaking character, for assistant messages.
    pub character_id: Option<String>,
    /// Creation time of the node.
    pub timestamp: DateTime<Utc>,
}

impl LinearMessage {
    fn from_node(node: &MemoryNode) -> Option<Self> {
        let role = node.role().filter(|role| role.is_conversational())?;
        Some(Self {
            id: node.id,
            role: role.clone(),
            content: node.content.clone(),
            character_id: node.character_id().map(str::to_string),
            timestamp: node.timestamp,
        })
    }
}

/// A nonlinear conversation thread.
///
/// Instead of a linear message log, every message is a node and every reply
/// relationship is an edge, so several characters can answer the same prompt
/// in parallel branches. Nodes live in an arena; edges are append-only and an
/// outgoing adjacency list is kept in step with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrochetThread {
    thread_id: String,
    name: String,
    nodes: Vec<MemoryNode>,
    index: HashMap<NodeId, NodeIndex>,
    edges: Vec<MemoryEdge>,
    /// Outgoing targets per node, in edge insertion order.
    outgoing: Vec<Vec<NodeIndex>>,
    characters: BTreeSet<String>,
    current_context: Vec<NodeId>,
}

impl CrochetThread {
    /// Create an empty thread.
    pub fn new(thread_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rebuild a thread from stored parts.
    ///
    /// Callers are responsible for having checked that every edge endpoint
    /// and context id refers to one of `nodes`.
    pub(crate) fn from_parts(
        thread_id: String,
        name: String,
        nodes: Vec<MemoryNode>,
        edges: Vec<MemoryEdge>,
        characters: BTreeSet<String>,
        current_context: Vec<NodeId>,
    ) -> Self {
        let mut thread = Self::new(thread_id, name);
        for node in nodes {
            thread.insert_node(node);
        }
        for edge in edges {
            thread.push_edge(edge);
        }
        thread.characters.extend(characters);
        thread.current_context = current_context;
        thread
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The thread identifier used as storage key.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.index.get(&id).map(|idx| &self.nodes[idx.0])
    }

    /// Check whether a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    /// All edges, in creation order.
    pub fn edges(&self) -> &[MemoryEdge] {
        &self.edges
    }

    /// Characters that have spoken in this thread.
    pub fn characters(&self) -> &BTreeSet<String> {
        &self.characters
    }

    /// Nodes new assistant replies attach to.
    pub fn current_context(&self) -> &[NodeId] {
        &self.current_context
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert a node without connecting it.
    ///
    /// Assistant messages register their character. A node whose id is
    /// already present replaces the stored node in place, keeping its edges.
    pub fn insert_node(&mut self, node: MemoryNode) -> NodeId {
        let id = node.id;
        if let (Some(Role::Assistant), Some(character_id)) = (node.role(), node.character_id()) {
            self.characters.insert(character_id.to_string());
        }

        match self.index.get(&id) {
            Some(idx) => self.nodes[idx.0] = node,
            None => {
                self.index.insert(id, NodeIndex(self.nodes.len()));
                self.nodes.push(node);
                self.outgoing.push(Vec::new());
            }
        }
        id
    }

    /// Add a message as a new node.
    ///
    /// Assistant messages are connected from every node of the current
    /// context. A user message becomes the sole context node. Any other role
    /// is stored unconnected.
    pub fn add_message(
        &mut self,
        role: impl Into<Role>,
        content: impl Into<String>,
        character_id: Option<&str>,
    ) -> NodeId {
        let role = role.into();
        let character_id = match (&role, character_id) {
            (Role::Assistant, Some(id)) if !id.is_empty() => Some(id.to_string()),
            _ => None,
        };

        let node_id = self.insert_node(MemoryNode::message(role.clone(), content, character_id));
        debug!(thread = %self.thread_id, node = %node_id, role = %role, "added message");

        match role {
            Role::Assistant => {
                let context = self.current_context.clone();
                for context_id in context {
                    self.connect(context_id, node_id, EdgeType::Reply);
                }
            }
            Role::User => self.current_context = vec![node_id],
            Role::Other(_) => {}
        }

        node_id
    }

    /// Add a character's response.
    ///
    /// The response is connected from `context_node_ids`, or from the current
    /// context when none are given. Unknown context ids are skipped. The
    /// context pointer itself is left untouched.
    pub fn add_character_response(
        &mut self,
        character_id: &str,
        content: impl Into<String>,
        context_node_ids: Option<&[NodeId]>,
    ) -> NodeId {
        let node = MemoryNode::message(Role::Assistant, content, Some(character_id.to_string()));
        let node_id = self.insert_node(node);
        debug!(thread = %self.thread_id, node = %node_id, character = character_id, "added character response");

        let connect_to = match context_node_ids {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => self.current_context.clone(),
        };
        for context_id in connect_to {
            self.connect(context_id, node_id, EdgeType::Reply);
        }

        node_id
    }

    /// Add an event node. Events carry no edges and stay out of the linear view.
    pub fn add_event(&mut self, label: impl Into<String>, content: impl Into<String>) -> NodeId {
        self.insert_node(MemoryNode::event(label, content))
    }

    /// Connect two existing nodes.
    ///
    /// Returns `false` without creating anything when either endpoint is
    /// unknown.
    pub fn connect(&mut self, source: NodeId, target: NodeId, edge_type: EdgeType) -> bool {
        if !(self.contains(source) && self.contains(target)) {
            debug!(thread = %self.thread_id, %source, %target, "skipping edge to unknown node");
            return false;
        }
        self.push_edge(MemoryEdge::new(source, target, edge_type));
        true
    }

    fn push_edge(&mut self, edge: MemoryEdge) {
        if let (Some(&source), Some(&target)) =
            (self.index.get(&edge.source_id), self.index.get(&edge.target_id))
        {
            self.outgoing[source.0].push(target);
            self.edges.push(edge);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get snapshots of every response a character gave, in insertion order.
    pub fn get_character_responses(&self, character_id: &str) -> Vec<MemoryNode> {
        self.nodes
            .iter()
            .filter(|node| node.is_response_from(character_id))
            .cloned()
            .collect()
    }

    /// Find the shortest directed path between two nodes.
    ///
    /// Breadth-first over edges in creation order, so among equally short
    /// paths the one discovered first wins. Returns an empty path when either
    /// node is unknown or `end` is unreachable.
    pub fn get_conversation_path(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let (Some(&start_idx), Some(&end_idx)) = (self.index.get(&start), self.index.get(&end))
        else {
            return Vec::new();
        };

        let mut parent: Vec<Option<NodeIndex>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([start_idx]);
        visited[start_idx.0] = true;

        while let Some(current) = queue.pop_front() {
            if current == end_idx {
                let mut path = vec![self.nodes[current.0].id];
                let mut cursor = current;
                while let Some(prev) = parent[cursor.0] {
                    path.push(self.nodes[prev.0].id);
                    cursor = prev;
                }
                path.reverse();
                return path;
            }

            for &next in &self.outgoing[current.0] {
                if !visited[next.0] {
                    visited[next.0] = true;
                    parent[next.0] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        Vec::new()
    }

    /// Flatten the graph into a chronological conversation.
    ///
    /// Only user and assistant messages are included. Nodes with equal
    /// timestamps keep their insertion order.
    pub fn get_linear_conversation(&self) -> Vec<LinearMessage> {
        let mut messages: Vec<LinearMessage> =
            self.nodes.iter().filter_map(LinearMessage::from_node).collect();
        messages.sort_by_key(|message| message.timestamp);
        messages
    }

    /// The linear conversation, optionally narrowed to one character's voice.
    ///
    /// User messages are always kept; assistant messages are kept only when
    /// they come from `character_id`.
    pub fn conversation_history(&self, character_id: Option<&str>) -> Vec<LinearMessage> {
        let messages = self.get_linear_conversation();
        match character_id {
            None => messages,
            Some(character_id) => messages
                .into_iter()
                .filter(|m| m.role != Role::Assistant || m.character_id.as_deref() == Some(character_id))
                .collect(),
        }
    }
}
