//! Kern datastructuren voor het modelleren van de riggraph.

use std::collections::HashMap;
use std::fmt;

pub mod evaluator;
pub mod node;
pub mod topo;
pub mod value;
pub mod wire;

use node::{Node, NodeId};
use wire::Wire;

/// Graph-container met indices voor snelle lookups.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    wires: Vec<Wire>,
    node_index: HashMap<NodeId, usize>,
    name_index: HashMap<String, Vec<NodeId>>,
    next_id: usize,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een node toe aan de graph. Als `node.id` niet gezet is, wordt een
    /// nieuw id uitgegeven.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        let id = if node.id == NodeId::default() {
            let assigned = NodeId::new(self.next_id);
            self.next_id += 1;
            node.id = assigned;
            assigned
        } else {
            self.next_id = self.next_id.max(node.id.0 + 1);
            node.id
        };

        if self.node_index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }

        let idx = self.nodes.len();
        self.node_index.insert(id, idx);

        if let Some(name) = node.name.as_deref() {
            self.index_name(id, name);
        }
        if let Some(nickname) = node.nickname.as_deref() {
            self.index_name(id, nickname);
        }

        self.nodes.push(node);
        Ok(id)
    }

    /// Voeg een verbinding toe tussen twee bestaande nodes.
    pub fn add_wire(&mut self, wire: Wire) -> Result<(), GraphError> {
        if !self.node_index.contains_key(&wire.from_node) {
            return Err(GraphError::UnknownNode(wire.from_node));
        }
        if !self.node_index.contains_key(&wire.to_node) {
            return Err(GraphError::UnknownNode(wire.to_node));
        }

        self.wires.push(wire);
        Ok(())
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index
            .get(&id)
            .and_then(|idx| self.nodes.get(*idx))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.node_index
            .get(&id)
            .copied()
            .and_then(move |idx| self.nodes.get_mut(idx))
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Nodes waarvan naam of nickname overeenkomt (hoofdletterongevoelig).
    #[must_use]
    pub fn nodes_with_name(&self, name: &str) -> Option<&[NodeId]> {
        self.name_index
            .get(&normalize_name(name))
            .map(|ids| ids.as_slice())
    }

    /// Alle geregistreerde (genormaliseerde) namen, voor suggesties bij
    /// lookup-fouten.
    #[must_use]
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.name_index.keys().map(String::as_str)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    fn index_name(&mut self, id: NodeId, name: &str) {
        let key = normalize_name(name);
        self.name_index.entry(key).or_default().push(id);
    }
}

/// Fouten die kunnen optreden bij het opbouwen van de graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode(NodeId),
    UnknownNode(NodeId),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode(id) => write!(f, "node {:?} bestaat al in de graph", id.0),
            Self::UnknownNode(id) => write!(f, "node {:?} niet gevonden in graph", id.0),
        }
    }
}

impl std::error::Error for GraphError {}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
