//! Audio graph topology.

use alloc::vec::Vec;

/// Node identifier in the audio graph.
pub type NodeId = u16;

/// The node every graph routes into (the physical output).
pub const DESTINATION: NodeId = 0;

/// The audio processing graph.
#[derive(Clone, Debug, Default)]
pub struct AudioGraph {
    /// All nodes in the graph
    pub nodes: Vec<Node>,
    /// Connections between nodes
    pub connections: Vec<Connection>,
}

impl AudioGraph {
    /// Create a graph with just the destination node.
    pub fn with_destination() -> Self {
        Self {
            nodes: alloc::vec![Node {
                id: DESTINATION,
                node_type: NodeType::Destination,
            }],
            connections: Vec::new(),
        }
    }

    /// Add a node and return its ID.
    pub fn add_node(&mut self, node_type: NodeType) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node { id, node_type });
        id
    }

    /// Connect two nodes.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.connections.push(Connection { from, to });
    }

    /// Remove every connection into or out of `id`.
    pub fn disconnect(&mut self, id: NodeId) {
        self.connections.retain(|c| c.from != id && c.to != id);
    }

    /// Drop everything except the destination node.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.connections.clear();
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Number of nodes, destination included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A node in the audio graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// What type of node this is
    pub node_type: NodeType,
}

/// Oscillator wave shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Type of audio graph node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    /// Physical output
    Destination,
    /// Multiplies its summed inputs by an automatable gain
    Gain,
    /// Periodic tone source
    Oscillator { waveform: Waveform, frequency: f32 },
    /// Plays a sample buffer, optionally looped
    BufferSource { looped: bool },
}

impl NodeType {
    /// Whether the node produces sound on its own and can be started.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeType::Oscillator { .. } | NodeType::BufferSource { .. })
    }

    /// Short display label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Destination => "Destination",
            NodeType::Gain => "Gain",
            NodeType::Oscillator { waveform: Waveform::Sine, .. } => "Sine",
            NodeType::Oscillator { waveform: Waveform::Triangle, .. } => "Triangle",
            NodeType::BufferSource { .. } => "Buffer",
        }
    }
}

/// Connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    /// Source node
    pub from: NodeId,
    /// Destination node
    pub to: NodeId,
}
