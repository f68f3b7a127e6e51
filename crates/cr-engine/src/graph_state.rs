//! Runtime state for audio graph traversal.

use cr_ir::{AudioGraph, NodeId};

/// Precomputed traversal data for rendering a graph one frame at a time.
pub struct GraphState {
    /// Traversal order: every node appears after all of its inputs.
    pub topo_order: Vec<NodeId>,
    /// Input node IDs for each node (indexed by NodeId).
    pub inputs: Vec<Vec<NodeId>>,
    /// Output sample of each node for the current frame (indexed by NodeId).
    pub outputs: Vec<f32>,
}

impl GraphState {
    /// Build graph state from an AudioGraph, computing the traversal order.
    pub fn from_graph(graph: &AudioGraph) -> Self {
        let n = graph.nodes.len();
        let mut inputs = vec![Vec::new(); n];
        for conn in &graph.connections {
            if (conn.to as usize) < n && (conn.from as usize) < n {
                inputs[conn.to as usize].push(conn.from);
            }
        }
        Self {
            topo_order: topological_sort(graph),
            inputs,
            outputs: vec![0.0; n],
        }
    }

    /// Sum of the current outputs feeding `node`.
    pub fn gather(&self, node: NodeId) -> f32 {
        self.inputs[node as usize]
            .iter()
            .map(|&src| self.outputs[src as usize])
            .sum()
    }
}

/// Topological sort via Kahn's algorithm.
///
/// Returns nodes ordered so that every source appears before its
/// consumers; the destination comes last for a graph that feeds it.
/// Nodes on a cycle are left out and never rendered.
pub fn topological_sort(graph: &AudioGraph) -> Vec<NodeId> {
    let n = graph.nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let mut in_degree = vec![0u32; n];
    let mut successors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    for conn in &graph.connections {
        if (conn.to as usize) < n && (conn.from as usize) < n {
            in_degree[conn.to as usize] += 1;
            successors[conn.from as usize].push(conn.to);
        }
    }

    let mut queue: Vec<NodeId> = (0..n as NodeId)
        .filter(|&id| in_degree[id as usize] == 0)
        .collect();
    let mut result = Vec::with_capacity(n);

    while let Some(node_id) = queue.pop() {
        result.push(node_id);
        for &next in &successors[node_id as usize] {
            in_degree[next as usize] -= 1;
            if in_degree[next as usize] == 0 {
                queue.push(next);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_ir::{NodeType, Waveform, DESTINATION};

    fn osc() -> NodeType {
        NodeType::Oscillator { waveform: Waveform::Sine, frequency: 220.0 }
    }

    #[test]
    fn destination_only_graph() {
        let graph = AudioGraph::with_destination();
        assert_eq!(topological_sort(&graph), vec![DESTINATION]);
    }

    #[test]
    fn chain_topology() {
        // osc -> gain -> master -> destination
        let mut graph = AudioGraph::with_destination();
        let master = graph.add_node(NodeType::Gain);
        let gain = graph.add_node(NodeType::Gain);
        let source = graph.add_node(osc());
        graph.connect(master, DESTINATION);
        graph.connect(source, gain);
        graph.connect(gain, master);

        let order = topological_sort(&graph);
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos(source) < pos(gain));
        assert!(pos(gain) < pos(master));
        assert!(pos(master) < pos(DESTINATION));
    }

    #[test]
    fn cycle_members_are_skipped() {
        let mut graph = AudioGraph::with_destination();
        let a = graph.add_node(NodeType::Gain);
        let b = graph.add_node(NodeType::Gain);
        graph.connect(a, b);
        graph.connect(b, a);
        graph.connect(b, DESTINATION);

        let order = topological_sort(&graph);
        assert!(!order.contains(&a));
        assert!(!order.contains(&b));
    }

    #[test]
    fn gather_sums_inputs() {
        let mut graph = AudioGraph::with_destination();
        let a = graph.add_node(osc());
        let b = graph.add_node(osc());
        graph.connect(a, DESTINATION);
        graph.connect(b, DESTINATION);

        let mut state = GraphState::from_graph(&graph);
        state.outputs[a as usize] = 0.25;
        state.outputs[b as usize] = 0.5;
        assert!((state.gather(DESTINATION) - 0.75).abs() < 1e-6);
        assert_eq!(state.gather(a), 0.0);
    }
}
