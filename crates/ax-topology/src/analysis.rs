//! Connectivity analysis of the multibody graph.
//!
//! Nodes are graph vertices; elements and joints are undirected edges.

use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::UnGraph;

use crate::topology::Topology;

/// Edge type in the connectivity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Element,
    Joint,
}

/// Summary of how the multibody system hangs together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connectivity {
    /// Number of disconnected assemblies.
    pub components: usize,
    /// True if elements and joints close a kinematic loop.
    pub closed_loop: bool,
    /// Number of joint edges.
    pub joints: usize,
}

fn to_graph(topology: &Topology) -> UnGraph<(), Link> {
    let mut graph = UnGraph::with_capacity(
        topology.nodes().len(),
        topology.elements().len() + topology.joints().len(),
    );
    let vertices: Vec<_> = topology.nodes().iter().map(|_| graph.add_node(())).collect();
    for e in topology.elements() {
        graph.add_edge(vertices[e.start().idx()], vertices[e.end().idx()], Link::Element);
    }
    for j in topology.joints() {
        graph.add_edge(vertices[j.nodes[0].idx()], vertices[j.nodes[1].idx()], Link::Joint);
    }
    graph
}

/// Analyze the connectivity of a validated topology.
pub fn analyze(topology: &Topology) -> Connectivity {
    let graph = to_graph(topology);
    Connectivity {
        components: connected_components(&graph),
        closed_loop: is_cyclic_undirected(&graph),
        joints: graph
            .edge_weights()
            .filter(|&&w| w == Link::Joint)
            .count(),
    }
}
