//! Degree-of-freedom indexing for the structural solver.
//!
//! Layout of the global unknown vector:
//! - 6 DOFs per free node (3 translation increments, 3 rotation-vector
//!   increments), in node order
//! - one Lagrange multiplier block per joint (3 spherical, 5 hinge,
//!   6 prescribed), in joint order
//!
//! Nodes whose motion is prescribed carry no DOFs. The layout is fixed once
//! built, so the DOF count never changes during a simulation.

use ax_core::{JointId, NodeId};

use crate::error::{TopologyError, TopologyResult};
use crate::topology::Topology;

/// DOFs per free structural node.
pub const NODE_DOFS: usize = 6;

/// Contiguous solver indices for nodes and joint multipliers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofMap {
    /// First DOF of each node (None if prescribed).
    node_offset: Vec<Option<usize>>,
    /// Free nodes in DOF order.
    free_nodes: Vec<NodeId>,
    /// (first multiplier index, count) per joint.
    joint_block: Vec<(usize, usize)>,
    node_dofs: usize,
    total: usize,
}

impl DofMap {
    /// Build a DOF map; `prescribed` lists nodes removed from the unknowns.
    pub fn new(topology: &Topology, prescribed: &[NodeId]) -> Self {
        let mut node_offset = Vec::with_capacity(topology.nodes().len());
        let mut free_nodes = Vec::new();
        let mut next = 0;
        for node in topology.nodes() {
            if prescribed.contains(&node.id) {
                node_offset.push(None);
            } else {
                node_offset.push(Some(next));
                free_nodes.push(node.id);
                next += NODE_DOFS;
            }
        }
        let node_dofs = next;

        let mut joint_block = Vec::with_capacity(topology.joints().len());
        for joint in topology.joints() {
            let count = joint.kind.constraint_count();
            joint_block.push((next, count));
            next += count;
        }

        Self {
            node_offset,
            free_nodes,
            joint_block,
            node_dofs,
            total: next,
        }
    }

    /// Total number of unknowns (node DOFs + multipliers).
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of node DOFs (multipliers excluded).
    pub fn node_dof_count(&self) -> usize {
        self.node_dofs
    }

    /// Number of Lagrange multipliers.
    pub fn multiplier_count(&self) -> usize {
        self.total - self.node_dofs
    }

    /// First DOF of a node, or `None` if the node is prescribed.
    pub fn node_offset(&self, id: NodeId) -> TopologyResult<Option<usize>> {
        self.node_offset
            .get(id.idx())
            .copied()
            .ok_or(TopologyError::IdNotFound { what: "NodeId" })
    }

    /// Whether a node carries DOFs.
    pub fn is_free(&self, id: NodeId) -> bool {
        matches!(self.node_offset.get(id.idx()), Some(Some(_)))
    }

    /// Free nodes in DOF order.
    pub fn free_nodes(&self) -> &[NodeId] {
        &self.free_nodes
    }

    /// Multiplier block (start, count) of a joint.
    pub fn joint_block(&self, id: JointId) -> TopologyResult<(usize, usize)> {
        self.joint_block
            .get(id.idx())
            .copied()
            .ok_or(TopologyError::IdNotFound { what: "JointId" })
    }
}
