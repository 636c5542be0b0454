//! Core topology data structures.

use ax_core::{BodyId, ElemId, JointId, NodeId};
use nalgebra::{UnitQuaternion, Vector3};

/// Structural node in its reference configuration.
///
/// `orientation` maps the node material frame to the global frame; the
/// material x axis runs along the beam.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

/// Whether a body deforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Elastic beam body.
    Flexible,
    /// Beam body with stiffness scaled up until deformation is negligible.
    Rigid,
}

/// A body groups elements that move together (wing, blade, fuselage...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub kind: BodyKind,
}

/// Two-node beam element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElemId,
    pub body: BodyId,
    /// End nodes: [start, end].
    pub nodes: [NodeId; 2],
    /// Index into the structural model's section table.
    pub section: usize,
}

impl Element {
    pub fn start(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn end(&self) -> NodeId {
        self.nodes[1]
    }
}

/// Kinematic constraint type between two coincident nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Shared position, free relative rotation.
    Spherical,
    /// Shared position, relative rotation only about `axis`.
    Hinge { axis: Vector3<f64> },
    /// Shared position, relative rotation about `axis` imposed by a schedule.
    Prescribed { axis: Vector3<f64> },
}

impl JointKind {
    /// Number of scalar constraint equations (= Lagrange multipliers).
    pub fn constraint_count(&self) -> usize {
        match self {
            JointKind::Spherical => 3,
            JointKind::Hinge { .. } => 5,
            JointKind::Prescribed { .. } => 6,
        }
    }

    /// Rotation axis in the global reference frame, if any.
    pub fn axis(&self) -> Option<Vector3<f64>> {
        match self {
            JointKind::Spherical => None,
            JointKind::Hinge { axis } | JointKind::Prescribed { axis } => Some(*axis),
        }
    }
}

/// Joint connecting node `nodes[0]` (parent side) to `nodes[1]` (child side).
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub name: String,
    pub kind: JointKind,
    pub nodes: [NodeId; 2],
}

/// The topology: a validated, immutable collection of nodes, bodies,
/// elements and joints.
///
/// Stores compact adjacency (node → incident elements, node → incident
/// joints) as offset arrays. Every collection is indexed by its IDs.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) bodies: Vec<Body>,
    pub(crate) elements: Vec<Element>,
    pub(crate) joints: Vec<Joint>,

    /// Node i's elements are in node_elems[node_elem_offsets[i]..node_elem_offsets[i+1]].
    pub(crate) node_elem_offsets: Vec<usize>,
    pub(crate) node_elems: Vec<ElemId>,

    pub(crate) node_joint_offsets: Vec<usize>,
    pub(crate) node_joints: Vec<JointId>,
}

impl Topology {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.idx())
    }

    pub fn element(&self, id: ElemId) -> Option<&Element> {
        self.elements.get(id.idx())
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.idx())
    }

    /// Elements incident to a node, in ascending ID order.
    pub fn node_elements(&self, node: NodeId) -> &[ElemId] {
        let idx = node.idx();
        if idx >= self.nodes.len() {
            return &[];
        }
        &self.node_elems[self.node_elem_offsets[idx]..self.node_elem_offsets[idx + 1]]
    }

    /// Joints incident to a node, in ascending ID order.
    pub fn node_joints(&self, node: NodeId) -> &[JointId] {
        let idx = node.idx();
        if idx >= self.nodes.len() {
            return &[];
        }
        &self.node_joints[self.node_joint_offsets[idx]..self.node_joint_offsets[idx + 1]]
    }

    /// Reference length of an element.
    pub fn element_length(&self, id: ElemId) -> Option<f64> {
        let e = self.element(id)?;
        let a = self.node(e.start())?;
        let b = self.node(e.end())?;
        Some((b.position - a.position).norm())
    }

    /// Whether the element belongs to a rigid body.
    pub fn is_rigid(&self, id: ElemId) -> bool {
        self.element(id)
            .and_then(|e| self.body(e.body))
            .is_some_and(|b| b.kind == BodyKind::Rigid)
    }

    /// Element joining two nodes, in either direction.
    pub fn element_between(&self, a: NodeId, b: NodeId) -> Option<ElemId> {
        self.node_elements(a)
            .iter()
            .copied()
            .find(|&e| self.elements[e.idx()].nodes.contains(&b))
    }
}
