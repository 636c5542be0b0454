//! Incremental topology builder.

use ax_core::{BodyId, ElemId, Id, JointId, NodeId};
use nalgebra::{UnitQuaternion, Vector3};

use crate::error::TopologyResult;
use crate::topology::{Body, BodyKind, Element, Joint, JointKind, Node, Topology};
use crate::validate;

/// Builder for constructing a topology incrementally.
///
/// Use `add_node`, `add_element` and `add_joint` to build up the multibody
/// system, then call `build()` to validate and freeze it into an immutable
/// `Topology`.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    bodies: Vec<Body>,
    elements: Vec<Element>,
    joints: Vec<Joint>,
}

impl TopologyBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body and return its ID.
    pub fn add_body(&mut self, name: impl Into<String>, kind: BodyKind) -> BodyId {
        let id = Id::from_usize(self.bodies.len());
        self.bodies.push(Body {
            id,
            name: name.into(),
            kind,
        });
        id
    }

    /// Add a node at its reference position and orientation.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        position: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
    ) -> NodeId {
        let id = Id::from_usize(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.into(),
            position,
            orientation,
        });
        id
    }

    /// Add a two-node beam element using section `section`.
    pub fn add_element(
        &mut self,
        body: BodyId,
        start: NodeId,
        end: NodeId,
        section: usize,
    ) -> ElemId {
        let id = Id::from_usize(self.elements.len());
        self.elements.push(Element {
            id,
            body,
            nodes: [start, end],
            section,
        });
        id
    }

    /// Add a joint between two coincident nodes.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        kind: JointKind,
        parent: NodeId,
        child: NodeId,
    ) -> JointId {
        let id = Id::from_usize(self.joints.len());
        self.joints.push(Joint {
            id,
            name: name.into(),
            kind,
            nodes: [parent, child],
        });
        id
    }

    /// Discretize a straight beam from an existing node to `end` into
    /// `n_elements` equal elements sharing `orientation`.
    ///
    /// Returns every node along the beam, `start` included.
    pub fn add_straight_beam(
        &mut self,
        body: BodyId,
        start: NodeId,
        end: Vector3<f64>,
        n_elements: usize,
        section: usize,
    ) -> Vec<NodeId> {
        let Some(first) = self.nodes.get(start.idx()) else {
            return vec![start];
        };
        let origin = first.position;
        let orientation = first.orientation;
        let prefix = self
            .bodies
            .get(body.idx())
            .map_or_else(|| "beam".to_string(), |b| b.name.clone());

        let mut ids = Vec::with_capacity(n_elements + 1);
        ids.push(start);
        for k in 1..=n_elements {
            let s = k as f64 / n_elements as f64;
            let position = origin + (end - origin) * s;
            let node = self.add_node(format!("{prefix}_{k}"), position, orientation);
            let prev = ids[k - 1];
            self.add_element(body, prev, node, section);
            ids.push(node);
        }
        ids
    }

    /// Rename a node (useful for post-construction adjustments).
    pub fn rename_node(&mut self, node: NodeId, new_name: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node.idx()) {
            n.name = new_name.into();
        }
    }

    /// Build and validate the topology.
    pub fn build(self) -> TopologyResult<Topology> {
        validate::validate_structure(&self.nodes, &self.bodies, &self.elements, &self.joints)?;

        let (node_elem_offsets, node_elems) = build_adjacency(
            self.nodes.len(),
            self.elements.iter().flat_map(|e| e.nodes.map(|n| (n, e.id))),
        );
        let (node_joint_offsets, node_joints) = build_adjacency(
            self.nodes.len(),
            self.joints.iter().flat_map(|j| j.nodes.map(|n| (n, j.id))),
        );

        validate::validate_attachment(&self.nodes, &node_elem_offsets)?;

        Ok(Topology {
            nodes: self.nodes,
            bodies: self.bodies,
            elements: self.elements,
            joints: self.joints,
            node_elem_offsets,
            node_elems,
            node_joint_offsets,
            node_joints,
        })
    }
}

/// Build compact adjacency lists from (node, item) incidence pairs.
fn build_adjacency(
    node_count: usize,
    incidences: impl Iterator<Item = (NodeId, Id)>,
) -> (Vec<usize>, Vec<Id>) {
    let mut per_node: Vec<Vec<Id>> = vec![Vec::new(); node_count];
    for (node, item) in incidences {
        per_node[node.idx()].push(item);
    }

    let mut offsets = Vec::with_capacity(node_count + 1);
    let mut flat = Vec::new();
    offsets.push(0);
    for mut items in per_node {
        // Sort for determinism
        items.sort();
        items.dedup();
        flat.extend_from_slice(&items);
        offsets.push(flat.len());
    }
    (offsets, flat)
}
