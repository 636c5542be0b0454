//! Structural state snapshots.
//!
//! A `StructuralState` is an immutable value: each accepted step produces a
//! new one and the previous value is kept as the rollback checkpoint.

use ax_core::{JointId, NodeId};
use nalgebra::{DVector, UnitQuaternion, Vector3};

use crate::element::Placement;
use crate::model::StructuralModel;
use crate::prescribed::NodePose;

/// Kinematic state of one node (global frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub angular_acceleration: Vector3<f64>,
}

impl NodeState {
    pub fn at_rest(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self::from(NodePose::stationary(position, orientation))
    }

    pub fn placement(&self) -> Placement {
        Placement::new(self.position, self.orientation)
    }
}

impl From<NodePose> for NodeState {
    fn from(p: NodePose) -> Self {
        Self {
            position: p.position,
            orientation: p.orientation,
            velocity: p.velocity,
            angular_velocity: p.angular_velocity,
            acceleration: p.acceleration,
            angular_acceleration: p.angular_acceleration,
        }
    }
}

/// Element strain measures (element frame).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementStrain {
    /// Axial and shear strain
    pub strain: Vector3<f64>,
    /// Torsion and bending curvature
    pub curvature: Vector3<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JointState {
    pub id: JointId,
    /// Rotation about the joint axis (relative rotation magnitude for spherical joints)
    pub angle: f64,
    /// Lagrange multipliers: constraint forces then moments
    pub reaction: DVector<f64>,
}

/// Force and moment the support exerts on a prescribed node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SupportReaction {
    pub node: NodeId,
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructuralState {
    pub time: f64,
    pub nodes: Vec<NodeState>,
    pub elements: Vec<ElementStrain>,
    pub joints: Vec<JointState>,
    pub supports: Vec<SupportReaction>,
}

impl StructuralState {
    /// Undeformed reference configuration at rest.
    pub fn at_rest(model: &StructuralModel) -> Self {
        let topology = model.topology();
        Self {
            time: 0.0,
            nodes: topology
                .nodes()
                .iter()
                .map(|n| NodeState::at_rest(n.position, n.orientation))
                .collect(),
            elements: vec![ElementStrain::default(); topology.elements().len()],
            joints: topology
                .joints()
                .iter()
                .map(|j| JointState {
                    id: j.id,
                    angle: 0.0,
                    reaction: DVector::zeros(j.kind.constraint_count()),
                })
                .collect(),
            supports: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.get(id.idx())
    }

    pub fn positions(&self) -> Vec<Vector3<f64>> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    /// Norm of the nodal position difference with another state.
    pub fn displacement_distance(&self, other: &StructuralState) -> f64 {
        self.nodes
            .iter()
            .zip(&other.nodes)
            .map(|(a, b)| (a.position - b.position).norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// Norm of the nodal displacement from the reference configuration.
    pub fn displacement_norm(&self, model: &StructuralModel) -> f64 {
        self.nodes
            .iter()
            .zip(model.topology().nodes())
            .map(|(a, n)| (a.position - n.position).norm_squared())
            .sum::<f64>()
            .sqrt()
    }
}
