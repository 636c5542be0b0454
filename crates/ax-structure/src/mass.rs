//! Lumped nodal inertia.

use ax_core::NodeId;
use ax_core::rotation::matrix;
use ax_topology::Topology;
use nalgebra::{Matrix3, Vector3};

use crate::element::{Placement, reference_frame};
use crate::error::{StructureError, StructureResult};
use crate::section::BeamSection;

/// Concentrated mass attached to a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMass {
    pub node: NodeId,
    pub mass: f64,
    /// Rotary inertia in the node material frame (kg·m²)
    pub inertia: Matrix3<f64>,
}

/// Mass and material-frame rotary inertia of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LumpedInertia {
    pub mass: f64,
    pub inertia: Matrix3<f64>,
}

impl Default for LumpedInertia {
    fn default() -> Self {
        Self {
            mass: 0.0,
            inertia: Matrix3::zeros(),
        }
    }
}

/// Half of every adjacent element's mass and rotary inertia, plus point masses.
pub fn lump(
    topology: &Topology,
    sections: &[BeamSection],
    point_masses: &[PointMass],
) -> StructureResult<Vec<LumpedInertia>> {
    let mut lumped = vec![LumpedInertia::default(); topology.nodes().len()];
    let placements: Vec<Placement> = topology
        .nodes()
        .iter()
        .map(|n| Placement::new(n.position, n.orientation))
        .collect();

    for elem in topology.elements() {
        let section = sections.get(elem.section).ok_or_else(|| StructureError::Setup {
            what: format!("element {} uses undefined section {}", elem.id, elem.section),
        })?;
        let (a, b) = (elem.start().idx(), elem.end().idx());
        let l0 = (placements[b].position - placements[a].position).norm();
        let e0 = reference_frame(&placements[a], &placements[b])?;
        let per_length = Matrix3::from_diagonal(&Vector3::from(section.inertia_per_length));

        for node in [a, b] {
            // Element frame expressed in the node material frame
            let to_node = matrix(&placements[node].orientation).transpose() * e0;
            lumped[node].mass += 0.5 * section.mass_per_length * l0;
            lumped[node].inertia += to_node * per_length * to_node.transpose() * (0.5 * l0);
        }
    }

    for pm in point_masses {
        if let Some(l) = lumped.get_mut(pm.node.idx()) {
            l.mass += pm.mass;
            l.inertia += pm.inertia;
        }
    }
    Ok(lumped)
}
