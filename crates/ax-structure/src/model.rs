//! Structural model: topology plus sections, inertia and boundary conditions.

use ax_core::{JointId, NodeId, Schedule};
use ax_topology::{DofMap, JointKind, Topology, analyze};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::element::{ElementGeometry, Placement};
use crate::error::{StructureError, StructureResult};
use crate::mass::{LumpedInertia, PointMass, lump};
use crate::prescribed::{FixedSupport, NodePose, PrescribedMotion};
use crate::section::BeamSection;

/// A node whose motion is imposed.
#[derive(Debug)]
pub struct PrescribedNode {
    pub node: NodeId,
    pub motion: Box<dyn PrescribedMotion>,
}

/// Disturbance inputs of the structure sampled at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuralInputs {
    pub time: f64,
    /// Pose of each prescribed node, in `StructuralModel::prescribed()` order.
    pub poses: Vec<(NodeId, NodePose)>,
    /// Commanded angle of each joint (`None` unless the joint is prescribed).
    pub joint_angles: Vec<Option<f64>>,
}

impl StructuralInputs {
    pub fn pose(&self, node: NodeId) -> Option<&NodePose> {
        self.poses.iter().find(|(n, _)| *n == node).map(|(_, p)| p)
    }
}

/// Builder collecting everything the structural solver needs besides the topology.
pub struct StructuralModelBuilder {
    topology: Topology,
    sections: Vec<BeamSection>,
    point_masses: Vec<PointMass>,
    prescribed: Vec<PrescribedNode>,
    joint_schedules: Vec<(JointId, Box<dyn Schedule>)>,
}

impl StructuralModelBuilder {
    pub fn new(topology: Topology, sections: Vec<BeamSection>) -> Self {
        Self {
            topology,
            sections,
            point_masses: Vec::new(),
            prescribed: Vec::new(),
            joint_schedules: Vec::new(),
        }
    }

    pub fn point_mass(mut self, node: NodeId, mass: f64, inertia: Matrix3<f64>) -> Self {
        self.point_masses.push(PointMass {
            node,
            mass,
            inertia,
        });
        self
    }

    /// Impose the motion of a node.
    pub fn prescribe(mut self, node: NodeId, motion: impl PrescribedMotion + 'static) -> Self {
        self.prescribed.push(PrescribedNode {
            node,
            motion: Box::new(motion),
        });
        self
    }

    /// Clamp a node at its reference pose.
    pub fn clamp(self, node: NodeId) -> Self {
        // An unknown node is reported by build()
        let (position, orientation) = self.topology.node(node).map_or(
            (Vector3::zeros(), UnitQuaternion::identity()),
            |n| (n.position, n.orientation),
        );
        self.prescribe(
            node,
            FixedSupport {
                position,
                orientation,
            },
        )
    }

    /// Drive a prescribed joint's angle.
    pub fn joint_schedule(mut self, joint: JointId, schedule: impl Schedule + 'static) -> Self {
        self.joint_schedules.push((joint, Box::new(schedule)));
        self
    }

    pub fn build(self) -> StructureResult<StructuralModel> {
        let topology = self.topology;
        for section in &self.sections {
            section.validate()?;
        }
        for pm in &self.point_masses {
            if topology.node(pm.node).is_none() {
                return Err(setup(format!("point mass on unknown node {}", pm.node)));
            }
            if !(pm.mass.is_finite() && pm.mass >= 0.0) {
                return Err(setup(format!("point mass on node {} is not physical", pm.node)));
            }
        }

        let connectivity = analyze(&topology);
        tracing::debug!(
            components = connectivity.components,
            closed_loop = connectivity.closed_loop,
            joints = connectivity.joints,
            "structural topology"
        );
        if connectivity.components > 1 {
            tracing::warn!(
                components = connectivity.components,
                "structure has disconnected assemblies"
            );
        }

        let mut prescribed_nodes = Vec::with_capacity(self.prescribed.len());
        for p in &self.prescribed {
            if topology.node(p.node).is_none() {
                return Err(setup(format!("prescribed motion on unknown node {}", p.node)));
            }
            if prescribed_nodes.contains(&p.node) {
                return Err(setup(format!("node {} is prescribed twice", p.node)));
            }
            prescribed_nodes.push(p.node);
        }

        let mut joint_schedules: Vec<Option<Box<dyn Schedule>>> =
            topology.joints().iter().map(|_| None).collect();
        for (joint, schedule) in self.joint_schedules {
            let j = topology
                .joint(joint)
                .ok_or_else(|| setup(format!("schedule for unknown joint {joint}")))?;
            if !matches!(j.kind, JointKind::Prescribed { .. }) {
                return Err(setup(format!("joint {joint} is not a prescribed joint")));
            }
            joint_schedules[joint.idx()] = Some(schedule);
        }
        for j in topology.joints() {
            if matches!(j.kind, JointKind::Prescribed { .. }) && joint_schedules[j.id.idx()].is_none()
            {
                return Err(setup(format!("prescribed joint {} has no schedule", j.id)));
            }
            if j.nodes.iter().all(|n| prescribed_nodes.contains(n)) {
                return Err(setup(format!("joint {} connects two prescribed nodes", j.id)));
            }
        }

        let mut geometry = Vec::with_capacity(topology.elements().len());
        for elem in topology.elements() {
            if elem.section >= self.sections.len() {
                return Err(setup(format!(
                    "element {} uses undefined section {}",
                    elem.id, elem.section
                )));
            }
            let place = |id: NodeId| {
                topology
                    .node(id)
                    .map(|n| Placement::new(n.position, n.orientation))
                    .ok_or_else(|| setup(format!("element {} has unknown node {id}", elem.id)))
            };
            geometry.push(ElementGeometry::reference(&place(elem.start())?, &place(elem.end())?)?);
        }

        let inertia = lump(&topology, &self.sections, &self.point_masses)?;
        let dofs = DofMap::new(&topology, &prescribed_nodes);

        tracing::debug!(
            nodes = topology.nodes().len(),
            elements = topology.elements().len(),
            joints = topology.joints().len(),
            dofs = dofs.len(),
            "structural model built"
        );

        Ok(StructuralModel {
            topology,
            sections: self.sections,
            geometry,
            inertia,
            prescribed: self.prescribed,
            joint_schedules,
            dofs,
        })
    }
}

fn setup(what: String) -> StructureError {
    StructureError::Setup { what }
}

/// Immutable structural model shared by every step.
#[derive(Debug)]
pub struct StructuralModel {
    topology: Topology,
    sections: Vec<BeamSection>,
    geometry: Vec<ElementGeometry>,
    inertia: Vec<LumpedInertia>,
    prescribed: Vec<PrescribedNode>,
    joint_schedules: Vec<Option<Box<dyn Schedule>>>,
    dofs: DofMap,
}

impl StructuralModel {
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn sections(&self) -> &[BeamSection] {
        &self.sections
    }

    pub fn geometry(&self) -> &[ElementGeometry] {
        &self.geometry
    }

    pub fn inertia(&self) -> &[LumpedInertia] {
        &self.inertia
    }

    pub fn prescribed(&self) -> &[PrescribedNode] {
        &self.prescribed
    }

    pub fn dofs(&self) -> &DofMap {
        &self.dofs
    }

    pub fn total_mass(&self) -> f64 {
        self.inertia.iter().map(|l| l.mass).sum()
    }

    /// Earliest end of all finite input domains.
    pub fn input_horizon(&self) -> Option<f64> {
        self.prescribed
            .iter()
            .filter_map(|p| p.motion.domain())
            .chain(self.joint_schedules.iter().flatten().filter_map(|s| s.domain()))
            .map(|(_, end)| end)
            .reduce(f64::min)
    }

    /// Sample prescribed poses and joint angles at time `t`.
    pub fn sample_inputs(&self, t: f64) -> StructureResult<StructuralInputs> {
        let poses = self
            .prescribed
            .iter()
            .map(|p| Ok((p.node, p.motion.pose(t)?)))
            .collect::<StructureResult<Vec<_>>>()?;
        let joint_angles = self
            .joint_schedules
            .iter()
            .map(|s| s.as_ref().map(|s| s.value(t)).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StructuralInputs {
            time: t,
            poses,
            joint_angles,
        })
    }
}
