//! Displacement and load transfer.
//!
//! A grid point rides rigidly with its node, `ζ = x + R d` and
//! `ζ̇ = ẋ + ω × R d`. The transpose of that map sends a grid force `F` at
//! `ζ` to the node as `F` plus the moment `(ζ − x) × F`, so net force and
//! net moment about any point are preserved.

use ax_aero::{AerodynamicState, SurfaceMotion};
use ax_core::AxError;
use ax_core::rotation::matrix;
use ax_structure::{NodalLoads, StructuralState};

use crate::control::ControlSystem;
use crate::error::CouplingResult;
use crate::map::CouplingMap;

/// Lattice geometry and grid point velocities implied by a structural state.
pub fn geometry_from_structure(
    map: &CouplingMap,
    structure: &StructuralState,
    controls: &ControlSystem,
    deflections: &[f64],
) -> CouplingResult<Vec<SurfaceMotion>> {
    map.surfaces()
        .iter()
        .map(|sm| -> CouplingResult<SurfaceMotion> {
            let mut offsets = sm.offsets().to_vec();
            if !controls.is_empty() {
                controls.deflect(sm.surface, map, &mut offsets, deflections)?;
            }
            let mut motion = SurfaceMotion {
                points: Vec::with_capacity(offsets.len()),
                velocities: Vec::with_capacity(offsets.len()),
            };
            for (owner, d) in sm.owners().iter().zip(&offsets) {
                let node = structure.node(*owner).ok_or(AxError::IndexOob {
                    what: "structural node of grid point",
                    index: owner.idx(),
                    len: structure.nodes.len(),
                })?;
                let arm = matrix(&node.orientation) * d;
                motion.points.push(node.position + arm);
                motion.velocities.push(node.velocity + node.angular_velocity.cross(&arm));
            }
            Ok(motion)
        })
        .collect()
}

/// Nodal loads equivalent to the grid point forces of every surface.
pub fn loads_from_aero(
    map: &CouplingMap,
    structure: &StructuralState,
    aero: &AerodynamicState,
) -> CouplingResult<NodalLoads> {
    let mut loads = NodalLoads::zeros(structure.nodes.len());
    for sm in map.surfaces() {
        let surface = aero.surface(sm.surface).ok_or(AxError::Invariant {
            what: "coupling map refers to a missing aerodynamic surface",
        })?;
        let points = surface.lattice.points();
        for ((owner, zeta), force) in sm.owners().iter().zip(points).zip(&surface.forces) {
            let node = structure.node(*owner).ok_or(AxError::IndexOob {
                what: "structural node of grid point",
                index: owner.idx(),
                len: structure.nodes.len(),
            })?;
            loads.add_force(*owner, *force);
            loads.add_moment(*owner, (zeta - node.position).cross(force));
        }
    }
    Ok(loads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlSurface;
    use crate::map::SurfaceBinding;
    use ax_aero::Lattice;
    use ax_core::{ConstantSchedule, Id};
    use ax_structure::{BeamSection, StructuralModelBuilder};
    use ax_topology::{BodyKind, TopologyBuilder};
    use nalgebra::{UnitQuaternion, Vector3};

    /// Wing along +y with material x spanwise, chord along +x.
    pub(crate) fn wing() -> (ax_structure::StructuralModel, AerodynamicState, CouplingMap) {
        let q = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
        let mut b = TopologyBuilder::new();
        let body = b.add_body("wing", BodyKind::Flexible);
        let root = b.add_node("root", Vector3::zeros(), q);
        let nodes = b.add_straight_beam(body, root, Vector3::new(0.0, 4.0, 0.0), 4, 0);
        let topology = b.build().unwrap();

        let lattice = Lattice::rectangular(
            Vector3::new(-0.25, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 4.0, 0.0),
            2,
            4,
        )
        .unwrap();
        let aero = AerodynamicState::new(vec![("wing".into(), lattice)]).unwrap();
        let map = CouplingMap::build(
            &topology,
            &aero,
            &[SurfaceBinding {
                surface: Id::from_index(0),
                columns: nodes,
            }],
        )
        .unwrap();
        let model = StructuralModelBuilder::new(topology, vec![BeamSection::uniform(1.0, 1.0, 1.0, 1.0, 1.0)])
            .clamp(root)
            .build()
            .unwrap();
        (model, aero, map)
    }

    #[test]
    fn reference_state_reproduces_lattice() {
        let (model, aero, map) = wing();
        let state = StructuralState::at_rest(&model);
        let motion = geometry_from_structure(&map, &state, &ControlSystem::new(), &[]).unwrap();
        for (p, q) in motion[0].points.iter().zip(aero.surfaces[0].lattice.points()) {
            assert!((p - q).norm() < 1e-12);
        }
        assert!(motion[0].velocities.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn rotating_node_moves_its_grid_points() {
        let (model, _, map) = wing();
        let mut state = StructuralState::at_rest(&model);
        let tip = &mut state.nodes[4];
        tip.angular_velocity = Vector3::new(0.0, 2.0, 0.0);
        tip.velocity = Vector3::new(0.0, 0.0, 1.0);
        let motion = geometry_from_structure(&map, &state, &ControlSystem::new(), &[]).unwrap();
        // Trailing-edge tip point sits 0.75 m aft of the node: ω × r = (0,2,0) × (0.75,0,0)
        let sm = &map.surfaces()[0];
        let v = motion[0].velocities[sm.point_index(2, 4)];
        assert!((v - Vector3::new(0.0, 0.0, 1.0 - 1.5)).norm() < 1e-12);
    }

    #[test]
    fn flap_deflection_rotates_aft_rows_only() {
        let (model, aero, map) = wing();
        let controls = ControlSystem::new().with(
            ControlSurface {
                name: "aileron".into(),
                surface: Id::from_index(0),
                hinge_row: 1,
                first_column: 3,
                last_column: 4,
            },
            ConstantSchedule(0.2),
        );
        controls.validate(&map).unwrap();
        let deflections = controls.sample(0.0).unwrap();
        let state = StructuralState::at_rest(&model);
        let motion = geometry_from_structure(&map, &state, &controls, &deflections).unwrap();
        let sm = &map.surfaces()[0];
        let reference = aero.surfaces[0].lattice.points();

        // Rows up to the hinge and columns outside the flap stay put
        for i in 0..=1 {
            let k = sm.point_index(i, 4);
            assert!((motion[0].points[k] - reference[k]).norm() < 1e-12);
        }
        let k = sm.point_index(2, 2);
        assert!((motion[0].points[k] - reference[k]).norm() < 1e-12);

        // Trailing edge of the flap swings through 0.2 rad about the hinge
        let k = sm.point_index(2, 3);
        let hinge = reference[sm.point_index(1, 3)];
        let before = reference[k] - hinge;
        let after = motion[0].points[k] - hinge;
        assert!((after.norm() - before.norm()).abs() < 1e-12);
        assert!((before.angle(&after) - 0.2).abs() < 1e-12);
        assert!(after.y.abs() < 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::wing;
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};
    use proptest::prelude::*;

    fn vec3(range: f64) -> impl Strategy<Value = Vector3<f64>> {
        (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn transfer_conserves_force_and_moment(
            displacements in prop::collection::vec(vec3(0.5), 5),
            rotations in prop::collection::vec(vec3(1.0), 5),
            forces in prop::collection::vec(vec3(100.0), 15),
            point in vec3(10.0),
        ) {
            let (model, mut aero, map) = wing();
            let mut state = StructuralState::at_rest(&model);
            for ((node, u), r) in state.nodes.iter_mut().zip(&displacements).zip(&rotations) {
                node.position += u;
                node.orientation = UnitQuaternion::from_scaled_axis(*r) * node.orientation;
            }
            let motion = geometry_from_structure(&map, &state, &ControlSystem::new(), &[]).unwrap();
            let surface = &mut aero.surfaces[0];
            surface.lattice.set_points(motion[0].points.clone()).unwrap();
            surface.forces = forces.clone();

            let loads = loads_from_aero(&map, &state, &aero).unwrap();
            let force: Vector3<f64> = forces.iter().sum();
            let moment = surface_moment(&aero, &point);
            let scale = 1.0 + force.norm() + moment.norm();

            prop_assert!((loads.total_force() - force).norm() < 1e-9 * scale);
            prop_assert!((loads.total_moment(&state.positions(), &point) - moment).norm() < 1e-9 * scale);
        }
    }

    fn surface_moment(aero: &AerodynamicState, point: &Vector3<f64>) -> Vector3<f64> {
        aero.surfaces[0].total_moment(point)
    }
}
