//! Nodes driven by prescribed motion.

use ax_core::FailureKind;
use ax_structure::{
    BeamSection, HarmonicMotion, NodalLoads, NodeState, PrescribedMotion, StructuralConfig,
    StructuralModelBuilder, StructuralState, TabulatedTrajectory, step,
};
use ax_topology::{BodyKind, TopologyBuilder};
use nalgebra::{UnitQuaternion, Vector3};

#[test]
fn driven_root_follows_its_trajectory_exactly() {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("wing", BodyKind::Flexible);
    let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
    let nodes = b.add_straight_beam(body, root, Vector3::new(0.0, 4.0, 0.0), 4, 0);
    let topology = b.build().unwrap();

    let motion = HarmonicMotion {
        position: Vector3::zeros(),
        orientation: UnitQuaternion::identity(),
        amplitude: Vector3::new(0.0, 0.0, 0.05),
        rotation_amplitude: Vector3::new(0.0, 0.02, 0.0),
        omega: 2.0 * std::f64::consts::PI,
    };
    let section = BeamSection::uniform(1.0e7, 1.0e7, 1.0e4, 1.0e4, 1.0).with_inertia([0.01; 3]);
    let model = StructuralModelBuilder::new(topology, vec![section])
        .prescribe(root, motion)
        .build()
        .unwrap();

    let config = StructuralConfig::default();
    let loads = NodalLoads::zeros(nodes.len());
    let dt = 0.01;
    let mut state = StructuralState::at_rest(&model);
    for k in 1..=15 {
        let t = k as f64 * dt;
        let inputs = model.sample_inputs(t).unwrap();
        state = step(&model, &config, &state, &loads, &inputs, dt).unwrap().state;
        let expected = NodeState::from(motion.pose(t).unwrap());
        assert_eq!(*state.node(root).unwrap(), expected);
        assert!(state.supports[0].force.iter().all(|f| f.is_finite()));
    }
    // The free tip is dragged along with the root
    assert!(state.node(nodes[4]).unwrap().position.z > 0.0);
}

#[test]
fn sampling_outside_trajectory_is_input_out_of_range() {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("wing", BodyKind::Flexible);
    let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
    b.add_straight_beam(body, root, Vector3::new(1.0, 0.0, 0.0), 2, 0);
    let topology = b.build().unwrap();

    let trajectory = TabulatedTrajectory::new(
        vec![0.0, 0.5],
        vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 0.1)],
        UnitQuaternion::identity(),
    )
    .unwrap();
    let model = StructuralModelBuilder::new(topology, vec![BeamSection::uniform(1.0, 1.0, 1.0, 1.0, 1.0)])
        .prescribe(root, trajectory)
        .build()
        .unwrap();

    assert_eq!(model.input_horizon(), Some(0.5));
    let inputs = model.sample_inputs(0.25).unwrap();
    assert!((inputs.pose(root).unwrap().position.z - 0.05).abs() < 1e-15);

    let err = model.sample_inputs(0.6).unwrap_err();
    assert_eq!(err.kind(), FailureKind::InputOutOfRange);
}

#[test]
fn node_cannot_be_prescribed_twice() {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("wing", BodyKind::Flexible);
    let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
    b.add_straight_beam(body, root, Vector3::new(1.0, 0.0, 0.0), 1, 0);
    let topology = b.build().unwrap();
    let err = StructuralModelBuilder::new(topology, vec![BeamSection::uniform(1.0, 1.0, 1.0, 1.0, 1.0)])
        .clamp(root)
        .clamp(root)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Setup);
}
