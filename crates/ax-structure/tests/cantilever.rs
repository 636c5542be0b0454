//! Cantilever beam benchmarks against closed-form results.

use ax_core::NodeId;
use ax_structure::{
    BeamSection, NodalLoads, StructuralConfig, StructuralDynamics, StructuralModel,
    StructuralModelBuilder, StructuralState, solve_static, step,
};
use ax_topology::{BodyKind, TopologyBuilder};
use nalgebra::{UnitQuaternion, Vector3};

const LENGTH: f64 = 10.0;
const EI: f64 = 1.0e6;
const TIP_LOAD: f64 = 10.0;

fn cantilever(elements: usize) -> (StructuralModel, NodeId, NodeId) {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("spar", BodyKind::Flexible);
    let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
    let nodes = b.add_straight_beam(body, root, Vector3::new(LENGTH, 0.0, 0.0), elements, 0);
    let tip = *nodes.last().unwrap();
    let topology = b.build().unwrap();

    let section = BeamSection::uniform(1.0e8, 1.0e8, 1.0e6, EI, 2.0).with_inertia([0.02, 0.01, 0.01]);
    let model = StructuralModelBuilder::new(topology, vec![section])
        .clamp(root)
        .build()
        .unwrap();
    (model, root, tip)
}

#[test]
fn static_tip_load_matches_beam_theory() {
    let (model, root, tip) = cantilever(20);
    let mut loads = NodalLoads::zeros(model.topology().nodes().len());
    loads.add_force(tip, Vector3::new(0.0, 0.0, TIP_LOAD));

    let initial = StructuralState::at_rest(&model);
    let inputs = model.sample_inputs(0.0).unwrap();
    let report = solve_static(&model, &StructuralConfig::default(), &initial, &loads, &inputs).unwrap();

    let expected = TIP_LOAD * LENGTH.powi(3) / (3.0 * EI);
    let deflection = report.state.node(tip).unwrap().position.z;
    assert!(
        ((deflection - expected) / expected).abs() < 0.01,
        "tip deflection {deflection} vs {expected}"
    );

    // The root stays put and carries the whole load
    assert_eq!(report.state.node(root).unwrap().position, Vector3::zeros());
    let support = report.state.supports[0];
    assert_eq!(support.node, root);
    assert!((support.force - Vector3::new(0.0, 0.0, -TIP_LOAD)).norm() < 1e-4);
    assert!((support.moment.y - TIP_LOAD * LENGTH).abs() < 1e-2);
}

#[test]
fn bending_strain_is_largest_at_the_root() {
    let (model, _, tip) = cantilever(10);
    let mut loads = NodalLoads::zeros(model.topology().nodes().len());
    loads.add_force(tip, Vector3::new(0.0, 0.0, TIP_LOAD));
    let report = solve_static(
        &model,
        &StructuralConfig::default(),
        &StructuralState::at_rest(&model),
        &loads,
        &model.sample_inputs(0.0).unwrap(),
    )
    .unwrap();

    let curvature: Vec<f64> = report.state.elements.iter().map(|e| e.curvature.y.abs()).collect();
    assert!(curvature.windows(2).all(|w| w[0] > w[1]));
    // κ = M / EI at the root element midpoint
    let root_moment = TIP_LOAD * (LENGTH - 0.5);
    assert!((curvature[0] - root_moment / EI).abs() / (root_moment / EI) < 0.01);
}

#[test]
fn unloaded_structure_stays_at_rest() {
    let (model, _, _) = cantilever(5);
    let config = StructuralConfig::default();
    let loads = NodalLoads::zeros(model.topology().nodes().len());
    let initial = StructuralState::at_rest(&model);
    let report = step(&model, &config, &initial, &loads, &model.sample_inputs(0.01).unwrap(), 0.01)
        .unwrap();
    assert_eq!(report.newton_iterations, 0);
    assert_eq!(report.state.nodes, initial.nodes);
}

#[test]
fn dynamic_response_under_step_load_starts_at_rest() {
    let (model, _, tip) = cantilever(8);
    let config = StructuralConfig {
        dynamics: StructuralDynamics::Dynamic,
        ..Default::default()
    };
    let mut loads = NodalLoads::zeros(model.topology().nodes().len());
    loads.add_force(tip, Vector3::new(0.0, 0.0, TIP_LOAD));

    let dt = 0.005;
    let mut state = StructuralState::at_rest(&model);
    let mut tip_history = Vec::new();
    for k in 1..=10 {
        let inputs = model.sample_inputs(k as f64 * dt).unwrap();
        state = step(&model, &config, &state, &loads, &inputs, dt).unwrap().state;
        tip_history.push(state.node(tip).unwrap().position.z);
    }
    // The tip accelerates in the load direction from rest
    assert!(tip_history.iter().all(|&z| z > 0.0));
    assert!(tip_history[9] > tip_history[0]);
    assert!((state.time - 10.0 * dt).abs() < 1e-12);
}

#[test]
fn free_beam_momentum_balance() {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("free", BodyKind::Flexible);
    let start = b.add_node("a", Vector3::zeros(), UnitQuaternion::identity());
    let nodes = b.add_straight_beam(body, start, Vector3::new(2.0, 0.0, 0.0), 4, 0);
    let topology = b.build().unwrap();
    let section = BeamSection::uniform(1.0e6, 1.0e6, 1.0e3, 1.0e3, 1.5).with_inertia([0.01, 0.005, 0.005]);
    let model = StructuralModelBuilder::new(topology, vec![section]).build().unwrap();

    let force = Vector3::new(0.0, 3.0, 5.0);
    let mut loads = NodalLoads::zeros(nodes.len());
    loads.add_force(nodes[4], force);

    let config = StructuralConfig::default();
    let report = step(
        &model,
        &config,
        &StructuralState::at_rest(&model),
        &loads,
        &model.sample_inputs(0.01).unwrap(),
        0.01,
    )
    .unwrap();

    // Internal forces cancel: Σ m a equals the applied force
    let momentum_rate: Vector3<f64> = report
        .state
        .nodes
        .iter()
        .zip(model.inertia())
        .map(|(n, l)| n.acceleration * l.mass)
        .sum();
    assert!((momentum_rate - force).norm() < 1e-5, "{momentum_rate:?}");
    assert!((model.total_mass() - 3.0).abs() < 1e-12);
}
