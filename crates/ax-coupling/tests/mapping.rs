//! Coupling map construction against mismatched structures and lattices.

use ax_aero::{AerodynamicState, Lattice};
use ax_core::{ConstantSchedule, FailureKind, Id, NodeId};
use ax_coupling::{ControlSurface, ControlSystem, CouplingError, CouplingMap, SurfaceBinding};
use ax_topology::{BodyKind, Topology, TopologyBuilder};
use nalgebra::{UnitQuaternion, Vector3};

fn beam(elements: usize) -> (Topology, Vec<NodeId>) {
    let mut b = TopologyBuilder::new();
    let body = b.add_body("wing", BodyKind::Flexible);
    let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
    let nodes = b.add_straight_beam(body, root, Vector3::new(0.0, 3.0, 0.0), elements, 0);
    (b.build().unwrap(), nodes)
}

fn aero(n: usize) -> AerodynamicState {
    let lattice = Lattice::rectangular(
        Vector3::zeros(),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 3.0, 0.0),
        2,
        n,
    )
    .unwrap();
    AerodynamicState::new(vec![("wing".into(), lattice)]).unwrap()
}

fn binding(columns: Vec<NodeId>) -> SurfaceBinding {
    SurfaceBinding {
        surface: Id::from_index(0),
        columns,
    }
}

#[test]
fn every_column_node_bears_load() {
    let (topology, nodes) = beam(3);
    let map = CouplingMap::build(&topology, &aero(3), &[binding(nodes.clone())]).unwrap();

    let bearing: Vec<NodeId> = map.load_bearing_nodes().collect();
    assert_eq!(bearing, nodes);
    for &node in &nodes {
        // m + 1 = 3 grid rows per column
        assert_eq!(map.point_count(node), 3);
    }
    let sm = map.surface(Id::from_index(0)).unwrap();
    for j in 0..3 {
        let elem = sm.panel_element(1, j);
        let e = topology.element(elem).unwrap();
        assert_eq!((e.start(), e.end()), (nodes[j], nodes[j + 1]));
    }
}

#[test]
fn unbound_surface_is_rejected() {
    let (topology, _) = beam(3);
    let err = CouplingMap::build(&topology, &aero(3), &[]).unwrap_err();
    assert!(matches!(err, CouplingError::Mapping { .. }));
    assert_eq!(err.kind(), FailureKind::Setup);
}

#[test]
fn surface_bound_twice_is_rejected() {
    let (topology, nodes) = beam(3);
    let err = CouplingMap::build(
        &topology,
        &aero(3),
        &[binding(nodes.clone()), binding(nodes)],
    )
    .unwrap_err();
    assert!(matches!(err, CouplingError::Mapping { .. }));
}

#[test]
fn column_count_must_match_lattice() {
    let (topology, nodes) = beam(3);
    let err = CouplingMap::build(&topology, &aero(2), &[binding(nodes)]).unwrap_err();
    assert!(matches!(err, CouplingError::Mapping { .. }));
}

#[test]
fn adjacent_columns_need_an_element() {
    let (topology, nodes) = beam(3);
    // Skipping a node leaves a panel strip with no element between its columns
    let columns = vec![nodes[0], nodes[2], nodes[1], nodes[3]];
    let err = CouplingMap::build(&topology, &aero(3), &[binding(columns)]).unwrap_err();
    assert!(matches!(err, CouplingError::Mapping { .. }));
}

#[test]
fn control_surface_outside_lattice_is_rejected() {
    let (topology, nodes) = beam(3);
    let map = CouplingMap::build(&topology, &aero(3), &[binding(nodes)]).unwrap();
    let outside = ControlSystem::new().with(
        ControlSurface {
            name: "flap".into(),
            surface: Id::from_index(0),
            hinge_row: 2,
            first_column: 0,
            last_column: 1,
        },
        ConstantSchedule(0.1),
    );
    assert!(outside.validate(&map).is_err());

    let inside = ControlSystem::new().with(
        ControlSurface {
            name: "flap".into(),
            surface: Id::from_index(0),
            hinge_row: 1,
            first_column: 0,
            last_column: 3,
        },
        ConstantSchedule(0.1),
    );
    assert!(inside.validate(&map).is_ok());
    assert_eq!(inside.horizon(), None);
}
