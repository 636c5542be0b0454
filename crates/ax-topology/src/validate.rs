//! Topology validation logic.

use crate::error::{TopologyError, TopologyResult};
use crate::topology::{Body, Element, Joint, JointKind, Node};

/// Relative tolerance on joint node coincidence.
const COINCIDENCE_TOL: f64 = 1e-9;

/// Validate references, element geometry and joint placement.
pub(crate) fn validate_structure(
    nodes: &[Node],
    bodies: &[Body],
    elements: &[Element],
    joints: &[Joint],
) -> TopologyResult<()> {
    if elements.is_empty() {
        return Err(TopologyError::Empty);
    }

    for elem in elements {
        if elem.body.idx() >= bodies.len() {
            return Err(TopologyError::InvalidBodyRef {
                elem: elem.id,
                body: elem.body,
            });
        }
        for &node in &elem.nodes {
            if node.idx() >= nodes.len() {
                return Err(TopologyError::InvalidNodeRef {
                    elem: elem.id,
                    node,
                });
            }
        }
        if elem.nodes[0] == elem.nodes[1] {
            return Err(TopologyError::DegenerateElement { elem: elem.id });
        }
        let a = nodes[elem.nodes[0].idx()].position;
        let b = nodes[elem.nodes[1].idx()].position;
        let length = (b - a).norm();
        if !length.is_finite() || length <= 0.0 {
            return Err(TopologyError::ZeroLength { elem: elem.id });
        }
    }

    // Characteristic size for the coincidence check
    let scale = nodes
        .iter()
        .map(|n| n.position.norm())
        .fold(1.0_f64, f64::max);

    for joint in joints {
        for &node in &joint.nodes {
            if node.idx() >= nodes.len() {
                return Err(TopologyError::InvalidJointNode {
                    joint: joint.id,
                    node,
                });
            }
        }
        if joint.nodes[0] == joint.nodes[1] {
            return Err(TopologyError::DegenerateJoint { joint: joint.id });
        }
        let gap = (nodes[joint.nodes[1].idx()].position - nodes[joint.nodes[0].idx()].position)
            .norm();
        if gap > COINCIDENCE_TOL * scale {
            return Err(TopologyError::JointNotCoincident {
                joint: joint.id,
                gap,
            });
        }
        if let JointKind::Hinge { axis } | JointKind::Prescribed { axis } = joint.kind {
            let len = axis.norm();
            if !len.is_finite() || len <= 0.0 {
                return Err(TopologyError::ZeroAxis { joint: joint.id });
            }
        }
    }

    Ok(())
}

/// Every node must carry at least one element.
pub(crate) fn validate_attachment(nodes: &[Node], node_elem_offsets: &[usize]) -> TopologyResult<()> {
    for node in nodes {
        let i = node.id.idx();
        if node_elem_offsets[i + 1] == node_elem_offsets[i] {
            return Err(TopologyError::OrphanNode { node: node.id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ax_core::Id;
    use nalgebra::{UnitQuaternion, Vector3};

    fn node(i: u32, x: f64) -> Node {
        Node {
            id: Id::from_index(i),
            name: format!("n{i}"),
            position: Vector3::new(x, 0.0, 0.0),
            orientation: UnitQuaternion::identity(),
        }
    }

    fn body() -> Vec<Body> {
        vec![Body {
            id: Id::from_index(0),
            name: "b".into(),
            kind: crate::BodyKind::Flexible,
        }]
    }

    fn elem(i: u32, a: u32, b: u32) -> Element {
        Element {
            id: Id::from_index(i),
            body: Id::from_index(0),
            nodes: [Id::from_index(a), Id::from_index(b)],
            section: 0,
        }
    }

    #[test]
    fn validate_empty_topology() {
        assert_eq!(
            validate_structure(&[], &[], &[], &[]),
            Err(TopologyError::Empty)
        );
    }

    #[test]
    fn validate_invalid_node_ref() {
        let nodes = vec![node(0, 0.0)];
        let result = validate_structure(&nodes, &body(), &[elem(0, 0, 99)], &[]);
        assert!(matches!(
            result,
            Err(TopologyError::InvalidNodeRef { .. })
        ));
    }

    #[test]
    fn validate_zero_length() {
        let nodes = vec![node(0, 1.0), node(1, 1.0)];
        let result = validate_structure(&nodes, &body(), &[elem(0, 0, 1)], &[]);
        assert!(matches!(result, Err(TopologyError::ZeroLength { .. })));
    }

    #[test]
    fn validate_joint_must_be_coincident() {
        let nodes = vec![node(0, 0.0), node(1, 1.0), node(2, 1.5), node(3, 2.0)];
        let elements = vec![elem(0, 0, 1), elem(1, 2, 3)];
        let joints = vec![Joint {
            id: Id::from_index(0),
            name: "j".into(),
            kind: JointKind::Spherical,
            nodes: [Id::from_index(1), Id::from_index(2)],
        }];
        let result = validate_structure(&nodes, &body(), &elements, &joints);
        assert!(matches!(
            result,
            Err(TopologyError::JointNotCoincident { gap, .. }) if (gap - 0.5).abs() < 1e-15
        ));
    }

    #[test]
    fn validate_hinge_axis_nonzero() {
        let nodes = vec![node(0, 0.0), node(1, 1.0), node(2, 1.0), node(3, 2.0)];
        let elements = vec![elem(0, 0, 1), elem(1, 2, 3)];
        let joints = vec![Joint {
            id: Id::from_index(0),
            name: "j".into(),
            kind: JointKind::Hinge {
                axis: Vector3::zeros(),
            },
            nodes: [Id::from_index(1), Id::from_index(2)],
        }];
        let result = validate_structure(&nodes, &body(), &elements, &joints);
        assert!(matches!(result, Err(TopologyError::ZeroAxis { .. })));
    }
}
