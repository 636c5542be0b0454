//! Topology-specific error types.

use ax_core::{AxError, BodyId, ElemId, JointId, NodeId};

pub type TopologyResult<T> = Result<T, TopologyError>;

/// Topology construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// An element refers to a node that doesn't exist.
    InvalidNodeRef { elem: ElemId, node: NodeId },

    /// An element refers to a body that doesn't exist.
    InvalidBodyRef { elem: ElemId, body: BodyId },

    /// A joint refers to a node that doesn't exist.
    InvalidJointNode { joint: JointId, node: NodeId },

    /// Both ends of an element (or a joint) are the same node.
    DegenerateElement { elem: ElemId },

    /// Element end nodes coincide in the reference configuration.
    ZeroLength { elem: ElemId },

    /// A joint connects a node to itself.
    DegenerateJoint { joint: JointId },

    /// Joint nodes are not coincident in the reference configuration.
    JointNotCoincident { joint: JointId, gap: f64 },

    /// A hinge or prescribed joint axis has zero length.
    ZeroAxis { joint: JointId },

    /// A node is not attached to any element.
    OrphanNode { node: NodeId },

    /// Topology has no elements.
    Empty,

    /// ID not found in DOF map.
    IdNotFound { what: &'static str },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::InvalidNodeRef { elem, node } => {
                write!(f, "Element {} refers to non-existent node {}", elem, node)
            }
            TopologyError::InvalidBodyRef { elem, body } => {
                write!(f, "Element {} refers to non-existent body {}", elem, body)
            }
            TopologyError::InvalidJointNode { joint, node } => {
                write!(f, "Joint {} refers to non-existent node {}", joint, node)
            }
            TopologyError::DegenerateElement { elem } => {
                write!(f, "Element {} connects a node to itself", elem)
            }
            TopologyError::ZeroLength { elem } => {
                write!(f, "Element {} has zero reference length", elem)
            }
            TopologyError::DegenerateJoint { joint } => {
                write!(f, "Joint {} connects a node to itself", joint)
            }
            TopologyError::JointNotCoincident { joint, gap } => {
                write!(
                    f,
                    "Joint {} nodes are {} apart in the reference configuration",
                    joint, gap
                )
            }
            TopologyError::ZeroAxis { joint } => {
                write!(f, "Joint {} has a zero-length axis", joint)
            }
            TopologyError::OrphanNode { node } => {
                write!(f, "Node {} is not attached to any element", node)
            }
            TopologyError::Empty => write!(f, "Topology has no elements"),
            TopologyError::IdNotFound { what } => {
                write!(f, "{} not found in DOF map", what)
            }
        }
    }
}

impl std::error::Error for TopologyError {}

impl From<TopologyError> for AxError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::IdNotFound { what } => AxError::InvalidArg { what },
            _ => AxError::Invariant {
                what: "multibody topology is invalid",
            },
        }
    }
}
