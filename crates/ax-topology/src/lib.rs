//! ax-topology: multibody topology layer for aeroflex.
//!
//! Provides:
//! - Core topology data structures (Node, Body, Element, Joint, Topology)
//! - Incremental topology builder with validation
//! - Degree-of-freedom indexing for the structural solver
//! - Connectivity analysis (components, closed kinematic loops)
//!
//! # Example
//!
//! ```
//! use ax_topology::{BodyKind, TopologyBuilder};
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! let mut builder = TopologyBuilder::new();
//! let wing = builder.add_body("wing", BodyKind::Flexible);
//! let root = builder.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
//! let tip = builder.add_node("tip", Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity());
//! builder.add_element(wing, root, tip, 0);
//! let topology = builder.build().unwrap();
//!
//! assert_eq!(topology.nodes().len(), 2);
//! assert_eq!(topology.elements().len(), 1);
//! ```

pub mod analysis;
pub mod builder;
pub mod error;
pub mod indexing;
pub mod topology;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use analysis::{Connectivity, analyze};
pub use builder::TopologyBuilder;
pub use error::{TopologyError, TopologyResult};
pub use indexing::DofMap;
pub use topology::{Body, BodyKind, Element, Joint, JointKind, Node, Topology};
