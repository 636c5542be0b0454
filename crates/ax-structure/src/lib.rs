//! Nonlinear structural dynamics for flexible multibody beam assemblies.
//!
//! The structure is a set of geometrically exact two-node beam elements
//! connected by joints (Lagrange multipliers), with lumped inertia, optional
//! prescribed-motion nodes and Newmark time integration. Each step is solved
//! with Newton-Raphson on translation and rotation-vector increments.

pub mod config;
pub mod element;
pub mod error;
pub mod integrator;
pub mod jacobian;
pub mod joints;
pub mod loads;
pub mod mass;
pub mod model;
pub mod newton;
pub mod prescribed;
pub mod section;
pub mod solver;
pub mod state;

pub use config::{StructuralConfig, StructuralDynamics};
pub use error::{StructureError, StructureResult};
pub use loads::{NodalLoad, NodalLoads};
pub use model::{StructuralInputs, StructuralModel, StructuralModelBuilder};
pub use newton::{NewtonConfig, NewtonResult};
pub use prescribed::{FixedSupport, HarmonicMotion, NodePose, PrescribedMotion, TabulatedTrajectory};
pub use section::BeamSection;
pub use solver::{StepReport, solve_static, step};
pub use state::{ElementStrain, JointState, NodeState, StructuralState, SupportReaction};
