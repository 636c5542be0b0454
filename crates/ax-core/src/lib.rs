//! ax-core: stable foundation for aeroflex.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (finite/positive argument checks)
//! - ids (stable compact IDs for topology objects)
//! - rotation (exponential/logarithmic maps and tangent operator)
//! - schedule (scalar time schedules for prescribed angles and control inputs)
//! - timing (opt-in wall-clock accounting)
//! - error (shared error types and failure classification)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod rotation;
pub mod schedule;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{AxError, AxResult, FailureKind};
pub use ids::*;
pub use numeric::*;
pub use schedule::{ConstantSchedule, HarmonicSchedule, Schedule, TabulatedSchedule};
pub use units::*;
