//! Built-in demonstration cases.
//!
//! Small, self-contained models used by the command line tool and by the
//! integration tests.

use std::f64::consts::FRAC_PI_2;

use ax_aero::{Lattice, OneMinusCosineGust, SteadyVelocityField, VelocityField};
use ax_core::{HarmonicSchedule, Id, NodeId, m, mps};
use ax_coupling::{ControlSurface, ControlSystem, SurfaceBinding};
use ax_structure::{BeamSection, HarmonicMotion, NodalLoads, StructuralModelBuilder, StructureError};
use ax_topology::{BodyKind, TopologyBuilder};
use nalgebra::{UnitQuaternion, Vector3};

use crate::error::SimResult;
use crate::model::AeroelasticModel;

/// Cantilever along +x, clamped at the origin, with a transverse tip load.
#[derive(Clone, Debug, PartialEq)]
pub struct CantileverCase {
    pub length: f64,
    pub elements: usize,
    pub section: BeamSection,
    /// Tip force along +z (N)
    pub tip_load: f64,
}

impl Default for CantileverCase {
    fn default() -> Self {
        Self {
            length: 10.0,
            elements: 20,
            section: BeamSection::uniform(1e8, 1e8, 1e6, 1e6, 2.0).with_inertia([0.02, 0.01, 0.01]),
            tip_load: 10.0,
        }
    }
}

impl CantileverCase {
    pub fn tip(&self) -> NodeId {
        Id::from_usize(self.elements)
    }

    pub fn build(&self) -> SimResult<AeroelasticModel> {
        let mut b = TopologyBuilder::new();
        let beam = b.add_body("beam", BodyKind::Flexible);
        let root = b.add_node("root", Vector3::zeros(), UnitQuaternion::identity());
        let nodes = b.add_straight_beam(beam, root, Vector3::new(self.length, 0.0, 0.0), self.elements, 0);
        let topology = b.build().map_err(StructureError::from)?;

        let structure = StructuralModelBuilder::new(topology, vec![self.section])
            .clamp(root)
            .build()?;
        let mut applied = NodalLoads::zeros(nodes.len());
        applied.add_force(self.tip(), Vector3::new(0.0, 0.0, self.tip_load));
        AeroelasticModel::structural(structure).with_applied_loads(applied)
    }
}

/// Discrete gust crossing the wing.
#[derive(Clone, Debug, PartialEq)]
pub struct GustCase {
    /// Gust length (m)
    pub length: f64,
    /// Peak vertical velocity (m/s)
    pub intensity: f64,
    /// Distance upstream of the leading edge at t = 0 (m)
    pub offset: f64,
}

/// Straight wing along +y in a uniform stream along +x.
///
/// The beam runs along the quarter chord with one element per spanwise
/// panel strip. The root either is clamped or plunges as
/// `h = A (1 − cos ωt)`.
#[derive(Clone, Debug, PartialEq)]
pub struct WingCase {
    pub span: f64,
    pub chord: f64,
    pub chordwise_panels: usize,
    pub spanwise_panels: usize,
    pub section: BeamSection,
    /// Freestream speed (m/s)
    pub speed: f64,
    /// Angle of attack (rad)
    pub incidence: f64,
    /// Root plunge amplitude (m); zero clamps the root
    pub plunge_amplitude: f64,
    /// Root plunge angular frequency (rad/s)
    pub plunge_frequency: f64,
    pub gust: Option<GustCase>,
    /// Amplitude of a sinusoidal outboard flap deflection (rad)
    pub flap_amplitude: Option<f64>,
}

impl Default for WingCase {
    fn default() -> Self {
        Self {
            span: 4.0,
            chord: 1.0,
            chordwise_panels: 2,
            spanwise_panels: 4,
            section: BeamSection::uniform(1e7, 1e7, 1e4, 2e4, 5.0).with_inertia([0.5, 0.25, 0.25]),
            speed: 10.0,
            incidence: 0.05,
            plunge_amplitude: 0.0,
            plunge_frequency: 2.0 * std::f64::consts::PI,
            gust: None,
            flap_amplitude: None,
        }
    }
}

impl WingCase {
    /// Material x along the span, so the flap hinge is the material x axis.
    pub fn root_orientation() -> UnitQuaternion<f64> {
        UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, FRAC_PI_2))
    }

    pub fn tip(&self) -> NodeId {
        Id::from_usize(self.spanwise_panels)
    }

    /// Root plunge motion, when the root is not clamped.
    pub fn root_motion(&self) -> Option<HarmonicMotion> {
        (self.plunge_amplitude != 0.0).then(|| HarmonicMotion {
            position: Vector3::zeros(),
            orientation: Self::root_orientation(),
            amplitude: Vector3::new(0.0, 0.0, self.plunge_amplitude),
            rotation_amplitude: Vector3::zeros(),
            omega: self.plunge_frequency,
        })
    }

    pub fn inflow(&self) -> SimResult<Box<dyn VelocityField>> {
        let direction = Vector3::new(self.incidence.cos(), 0.0, self.incidence.sin());
        let Some(gust) = &self.gust else {
            return Ok(Box::new(SteadyVelocityField::new(mps(self.speed), direction)?));
        };
        // The gust field carries the freestream; its front starts upstream of the leading edge.
        let leading_edge = -0.25 * self.chord * self.incidence.cos();
        let gust = OneMinusCosineGust::new(
            mps(self.speed),
            direction,
            m(gust.length),
            mps(gust.intensity),
            Vector3::z(),
            m(leading_edge - gust.offset),
        )?;
        Ok(Box::new(gust))
    }

    pub fn build(&self) -> SimResult<AeroelasticModel> {
        self.build_with_inflow(self.inflow()?)
    }

    /// Build the wing in a caller-supplied inflow instead of [`Self::inflow`].
    pub fn build_with_inflow(&self, inflow: Box<dyn VelocityField>) -> SimResult<AeroelasticModel> {
        let n = self.spanwise_panels;
        let mut b = TopologyBuilder::new();
        let wing = b.add_body("wing", BodyKind::Flexible);
        let root = b.add_node("root", Vector3::zeros(), Self::root_orientation());
        let columns = b.add_straight_beam(wing, root, Vector3::new(0.0, self.span, 0.0), n, 0);
        let topology = b.build().map_err(StructureError::from)?;

        let builder = StructuralModelBuilder::new(topology, vec![self.section]);
        let structure = match self.root_motion() {
            Some(motion) => builder.prescribe(root, motion),
            None => builder.clamp(root),
        }
        .build()?;

        let lattice = Lattice::rectangular(
            Vector3::new(-0.25 * self.chord, 0.0, 0.0),
            Vector3::new(self.chord, 0.0, 0.0),
            Vector3::new(0.0, self.span, 0.0),
            self.chordwise_panels,
            n,
        )?;
        let binding = SurfaceBinding {
            surface: Id::from_index(0),
            columns,
        };
        let mut model = AeroelasticModel::with_surfaces(
            structure,
            vec![("wing".into(), lattice)],
            &[binding],
            inflow,
        )?;

        if let Some(amplitude) = self.flap_amplitude {
            let flap = ControlSurface {
                name: "flap".into(),
                surface: Id::from_index(0),
                hinge_row: self.chordwise_panels - 1,
                first_column: n / 2,
                last_column: n,
            };
            let schedule = HarmonicSchedule {
                offset: 0.0,
                amplitude,
                omega: self.plunge_frequency,
                phase: 0.0,
            };
            model = model.with_controls(ControlSystem::new().with(flap, schedule))?;
        }
        Ok(model)
    }
}
