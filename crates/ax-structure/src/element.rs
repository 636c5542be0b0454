//! Geometrically exact two-node beam element.
//!
//! One-point quadrature at the element midpoint. The element frame is the
//! interpolated midpoint rotation carried through a fixed offset `Q` taken
//! from the reference configuration, so strains vanish exactly there and
//! are invariant under rigid motion of the element.

use ax_core::rotation::{exp_map, log_map, matrix};
use ax_core::{AxError, AxResult};
use nalgebra::{Matrix3, SVector, UnitQuaternion, Vector3};

use crate::section::BeamSection;

/// Step used for differentiating strains with respect to nodal spins.
const SPIN_STEP: f64 = 1e-6;

/// Position and orientation of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Placement {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Apply a left spin `φ` to the orientation.
    fn spun(&self, phi: &Vector3<f64>) -> Self {
        Self {
            position: self.position,
            orientation: exp_map(phi) * self.orientation,
        }
    }
}

/// Reference-configuration quantities of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementGeometry {
    /// Reference length
    pub l0: f64,
    /// Offset from the midpoint material frame to the element frame
    pub q: Matrix3<f64>,
    /// Reference curvature (element frame)
    pub kappa0: Vector3<f64>,
}

/// Midpoint rotation `R₁ exp(½ log(R₁ᵀR₂))` and the relative rotation vector.
fn midpoint(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> (UnitQuaternion<f64>, Vector3<f64>) {
    let psi = log_map(&(a.inverse() * b));
    (a * exp_map(&(psi * 0.5)), psi)
}

/// Reference element frame: x along the chord, y from the midpoint material y axis.
pub fn reference_frame(a: &Placement, b: &Placement) -> AxResult<Matrix3<f64>> {
    let chord = b.position - a.position;
    let l0 = chord.norm();
    if !(l0.is_finite() && l0 > 0.0) {
        return Err(AxError::InvalidArg {
            what: "element has zero reference length",
        });
    }
    let t = chord / l0;
    let (rm, _) = midpoint(&a.orientation, &b.orientation);
    let rm = matrix(&rm);

    let mut y = rm.column(1) - t * t.dot(&rm.column(1));
    if y.norm() < 1e-8 {
        // Material y along the chord: fall back to material z
        let z = rm.column(2);
        y = (t.cross(&z)).into_owned();
    }
    let y = y.normalize();
    let z = t.cross(&y);
    Ok(Matrix3::from_columns(&[t, y, z]))
}

impl ElementGeometry {
    /// Capture the element's reference configuration.
    pub fn reference(a: &Placement, b: &Placement) -> AxResult<Self> {
        let e0 = reference_frame(a, b)?;
        let l0 = (b.position - a.position).norm();
        let (rm, psi0) = midpoint(&a.orientation, &b.orientation);
        let q = matrix(&rm).transpose() * e0;
        Ok(Self {
            l0,
            q,
            kappa0: q.transpose() * psi0 / l0,
        })
    }

    /// Axial/shear strain `γ` and torsion/bending curvature `κ` in the element frame.
    pub fn strains(&self, a: &Placement, b: &Placement) -> (Vector3<f64>, Vector3<f64>) {
        let (rm, psi) = midpoint(&a.orientation, &b.orientation);
        let e = matrix(&rm) * self.q;
        let gamma = e.transpose() * (b.position - a.position) / self.l0 - Vector3::x();
        let kappa = self.q.transpose() * psi / self.l0 - self.kappa0;
        (gamma, kappa)
    }

    /// Strain energy `½L₀(γᵀC_γγ + κᵀC_κκ)`.
    pub fn energy(&self, section: &BeamSection, factor: f64, a: &Placement, b: &Placement) -> f64 {
        let (gamma, kappa) = self.strains(a, b);
        let cg = section.force_stiffness() * factor;
        let ck = section.moment_stiffness() * factor;
        0.5 * self.l0 * (gamma.dot(&(cg * gamma)) + kappa.dot(&(ck * kappa)))
    }

    /// Gradient of the strain energy with respect to nodal translations and
    /// left spins, ordered `[x₁, φ₁, x₂, φ₂]` (global frame).
    ///
    /// Translation terms are exact; spin terms differentiate the strains
    /// by central differences.
    pub fn internal_forces(
        &self,
        section: &BeamSection,
        factor: f64,
        a: &Placement,
        b: &Placement,
    ) -> SVector<f64, 12> {
        let (gamma, kappa) = self.strains(a, b);
        let force = section.force_stiffness() * factor * gamma;
        let moment = section.moment_stiffness() * factor * kappa;

        let (rm, _) = midpoint(&a.orientation, &b.orientation);
        let f2 = matrix(&rm) * self.q * force;

        let mut g = SVector::<f64, 12>::zeros();
        g.fixed_rows_mut::<3>(0).copy_from(&(-f2));
        g.fixed_rows_mut::<3>(6).copy_from(&f2);

        for (end, offset) in [(0usize, 3usize), (1, 9)] {
            for k in 0..3 {
                let mut phi = Vector3::zeros();
                phi[k] = SPIN_STEP;
                let (plus, minus) = if end == 0 {
                    (
                        self.strains(&a.spun(&phi), b),
                        self.strains(&a.spun(&-phi), b),
                    )
                } else {
                    (
                        self.strains(a, &b.spun(&phi)),
                        self.strains(a, &b.spun(&-phi)),
                    )
                };
                let d_gamma = (plus.0 - minus.0) / (2.0 * SPIN_STEP);
                let d_kappa = (plus.1 - minus.1) / (2.0 * SPIN_STEP);
                g[offset + k] = self.l0 * (d_gamma.dot(&force) + d_kappa.dot(&moment));
            }
        }
        g
    }
}
