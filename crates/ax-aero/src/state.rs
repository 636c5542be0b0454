//! Aerodynamic state: bound lattices, their wakes and panel loads.

use ax_core::{Id, SurfaceId};
use nalgebra::Vector3;

use crate::error::AeroResult;
use crate::lattice::{Lattice, ring_area, ring_centroid, ring_normal};
use crate::wake::WakeArena;

/// One lifting surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceState {
    pub id: SurfaceId,
    pub name: String,
    pub lattice: Lattice,
    /// Grid point velocities (global frame)
    pub grid_velocities: Vec<Vector3<f64>>,
    /// Bound ring strengths, panel order
    pub gamma: Vec<f64>,
    pub gamma_dot: Vec<f64>,
    pub normals: Vec<Vector3<f64>>,
    pub collocation: Vec<Vector3<f64>>,
    pub areas: Vec<f64>,
    /// Aerodynamic force at each grid point (steady plus added-mass part)
    pub forces: Vec<Vector3<f64>>,
    pub wake: WakeArena,
}

impl SurfaceState {
    pub fn new(id: SurfaceId, name: impl Into<String>, lattice: Lattice) -> AeroResult<Self> {
        let wake = WakeArena::new(lattice.trailing_edge())?;
        let panels = lattice.panel_count();
        let points = lattice.point_count();
        let mut surface = Self {
            id,
            name: name.into(),
            lattice,
            grid_velocities: vec![Vector3::zeros(); points],
            gamma: vec![0.0; panels],
            gamma_dot: vec![0.0; panels],
            normals: Vec::new(),
            collocation: Vec::new(),
            areas: Vec::new(),
            forces: vec![Vector3::zeros(); points],
            wake,
        };
        surface.update_panels();
        Ok(surface)
    }

    /// Recompute normals, collocation points and areas from the lattice.
    pub fn update_panels(&mut self) {
        let l = &self.lattice;
        let corners: Vec<[Vector3<f64>; 4]> = (0..l.m())
            .flat_map(|i| (0..l.n()).map(move |j| l.corners(i, j)))
            .collect();
        self.normals = corners.iter().map(ring_normal).collect();
        self.collocation = corners.iter().map(ring_centroid).collect();
        self.areas = corners.iter().map(ring_area).collect();
    }

    /// Bound strengths of the trailing-edge panel row.
    pub fn trailing_edge_gamma(&self) -> &[f64] {
        let n = self.lattice.n();
        let start = self.lattice.panel_index(self.lattice.m() - 1, 0);
        &self.gamma[start..start + n]
    }

    /// Circulation about the surface: sum of the spanwise strip circulations.
    pub fn bound_circulation(&self) -> f64 {
        self.trailing_edge_gamma().iter().sum()
    }

    /// Circulation shed in the latest step: newest wake ring row minus the one before.
    pub fn shed_circulation(&self) -> f64 {
        let newest: f64 = self.wake.newest_gamma().map_or(0.0, |g| g.iter().sum());
        let previous: f64 = self.wake.previous_gamma().map_or(0.0, |g| g.iter().sum());
        newest - previous
    }

    pub fn total_force(&self) -> Vector3<f64> {
        self.forces.iter().sum()
    }

    /// Moment of the grid point forces about `point`.
    pub fn total_moment(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.lattice
            .points()
            .iter()
            .zip(&self.forces)
            .map(|(p, f)| (p - point).cross(f))
            .sum()
    }
}

/// Kelvin bookkeeping of one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CirculationBalance {
    pub bound: f64,
    /// Shed in the latest step
    pub shed: f64,
    /// Released into the wake since the start
    pub released: f64,
    pub wake_rings: usize,
}

impl CirculationBalance {
    /// Bound circulation left over once the released wake is accounted
    /// for; zero while circulation is conserved.
    pub fn net(&self) -> f64 {
        self.bound - self.released
    }
}

/// Aerodynamic state of every surface at the end of a step.
#[derive(Clone, Debug, PartialEq)]
pub struct AerodynamicState {
    pub time: f64,
    /// Number of steps taken since the start
    pub step: usize,
    /// Step size of the latest step (zero before the first)
    pub dt: f64,
    pub surfaces: Vec<SurfaceState>,
    /// Bound strengths at the start of the current step
    pub(crate) start_gamma: Vec<Vec<f64>>,
}

impl AerodynamicState {
    /// Surfaces at rest with no circulation and a wake of zero length.
    pub fn new(lattices: Vec<(String, Lattice)>) -> AeroResult<Self> {
        let surfaces = lattices
            .into_iter()
            .enumerate()
            .map(|(k, (name, lattice))| SurfaceState::new(Id::from_usize(k), name, lattice))
            .collect::<AeroResult<Vec<_>>>()?;
        let start_gamma = surfaces.iter().map(|s| s.gamma.clone()).collect();
        Ok(Self {
            time: 0.0,
            step: 0,
            dt: 0.0,
            surfaces,
            start_gamma,
        })
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceState> {
        self.surfaces.get(id.idx())
    }

    pub fn panel_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.lattice.panel_count()).sum()
    }

    pub fn total_bound_circulation(&self) -> f64 {
        self.surfaces.iter().map(SurfaceState::bound_circulation).sum()
    }

    pub fn shed_circulation(&self) -> f64 {
        self.surfaces.iter().map(SurfaceState::shed_circulation).sum()
    }

    /// Circulation released into every wake, truncated rows included.
    pub fn released_circulation(&self) -> f64 {
        self.surfaces.iter().map(|s| s.wake.released_circulation()).sum()
    }

    pub fn wake_ring_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.wake.ring_count()).sum()
    }

    pub fn circulation_balance(&self) -> CirculationBalance {
        CirculationBalance {
            bound: self.total_bound_circulation(),
            shed: self.shed_circulation(),
            released: self.released_circulation(),
            wake_rings: self.wake_ring_count(),
        }
    }

    pub fn total_force(&self) -> Vector3<f64> {
        self.surfaces.iter().map(SurfaceState::total_force).sum()
    }
}
