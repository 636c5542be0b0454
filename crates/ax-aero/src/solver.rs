//! Unsteady vortex-lattice step.
//!
//! A time step is split in two calls. `begin_step` convects the wake of the
//! previous accepted state and sheds a new ring row behind every surface;
//! it runs once per step. `solve` places the bound lattices on the current
//! surface geometry, solves for the bound strengths and computes the panel
//! forces; it runs once per coupling iteration and depends only on the
//! state returned by `begin_step` and on its arguments.

use ax_core::AxError;
use ax_core::timing::{Timer, solver_timing};
use nalgebra::{DMatrix, DVector, Vector3};
use rayon::prelude::*;

use crate::biot_savart;
use crate::config::{AeroConfig, WakeModel};
use crate::error::{AeroError, AeroResult};
use crate::field::VelocityField;
use crate::state::{AerodynamicState, SurfaceState};

/// Pivot ratio below which the influence matrix is treated as singular.
const SINGULAR_PIVOT_RATIO: f64 = 1e-12;

/// Grid point positions and velocities of one surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMotion {
    pub points: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

/// Vorticity contributing to an induced velocity.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Sources {
    /// Bound and wake rings
    All,
    /// Wake rings except the newest row, which enters the system through
    /// the Kutta condition
    SettledWake,
}

fn induced_velocity(
    surfaces: &[SurfaceState],
    p: &Vector3<f64>,
    sources: Sources,
    cutoff: f64,
) -> Vector3<f64> {
    let mut v = Vector3::zeros();
    for s in surfaces {
        if sources == Sources::All {
            let l = &s.lattice;
            for i in 0..l.m() {
                for j in 0..l.n() {
                    let g = s.gamma[l.panel_index(i, j)];
                    if g != 0.0 {
                        v += biot_savart::ring(p, &l.corners(i, j), g, cutoff);
                    }
                }
            }
        }
        let rows = match sources {
            Sources::All => s.wake.ring_rows(),
            Sources::SettledWake => s.wake.ring_rows().saturating_sub(1),
        };
        for k in 0..rows {
            for j in 0..s.wake.n() {
                let g = s.wake.gamma(k, j);
                if g != 0.0 {
                    v += biot_savart::ring(p, &s.wake.ring_corners(k, j), g, cutoff);
                }
            }
        }
    }
    v
}

/// Convect the wake of `previous` over `dt` and shed a new ring row.
///
/// The new row is attached to the previous trailing edge; `solve` moves it
/// onto the current one and sets its strength.
pub fn begin_step(
    previous: &AerodynamicState,
    config: &AeroConfig,
    field: &dyn VelocityField,
    dt: f64,
) -> AeroResult<AerodynamicState> {
    ax_core::ensure_positive(dt, "aerodynamic time step")?;
    let timer = Timer::start();
    let t = previous.time;

    let mut next = previous.clone();
    for s in &mut next.surfaces {
        let velocities = s
            .wake
            .live_vertices()
            .par_iter()
            .map(|p| {
                let mut v = field.velocity(p, t)?;
                if config.wake == WakeModel::Free {
                    v += induced_velocity(&previous.surfaces, p, Sources::All, config.vortex_radius);
                }
                Ok(v)
            })
            .collect::<AeroResult<Vec<_>>>()?;
        for (p, v) in s.wake.live_vertices_mut().iter_mut().zip(&velocities) {
            *p += v * dt;
        }

        let te = s.lattice.trailing_edge().to_vec();
        let te_gamma = s.trailing_edge_gamma().to_vec();
        s.wake.shed(&te, &te_gamma)?;
        s.wake.prune_to(config.max_wake_rows);
    }

    next.start_gamma = previous.surfaces.iter().map(|s| s.gamma.clone()).collect();
    next.time = t + dt;
    next.step = previous.step + 1;
    next.dt = dt;
    timer.stop_into(&solver_timing::WAKE_CONVECTION);

    tracing::debug!(
        step = next.step,
        time = next.time,
        wake_rings = next.wake_ring_count(),
        "wake convected"
    );
    Ok(next)
}

/// Solve the bound circulation for the given surface motion and compute forces.
pub fn solve(
    state: &mut AerodynamicState,
    config: &AeroConfig,
    field: &dyn VelocityField,
    motions: &[SurfaceMotion],
) -> AeroResult<()> {
    if motions.len() != state.surfaces.len() {
        return Err(AxError::Invariant {
            what: "one surface motion per aerodynamic surface is required",
        }
        .into());
    }
    let timer = Timer::start();
    let t = state.time;
    let cutoff = config.vortex_radius;

    for (s, motion) in state.surfaces.iter_mut().zip(motions) {
        if motion.velocities.len() != motion.points.len() {
            return Err(AeroError::InvalidLattice {
                what: format!("surface '{}' motion has mismatched tables", s.name),
            });
        }
        s.lattice.set_points(motion.points.clone())?;
        s.grid_velocities = motion.velocities.clone();
        s.update_panels();
        s.wake.attach_to(s.lattice.trailing_edge());
    }

    let gamma = solve_circulation(state, field, t, cutoff)?;

    let mut offset = 0;
    for (s, start) in state.surfaces.iter_mut().zip(&state.start_gamma) {
        let count = s.lattice.panel_count();
        s.gamma = gamma.as_slice()[offset..offset + count].to_vec();
        s.gamma_dot = if state.dt > 0.0 {
            s.gamma
                .iter()
                .zip(start)
                .map(|(g, g0)| (g - g0) / state.dt)
                .collect()
        } else {
            vec![0.0; count]
        };
        let te_gamma = s.trailing_edge_gamma().to_vec();
        s.wake.set_newest_gamma(&te_gamma);
        offset += count;
    }

    let unsteady =
        config.include_unsteady_force && state.step > config.steps_without_unsteady_force;
    let forces = state
        .surfaces
        .iter()
        .map(|s| surface_forces(s, &state.surfaces, field, t, config, unsteady))
        .collect::<AeroResult<Vec<_>>>()?;
    for (s, f) in state.surfaces.iter_mut().zip(forces) {
        s.forces = f;
    }
    timer.stop_into(&solver_timing::AERO_SOLVE);

    tracing::debug!(
        step = state.step,
        bound = state.total_bound_circulation(),
        force_z = state.total_force().z,
        "aerodynamic solve"
    );
    Ok(())
}

/// Assemble and solve the no-penetration system with the implicit Kutta condition.
fn solve_circulation(
    state: &AerodynamicState,
    field: &dyn VelocityField,
    t: f64,
    cutoff: f64,
) -> AeroResult<DVector<f64>> {
    let surfaces = &state.surfaces;
    // (surface, i, j) of every bound panel in global order
    let panels: Vec<(usize, usize, usize)> = surfaces
        .iter()
        .enumerate()
        .flat_map(|(s, surf)| {
            let (m, n) = (surf.lattice.m(), surf.lattice.n());
            (0..m).flat_map(move |i| (0..n).map(move |j| (s, i, j)))
        })
        .collect();
    let count = panels.len();
    let offsets: Vec<usize> = surfaces
        .iter()
        .scan(0, |acc, s| {
            let o = *acc;
            *acc += s.lattice.panel_count();
            Some(o)
        })
        .collect();

    let rows = panels
        .par_iter()
        .map(|&(sp, ip, jp)| {
            let sp = &surfaces[sp];
            let k = sp.lattice.panel_index(ip, jp);
            let c = sp.collocation[k];
            let n = sp.normals[k];

            let mut row = vec![0.0; count];
            for (q, &(sq, iq, jq)) in panels.iter().enumerate() {
                let corners = surfaces[sq].lattice.corners(iq, jq);
                row[q] = biot_savart::ring(&c, &corners, 1.0, cutoff).dot(&n);
            }
            // Newest wake ring carries the trailing-edge strength
            for (s, surf) in surfaces.iter().enumerate() {
                let rows = surf.wake.ring_rows();
                if rows == 0 {
                    continue;
                }
                let m = surf.lattice.m();
                for j in 0..surf.lattice.n() {
                    let corners = surf.wake.ring_corners(rows - 1, j);
                    row[offsets[s] + surf.lattice.panel_index(m - 1, j)] +=
                        biot_savart::ring(&c, &corners, 1.0, cutoff).dot(&n);
                }
            }

            let corner_velocity: Vector3<f64> = sp
                .lattice
                .corner_indices(ip, jp)
                .iter()
                .map(|&g| sp.grid_velocities[g])
                .sum::<Vector3<f64>>()
                * 0.25;
            let v = field.velocity(&c, t)? + induced_velocity(surfaces, &c, Sources::SettledWake, cutoff)
                - corner_velocity;
            Ok((row, -v.dot(&n)))
        })
        .collect::<AeroResult<Vec<_>>>()?;

    let mut a = DMatrix::zeros(count, count);
    let mut b = DVector::zeros(count);
    for (p, (row, rhs)) in rows.into_iter().enumerate() {
        a.row_mut(p).copy_from_slice(&row);
        b[p] = rhs;
    }

    let lu = a.lu();
    let pivots = lu.u().diagonal().map(f64::abs);
    let (min, max) = (pivots.min(), pivots.max());
    if !(max > 0.0 && min / max > SINGULAR_PIVOT_RATIO) {
        return Err(AeroError::SingularSystem {
            what: format!("influence matrix pivot ratio {:e}", if max > 0.0 { min / max } else { 0.0 }),
        });
    }
    let gamma = lu.solve(&b).ok_or_else(|| AeroError::SingularSystem {
        what: "influence matrix factorization failed".to_string(),
    })?;
    if let Some(bad) = gamma.iter().find(|g| !g.is_finite()) {
        return Err(AxError::NonFinite {
            what: "bound circulation",
            value: *bad,
        }
        .into());
    }
    Ok(gamma)
}

/// Grid point forces of one surface: Joukowski forces on every bound
/// segment split between its end points, plus the added-mass term split
/// between the four ring corners.
fn surface_forces(
    surface: &SurfaceState,
    surfaces: &[SurfaceState],
    field: &dyn VelocityField,
    t: f64,
    config: &AeroConfig,
    unsteady: bool,
) -> AeroResult<Vec<Vector3<f64>>> {
    let l = &surface.lattice;
    let (m, n) = (l.m(), l.n());
    let gamma = |i: usize, j: usize| surface.gamma[l.panel_index(i, j)];

    // (start point, end point, net strength along start → end)
    let mut segments = Vec::with_capacity(m * n + m * (n + 1));
    for i in 0..m {
        for j in 0..n {
            // The trailing-edge segment cancels against the newest wake ring
            let upstream = if i > 0 { gamma(i - 1, j) } else { 0.0 };
            segments.push((l.point_index(i, j), l.point_index(i, j + 1), gamma(i, j) - upstream));
        }
        for j in 0..=n {
            let left = if j > 0 { gamma(i, j - 1) } else { 0.0 };
            let right = if j < n { gamma(i, j) } else { 0.0 };
            segments.push((l.point_index(i, j), l.point_index(i + 1, j), left - right));
        }
    }

    let points = l.points();
    let velocities = &surface.grid_velocities;
    let segment_forces = segments
        .par_iter()
        .map(|&(a, b, g)| {
            if g == 0.0 {
                return Ok(Vector3::zeros());
            }
            let mid = (points[a] + points[b]) * 0.5;
            let v = field.velocity(&mid, t)?
                + induced_velocity(surfaces, &mid, Sources::All, config.vortex_radius)
                - (velocities[a] + velocities[b]) * 0.5;
            Ok(v.cross(&(points[b] - points[a])) * (config.rho * g))
        })
        .collect::<AeroResult<Vec<_>>>()?;

    let mut forces = vec![Vector3::zeros(); l.point_count()];
    for (&(a, b, _), f) in segments.iter().zip(&segment_forces) {
        forces[a] += f * 0.5;
        forces[b] += f * 0.5;
    }

    if unsteady {
        for i in 0..m {
            for j in 0..n {
                let k = l.panel_index(i, j);
                let f = surface.normals[k] * (config.rho * surface.gamma_dot[k] * surface.areas[k]);
                for c in l.corner_indices(i, j) {
                    forces[c] += f * 0.25;
                }
            }
        }
    }
    Ok(forces)
}
