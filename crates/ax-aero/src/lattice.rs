//! Vortex-ring lattice geometry.
//!
//! A lattice has `m` chordwise and `n` spanwise panels on an `(m+1)×(n+1)`
//! grid. Row `i = 0` is the leading edge and row `i = m` the trailing edge.
//! Ring `(i, j)` has corners `(i,j) → (i,j+1) → (i+1,j+1) → (i+1,j)`, which
//! orients its normal so that positive circulation produces lift along it.

use nalgebra::Vector3;

use crate::error::{AeroError, AeroResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    m: usize,
    n: usize,
    points: Vec<Vector3<f64>>,
}

impl Lattice {
    pub fn new(m: usize, n: usize, points: Vec<Vector3<f64>>) -> AeroResult<Self> {
        if m == 0 || n == 0 {
            return Err(AeroError::InvalidLattice {
                what: format!("lattice needs at least one panel (got {m}×{n})"),
            });
        }
        if points.len() != (m + 1) * (n + 1) {
            return Err(AeroError::InvalidLattice {
                what: format!(
                    "{}×{} lattice needs {} grid points, got {}",
                    m,
                    n,
                    (m + 1) * (n + 1),
                    points.len()
                ),
            });
        }
        if points.iter().any(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(AeroError::InvalidLattice {
                what: "non-finite grid point".to_string(),
            });
        }
        Ok(Self { m, n, points })
    }

    /// Flat rectangular lattice spanned by a chord vector and a span vector.
    pub fn rectangular(
        leading_edge_root: Vector3<f64>,
        chord: Vector3<f64>,
        span: Vector3<f64>,
        m: usize,
        n: usize,
    ) -> AeroResult<Self> {
        let mut points = Vec::with_capacity((m + 1) * (n + 1));
        for i in 0..=m {
            for j in 0..=n {
                let s = i as f64 / m.max(1) as f64;
                let t = j as f64 / n.max(1) as f64;
                points.push(leading_edge_root + chord * s + span * t);
            }
        }
        Self::new(m, n, points)
    }

    /// Chordwise panel count.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Spanwise panel count.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn panel_count(&self) -> usize {
        self.m * self.n
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    pub fn point_index(&self, i: usize, j: usize) -> usize {
        i * (self.n + 1) + j
    }

    pub fn panel_index(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    pub fn point(&self, i: usize, j: usize) -> Vector3<f64> {
        self.points[self.point_index(i, j)]
    }

    /// Grid indices of the four ring corners of panel `(i, j)`.
    pub fn corner_indices(&self, i: usize, j: usize) -> [usize; 4] {
        [
            self.point_index(i, j),
            self.point_index(i, j + 1),
            self.point_index(i + 1, j + 1),
            self.point_index(i + 1, j),
        ]
    }

    pub fn corners(&self, i: usize, j: usize) -> [Vector3<f64>; 4] {
        self.corner_indices(i, j).map(|k| self.points[k])
    }

    /// Trailing-edge row of grid points.
    pub fn trailing_edge(&self) -> &[Vector3<f64>] {
        let start = self.point_index(self.m, 0);
        &self.points[start..start + self.n + 1]
    }

    /// Replace the grid points, keeping the panel counts.
    pub fn set_points(&mut self, points: Vec<Vector3<f64>>) -> AeroResult<()> {
        *self = Self::new(self.m, self.n, points)?;
        Ok(())
    }
}

/// Unit normal of a ring from its diagonals.
pub fn ring_normal(c: &[Vector3<f64>; 4]) -> Vector3<f64> {
    let d = (c[3] - c[1]).cross(&(c[2] - c[0]));
    let norm = d.norm();
    if norm > 0.0 { d / norm } else { Vector3::zeros() }
}

/// Ring area (half the diagonal cross product magnitude).
pub fn ring_area(c: &[Vector3<f64>; 4]) -> f64 {
    0.5 * (c[3] - c[1]).cross(&(c[2] - c[0])).norm()
}

pub fn ring_centroid(c: &[Vector3<f64>; 4]) -> Vector3<f64> {
    (c[0] + c[1] + c[2] + c[3]) * 0.25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangular_plate_geometry() {
        let l = Lattice::rectangular(
            Vector3::zeros(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 4.0, 0.0),
            2,
            4,
        )
        .unwrap();
        assert_eq!(l.point_count(), 15);
        assert_eq!(l.panel_count(), 8);
        let c = l.corners(1, 2);
        assert!((ring_normal(&c) - Vector3::z()).norm() < 1e-15);
        assert!((ring_area(&c) - 0.5).abs() < 1e-15);
        assert!((ring_centroid(&c) - Vector3::new(0.75, 2.5, 0.0)).norm() < 1e-15);
        assert_eq!(l.trailing_edge().len(), 5);
        assert!((l.trailing_edge()[0].x - 1.0).abs() < 1e-15);
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let err = Lattice::new(1, 1, vec![Vector3::zeros(); 3]).unwrap_err();
        assert!(matches!(err, AeroError::InvalidLattice { .. }));
    }
}
