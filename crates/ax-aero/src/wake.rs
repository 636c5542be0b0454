//! Wake vortex rings stored as an index arena.
//!
//! Vertex rows are appended in shedding order, so row `k + 1` is younger
//! than row `k` and the newest row sits on the trailing edge. Ring `k` spans
//! rows `k` and `k + 1`. Rows before `live_start` have been truncated and
//! are skipped by every query; the storage is compacted once the dead prefix
//! outgrows the live part.
//!
//! Once a row leaves the trailing edge its strength is frozen, and the
//! spanwise vorticity it adds over the row behind it is booked into a
//! running total that truncation never touches.

use nalgebra::Vector3;

use crate::error::{AeroError, AeroResult};

#[derive(Clone, Debug, PartialEq)]
pub struct WakeArena {
    /// Spanwise panels per row
    n: usize,
    /// Vertex rows, `n + 1` points each
    vertices: Vec<Vector3<f64>>,
    /// Ring strengths, `n` per ring
    gamma: Vec<f64>,
    /// First live row
    live_start: usize,
    /// Circulation released by rows that have left the trailing edge
    frozen_release: f64,
}

impl WakeArena {
    /// Wake with a single vertex row on the trailing edge and no rings.
    pub fn new(trailing_edge: &[Vector3<f64>]) -> AeroResult<Self> {
        if trailing_edge.len() < 2 {
            return Err(AeroError::InvalidLattice {
                what: "trailing edge needs at least two points".to_string(),
            });
        }
        Ok(Self {
            n: trailing_edge.len() - 1,
            vertices: trailing_edge.to_vec(),
            gamma: Vec::new(),
            live_start: 0,
            frozen_release: 0.0,
        })
    }

    /// Spanwise ring count.
    pub fn n(&self) -> usize {
        self.n
    }

    fn total_rows(&self) -> usize {
        self.vertices.len() / (self.n + 1)
    }

    /// Live vertex rows.
    pub fn row_count(&self) -> usize {
        self.total_rows() - self.live_start
    }

    /// Live ring rows.
    pub fn ring_rows(&self) -> usize {
        self.row_count().saturating_sub(1)
    }

    pub fn ring_count(&self) -> usize {
        self.ring_rows() * self.n
    }

    /// Live vertex row `k` (0 = oldest).
    pub fn row(&self, k: usize) -> &[Vector3<f64>] {
        let start = (self.live_start + k) * (self.n + 1);
        &self.vertices[start..start + self.n + 1]
    }

    /// All live vertices, oldest row first.
    pub fn live_vertices(&self) -> &[Vector3<f64>] {
        &self.vertices[self.live_start * (self.n + 1)..]
    }

    pub fn live_vertices_mut(&mut self) -> &mut [Vector3<f64>] {
        let start = self.live_start * (self.n + 1);
        &mut self.vertices[start..]
    }

    /// Strength of live ring `(k, j)`.
    pub fn gamma(&self, k: usize, j: usize) -> f64 {
        self.gamma[(self.live_start + k) * self.n + j]
    }

    /// Strengths of the live ring row `k`.
    pub fn ring_row_gamma(&self, k: usize) -> &[f64] {
        let start = (self.live_start + k) * self.n;
        &self.gamma[start..start + self.n]
    }

    /// Corners of live ring `(k, j)`, upstream edge first.
    pub fn ring_corners(&self, k: usize, j: usize) -> [Vector3<f64>; 4] {
        let up = self.row(k + 1);
        let down = self.row(k);
        [up[j], up[j + 1], down[j + 1], down[j]]
    }

    /// Iterate over every live ring with its strength.
    pub fn rings(&self) -> impl Iterator<Item = ([Vector3<f64>; 4], f64)> + '_ {
        (0..self.ring_rows())
            .flat_map(move |k| (0..self.n).map(move |j| (self.ring_corners(k, j), self.gamma(k, j))))
    }

    /// Shed a new row: append trailing-edge vertices and a ring row of strengths.
    pub fn shed(&mut self, trailing_edge: &[Vector3<f64>], gamma: &[f64]) -> AeroResult<()> {
        if trailing_edge.len() != self.n + 1 || gamma.len() != self.n {
            return Err(AeroError::InvalidLattice {
                what: format!(
                    "shed row has {} points and {} strengths, wake expects {} and {}",
                    trailing_edge.len(),
                    gamma.len(),
                    self.n + 1,
                    self.n
                ),
            });
        }
        self.frozen_release += self.newest_release();
        self.vertices.extend_from_slice(trailing_edge);
        self.gamma.extend_from_slice(gamma);
        Ok(())
    }

    /// Newest ring row total minus the row behind it.
    fn newest_release(&self) -> f64 {
        let newest: f64 = self.newest_gamma().map_or(0.0, |g| g.iter().sum());
        let previous: f64 = self.previous_gamma().map_or(0.0, |g| g.iter().sum());
        newest - previous
    }

    /// Net spanwise circulation released into the wake since the start,
    /// rows already truncated included. Equals the newest row total while
    /// shed rows keep their strengths.
    pub fn released_circulation(&self) -> f64 {
        self.frozen_release + self.newest_release()
    }

    /// Move the newest row onto the current trailing edge.
    pub fn attach_to(&mut self, trailing_edge: &[Vector3<f64>]) {
        let start = self.vertices.len() - (self.n + 1);
        self.vertices[start..].copy_from_slice(&trailing_edge[..self.n + 1]);
    }

    /// Set the strengths of the newest ring row (no-op without rings).
    pub fn set_newest_gamma(&mut self, gamma: &[f64]) {
        if self.ring_rows() == 0 {
            return;
        }
        let start = self.gamma.len() - self.n;
        self.gamma[start..].copy_from_slice(&gamma[..self.n]);
    }

    pub fn newest_gamma(&self) -> Option<&[f64]> {
        (self.ring_rows() > 0).then(|| &self.gamma[self.gamma.len() - self.n..])
    }

    /// Strengths of the second-newest ring row.
    pub fn previous_gamma(&self) -> Option<&[f64]> {
        (self.ring_rows() > 1).then(|| {
            let end = self.gamma.len() - self.n;
            &self.gamma[end - self.n..end]
        })
    }

    /// Drop the oldest rings so at most `max_rows` ring rows stay live.
    pub fn prune_to(&mut self, max_rows: usize) {
        let excess = self.ring_rows().saturating_sub(max_rows);
        if excess == 0 {
            return;
        }
        self.live_start += excess;
        if self.live_start > self.row_count() {
            self.compact();
        }
    }

    fn compact(&mut self) {
        self.vertices.drain(..self.live_start * (self.n + 1));
        self.gamma.drain(..self.live_start * self.n);
        self.live_start = 0;
    }
}
