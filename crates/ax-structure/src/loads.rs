//! External nodal loads.

use ax_core::NodeId;
use nalgebra::Vector3;
use std::ops::AddAssign;

/// Force and moment applied at a node (global frame).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodalLoad {
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl AddAssign for NodalLoad {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.moment += rhs.moment;
    }
}

/// One `NodalLoad` per structural node, indexed by node ID.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodalLoads {
    loads: Vec<NodalLoad>,
}

impl NodalLoads {
    pub fn zeros(node_count: usize) -> Self {
        Self {
            loads: vec![NodalLoad::default(); node_count],
        }
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Load at a node (zero if the node is out of range).
    pub fn get(&self, node: NodeId) -> NodalLoad {
        self.loads.get(node.idx()).copied().unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[NodalLoad] {
        &self.loads
    }

    pub fn add_force(&mut self, node: NodeId, force: Vector3<f64>) {
        if let Some(l) = self.loads.get_mut(node.idx()) {
            l.force += force;
        }
    }

    pub fn add_moment(&mut self, node: NodeId, moment: Vector3<f64>) {
        if let Some(l) = self.loads.get_mut(node.idx()) {
            l.moment += moment;
        }
    }

    /// Accumulate another load set of the same size.
    pub fn accumulate(&mut self, other: &NodalLoads) {
        for (l, o) in self.loads.iter_mut().zip(&other.loads) {
            *l += *o;
        }
    }

    /// Under-relaxed update `previous + ω (self − previous)`.
    pub fn relaxed(&self, previous: &NodalLoads, omega: f64) -> NodalLoads {
        let loads = self
            .loads
            .iter()
            .zip(&previous.loads)
            .map(|(new, old)| NodalLoad {
                force: old.force + (new.force - old.force) * omega,
                moment: old.moment + (new.moment - old.moment) * omega,
            })
            .collect();
        NodalLoads { loads }
    }

    /// Euclidean norm over all force and moment components.
    pub fn norm(&self) -> f64 {
        self.loads
            .iter()
            .map(|l| l.force.norm_squared() + l.moment.norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// Norm of the difference with another load set.
    pub fn distance(&self, other: &NodalLoads) -> f64 {
        self.loads
            .iter()
            .zip(&other.loads)
            .map(|(a, b)| (a.force - b.force).norm_squared() + (a.moment - b.moment).norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    pub fn total_force(&self) -> Vector3<f64> {
        self.loads.iter().map(|l| l.force).sum()
    }

    /// Net moment about `point`, given the current node positions.
    pub fn total_moment(&self, positions: &[Vector3<f64>], point: &Vector3<f64>) -> Vector3<f64> {
        self.loads
            .iter()
            .zip(positions)
            .map(|(l, x)| l.moment + (x - point).cross(&l.force))
            .sum()
    }
}
