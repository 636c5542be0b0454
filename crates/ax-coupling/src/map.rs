//! Correspondence between aerodynamic grid points and structural nodes.
//!
//! Every spanwise grid column of a lattice is carried by one structural
//! node; a grid point is stored as an offset from that node in the node's
//! reference material frame. Panel `(i, j)` belongs to the element joining
//! the nodes of columns `j` and `j + 1`.

use ax_aero::AerodynamicState;
use ax_core::rotation::matrix;
use ax_core::{ElemId, NodeId, SurfaceId};
use ax_topology::Topology;
use nalgebra::Vector3;

use crate::error::{CouplingError, CouplingResult};

/// Structural nodes carrying the spanwise grid columns of one surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceBinding {
    pub surface: SurfaceId,
    /// One node per grid column `j = 0..=n`
    pub columns: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMap {
    pub surface: SurfaceId,
    m: usize,
    n: usize,
    /// Owning node of each grid point
    owners: Vec<NodeId>,
    /// Grid point offset in the owner's reference material frame
    offsets: Vec<Vector3<f64>>,
    /// Owning element of each panel
    panel_elements: Vec<ElemId>,
}

impl SurfaceMap {
    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn owners(&self) -> &[NodeId] {
        &self.owners
    }

    pub fn offsets(&self) -> &[Vector3<f64>] {
        &self.offsets
    }

    pub fn panel_element(&self, i: usize, j: usize) -> ElemId {
        self.panel_elements[i * self.n + j]
    }

    pub fn point_index(&self, i: usize, j: usize) -> usize {
        i * (self.n + 1) + j
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CouplingMap {
    surfaces: Vec<SurfaceMap>,
    /// Grid points carried by each structural node
    node_points: Vec<usize>,
}

impl CouplingMap {
    /// Build the map from the reference structure and lattices.
    pub fn build(
        topology: &Topology,
        aero: &AerodynamicState,
        bindings: &[SurfaceBinding],
    ) -> CouplingResult<Self> {
        let mut node_points = vec![0; topology.nodes().len()];
        let mut surfaces = Vec::with_capacity(aero.surfaces.len());

        for surface in &aero.surfaces {
            let mut matching = bindings.iter().filter(|b| b.surface == surface.id);
            let binding = matching.next().ok_or_else(|| mapping(format!(
                "surface '{}' is not bound to the structure",
                surface.name
            )))?;
            if matching.next().is_some() {
                return Err(mapping(format!("surface '{}' is bound twice", surface.name)));
            }

            let lattice = &surface.lattice;
            let (m, n) = (lattice.m(), lattice.n());
            if binding.columns.len() != n + 1 {
                return Err(mapping(format!(
                    "surface '{}' has {} grid columns but {} bound nodes",
                    surface.name,
                    n + 1,
                    binding.columns.len()
                )));
            }
            let mut column_frames = Vec::with_capacity(n + 1);
            for &node in &binding.columns {
                let reference = topology
                    .node(node)
                    .ok_or_else(|| mapping(format!("binding uses unknown node {node}")))?;
                column_frames.push((reference.position, matrix(&reference.orientation)));
            }

            let mut owners = Vec::with_capacity(lattice.point_count());
            let mut offsets = Vec::with_capacity(lattice.point_count());
            for i in 0..=m {
                for j in 0..=n {
                    let (x, r) = &column_frames[j];
                    owners.push(binding.columns[j]);
                    offsets.push(r.transpose() * (lattice.point(i, j) - x));
                    node_points[binding.columns[j].idx()] += 1;
                }
            }

            let mut panel_elements = Vec::with_capacity(m * n);
            for _ in 0..m {
                for j in 0..n {
                    let (a, b) = (binding.columns[j], binding.columns[j + 1]);
                    let elem = topology.element_between(a, b).ok_or_else(|| {
                        mapping(format!(
                            "panel strip {j} of surface '{}' has no element between nodes {a} and {b}",
                            surface.name
                        ))
                    })?;
                    panel_elements.push(elem);
                }
            }

            surfaces.push(SurfaceMap {
                surface: surface.id,
                m,
                n,
                owners,
                offsets,
                panel_elements,
            });
        }

        tracing::debug!(
            surfaces = surfaces.len(),
            load_nodes = node_points.iter().filter(|&&c| c > 0).count(),
            "coupling map built"
        );
        Ok(Self {
            surfaces,
            node_points,
        })
    }

    pub fn surfaces(&self) -> &[SurfaceMap] {
        &self.surfaces
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceMap> {
        self.surfaces.iter().find(|s| s.surface == id)
    }

    /// Number of grid points whose loads go to `node`.
    pub fn point_count(&self, node: NodeId) -> usize {
        self.node_points.get(node.idx()).copied().unwrap_or(0)
    }

    /// Nodes receiving aerodynamic loads.
    pub fn load_bearing_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_points
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(k, _)| ax_core::Id::from_usize(k))
    }
}

fn mapping(what: String) -> CouplingError {
    CouplingError::Mapping { what }
}
