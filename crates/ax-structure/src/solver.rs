//! Structural step and static solves.
//!
//! Unknowns per free node are the translation increment `u` and the
//! rotation-vector increment `Θ` of the step (`x = x_n + u`, `R = exp(Θ) R_n`),
//! followed by the joint multipliers. Element, node and joint blocks are
//! assembled from local residuals; their tangents are central differences of
//! those residuals. Element blocks are evaluated in parallel and scattered in
//! element order, so repeated solves are bit-identical.
//!
//! Constraint rows enter the residual multiplied by the stiffest element's
//! axial (gap rows) or bending (rotation rows) stiffness per unit length, so
//! they weigh like forces in the line-search norm. Multipliers stay physical.

use ax_core::rotation::{compose, matrix, tangent_operator};
use ax_core::timing::{Timer, solver_timing};
use ax_core::{AxError, ensure_positive};
use nalgebra::{DMatrix, DVector, Vector3};
use rayon::prelude::*;

use crate::config::{StructuralConfig, StructuralDynamics};
use crate::element::Placement;
use crate::error::{StructureError, StructureResult};
use crate::integrator::Newmark;
use crate::jacobian::central_difference_jacobian;
use crate::joints::{constraint, joint_angle, relative_rotation};
use crate::loads::NodalLoads;
use crate::model::{StructuralInputs, StructuralModel};
use crate::newton::{NewtonResult, newton_solve_with_floor};
use crate::prescribed::NodePose;
use crate::state::{ElementStrain, JointState, NodeState, StructuralState, SupportReaction};

/// Outcome of a structural solve.
#[derive(Clone, Debug)]
pub struct StepReport {
    pub state: StructuralState,
    pub newton_iterations: usize,
    pub residual_norm: f64,
}

/// Multiple of the unit round-off allowed in a stalled residual.
const ROUNDOFF_MARGIN: f64 = 4.0;

#[derive(Clone, Copy, Debug)]
enum Inertia {
    Static,
    Dynamic { dt: f64, newmark: Newmark },
}

/// Advance the structure by `dt` under external `loads`.
///
/// `inputs` must be sampled at the end-of-step time. In
/// `StructuralDynamics::Static` mode the step is a quasi-static equilibrium
/// solve.
pub fn step(
    model: &StructuralModel,
    config: &StructuralConfig,
    previous: &StructuralState,
    loads: &NodalLoads,
    inputs: &StructuralInputs,
    dt: f64,
) -> StructureResult<StepReport> {
    ensure_positive(dt, "structural time step")?;
    let inertia = match config.dynamics {
        StructuralDynamics::Static => Inertia::Static,
        StructuralDynamics::Dynamic => Inertia::Dynamic {
            dt,
            newmark: Newmark::with_damping(config.newmark_damping),
        },
    };
    StepProblem::new(model, config, previous, loads, inputs, inertia)?.solve()
}

/// Static equilibrium under `loads`, starting from `initial`.
pub fn solve_static(
    model: &StructuralModel,
    config: &StructuralConfig,
    initial: &StructuralState,
    loads: &NodalLoads,
    inputs: &StructuralInputs,
) -> StructureResult<StepReport> {
    StepProblem::new(model, config, initial, loads, inputs, Inertia::Static)?.solve()
}

struct StepProblem<'a> {
    model: &'a StructuralModel,
    config: &'a StructuralConfig,
    previous: &'a StructuralState,
    loads: &'a NodalLoads,
    inputs: &'a StructuralInputs,
    inertia: Inertia,
    gravity: Vector3<f64>,
    /// Start-of-step placement of free nodes, commanded placement of prescribed ones
    base: Vec<Placement>,
    /// Commanded pose of prescribed nodes
    commanded: Vec<Option<NodePose>>,
    /// First DOF of each node (None if prescribed)
    offsets: Vec<Option<usize>>,
    /// Weights of the gap and rotation constraint rows
    constraint_scale: [f64; 2],
}

/// Largest force and moment stiffness per unit length over the elements,
/// 1 where the model has none.
fn constraint_scale(model: &StructuralModel) -> [f64; 2] {
    let sections = model.sections();
    let (force, moment) = model
        .topology()
        .elements()
        .iter()
        .zip(model.geometry())
        .fold((0.0_f64, 0.0_f64), |(f, m), (elem, geom)| {
            let section = &sections[elem.section];
            (
                f.max(section.force_stiffness().amax() / geom.l0),
                m.max(section.moment_stiffness().amax() / geom.l0),
            )
        });
    let positive = |k: f64| if k.is_finite() && k > 0.0 { k } else { 1.0 };
    [positive(force), positive(moment)]
}

impl<'a> StepProblem<'a> {
    fn new(
        model: &'a StructuralModel,
        config: &'a StructuralConfig,
        previous: &'a StructuralState,
        loads: &'a NodalLoads,
        inputs: &'a StructuralInputs,
        inertia: Inertia,
    ) -> StructureResult<Self> {
        let topology = model.topology();
        let n = topology.nodes().len();
        if previous.nodes.len() != n || loads.len() != n {
            return Err(AxError::Invariant {
                what: "state and load vectors must match the structural node count",
            }
            .into());
        }

        let mut commanded = vec![None; n];
        for p in model.prescribed() {
            let pose = inputs.pose(p.node).ok_or_else(|| StructureError::Setup {
                what: format!("no commanded pose for prescribed node {}", p.node),
            })?;
            commanded[p.node.idx()] = Some(*pose);
        }
        let base = previous
            .nodes
            .iter()
            .zip(&commanded)
            .map(|(s, c)| match c {
                Some(pose) => Placement::new(pose.position, pose.orientation),
                None => s.placement(),
            })
            .collect();
        let offsets = topology
            .nodes()
            .iter()
            .map(|node| model.dofs().node_offset(node.id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            model,
            config,
            previous,
            loads,
            inputs,
            inertia,
            gravity: config.gravity_vector(),
            base,
            commanded,
            offsets,
            constraint_scale: constraint_scale(model),
        })
    }

    fn solve(&self) -> StructureResult<StepReport> {
        let timer = Timer::start();
        let x0 = self.initial_guess();
        let result = newton_solve_with_floor(
            x0,
            |x| self.residual(x),
            |x| self.jacobian(x),
            &self.config.newton,
            self.residual_floor(),
        );
        timer.stop_into(&solver_timing::STRUCTURE_SOLVE);
        let result = result?;
        tracing::debug!(
            iterations = result.iterations,
            residual = result.residual_norm,
            time = self.inputs.time,
            "structural solve converged"
        );
        self.finish(result)
    }

    /// Round-off level of the assembled residual: element forces come from
    /// differences of absolute positions scaled by the axial stiffness.
    fn residual_floor(&self) -> f64 {
        let topology = self.model.topology();
        let stiffness = topology
            .elements()
            .iter()
            .enumerate()
            .map(|(e, elem)| {
                self.model.sections()[elem.section].force_stiffness().amax() * self.stiffness_factor(e)
                    / self.model.geometry()[e].l0
            })
            .fold(0.0, f64::max);
        let extent = self
            .base
            .iter()
            .map(|p| p.position.amax())
            .fold(1.0, f64::max);
        let dofs = self.model.dofs().len() as f64;
        ROUNDOFF_MARGIN * f64::EPSILON * stiffness * extent * dofs.sqrt()
    }

    /// Node placement for local increments `z = [u, Θ]`.
    fn placement(&self, node: usize, z: &[f64]) -> Placement {
        let b = &self.base[node];
        Placement::new(
            b.position + Vector3::new(z[0], z[1], z[2]),
            compose(&Vector3::new(z[3], z[4], z[5]), &b.orientation),
        )
    }

    /// Local increments of a node (zero for prescribed nodes).
    fn increments(&self, node: usize, x: &DVector<f64>) -> [f64; 6] {
        let mut z = [0.0; 6];
        if let Some(o) = self.offsets[node] {
            z.copy_from_slice(&x.as_slice()[o..o + 6]);
        }
        z
    }

    fn gather(&self, nodes: [usize; 2], x: &DVector<f64>, extra: &[f64]) -> DVector<f64> {
        let mut z = DVector::zeros(12 + extra.len());
        z.as_mut_slice()[0..6].copy_from_slice(&self.increments(nodes[0], x));
        z.as_mut_slice()[6..12].copy_from_slice(&self.increments(nodes[1], x));
        z.as_mut_slice()[12..].copy_from_slice(extra);
        z
    }

    /// Global index of entry `i` of a local two-node block (None if prescribed).
    fn global_index(&self, nodes: [usize; 2], multipliers: usize, i: usize) -> Option<usize> {
        if i < 12 {
            self.offsets[nodes[i / 6]].map(|o| o + i % 6)
        } else {
            Some(multipliers + i - 12)
        }
    }

    fn initial_guess(&self) -> DVector<f64> {
        let dofs = self.model.dofs();
        let mut x = DVector::zeros(dofs.len());
        if let Inertia::Dynamic { dt, newmark } = self.inertia {
            for (node, offset) in self.offsets.iter().enumerate() {
                if let Some(o) = *offset {
                    let s = &self.previous.nodes[node];
                    let u = newmark.predict(dt, &s.velocity, &s.acceleration);
                    let theta = newmark.predict(dt, &s.angular_velocity, &s.angular_acceleration);
                    x.fixed_rows_mut::<3>(o).copy_from(&u);
                    x.fixed_rows_mut::<3>(o + 3).copy_from(&theta);
                }
            }
        }
        for (joint, js) in self.model.topology().joints().iter().zip(&self.previous.joints) {
            if let Ok((start, count)) = dofs.joint_block(joint.id) {
                if js.reaction.len() == count {
                    x.rows_mut(start, count).copy_from(&js.reaction);
                }
            }
        }
        x
    }

    /// Map a spatial moment to the rotation-vector unknowns: `T(Θ)ᵀ m`.
    fn map_moment(z: &[f64], moment: &Vector3<f64>) -> Vector3<f64> {
        tangent_operator(&Vector3::new(z[0], z[1], z[2])).transpose() * moment
    }

    fn stiffness_factor(&self, e: usize) -> f64 {
        let topology = self.model.topology();
        if topology.is_rigid(topology.elements()[e].id) {
            self.config.rigid_stiffness_factor
        } else {
            1.0
        }
    }

    fn element_nodes(&self, e: usize) -> [usize; 2] {
        let elem = &self.model.topology().elements()[e];
        [elem.start().idx(), elem.end().idx()]
    }

    /// Element internal forces conjugate to the local increments.
    fn element_residual(&self, e: usize, z: &DVector<f64>) -> DVector<f64> {
        let nodes = self.element_nodes(e);
        let elem = &self.model.topology().elements()[e];
        let z = z.as_slice();
        let a = self.placement(nodes[0], &z[0..6]);
        let b = self.placement(nodes[1], &z[6..12]);
        let g = self.model.geometry()[e].internal_forces(
            &self.model.sections()[elem.section],
            self.stiffness_factor(e),
            &a,
            &b,
        );
        let mut r = DVector::zeros(12);
        for off in [0, 6] {
            let moment = Vector3::new(g[off + 3], g[off + 4], g[off + 5]);
            r.fixed_rows_mut::<3>(off)
                .copy_from(&g.fixed_rows::<3>(off));
            r.fixed_rows_mut::<3>(off + 3)
                .copy_from(&Self::map_moment(&z[off + 3..off + 6], &moment));
        }
        r
    }

    /// Inertial, gravity and external load terms of one node.
    fn node_residual(&self, node: usize, z: &[f64]) -> DVector<f64> {
        let lumped = &self.model.inertia()[node];
        let load = self.loads.as_slice()[node];
        let p = self.placement(node, z);

        let (accel, omega, alpha) = match (self.inertia, &self.commanded[node]) {
            (Inertia::Static, _) => (Vector3::zeros(), Vector3::zeros(), Vector3::zeros()),
            (Inertia::Dynamic { .. }, Some(pose)) => (
                pose.acceleration,
                pose.angular_velocity,
                pose.angular_acceleration,
            ),
            (Inertia::Dynamic { dt, newmark }, None) => {
                let s = &self.previous.nodes[node];
                let u = Vector3::new(z[0], z[1], z[2]);
                let theta = Vector3::new(z[3], z[4], z[5]);
                let (_, a) = newmark.rates(dt, &u, &s.velocity, &s.acceleration);
                let (w, al) =
                    newmark.rates(dt, &theta, &s.angular_velocity, &s.angular_acceleration);
                (a, w, al)
            }
        };

        let force = (accel - self.gravity) * lumped.mass - load.force;
        let rot = matrix(&p.orientation);
        let j = rot * lumped.inertia * rot.transpose();
        let moment = j * alpha + omega.cross(&(j * omega)) - load.moment;

        let mut r = DVector::zeros(6);
        r.fixed_rows_mut::<3>(0).copy_from(&force);
        r.fixed_rows_mut::<3>(3)
            .copy_from(&Self::map_moment(&z[3..6], &moment));
        r
    }

    fn joint_nodes(&self, j: usize) -> [usize; 2] {
        let joint = &self.model.topology().joints()[j];
        [joint.nodes[0].idx(), joint.nodes[1].idx()]
    }

    fn joint_constraint(&self, j: usize, z: &[f64]) -> DVector<f64> {
        let topology = self.model.topology();
        let joint = &topology.joints()[j];
        let nodes = self.joint_nodes(j);
        let reference = [
            &topology.nodes()[nodes[0]].orientation,
            &topology.nodes()[nodes[1]].orientation,
        ];
        let angle = self.inputs.joint_angles.get(j).copied().flatten().unwrap_or(0.0);
        constraint(
            &joint.kind,
            reference,
            &self.placement(nodes[0], &z[0..6]),
            &self.placement(nodes[1], &z[6..12]),
            angle,
        )
    }

    /// Constraint rows as they enter the residual.
    fn weighted_constraint(&self, j: usize, z: &[f64]) -> DVector<f64> {
        let mut g = self.joint_constraint(j, z);
        let [force, moment] = self.constraint_scale;
        for (row, v) in g.iter_mut().enumerate() {
            *v *= if row < 3 { force } else { moment };
        }
        g
    }

    /// Joint block `[Cᵀλ; s g]` for local vector `w = [z_a, z_b, λ]`.
    fn joint_residual(&self, j: usize, w: &DVector<f64>) -> StructureResult<DVector<f64>> {
        let z = w.rows(0, 12).into_owned();
        let lambda = w.rows(12, w.len() - 12);
        let c = central_difference_jacobian(
            &z,
            |z| Ok(self.joint_constraint(j, z.as_slice())),
            self.config.fd_step,
        )?;
        let mut r = DVector::zeros(w.len());
        r.rows_mut(0, 12).copy_from(&(c.transpose() * lambda));
        r.rows_mut(12, w.len() - 12)
            .copy_from(&self.weighted_constraint(j, z.as_slice()));
        Ok(r)
    }

    fn joint_local(&self, j: usize, x: &DVector<f64>) -> StructureResult<(usize, DVector<f64>)> {
        let joint = &self.model.topology().joints()[j];
        let (start, count) = self.model.dofs().joint_block(joint.id)?;
        let lambda = &x.as_slice()[start..start + count];
        Ok((start, self.gather(self.joint_nodes(j), x, lambda)))
    }

    fn residual(&self, x: &DVector<f64>) -> StructureResult<DVector<f64>> {
        let topology = self.model.topology();
        let mut r = DVector::zeros(x.len());

        let element_r: Vec<DVector<f64>> = (0..topology.elements().len())
            .into_par_iter()
            .map(|e| self.element_residual(e, &self.gather(self.element_nodes(e), x, &[])))
            .collect();
        for (e, re) in element_r.iter().enumerate() {
            let nodes = self.element_nodes(e);
            for (i, v) in re.iter().enumerate() {
                if let Some(g) = self.global_index(nodes, 0, i) {
                    r[g] += v;
                }
            }
        }

        for (node, offset) in self.offsets.iter().enumerate() {
            if let Some(o) = *offset {
                let rn = self.node_residual(node, &self.increments(node, x));
                let mut block = r.rows_mut(o, 6);
                block += rn;
            }
        }

        for j in 0..topology.joints().len() {
            let (start, w) = self.joint_local(j, x)?;
            let rj = self.joint_residual(j, &w)?;
            let nodes = self.joint_nodes(j);
            for (i, v) in rj.iter().enumerate() {
                if let Some(g) = self.global_index(nodes, start, i) {
                    r[g] += v;
                }
            }
        }
        Ok(r)
    }

    fn jacobian(&self, x: &DVector<f64>) -> StructureResult<DMatrix<f64>> {
        let topology = self.model.topology();
        let eps = self.config.fd_step;
        let mut jac = DMatrix::zeros(x.len(), x.len());

        let element_k = (0..topology.elements().len())
            .into_par_iter()
            .map(|e| {
                let z = self.gather(self.element_nodes(e), x, &[]);
                central_difference_jacobian(&z, |z| Ok(self.element_residual(e, z)), eps)
            })
            .collect::<StructureResult<Vec<_>>>()?;
        for (e, ke) in element_k.iter().enumerate() {
            self.scatter(&mut jac, self.element_nodes(e), 0, ke);
        }

        let node_k = self
            .offsets
            .par_iter()
            .enumerate()
            .filter_map(|(node, &offset)| offset.map(|o| (node, o)))
            .map(|(node, o)| {
                let z = DVector::from_row_slice(&self.increments(node, x));
                let k = central_difference_jacobian(
                    &z,
                    |z| Ok(self.node_residual(node, z.as_slice())),
                    eps,
                )?;
                Ok((o, k))
            })
            .collect::<StructureResult<Vec<_>>>()?;
        for (o, k) in node_k {
            let mut block = jac.view_mut((o, o), (6, 6));
            block += k;
        }

        for j in 0..topology.joints().len() {
            let (start, w) = self.joint_local(j, x)?;
            let kj = central_difference_jacobian(&w, |w| self.joint_residual(j, w), eps)?;
            self.scatter(&mut jac, self.joint_nodes(j), start, &kj);
        }
        Ok(jac)
    }

    fn scatter(&self, jac: &mut DMatrix<f64>, nodes: [usize; 2], multipliers: usize, k: &DMatrix<f64>) {
        for i in 0..k.nrows() {
            let Some(gi) = self.global_index(nodes, multipliers, i) else {
                continue;
            };
            for c in 0..k.ncols() {
                if let Some(gc) = self.global_index(nodes, multipliers, c) {
                    jac[(gi, gc)] += k[(i, c)];
                }
            }
        }
    }

    fn finish(&self, result: NewtonResult) -> StructureResult<StepReport> {
        let topology = self.model.topology();
        let x = &result.x;

        let nodes: Vec<NodeState> = (0..topology.nodes().len())
            .map(|node| self.node_state(node, x))
            .collect();

        let elements = topology
            .elements()
            .iter()
            .enumerate()
            .map(|(e, elem)| {
                let (strain, curvature) = self.model.geometry()[e].strains(
                    &nodes[elem.start().idx()].placement(),
                    &nodes[elem.end().idx()].placement(),
                );
                ElementStrain { strain, curvature }
            })
            .collect();

        let mut joints = Vec::with_capacity(topology.joints().len());
        for (j, joint) in topology.joints().iter().enumerate() {
            let (start, w) = self.joint_local(j, x)?;
            let g = self.joint_constraint(j, &w.as_slice()[0..12]);
            let violation = g.amax();
            if !(violation <= self.config.constraint_tol) {
                return Err(StructureError::ConstraintViolation {
                    joint: joint.id,
                    residual: violation,
                });
            }
            let [a, b] = self.joint_nodes(j);
            let psi = relative_rotation(
                [&topology.nodes()[a].orientation, &topology.nodes()[b].orientation],
                &nodes[a].orientation,
                &nodes[b].orientation,
            );
            joints.push(JointState {
                id: joint.id,
                angle: joint_angle(&joint.kind, &psi),
                reaction: x.rows(start, joint.kind.constraint_count()).into_owned(),
            });
        }

        let supports = self.support_reactions(x)?;

        Ok(StepReport {
            state: StructuralState {
                time: self.inputs.time,
                nodes,
                elements,
                joints,
                supports,
            },
            newton_iterations: result.iterations,
            residual_norm: result.residual_norm,
        })
    }

    fn node_state(&self, node: usize, x: &DVector<f64>) -> NodeState {
        if let Some(pose) = self.commanded[node] {
            return NodeState::from(pose);
        }
        let z = self.increments(node, x);
        let p = self.placement(node, &z);
        match self.inertia {
            Inertia::Static => NodeState::at_rest(p.position, p.orientation),
            Inertia::Dynamic { dt, newmark } => {
                let s = &self.previous.nodes[node];
                let u = Vector3::new(z[0], z[1], z[2]);
                let theta = Vector3::new(z[3], z[4], z[5]);
                let (velocity, acceleration) = newmark.rates(dt, &u, &s.velocity, &s.acceleration);
                let (angular_velocity, angular_acceleration) =
                    newmark.rates(dt, &theta, &s.angular_velocity, &s.angular_acceleration);
                NodeState {
                    position: p.position,
                    orientation: p.orientation,
                    velocity,
                    angular_velocity,
                    acceleration,
                    angular_acceleration,
                }
            }
        }
    }

    /// Residual at prescribed nodes: the force and moment the support supplies.
    fn support_reactions(&self, x: &DVector<f64>) -> StructureResult<Vec<SupportReaction>> {
        let topology = self.model.topology();
        let mut supports = Vec::with_capacity(self.model.prescribed().len());
        for p in self.model.prescribed() {
            let node = p.node.idx();
            let mut total = self.node_residual(node, &[0.0; 6]);
            for &e in topology.node_elements(p.node) {
                let e = e.idx();
                let nodes = self.element_nodes(e);
                let re = self.element_residual(e, &self.gather(nodes, x, &[]));
                for (end, &n) in nodes.iter().enumerate() {
                    if n == node {
                        total += re.rows(6 * end, 6);
                    }
                }
            }
            for &j in topology.node_joints(p.node) {
                let j = j.idx();
                let (_, w) = self.joint_local(j, x)?;
                let rj = self.joint_residual(j, &w)?;
                for (end, &n) in self.joint_nodes(j).iter().enumerate() {
                    if n == node {
                        total += rj.rows(6 * end, 6);
                    }
                }
            }
            supports.push(SupportReaction {
                node: p.node,
                force: total.fixed_rows::<3>(0).into_owned(),
                moment: total.fixed_rows::<3>(3).into_owned(),
            });
        }
        Ok(supports)
    }
}
