//! Solve pipeline: decompose, plan, execute, classify.
//!
//! `solve` only analyses the graph. Planning and execution are separate
//! steps, run back to back by `update`.

use super::classify::{self, Constrainedness};
use super::cluster::decompose;
use super::constraint::{CanonicalKind, Constraint, ConstraintId};
use super::context::{SolveContext, SolveStatus};
use super::error::{PlacementError, ProgramError};
use super::placement::{compose_pair, compose_ring, Placement};
use super::planner::{self, Instruction};
use super::types::{EntityId, Sketch};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Anything that can carry out a single construction instruction.
pub trait InstructionExecutor {
    fn exec_insn(&mut self, insn: &Instruction, ctx: &mut SolveContext) -> Result<(), PlacementError>;
}

/// Executes `ctx.program` in order, stopping at the first failure.
///
/// On failure the context is marked invalid with the failing index and the
/// placement message. Success leaves status untouched.
pub fn run_program<E: InstructionExecutor + ?Sized>(exec: &mut E, ctx: &mut SolveContext) -> Result<(), ProgramError> {
    let program = ctx.program.clone();
    for (index, insn) in program.iter().enumerate() {
        debug!(index, %insn, "exec");
        if let Err(source) = exec.exec_insn(insn, ctx) {
            let err = ProgramError { index, source };
            warn!(index, %insn, error = %err.source, "instruction failed");
            ctx.set_invalid(err.to_string());
            return Err(err);
        }
    }
    Ok(())
}

impl Sketch {
    /// Symmetric constraint lookup; `None` matches any kind.
    pub fn find_constraint(&self, kind: Option<CanonicalKind>, a: EntityId, b: EntityId) -> Option<&Constraint> {
        self.graph.find(kind, a, b)
    }

    /// Decomposes the constraint graph into clusters. Nothing is placed.
    pub fn solve(&self) -> SolveContext {
        let ids = self.entities.ids();
        let edge_counts: HashMap<EntityId, usize> = ids.iter().map(|&id| (id, self.graph.degree(id))).collect();
        let mut ctx = SolveContext::new(&self.entities, edge_counts);
        ctx.clusters = decompose(&self.graph, &ids);
        info!(
            sketch = %self.name,
            entities = ids.len(),
            constraints = self.graph.len(),
            clusters = ctx.clusters.len(),
            "decomposed"
        );
        ctx
    }

    pub fn plan(&self, ctx: &mut SolveContext) {
        planner::plan(&self.entities, &self.graph, &self.config, ctx);
    }

    pub fn exec_program(&mut self, ctx: &mut SolveContext) -> Result<(), ProgramError> {
        run_program(self, ctx)
    }

    pub fn classify(&self, ctx: &mut SolveContext) -> Constrainedness {
        classify::classify(&self.entities, ctx)
    }

    /// Runs the whole pipeline. Positions reached before a failing
    /// instruction are kept.
    pub fn update(&mut self) -> Result<SolveContext, ProgramError> {
        let mut ctx = self.solve();
        self.plan(&mut ctx);
        self.exec_program(&mut ctx)?;
        let overall = self.classify(&mut ctx);
        ctx.status = SolveStatus::Solved;
        ctx.status_text = format!("solved, {:?}-constrained", overall).to_lowercase();
        info!(
            sketch = %self.name,
            solutions = ctx.n_solutions,
            unresolved = ctx.unresolved.len(),
            "update complete"
        );
        Ok(ctx)
    }

    fn constraint(&self, id: ConstraintId) -> Result<Constraint, PlacementError> {
        self.graph
            .get(id)
            .copied()
            .ok_or_else(|| PlacementError::UnsupportedCase(format!("constraint {} does not exist", id)))
    }
}

impl InstructionExecutor for Sketch {
    fn exec_insn(&mut self, insn: &Instruction, ctx: &mut SolveContext) -> Result<(), PlacementError> {
        match *insn {
            Instruction::ComposePair { n, n1, c } => {
                let c = self.constraint(c)?;
                let mut p = Placement {
                    entities: &mut self.entities,
                    ctx,
                    config: &self.config,
                };
                compose_pair(&mut p, n, n1, &c)
            }
            Instruction::ComposeRing { n, n1, n2, c1, c2 } => {
                let (c1, c2) = (self.constraint(c1)?, self.constraint(c2)?);
                let mut p = Placement {
                    entities: &mut self.entities,
                    ctx,
                    config: &self.config,
                };
                compose_ring(&mut p, n, [n1, n2], [&c1, &c2])
            }
        }
    }
}

/// A sketch shared between an editor and whoever triggers solves.
pub type SharedSketch = Arc<Mutex<Sketch>>;

/// Runs `update` with the sketch locked for the whole pipeline.
pub fn update_shared(sketch: &SharedSketch) -> Result<SolveContext, ProgramError> {
    let mut guard = sketch.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.update()
}
