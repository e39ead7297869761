pub mod types;
pub mod constraint;
pub mod graph;
pub mod cluster;
pub mod planner;
pub mod placement;
pub mod context;
pub mod classify;
pub mod config;
pub mod error;
pub mod solver;

pub use classify::Constrainedness;
pub use cluster::{decompose, Admission, Cluster};
pub use config::SolverConfig;
pub use constraint::{CanonicalKind, Constraint, ConstraintId, ConstraintKind};
pub use context::{SolveContext, SolveStatus};
pub use error::{ConfigError, GraphError, PlacementError, ProgramError};
pub use graph::ConstraintGraph;
pub use planner::{Instruction, Program};
pub use solver::{run_program, update_shared, InstructionExecutor, SharedSketch};
pub use types::{Entity, EntityArena, EntityGeometry, EntityId, EntityKind, Sketch};



#[cfg(test)]
mod tests_placement;
