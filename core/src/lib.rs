pub mod geometry;
pub mod sketch;

pub use sketch::{Sketch, SolveContext, SolverConfig};
