use super::constraint::{CanonicalKind, ConstraintId};
use super::types::EntityId;
use thiserror::Error;

/// Errors raised while editing the constraint graph or entity arena.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Duplicate constraint: {kind} already constrains {first} and {second}")]
    DuplicateConstraint {
        first: EntityId,
        second: EntityId,
        kind: CanonicalKind,
    },

    #[error("A constraint needs two distinct entities, got {0} twice")]
    SelfConstraint(EntityId),

    #[error("Invalid constraint value {0}")]
    InvalidValue(f64),

    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("Unknown constraint {0}")]
    UnknownConstraint(ConstraintId),

    #[error("Constraint id {0} is already in use")]
    DuplicateId(ConstraintId),

    #[error("Entity slot {slot} holds entity {id}")]
    MisplacedEntity { slot: usize, id: EntityId },

    #[error("Entity {id} is still referenced by {refs} constraint(s)")]
    EntityInUse { id: EntityId, refs: usize },
}

/// Failure of a single placement function.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Too far: {0}")]
    TooFar(String),

    #[error("Too close: {0}")]
    TooClose(String),

    #[error("No solution: {0}")]
    NoSolution(String),

    #[error("No intersection: {0}")]
    NoIntersection(String),

    #[error("Coincident: {0}")]
    Coincident(String),

    #[error("Parallel: {0}")]
    Parallel(String),

    /// No placement function for this combination of entity kinds.
    #[error("Unsupported case: {0}")]
    UnsupportedCase(String),

    /// Reached a known case that has no implementation yet.
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl PlacementError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }

    /// Geometric infeasibility or degeneracy, as opposed to a dispatch gap.
    pub fn is_geometric(&self) -> bool {
        !matches!(self, Self::UnsupportedCase(_) | Self::NotImplemented(_))
    }
}

/// A placement failure tagged with the 0-based index of its instruction.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("instruction {index} failed: {source}")]
pub struct ProgramError {
    pub index: usize,
    #[source]
    pub source: PlacementError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid sketch: {0}")]
    Graph(#[from] GraphError),
}
