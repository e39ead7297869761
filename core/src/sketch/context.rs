use super::classify::Constrainedness;
use super::cluster::Cluster;
use super::planner::Program;
use super::types::{EntityArena, EntityId};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveStatus {
    /// Decomposed, not yet executed.
    #[default]
    Pending,
    Solved,
    /// Execution stopped at a failing instruction.
    Invalid,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Solved => write!(f, "solved"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Everything derived during one solve: clusters, the construction program,
/// per-entity bookkeeping and the outcome. Built fresh by `Sketch::solve`
/// and dropped afterwards, so nothing leaks from one solve into the next.
#[derive(Debug, Clone, Default)]
pub struct SolveContext {
    pub clusters: Vec<Cluster>,
    pub program: Program,
    /// Sum over executed placements of the number of candidate roots found.
    pub n_solutions: u32,
    pub status: SolveStatus,
    pub status_text: String,
    /// Free entities the planner could not reach.
    pub unresolved: Vec<EntityId>,
    pub constrainedness: Option<Constrainedness>,
    pub entity_status: Vec<(EntityId, Constrainedness)>,
    known: HashSet<EntityId>,
    checked: HashSet<EntityId>,
    n_edges: HashMap<EntityId, usize>,
}

impl SolveContext {
    /// Starts a solve: fixed entities are known, edge counts taken from the
    /// graph being analyzed.
    pub fn new(entities: &EntityArena, edge_counts: HashMap<EntityId, usize>) -> Self {
        Self {
            known: entities.iter().filter(|e| e.fixed).map(|e| e.id).collect(),
            n_edges: edge_counts,
            ..Self::default()
        }
    }

    pub fn is_known(&self, id: EntityId) -> bool {
        self.known.contains(&id)
    }

    pub fn mark_known(&mut self, id: EntityId) {
        self.known.insert(id);
    }

    pub fn n_edges(&self, id: EntityId) -> usize {
        self.n_edges.get(&id).copied().unwrap_or(0)
    }

    /// Marks `id` as visited by the classifier; false if it already was.
    pub(crate) fn check(&mut self, id: EntityId) -> bool {
        self.checked.insert(id)
    }

    pub fn is_checked(&self, id: EntityId) -> bool {
        self.checked.contains(&id)
    }

    pub fn set_invalid(&mut self, text: impl Into<String>) {
        self.status = SolveStatus::Invalid;
        self.status_text = text.into();
    }

    pub fn entity_constrainedness(&self, id: EntityId) -> Option<Constrainedness> {
        self.entity_status.iter().find(|(e, _)| *e == id).map(|(_, c)| *c)
    }
}
