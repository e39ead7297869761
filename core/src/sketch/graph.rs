use super::constraint::{CanonicalKind, Constraint, ConstraintId, ConstraintKind};
use super::error::GraphError;
use super::types::EntityId;
use serde::{Deserialize, Serialize};

/// An unordered collection of constraint edges, kept in insertion order.
///
/// The graph never owns entities; it refers to them by handle. Cloning a
/// graph copies the edges only, which is how the decomposition gets a
/// working copy it can consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGraph {
    edges: Vec<Constraint>,
    next_id: u32,
}

impl ConstraintGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint between `first` and `second`, translating the
    /// requested kind to its canonical form.
    ///
    /// Rejected with `DuplicateConstraint` if the unordered pair already has
    /// a constraint of the same canonical family.
    pub fn add(
        &mut self,
        kind: ConstraintKind,
        first: EntityId,
        second: EntityId,
        value: f64,
    ) -> Result<ConstraintId, GraphError> {
        if !value.is_finite() || (kind == ConstraintKind::Distance && value < 0.0) {
            return Err(GraphError::InvalidValue(value));
        }
        let id = ConstraintId(self.next_id);
        let constraint = Constraint::new(id, kind, first, second, value);
        self.check(&constraint)?;

        self.next_id = self.next_id.saturating_add(1);
        self.edges.push(constraint);
        Ok(id)
    }

    /// Checks that `constraint` could join this graph: distinct endpoints, a
    /// usable payload, an unused id and no edge of the same family between
    /// the same pair.
    pub fn check(&self, constraint: &Constraint) -> Result<(), GraphError> {
        let [first, second] = constraint.nodes;
        if first == second {
            return Err(GraphError::SelfConstraint(first));
        }
        let value = constraint.value;
        if !value.is_finite() || (constraint.kind == CanonicalKind::Distance && value < 0.0) {
            return Err(GraphError::InvalidValue(value));
        }
        if self.contains(constraint.id) {
            return Err(GraphError::DuplicateId(constraint.id));
        }
        if self.find(Some(constraint.kind), first, second).is_some() {
            return Err(GraphError::DuplicateConstraint {
                first,
                second,
                kind: constraint.kind,
            });
        }
        Ok(())
    }

    /// Inserts an existing edge as-is, keeping its id.
    pub fn insert(&mut self, constraint: Constraint) {
        self.next_id = self.next_id.max(constraint.id.0.saturating_add(1));
        self.edges.push(constraint);
    }

    /// Keeps ids handed out by `other` from being issued again.
    pub(crate) fn adopt_ids(&mut self, other: &ConstraintGraph) {
        self.next_id = self.next_id.max(other.next_id);
    }

    /// Unconditional removal. Entity back-references are the caller's
    /// business.
    pub fn remove(&mut self, id: ConstraintId) -> Option<Constraint> {
        let pos = self.edges.iter().position(|c| c.id == id)?;
        Some(self.edges.remove(pos))
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.edges.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ConstraintId) -> bool {
        self.get(id).is_some()
    }

    /// Symmetric lookup; `None` as kind matches any.
    pub fn find(&self, kind: Option<CanonicalKind>, a: EntityId, b: EntityId) -> Option<&Constraint> {
        self.edges
            .iter()
            .find(|c| c.connects(a, b) && kind.map_or(true, |k| c.kind == k))
    }

    pub fn find_similar(&self, template: &Constraint) -> Option<&Constraint> {
        self.edges.iter().find(|c| c.is_similar(template))
    }

    pub fn set_value(&mut self, id: ConstraintId, value: f64) -> Result<(), GraphError> {
        let edge = self
            .edges
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(GraphError::UnknownConstraint(id))?;
        if !value.is_finite() || (edge.kind == CanonicalKind::Distance && value < 0.0) {
            return Err(GraphError::InvalidValue(value));
        }
        edge.value = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.edges.iter()
    }

    /// Edges touching `n`, in insertion order.
    pub fn incident(&self, n: EntityId) -> impl Iterator<Item = &Constraint> + '_ {
        self.edges.iter().filter(move |c| c.touches(n))
    }

    pub fn degree(&self, n: EntityId) -> usize {
        self.incident(n).count()
    }

    pub fn first(&self) -> Option<&Constraint> {
        self.edges.first()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Entities touched by at least one edge, in order of first appearance.
    pub fn nodes(&self) -> Vec<EntityId> {
        let mut nodes = Vec::new();
        for c in &self.edges {
            for n in c.nodes {
                if !nodes.contains(&n) {
                    nodes.push(n);
                }
            }
        }
        nodes
    }

    pub fn ids(&self) -> Vec<ConstraintId> {
        self.edges.iter().map(|c| c.id).collect()
    }
}
