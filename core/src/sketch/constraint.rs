//! Sketch Constraints
//!
//! A constraint is an edge between exactly two entities. Users request one of
//! several kinds; every kind is translated to a canonical kind on insertion
//! so the solver only ever sees distances, angles and tangency.

use super::types::EntityId;
use crate::geometry::ApproxEq;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintId(pub u32);

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Kind requested by a tool or the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Distance,
    /// Entities touch: distance 0.
    Incident,
    /// Angle in radians.
    Angle,
    Perpendicular,
    Parallel,
    Tangent,
}

/// Kind the solver works with after translation.
///
/// Tangent has no distance or angle equivalent between two arbitrary
/// entities, so it stays a kind of its own. No placement rule accepts it:
/// the planner leaves entities held only by tangency unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalKind {
    Distance,
    Angle,
    Tangent,
}

impl ConstraintKind {
    /// Maps a requested kind and payload to its canonical form.
    ///
    /// | requested     | canonical       |
    /// |---------------|-----------------|
    /// | Incident      | Distance(0)     |
    /// | Perpendicular | Angle(π/2)      |
    /// | Parallel      | Angle(0)        |
    /// | others        | unchanged       |
    pub fn translate(self, value: f64) -> (CanonicalKind, f64) {
        match self {
            Self::Distance => (CanonicalKind::Distance, value),
            Self::Incident => (CanonicalKind::Distance, 0.0),
            Self::Angle => (CanonicalKind::Angle, value),
            Self::Perpendicular => (CanonicalKind::Angle, FRAC_PI_2),
            Self::Parallel => (CanonicalKind::Angle, 0.0),
            Self::Tangent => (CanonicalKind::Tangent, value),
        }
    }
}

impl From<CanonicalKind> for ConstraintKind {
    fn from(kind: CanonicalKind) -> Self {
        match kind {
            CanonicalKind::Distance => Self::Distance,
            CanonicalKind::Angle => Self::Angle,
            CanonicalKind::Tangent => Self::Tangent,
        }
    }
}

impl fmt::Display for CanonicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::Angle => write!(f, "angle"),
            Self::Tangent => write!(f, "tangent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    /// Kind as requested.
    pub user_kind: ConstraintKind,
    /// Kind after translation.
    pub kind: CanonicalKind,
    /// Distance (>= 0) or angle in radians.
    pub value: f64,
    pub nodes: [EntityId; 2],
}

impl Constraint {
    pub fn new(id: ConstraintId, user_kind: ConstraintKind, first: EntityId, second: EntityId, value: f64) -> Self {
        let (kind, value) = user_kind.translate(value);
        Self {
            id,
            user_kind,
            kind,
            value,
            nodes: [first, second],
        }
    }

    /// True for the unordered pair {a, b}.
    pub fn connects(&self, a: EntityId, b: EntityId) -> bool {
        (self.nodes[0] == a && self.nodes[1] == b) || (self.nodes[0] == b && self.nodes[1] == a)
    }

    pub fn touches(&self, n: EntityId) -> bool {
        self.nodes[0] == n || self.nodes[1] == n
    }

    /// The endpoint opposite to `n`, if `n` is an endpoint.
    pub fn other(&self, n: EntityId) -> Option<EntityId> {
        if self.nodes[0] == n {
            Some(self.nodes[1])
        } else if self.nodes[1] == n {
            Some(self.nodes[0])
        } else {
            None
        }
    }

    /// Same canonical kind, same endpoint pair, approximately equal payload.
    pub fn is_similar(&self, other: &Constraint) -> bool {
        self.kind == other.kind
            && self.connects(other.nodes[0], other.nodes[1])
            && self.value.approx_eq(&other.value)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({}, {}) = {}", self.id, self.kind, self.nodes[0], self.nodes[1], self.value)
    }
}
