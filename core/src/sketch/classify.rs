//! Constrainedness classification by edge counting.
//!
//! Runs as its own pass after decomposition; it reads only the edge counts
//! gathered in the solve context and the entities' fixed flags.

use super::context::SolveContext;
use super::types::{Entity, EntityArena, EntityKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constrainedness {
    Well,
    Under,
    Over,
}

impl Constrainedness {
    /// Combines two classifications; over dominates under dominates well.
    pub fn merge(self, other: Constrainedness) -> Constrainedness {
        match (self, other) {
            (Self::Over, _) | (_, Self::Over) => Self::Over,
            (Self::Under, _) | (_, Self::Under) => Self::Under,
            _ => Self::Well,
        }
    }
}

fn against(edges: usize, dof: usize) -> Constrainedness {
    match edges.cmp(&dof) {
        Ordering::Less => Constrainedness::Under,
        Ordering::Equal => Constrainedness::Well,
        Ordering::Greater => Constrainedness::Over,
    }
}

/// A free point has 2 DOF.
pub fn point_constrained(edges: usize, fixed: bool) -> Constrainedness {
    if fixed {
        Constrainedness::Well
    } else {
        against(edges, 2)
    }
}

/// A free segment of given length: position plus direction.
pub fn line_constrained(edges: usize, fixed: bool) -> Constrainedness {
    if fixed {
        Constrainedness::Well
    } else {
        against(edges, 3)
    }
}

/// Center plus radius.
pub fn circle_constrained(edges: usize, fixed: bool) -> Constrainedness {
    if fixed {
        Constrainedness::Well
    } else {
        against(edges, 3)
    }
}

pub fn entity_constrained(entity: &Entity, edges: usize) -> Constrainedness {
    match entity.kind() {
        EntityKind::Point => point_constrained(edges, entity.fixed),
        EntityKind::Line => line_constrained(edges, entity.fixed),
        EntityKind::Circle => circle_constrained(edges, entity.fixed),
    }
}

/// Classifies every constrained entity once and records the results in
/// `ctx`. Entities with no edges at all are left out.
pub fn classify(entities: &EntityArena, ctx: &mut SolveContext) -> Constrainedness {
    let mut overall = Constrainedness::Well;
    for entity in entities.iter() {
        let edges = ctx.n_edges(entity.id);
        if edges == 0 || !ctx.check(entity.id) {
            continue;
        }
        let c = entity_constrained(entity, edges);
        ctx.entity_status.push((entity.id, c));
        overall = overall.merge(c);
    }
    ctx.constrainedness = Some(overall);
    overall
}
