//! Construction planning.
//!
//! Turns the cluster structure into an ordered program. Executed in order,
//! each instruction places one entity from neighbours that are fixed or were
//! placed by an earlier instruction.

use super::config::SolverConfig;
use super::constraint::{Constraint, ConstraintId};
use super::context::SolveContext;
use super::graph::ConstraintGraph;
use super::placement::{pair_supported, ring_supported};
use super::types::{EntityArena, EntityId, EntityKind};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Place `n` from one known neighbour `n1` across constraint `c`.
    ComposePair {
        n: EntityId,
        n1: EntityId,
        c: ConstraintId,
    },
    /// Place `n` from two known neighbours at once.
    ComposeRing {
        n: EntityId,
        n1: EntityId,
        n2: EntityId,
        c1: ConstraintId,
        c2: ConstraintId,
    },
}

impl Instruction {
    pub fn target(&self) -> EntityId {
        match *self {
            Self::ComposePair { n, .. } | Self::ComposeRing { n, .. } => n,
        }
    }

    pub fn entities(&self) -> Vec<EntityId> {
        match *self {
            Self::ComposePair { n, n1, .. } => vec![n, n1],
            Self::ComposeRing { n, n1, n2, .. } => vec![n, n1, n2],
        }
    }

    pub fn constraints(&self) -> Vec<ConstraintId> {
        match *self {
            Self::ComposePair { c, .. } => vec![c],
            Self::ComposeRing { c1, c2, .. } => vec![c1, c2],
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComposePair { n, n1, c } => write!(f, "pair {} <- {} via {}", n, n1, c),
            Self::ComposeRing { n, n1, n2, c1, c2 } => {
                write!(f, "ring {} <- {} via {}, {} via {}", n, n1, c1, n2, c2)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    insns: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction.
    ///
    /// Every referenced entity and constraint must exist and each constraint
    /// must join the target to its neighbour. A violation is a planner bug,
    /// so it is asserted in debug builds rather than reported.
    pub fn add_insn(&mut self, insn: Instruction, graph: &ConstraintGraph, entities: &EntityArena) {
        for id in insn.entities() {
            debug_assert!(entities.contains(id), "instruction {} refers to missing entity {}", insn, id);
        }
        match insn {
            Instruction::ComposePair { n, n1, c } => {
                debug_assert!(n != n1, "instruction {} pairs an entity with itself", insn);
                debug_assert!(
                    graph.get(c).is_some_and(|e| e.connects(n, n1)),
                    "instruction {} uses constraint {} not joining its entities",
                    insn,
                    c
                );
            }
            Instruction::ComposeRing { n, n1, n2, c1, c2 } => {
                debug_assert!(n1 != n2 && n != n1 && n != n2, "instruction {} repeats an entity", insn);
                debug_assert!(
                    graph.get(c1).is_some_and(|e| e.connects(n, n1)),
                    "instruction {} uses constraint {} not joining its entities",
                    insn,
                    c1
                );
                debug_assert!(
                    graph.get(c2).is_some_and(|e| e.connects(n, n2)),
                    "instruction {} uses constraint {} not joining its entities",
                    insn,
                    c2
                );
            }
        }
        self.insns.push(insn);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.insns.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.insns.get(index)
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}

/// Cluster members in discovery order, each listed once.
fn discovery_order(ctx: &SolveContext, graph: &ConstraintGraph) -> Vec<EntityId> {
    let mut order: Vec<EntityId> = Vec::new();
    let from_clusters = ctx.clusters.iter().flat_map(|c| c.nodes.iter().copied());
    for n in from_clusters.chain(graph.nodes()) {
        if !order.contains(&n) {
            order.push(n);
        }
    }
    order
}

/// Edges joining `n` to a known entity, in edge order.
fn known_links<'g>(graph: &'g ConstraintGraph, known: &HashSet<EntityId>, n: EntityId) -> Vec<(EntityId, &'g Constraint)> {
    graph
        .incident(n)
        .filter_map(|c| c.other(n).map(|m| (m, c)))
        .filter(|(m, _)| known.contains(m))
        .collect()
}

struct Planner<'a> {
    graph: &'a ConstraintGraph,
    entities: &'a EntityArena,
    order: Vec<EntityId>,
    known: HashSet<EntityId>,
}

impl Planner<'_> {
    fn kind(&self, n: EntityId) -> Option<EntityKind> {
        self.entities.get(n).map(|e| e.kind())
    }

    fn pending(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied().filter(|n| !self.known.contains(n))
    }

    /// First pending entity with two known neighbours a ring rule accepts.
    fn next_ring(&self) -> Option<Instruction> {
        self.pending().find_map(|n| {
            let kind = self.kind(n)?;
            let links = known_links(self.graph, &self.known, n);
            links.iter().enumerate().find_map(|(i, &(n1, c1))| {
                links[i + 1..].iter().find_map(|&(n2, c2)| {
                    let k1 = self.kind(n1)?;
                    let k2 = self.kind(n2)?;
                    (n1 != n2 && ring_supported(kind, [(k1, c1.kind), (k2, c2.kind)])).then_some(
                        Instruction::ComposeRing {
                            n,
                            n1,
                            n2,
                            c1: c1.id,
                            c2: c2.id,
                        },
                    )
                })
            })
        })
    }

    /// First pending entity placeable from one known neighbour.
    fn next_pair(&self) -> Option<Instruction> {
        self.pending().find_map(|n| {
            let kind = self.kind(n)?;
            known_links(self.graph, &self.known, n)
                .into_iter()
                .find(|&(n1, c)| self.kind(n1).is_some_and(|k1| pair_supported(kind, k1, c.kind)))
                .map(|(n1, c)| Instruction::ComposePair { n, n1, c: c.id })
        })
    }

    /// Pins the first cluster seed whose endpoints are both still free and
    /// which a pair rule accepts in some orientation.
    fn next_anchor(&self, ctx: &SolveContext) -> Option<Instruction> {
        ctx.clusters.iter().find_map(|cluster| {
            let seed = self.graph.get(cluster.seed)?;
            let [a, b] = seed.nodes;
            if self.known.contains(&a) || self.known.contains(&b) {
                return None;
            }
            let (ka, kb) = (self.kind(a)?, self.kind(b)?);
            if !pair_supported(kb, ka, seed.kind) && !pair_supported(ka, kb, seed.kind) {
                return None;
            }
            Some(Instruction::ComposePair { n: b, n1: a, c: seed.id })
        })
    }
}

/// Builds the construction program for the clusters found in `ctx` and
/// stores it there. Rings are preferred over pairs so that an entity with
/// two known neighbours uses both constraints. Only combinations the
/// placement tables can execute are emitted; anything else stays pending
/// and ends up in `ctx.unresolved`.
pub fn plan(entities: &EntityArena, graph: &ConstraintGraph, config: &SolverConfig, ctx: &mut SolveContext) {
    let mut planner = Planner {
        graph,
        entities,
        order: discovery_order(ctx, graph),
        known: entities.iter().filter(|e| e.fixed).map(|e| e.id).collect(),
    };
    let mut program = Program::new();

    loop {
        let next = planner
            .next_ring()
            .or_else(|| planner.next_pair())
            .or_else(|| {
                if config.anchor_floating_clusters {
                    planner.next_anchor(ctx)
                } else {
                    None
                }
            });
        let Some(insn) = next else {
            break;
        };
        debug!(index = program.len(), %insn, "planned");
        planner.known.extend(insn.entities());
        program.add_insn(insn, graph, entities);
    }

    ctx.unresolved = planner
        .order
        .iter()
        .copied()
        .filter(|n| !planner.known.contains(n))
        .collect();
    if !ctx.unresolved.is_empty() {
        warn!(count = ctx.unresolved.len(), "entities left unplaced by the planner");
    }
    info!(instructions = program.len(), "program planned");
    ctx.program = program;
}
