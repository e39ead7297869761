//! Rigid cluster decomposition.
//!
//! A cluster grows from one seed edge by repeatedly admitting any entity that
//! is tied to the cluster by exactly two edges. Discovery order matters: the
//! planner walks clusters and their admissions in the order found here.

use super::classify::Constrainedness;
use super::constraint::ConstraintId;
use super::graph::ConstraintGraph;
use super::types::EntityId;
use tracing::debug;

/// An entity admitted into a cluster and the two edges that admitted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub node: EntityId,
    pub via: [ConstraintId; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub graph: ConstraintGraph,
    pub seed: ConstraintId,
    /// Members in admission order; the seed edge's endpoints come first.
    pub nodes: Vec<EntityId>,
    pub admissions: Vec<Admission>,
}

impl Cluster {
    fn seeded(working: &mut ConstraintGraph) -> Option<Self> {
        let seed = *working.first()?;
        working.remove(seed.id);
        let mut graph = ConstraintGraph::new();
        graph.insert(seed);
        Some(Self {
            graph,
            seed: seed.id,
            nodes: seed.nodes.to_vec(),
            admissions: Vec::new(),
        })
    }

    pub fn contains(&self, n: EntityId) -> bool {
        self.nodes.contains(&n)
    }

    /// Rigid-body count for point-like members: `2n - 3` edges fix `n`
    /// members up to a global motion.
    pub fn classify(&self) -> Constrainedness {
        let needed = (2 * self.nodes.len()).saturating_sub(3);
        match self.graph.len().cmp(&needed) {
            std::cmp::Ordering::Less => Constrainedness::Under,
            std::cmp::Ordering::Equal => Constrainedness::Well,
            std::cmp::Ordering::Greater => Constrainedness::Over,
        }
    }

    /// Edges of `working` linking `n` to a member of this cluster.
    fn links(&self, working: &ConstraintGraph, n: EntityId) -> Vec<ConstraintId> {
        working
            .incident(n)
            .filter(|c| c.other(n).is_some_and(|m| self.contains(m)))
            .map(|c| c.id)
            .collect()
    }

    fn admit(&mut self, working: &mut ConstraintGraph, n: EntityId, via: [ConstraintId; 2]) {
        for id in via {
            if let Some(edge) = working.remove(id) {
                self.graph.insert(edge);
            }
        }
        self.nodes.push(n);
        self.admissions.push(Admission { node: n, via });
    }
}

/// Partitions `graph` into clusters covering every edge exactly once.
///
/// `entities` fixes the scan order used when looking for admissible nodes.
pub fn decompose(graph: &ConstraintGraph, entities: &[EntityId]) -> Vec<Cluster> {
    let mut working = graph.clone();
    let mut clusters = Vec::new();

    loop {
        let Some(mut cluster) = Cluster::seeded(&mut working) else {
            break;
        };

        'scan: loop {
            for &n in entities {
                if cluster.contains(n) {
                    continue;
                }
                if let [a, b] = cluster.links(&working, n)[..] {
                    cluster.admit(&mut working, n, [a, b]);
                    continue 'scan;
                }
            }
            break;
        }

        debug!(
            seed = %cluster.seed,
            nodes = cluster.nodes.len(),
            edges = cluster.graph.len(),
            "cluster complete"
        );
        clusters.push(cluster);
    }

    clusters
}
