//! Closed-form placement of one entity from known neighbours.
//!
//! Dispatch goes through two fixed tables keyed by entity kinds. Pair rules
//! are keyed by (unknown, known, constraint kind); ring rules by the unknown
//! kind and the ordered pair of known kinds, looked up as given and then
//! swapped.

use super::config::SolverConfig;
use super::constraint::{CanonicalKind, Constraint};
use super::context::SolveContext;
use super::error::PlacementError;
use super::types::{Entity, EntityArena, EntityId, EntityKind};
use crate::geometry::{
    bearing, direction, distance, nearest_of, Circle2, CircleIntersection, LineCircleRoots, Point2, Segment2,
    SegmentIntersection,
};
use tracing::trace;

/// Mutable state a placement function works on.
pub struct Placement<'a> {
    pub entities: &'a mut EntityArena,
    pub ctx: &'a mut SolveContext,
    pub config: &'a SolverConfig,
}

type PairFn = fn(&mut Placement<'_>, EntityId, EntityId, &Constraint) -> Result<(), PlacementError>;
type RingFn = fn(&mut Placement<'_>, EntityId, [EntityId; 2], [&Constraint; 2]) -> Result<(), PlacementError>;

struct PairRule {
    unknown: EntityKind,
    known: EntityKind,
    kind: CanonicalKind,
    place: PairFn,
}

struct RingRule {
    unknown: EntityKind,
    known: [EntityKind; 2],
    /// Required constraint kinds, in the order of `known`. `None` accepts any.
    kinds: Option<[CanonicalKind; 2]>,
    /// False for cases that only report `NotImplemented`.
    implemented: bool,
    place: RingFn,
}

const PAIR_RULES: &[PairRule] = &[
    PairRule {
        unknown: EntityKind::Point,
        known: EntityKind::Point,
        kind: CanonicalKind::Distance,
        place: point_from_point_distance,
    },
    PairRule {
        unknown: EntityKind::Point,
        known: EntityKind::Line,
        kind: CanonicalKind::Distance,
        place: point_from_line_distance,
    },
    PairRule {
        unknown: EntityKind::Line,
        known: EntityKind::Line,
        kind: CanonicalKind::Distance,
        place: line_from_line_distance,
    },
    PairRule {
        unknown: EntityKind::Line,
        known: EntityKind::Line,
        kind: CanonicalKind::Angle,
        place: line_from_line_angle,
    },
];

const DISTANCES: Option<[CanonicalKind; 2]> = Some([CanonicalKind::Distance, CanonicalKind::Distance]);

const RING_RULES: &[RingRule] = &[
    RingRule {
        unknown: EntityKind::Point,
        known: [EntityKind::Point, EntityKind::Point],
        kinds: DISTANCES,
        implemented: true,
        place: point_from_points,
    },
    RingRule {
        unknown: EntityKind::Point,
        known: [EntityKind::Point, EntityKind::Line],
        kinds: DISTANCES,
        implemented: true,
        place: point_from_point_line,
    },
    RingRule {
        unknown: EntityKind::Point,
        known: [EntityKind::Line, EntityKind::Line],
        kinds: DISTANCES,
        implemented: true,
        place: point_from_lines,
    },
    RingRule {
        unknown: EntityKind::Line,
        known: [EntityKind::Point, EntityKind::Point],
        kinds: None,
        implemented: false,
        place: line_from_ring,
    },
    RingRule {
        unknown: EntityKind::Line,
        known: [EntityKind::Point, EntityKind::Line],
        kinds: None,
        implemented: false,
        place: line_from_ring,
    },
    RingRule {
        unknown: EntityKind::Line,
        known: [EntityKind::Line, EntityKind::Line],
        kinds: None,
        implemented: false,
        place: line_from_ring,
    },
];

fn find_pair(unknown: EntityKind, known: EntityKind, kind: CanonicalKind) -> Option<&'static PairRule> {
    PAIR_RULES
        .iter()
        .find(|r| r.unknown == unknown && r.known == known && r.kind == kind)
}

fn find_ring(unknown: EntityKind, known: [EntityKind; 2]) -> Option<&'static RingRule> {
    RING_RULES.iter().find(|r| r.unknown == unknown && r.known == known)
}

/// True if a pair placement exists for `unknown` from `known` across a
/// constraint of `kind`, in that orientation.
pub fn pair_supported(unknown: EntityKind, known: EntityKind, kind: CanonicalKind) -> bool {
    find_pair(unknown, known, kind).is_some()
}

/// True if `compose_ring` has a working placement for `unknown` from two
/// known entities, given as (kind, constraint kind) in either order.
pub fn ring_supported(unknown: EntityKind, known: [(EntityKind, CanonicalKind); 2]) -> bool {
    let [(k1, c1), (k2, c2)] = known;
    let (rule, kinds) = match (find_ring(unknown, [k1, k2]), find_ring(unknown, [k2, k1])) {
        (Some(rule), _) => (rule, [c1, c2]),
        (None, Some(rule)) => (rule, [c2, c1]),
        (None, None) => return false,
    };
    rule.implemented && rule.kinds.map_or(true, |k| k == kinds)
}

impl Placement<'_> {
    fn entity(&self, id: EntityId) -> Result<&Entity, PlacementError> {
        self.entities
            .get(id)
            .ok_or_else(|| PlacementError::UnsupportedCase(format!("entity {} does not exist", id)))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, PlacementError> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| PlacementError::UnsupportedCase(format!("entity {} does not exist", id)))
    }

    fn label(&self, id: EntityId) -> String {
        self.entities.label(id)
    }

    fn kind(&self, id: EntityId) -> Result<EntityKind, PlacementError> {
        Ok(self.entity(id)?.kind())
    }

    fn position(&self, id: EntityId) -> Result<Point2, PlacementError> {
        Ok(self.entity(id)?.position())
    }

    fn set_position(&mut self, id: EntityId, p: Point2) -> Result<(), PlacementError> {
        trace!(entity = %id, x = p.x, y = p.y, "placed");
        self.entity_mut(id)?.set_position(p);
        Ok(())
    }

    /// World segment of a line with non-zero length.
    fn segment(&self, id: EntityId) -> Result<Segment2, PlacementError> {
        let seg = self.entity(id)?.segment().ok_or_else(|| {
            PlacementError::UnsupportedCase(format!("{} is not a line", self.label(id)))
        })?;
        if seg.is_degenerate() {
            return Err(PlacementError::NoSolution(format!("line {} has zero length", self.label(id))));
        }
        Ok(seg)
    }

    fn is_fixed(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| e.fixed)
    }

    fn is_moved(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| e.moved)
    }

    /// Settles `n` on one of two candidate roots. Coincident roots count as
    /// one solution; otherwise the root nearer the pre-solve position wins
    /// and both are counted.
    fn settle(&mut self, n: EntityId, s1: Point2, s2: Point2) -> Result<(), PlacementError> {
        let pre = self.position(n)?;
        let chosen = if distance(&s1, &s2) == 0.0 {
            self.ctx.n_solutions += 1;
            s1
        } else {
            self.ctx.n_solutions += 2;
            nearest_of(&pre, s1, s2)
        };
        trace!(entity = %n, ?s1, ?s2, ?chosen, "tie-break");
        self.set_position(n, chosen)
    }

    fn settle_unique(&mut self, n: EntityId, s: Point2) -> Result<(), PlacementError> {
        self.ctx.n_solutions += 1;
        self.set_position(n, s)
    }
}

/// Places whichever of `n`, `n1` is still unknown from the other one.
///
/// If neither is known yet, the entity not being dragged is solved (when
/// `prefer_unmoved_as_unknown` is set) and the table may be consulted in
/// either orientation. Both end up known.
pub fn compose_pair(p: &mut Placement<'_>, n: EntityId, n1: EntityId, c: &Constraint) -> Result<(), PlacementError> {
    let (n_known, n1_known) = (p.ctx.is_known(n), p.ctx.is_known(n1));
    let both_free = !n_known && !n1_known;

    let (unknown, known) = if n_known && n1_known {
        match (p.is_fixed(n), p.is_fixed(n1)) {
            (true, true) => {
                trace!(%n, %n1, "both fixed, nothing to place");
                return Ok(());
            }
            (true, false) => (n1, n),
            _ => (n, n1),
        }
    } else if n_known {
        (n1, n)
    } else if both_free && p.config.prefer_unmoved_as_unknown && p.is_moved(n) && !p.is_moved(n1) {
        (n1, n)
    } else {
        (n, n1)
    };

    let (ku, kk) = (p.kind(unknown)?, p.kind(known)?);
    let (unknown, known, rule) = match find_pair(ku, kk, c.kind) {
        Some(rule) => (unknown, known, rule),
        None => match find_pair(kk, ku, c.kind) {
            Some(rule) if both_free => (known, unknown, rule),
            _ => {
                return Err(PlacementError::UnsupportedCase(format!(
                    "no {} placement of {} {} from {} {}",
                    c.kind,
                    ku,
                    p.label(unknown),
                    kk,
                    p.label(known)
                )))
            }
        },
    };

    (rule.place)(p, unknown, known, c)?;
    p.ctx.mark_known(unknown);
    p.ctx.mark_known(known);
    Ok(())
}

/// Places `n` from the two known entities `n1` and `n2`.
pub fn compose_ring(
    p: &mut Placement<'_>,
    n: EntityId,
    [n1, n2]: [EntityId; 2],
    [c1, c2]: [&Constraint; 2],
) -> Result<(), PlacementError> {
    if p.is_fixed(n) {
        trace!(%n, "fixed, nothing to place");
        return Ok(());
    }
    let (ku, k1, k2) = (p.kind(n)?, p.kind(n1)?, p.kind(n2)?);
    let (known, cts, rule) = if let Some(rule) = find_ring(ku, [k1, k2]) {
        ([n1, n2], [c1, c2], rule)
    } else if let Some(rule) = find_ring(ku, [k2, k1]) {
        ([n2, n1], [c2, c1], rule)
    } else {
        return Err(PlacementError::UnsupportedCase(format!(
            "no placement of {} {} from {} {} and {} {}",
            ku,
            p.label(n),
            k1,
            p.label(n1),
            k2,
            p.label(n2)
        )));
    };

    if let Some(kinds) = rule.kinds {
        if [cts[0].kind, cts[1].kind] != kinds {
            return Err(PlacementError::UnsupportedCase(format!(
                "{} {} from {} and {} needs {} and {} constraints, got {} and {}",
                ku,
                p.label(n),
                p.label(known[0]),
                p.label(known[1]),
                kinds[0],
                kinds[1],
                cts[0].kind,
                cts[1].kind
            )));
        }
    }

    (rule.place)(p, n, known, cts)?;
    p.ctx.mark_known(n);
    Ok(())
}

// =============================================================================
// Pair placements
// =============================================================================

/// Keeps the bearing from the unknown point towards the known one and puts
/// the unknown point at the requested distance back along it.
fn point_from_point_distance(p: &mut Placement<'_>, u: EntityId, k: EntityId, c: &Constraint) -> Result<(), PlacementError> {
    let pu = p.position(u)?;
    let pk = p.position(k)?;
    let theta = bearing(&pu, &pk);
    p.set_position(u, pk - direction(theta) * c.value)
}

/// Projects the point on the line and offsets it along the normal, keeping
/// the side nearer its pre-solve position.
fn point_from_line_distance(p: &mut Placement<'_>, u: EntityId, l: EntityId, c: &Constraint) -> Result<(), PlacementError> {
    let seg = p.segment(l)?;
    let pre = p.position(u)?;
    let foot = seg.foot(&pre);
    let target = if c.value == 0.0 {
        foot
    } else {
        let off = seg.normal() * c.value;
        nearest_of(&pre, foot + off, foot - off)
    };
    p.set_position(u, target)
}

/// Copies the known line and shifts the copy along its normal, to the side
/// where the unknown line currently sits.
fn line_from_line_distance(p: &mut Placement<'_>, u: EntityId, k: EntityId, c: &Constraint) -> Result<(), PlacementError> {
    let known_seg = p.segment(k)?;
    let (transform, geometry) = {
        let known = p.entity(k)?;
        (known.transform, known.geometry.clone())
    };
    let current = p.entity(u)?.segment().ok_or_else(|| {
        PlacementError::UnsupportedCase(format!("{} is not a line", p.label(u)))
    })?;
    let mid = current.point_at(0.5);
    let offset = known_seg.offset_toward(c.value, &mid).start - known_seg.start;

    let line = p.entity_mut(u)?;
    line.transform = transform;
    line.geometry = geometry;
    line.translate(&offset);
    trace!(entity = %u, dx = offset.x, dy = offset.y, "line offset");
    Ok(())
}

/// Rotates the unknown line about its start point so it makes the requested
/// signed angle with the known line's direction. Length is kept.
fn line_from_line_angle(p: &mut Placement<'_>, u: EntityId, k: EntityId, c: &Constraint) -> Result<(), PlacementError> {
    let known = p.segment(k)?;
    let line = p.segment(u)?;
    let phi = bearing(&known.start, &known.end);
    let end = line.start + direction(phi + c.value) * line.length();
    p.entity_mut(u)?.set_segment(&Segment2::new(line.start, end));
    trace!(entity = %u, angle = c.value, "line rotated");
    Ok(())
}

// =============================================================================
// Ring placements
// =============================================================================

/// Two-circle intersection.
fn point_from_points(p: &mut Placement<'_>, n: EntityId, [a, b]: [EntityId; 2], [ca, cb]: [&Constraint; 2]) -> Result<(), PlacementError> {
    let (d1, d2) = (ca.value, cb.value);
    let c1 = Circle2::new(p.position(a)?, d1);
    let c2 = Circle2::new(p.position(b)?, d2);
    let d12 = distance(&c1.center, &c2.center);

    match c1.intersect(&c2) {
        CircleIntersection::TooFar { gap } => Err(PlacementError::TooFar(format!(
            "{} and {} are {} apart, {} beyond the reach of distances {} + {}",
            p.label(a),
            p.label(b),
            d12,
            gap,
            d1,
            d2
        ))),
        CircleIntersection::TooClose { gap } => Err(PlacementError::TooClose(format!(
            "{} and {} are {} apart, {} short of the difference of distances {} and {}",
            p.label(a),
            p.label(b),
            d12,
            gap,
            d1,
            d2
        ))),
        CircleIntersection::Concentric => Err(PlacementError::Coincident(format!(
            "{} and {} coincide, distances {} and {} do not fix {}",
            p.label(a),
            p.label(b),
            d1,
            d2,
            p.label(n)
        ))),
        CircleIntersection::Points(s1, s2) => p.settle(n, s1, s2),
    }
}

/// Circle around the known point against the known line, offset by the
/// line distance towards the unknown point's side.
fn point_from_point_line(p: &mut Placement<'_>, n: EntityId, [a, l]: [EntityId; 2], [ca, cl]: [&Constraint; 2]) -> Result<(), PlacementError> {
    let pre = p.position(n)?;
    let seg = p.segment(l)?.offset_toward(cl.value, &pre);
    let circle = Circle2::new(p.position(a)?, ca.value);

    match seg.circle_roots(&circle) {
        LineCircleRoots::Miss => Err(PlacementError::TooFar(format!(
            "distance {} around {} does not reach line {}",
            ca.value,
            p.label(a),
            p.label(l)
        ))),
        LineCircleRoots::Tangent(_) => Err(PlacementError::NotImplemented(format!(
            "{} on the tangent of line {} and the circle around {}",
            p.label(n),
            p.label(l),
            p.label(a)
        ))),
        LineCircleRoots::Secant(u1, u2) => {
            let clip = p.config.clip_segments;
            let roots: Vec<f64> = [u1, u2]
                .into_iter()
                .filter(|u| !clip || (0.0..=1.0).contains(u))
                .collect();
            match roots[..] {
                [] => Err(PlacementError::NoSolution(format!(
                    "distance {} around {} meets line {} outside the segment",
                    ca.value,
                    p.label(a),
                    p.label(l)
                ))),
                [u] => p.settle_unique(n, seg.point_at(u)),
                [u1, u2, ..] => p.settle(n, seg.point_at(u1), seg.point_at(u2)),
            }
        }
    }
}

/// Intersection of the two known lines, each offset by its distance towards
/// the unknown point's side.
fn point_from_lines(p: &mut Placement<'_>, n: EntityId, [l1, l2]: [EntityId; 2], [c1, c2]: [&Constraint; 2]) -> Result<(), PlacementError> {
    let pre = p.position(n)?;
    let s1 = p.segment(l1)?.offset_toward(c1.value, &pre);
    let s2 = p.segment(l2)?.offset_toward(c2.value, &pre);

    match s1.intersect(&s2) {
        SegmentIntersection::Point { point, .. } => p.settle_unique(n, point),
        SegmentIntersection::Outside { point, t, u } => {
            if p.config.clip_segments {
                Err(PlacementError::NoIntersection(format!(
                    "lines {} and {} cross outside their segments (t = {}, u = {})",
                    p.label(l1),
                    p.label(l2),
                    t,
                    u
                )))
            } else {
                p.settle_unique(n, point)
            }
        }
        // TODO: place on parallel/coincident lines from the pre-solve position.
        SegmentIntersection::Parallel => Err(PlacementError::NotImplemented(format!(
            "{} from parallel lines {} and {}",
            p.label(n),
            p.label(l1),
            p.label(l2)
        ))),
        SegmentIntersection::Coincident => Err(PlacementError::NotImplemented(format!(
            "{} from coincident lines {} and {}",
            p.label(n),
            p.label(l1),
            p.label(l2)
        ))),
    }
}

/// Lines are built through their endpoints; direct ring placement of a line
/// has no implementation.
fn line_from_ring(p: &mut Placement<'_>, n: EntityId, [a, b]: [EntityId; 2], _: [&Constraint; 2]) -> Result<(), PlacementError> {
    Err(PlacementError::NotImplemented(format!(
        "line {} from {} {} and {} {}",
        p.label(n),
        p.kind(a)?,
        p.label(a),
        p.kind(b)?,
        p.label(b)
    )))
}
