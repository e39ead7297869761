use super::config::SolverConfig;
use super::constraint::ConstraintKind;
use super::error::PlacementError;
use super::planner::Instruction;
use super::solver::InstructionExecutor;
use super::types::{EntityId, Sketch};
use crate::geometry::Point2;
use std::f64::consts::FRAC_PI_2;

const TOL: f64 = 1e-9;

fn assert_at(sketch: &Sketch, id: EntityId, x: f64, y: f64) {
    let p = sketch.position(id).unwrap();
    assert!(
        (p.x - x).abs() < TOL && (p.y - y).abs() < TOL,
        "{} at ({}, {}), expected ({}, {})",
        id,
        p.x,
        p.y,
        x,
        y
    );
}

fn fixed_point(sketch: &mut Sketch, name: &str, pos: [f64; 2]) -> EntityId {
    let id = sketch.add_point(name, pos);
    sketch.set_fixed(id, true).unwrap();
    id
}

fn fixed_line(sketch: &mut Sketch, name: &str, start: [f64; 2], end: [f64; 2]) -> EntityId {
    let id = sketch.add_line(name, start, end);
    sketch.set_fixed(id, true).unwrap();
    id
}

/// Point C constrained to A and B by distances `d1` and `d2`.
fn two_circle_sketch(b: [f64; 2], c: [f64; 2], d1: f64, d2: f64) -> (Sketch, Instruction) {
    let mut sketch = Sketch::new("two circles");
    let a = fixed_point(&mut sketch, "A", [0.0, 0.0]);
    let b = fixed_point(&mut sketch, "B", b);
    let c = sketch.add_point("C", c);
    let c1 = sketch.add_constraint(ConstraintKind::Distance, c, a, d1).unwrap();
    let c2 = sketch.add_constraint(ConstraintKind::Distance, c, b, d2).unwrap();
    let insn = Instruction::ComposeRing { n: c, n1: a, n2: b, c1, c2 };
    (sketch, insn)
}

fn exec(sketch: &mut Sketch, insn: Instruction) -> (Result<(), PlacementError>, u32) {
    let mut ctx = sketch.solve();
    let result = sketch.exec_insn(&insn, &mut ctx);
    (result, ctx.n_solutions)
}

// =============================================================================
// Rings
// =============================================================================

#[test]
fn test_two_circles_pick_nearest_root() {
    let (mut sketch, insn) = two_circle_sketch([4.0, 0.0], [1.0, 1.0], 3.0, 3.0);
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, insn.target(), 2.0, 5f64.sqrt());
    assert_eq!(solutions, 2);

    let (mut sketch, insn) = two_circle_sketch([4.0, 0.0], [1.0, -1.0], 3.0, 3.0);
    exec(&mut sketch, insn).0.unwrap();
    assert_at(&sketch, insn.target(), 2.0, -5f64.sqrt());
}

#[test]
fn test_two_circles_touching_count_once() {
    let (mut sketch, insn) = two_circle_sketch([4.0, 0.0], [1.0, 1.0], 2.0, 2.0);
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, insn.target(), 2.0, 0.0);
    assert_eq!(solutions, 1);
}

#[test]
fn test_two_circles_too_far_leaves_point() {
    let (mut sketch, insn) = two_circle_sketch([10.0, 0.0], [1.0, 1.0], 3.0, 3.0);
    let (result, solutions) = exec(&mut sketch, insn);
    match result {
        Err(PlacementError::TooFar(msg)) => {
            assert!(msg.contains('A') && msg.contains('B'), "{}", msg);
        }
        other => panic!("expected TooFar, got {:?}", other),
    }
    assert_at(&sketch, insn.target(), 1.0, 1.0);
    assert_eq!(solutions, 0);
}

#[test]
fn test_two_circles_too_close() {
    let (mut sketch, insn) = two_circle_sketch([1.0, 0.0], [1.0, 1.0], 5.0, 1.0);
    let (result, _) = exec(&mut sketch, insn);
    assert!(matches!(result, Err(PlacementError::TooClose(_))));
    assert_at(&sketch, insn.target(), 1.0, 1.0);
}

#[test]
fn test_two_circles_concentric() {
    let (mut sketch, insn) = two_circle_sketch([0.0, 0.0], [1.0, 1.0], 2.0, 2.0);
    let (result, _) = exec(&mut sketch, insn);
    assert!(matches!(result, Err(PlacementError::Coincident(_))));
}

#[test]
fn test_point_from_point_and_line() {
    let mut sketch = Sketch::new("point line ring");
    let l = fixed_line(&mut sketch, "L", [0.0, 0.0], [10.0, 0.0]);
    let a = fixed_point(&mut sketch, "A", [5.0, 0.0]);
    let p = sketch.add_point("P", [8.0, 4.0]);
    let cl = sketch.add_constraint(ConstraintKind::Distance, p, l, 3.0).unwrap();
    let ca = sketch.add_constraint(ConstraintKind::Distance, p, a, 5.0).unwrap();

    // Line listed first: the table is consulted with the pair swapped.
    let insn = Instruction::ComposeRing { n: p, n1: l, n2: a, c1: cl, c2: ca };
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, p, 9.0, 3.0);
    assert_eq!(solutions, 2);
}

#[test]
fn test_point_line_ring_clipping() {
    let build = |config: SolverConfig| {
        let mut sketch = Sketch::new("clip").with_config(config);
        let l = fixed_line(&mut sketch, "L", [0.0, 0.0], [10.0, 0.0]);
        let a = fixed_point(&mut sketch, "A", [12.0, 0.0]);
        let p = sketch.add_point("P", [8.0, 4.0]);
        let ca = sketch.add_constraint(ConstraintKind::Distance, p, a, 5.0).unwrap();
        let cl = sketch.add_constraint(ConstraintKind::Distance, p, l, 3.0).unwrap();
        (sketch, Instruction::ComposeRing { n: p, n1: a, n2: l, c1: ca, c2: cl })
    };

    // Roots at x = 8 and x = 16; only the first lies on the segment.
    let (mut sketch, insn) = build(SolverConfig::default());
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, insn.target(), 8.0, 3.0);
    assert_eq!(solutions, 1);

    let (mut sketch, insn) = build(SolverConfig::default().with_clip_segments(false));
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, insn.target(), 8.0, 3.0);
    assert_eq!(solutions, 2);
}

#[test]
fn test_point_line_ring_miss() {
    let mut sketch = Sketch::new("miss");
    let l = fixed_line(&mut sketch, "L", [0.0, 0.0], [10.0, 0.0]);
    let a = fixed_point(&mut sketch, "A", [5.0, 0.0]);
    let p = sketch.add_point("P", [8.0, 4.0]);
    let ca = sketch.add_constraint(ConstraintKind::Distance, p, a, 1.0).unwrap();
    let cl = sketch.add_constraint(ConstraintKind::Distance, p, l, 3.0).unwrap();
    let insn = Instruction::ComposeRing { n: p, n1: a, n2: l, c1: ca, c2: cl };
    let (result, _) = exec(&mut sketch, insn);
    assert!(matches!(result, Err(PlacementError::TooFar(_))));
    assert_at(&sketch, p, 8.0, 4.0);
}

#[test]
fn test_point_from_two_lines() {
    let mut sketch = Sketch::new("corner");
    let l1 = fixed_line(&mut sketch, "L1", [0.0, 0.0], [10.0, 0.0]);
    let l2 = fixed_line(&mut sketch, "L2", [0.0, 0.0], [0.0, 10.0]);
    let p = sketch.add_point("P", [4.0, 5.0]);
    let c1 = sketch.add_constraint(ConstraintKind::Distance, p, l1, 1.0).unwrap();
    let c2 = sketch.add_constraint(ConstraintKind::Distance, p, l2, 2.0).unwrap();
    let insn = Instruction::ComposeRing { n: p, n1: l1, n2: l2, c1, c2 };
    let (result, solutions) = exec(&mut sketch, insn);
    result.unwrap();
    assert_at(&sketch, p, 2.0, 1.0);
    assert_eq!(solutions, 1);
}

#[test]
fn test_two_lines_crossing_outside_segments() {
    let build = |config: SolverConfig| {
        let mut sketch = Sketch::new("outside").with_config(config);
        let l1 = fixed_line(&mut sketch, "L1", [0.0, 0.0], [10.0, 0.0]);
        let l2 = fixed_line(&mut sketch, "L2", [20.0, 1.0], [20.0, 10.0]);
        let p = sketch.add_point("P", [15.0, 3.0]);
        let c1 = sketch.add_constraint(ConstraintKind::Incident, p, l1, 0.0).unwrap();
        let c2 = sketch.add_constraint(ConstraintKind::Incident, p, l2, 0.0).unwrap();
        (sketch, Instruction::ComposeRing { n: p, n1: l1, n2: l2, c1, c2 })
    };

    let (mut sketch, insn) = build(SolverConfig::default());
    let (result, _) = exec(&mut sketch, insn);
    assert!(matches!(result, Err(PlacementError::NoIntersection(_))));
    assert_at(&sketch, insn.target(), 15.0, 3.0);

    let (mut sketch, insn) = build(SolverConfig::default().with_clip_segments(false));
    exec(&mut sketch, insn).0.unwrap();
    assert_at(&sketch, insn.target(), 20.0, 0.0);
}

#[test]
fn test_parallel_lines_not_implemented() {
    let mut sketch = Sketch::new("rails");
    let l1 = fixed_line(&mut sketch, "L1", [0.0, 0.0], [10.0, 0.0]);
    let l2 = fixed_line(&mut sketch, "L2", [0.0, 5.0], [10.0, 5.0]);
    let p = sketch.add_point("P", [4.0, 3.0]);
    let c1 = sketch.add_constraint(ConstraintKind::Distance, p, l1, 1.0).unwrap();
    let c2 = sketch.add_constraint(ConstraintKind::Distance, p, l2, 1.0).unwrap();
    let insn = Instruction::ComposeRing { n: p, n1: l1, n2: l2, c1, c2 };
    let (result, _) = exec(&mut sketch, insn);
    assert!(result.unwrap_err().is_not_implemented());
    assert_at(&sketch, p, 4.0, 3.0);
}

#[test]
fn test_line_ring_not_implemented() {
    let mut sketch = Sketch::new("line ring");
    let a = fixed_point(&mut sketch, "A", [0.0, 0.0]);
    let b = fixed_point(&mut sketch, "B", [4.0, 0.0]);
    let l = sketch.add_line("L", [0.0, 1.0], [4.0, 1.0]);
    let c1 = sketch.add_constraint(ConstraintKind::Distance, l, a, 1.0).unwrap();
    let c2 = sketch.add_constraint(ConstraintKind::Distance, l, b, 1.0).unwrap();
    let insn = Instruction::ComposeRing { n: l, n1: a, n2: b, c1, c2 };
    let (result, _) = exec(&mut sketch, insn);
    let err = result.unwrap_err();
    assert!(err.is_not_implemented());
    assert!(!err.is_geometric());
}

#[test]
fn test_point_ring_needs_distances() {
    let mut sketch = Sketch::new("angles");
    let a = fixed_point(&mut sketch, "A", [0.0, 0.0]);
    let b = fixed_point(&mut sketch, "B", [4.0, 0.0]);
    let c = sketch.add_point("C", [1.0, 1.0]);
    let c1 = sketch.add_constraint(ConstraintKind::Angle, c, a, 0.5).unwrap();
    let c2 = sketch.add_constraint(ConstraintKind::Distance, c, b, 3.0).unwrap();
    let insn = Instruction::ComposeRing { n: c, n1: a, n2: b, c1, c2 };
    let (result, _) = exec(&mut sketch, insn);
    assert!(matches!(result, Err(PlacementError::UnsupportedCase(_))));
}

// =============================================================================
// Pairs
// =============================================================================

#[test]
fn test_point_from_point_keeps_bearing() {
    let mut sketch = Sketch::new("pair");
    let a = fixed_point(&mut sketch, "A", [0.0, 0.0]);
    let b = sketch.add_point("B", [3.0, 4.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, a, b, 10.0).unwrap();

    // The known entity may come first; roles follow what is known.
    let (result, solutions) = exec(&mut sketch, Instruction::ComposePair { n: a, n1: b, c });
    result.unwrap();
    assert_at(&sketch, a, 0.0, 0.0);
    assert_at(&sketch, b, 6.0, 8.0);
    assert_eq!(solutions, 0);
}

#[test]
fn test_free_pair_solves_the_unmoved_entity() {
    let mut sketch = Sketch::new("drag");
    let a = sketch.add_point("A", [0.0, 0.0]);
    let b = sketch.add_point("B", [3.0, 4.0]);
    sketch.set_moved(a, true).unwrap();
    let c = sketch.add_constraint(ConstraintKind::Distance, a, b, 10.0).unwrap();

    let mut ctx = sketch.solve();
    sketch
        .exec_insn(&Instruction::ComposePair { n: a, n1: b, c }, &mut ctx)
        .unwrap();
    assert_at(&sketch, a, 0.0, 0.0);
    assert_at(&sketch, b, 6.0, 8.0);
    assert!(ctx.is_known(a) && ctx.is_known(b));
}

#[test]
fn test_point_on_line_is_projection() {
    for (start, end) in [([0.0, 0.0], [10.0, 0.0]), ([10.0, 0.0], [0.0, 0.0])] {
        let mut sketch = Sketch::new("incident");
        let l = fixed_line(&mut sketch, "L", start, end);
        let p = sketch.add_point("P", [3.0, 4.0]);
        let c = sketch.add_constraint(ConstraintKind::Incident, p, l, 0.0).unwrap();
        exec(&mut sketch, Instruction::ComposePair { n: p, n1: l, c }).0.unwrap();
        assert_at(&sketch, p, 3.0, 0.0);
    }
}

#[test]
fn test_point_at_distance_from_line() {
    let mut sketch = Sketch::new("offset");
    let l = fixed_line(&mut sketch, "L", [0.0, 0.0], [10.0, 0.0]);
    let p = sketch.add_point("P", [5.0, -5.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, p, l, 2.0).unwrap();
    exec(&mut sketch, Instruction::ComposePair { n: p, n1: l, c }).0.unwrap();
    assert_at(&sketch, p, 5.0, -2.0);
}

#[test]
fn test_free_pair_uses_reversed_rule() {
    let mut sketch = Sketch::new("reversed");
    let l = sketch.add_line("L", [0.0, 0.0], [10.0, 0.0]);
    let p = sketch.add_point("P", [5.0, 5.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, l, p, 2.0).unwrap();
    exec(&mut sketch, Instruction::ComposePair { n: l, n1: p, c }).0.unwrap();
    assert_at(&sketch, p, 5.0, 2.0);
}

#[test]
fn test_reversed_rule_refused_when_known() {
    let mut sketch = Sketch::new("refused");
    let l = sketch.add_line("L", [0.0, 0.0], [10.0, 0.0]);
    let p = fixed_point(&mut sketch, "P", [5.0, 5.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, l, p, 2.0).unwrap();
    let (result, _) = exec(&mut sketch, Instruction::ComposePair { n: l, n1: p, c });
    assert!(matches!(result, Err(PlacementError::UnsupportedCase(_))));
    assert_at(&sketch, p, 5.0, 5.0);
}

#[test]
fn test_line_offset_from_line() {
    let mut sketch = Sketch::new("parallel offset");
    let l1 = fixed_line(&mut sketch, "L1", [0.0, 0.0], [10.0, 0.0]);
    let l2 = sketch.add_line("L2", [2.0, 3.0], [5.0, 4.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, l2, l1, 2.0).unwrap();
    exec(&mut sketch, Instruction::ComposePair { n: l2, n1: l1, c }).0.unwrap();

    let seg = sketch.entity(l2).and_then(|e| e.segment()).unwrap();
    assert!((seg.start - Point2::new(0.0, 2.0)).norm() < TOL);
    assert!((seg.end - Point2::new(10.0, 2.0)).norm() < TOL);
}

#[test]
fn test_line_perpendicular_to_line() {
    let mut sketch = Sketch::new("perpendicular");
    let l1 = fixed_line(&mut sketch, "L1", [0.0, 0.0], [10.0, 0.0]);
    let l2 = sketch.add_line("L2", [1.0, 1.0], [4.0, 1.0]);
    let c = sketch.add_constraint(ConstraintKind::Perpendicular, l2, l1, 0.0).unwrap();
    exec(&mut sketch, Instruction::ComposePair { n: l2, n1: l1, c }).0.unwrap();

    let seg = sketch.entity(l2).and_then(|e| e.segment()).unwrap();
    assert!((seg.start - Point2::new(1.0, 1.0)).norm() < TOL);
    assert!((seg.end - Point2::new(1.0, 4.0)).norm() < TOL);
    assert!((seg.length() - 3.0).abs() < TOL);
    let angle = seg.vector().y.atan2(seg.vector().x);
    assert!((angle - FRAC_PI_2).abs() < TOL);
}

#[test]
fn test_circle_pair_unsupported() {
    let mut sketch = Sketch::new("circle");
    let a = fixed_point(&mut sketch, "A", [0.0, 0.0]);
    let o = sketch.add_circle("O", [3.0, 0.0], 1.0);
    let c = sketch.add_constraint(ConstraintKind::Distance, o, a, 5.0).unwrap();
    let (result, _) = exec(&mut sketch, Instruction::ComposePair { n: o, n1: a, c });
    assert!(matches!(result, Err(PlacementError::UnsupportedCase(_))));
    assert_at(&sketch, o, 3.0, 0.0);
}

#[test]
fn test_degenerate_line_has_no_solution() {
    let mut sketch = Sketch::new("degenerate");
    let l = fixed_line(&mut sketch, "L", [2.0, 2.0], [2.0, 2.0]);
    let p = sketch.add_point("P", [5.0, 5.0]);
    let c = sketch.add_constraint(ConstraintKind::Distance, p, l, 1.0).unwrap();
    let (result, _) = exec(&mut sketch, Instruction::ComposePair { n: p, n1: l, c });
    assert!(matches!(result, Err(PlacementError::NoSolution(_))));
}
