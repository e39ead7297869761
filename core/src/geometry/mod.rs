use nalgebra as na;

pub type Point2 = na::Point2<f64>;
pub type Vector2 = na::Vector2<f64>;
pub type Isometry2 = na::Isometry2<f64>;

/// Tolerance used by approximate comparisons (payload matching, degenerate
/// segment detection). Root classification in the solver uses exact tests.
pub const EPSILON: f64 = 1e-6;

pub trait ApproxEq {
    fn approx_eq(&self, other: &Self) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).abs() < EPSILON
    }
}

impl ApproxEq for Point2 {
    fn approx_eq(&self, other: &Self) -> bool {
        na::distance_squared(self, other) < EPSILON * EPSILON
    }
}

impl ApproxEq for Vector2 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).norm_squared() < EPSILON * EPSILON
    }
}

pub mod primitives;
pub use primitives::*;

pub fn distance(p1: &Point2, p2: &Point2) -> f64 {
    na::distance(p1, p2)
}

/// Bearing of `to` as seen from `from`, in radians.
pub fn bearing(from: &Point2, to: &Point2) -> f64 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for an angle in radians.
#[inline]
pub fn direction(angle: f64) -> Vector2 {
    Vector2::new(angle.cos(), angle.sin())
}

/// 2D cross product (z-component of the 3D cross product).
#[inline]
pub fn cross(v1: &Vector2, v2: &Vector2) -> f64 {
    v1.x * v2.y - v1.y * v2.x
}

/// Perpendicular vector (90° counter-clockwise rotation).
#[inline]
pub fn perpendicular_ccw(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// Of two candidates, the one nearer to `reference`. Ties keep the first.
pub fn nearest_of(reference: &Point2, a: Point2, b: Point2) -> Point2 {
    if na::distance_squared(reference, &b) < na::distance_squared(reference, &a) {
        b
    } else {
        a
    }
}
