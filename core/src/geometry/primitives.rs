use super::{cross, perpendicular_ccw, Point2, Vector2, EPSILON};
use serde::{Deserialize, Serialize};

/// A 2D line segment, parameterized as `start + t * (end - start)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment2 {
    pub start: Point2,
    pub end: Point2,
}

/// Outcome of intersecting two segments with the determinant method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    /// Both parameters lie in [0,1].
    Point { point: Point2, t: f64, u: f64 },
    /// The supporting lines cross, but outside at least one segment.
    Outside { point: Point2, t: f64, u: f64 },
    Parallel,
    /// Parallel and on the same supporting line.
    Coincident,
}

/// Roots of `|start + u * (end - start) - center|^2 = r^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineCircleRoots {
    /// Negative discriminant.
    Miss,
    /// Zero discriminant.
    Tangent(f64),
    Secant(f64, f64),
}

/// Outcome of intersecting two circles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircleIntersection {
    /// Centers further apart than the sum of the radii.
    TooFar { gap: f64 },
    /// One circle strictly inside the other.
    TooClose { gap: f64 },
    /// Same center; no unique chord exists.
    Concentric,
    Points(Point2, Point2),
}

impl Segment2 {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> Vector2 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    pub fn is_degenerate(&self) -> bool {
        self.vector().norm_squared() < EPSILON * EPSILON
    }

    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + self.vector() * t
    }

    /// Unit normal, counter-clockwise from the segment direction.
    pub fn normal(&self) -> Vector2 {
        let n = perpendicular_ccw(&self.vector());
        let len = n.norm();
        if len < EPSILON {
            Vector2::zeros()
        } else {
            n / len
        }
    }

    /// Parameter of the orthogonal projection of `p` on the infinite line.
    pub fn project_param(&self, p: &Point2) -> f64 {
        let d = self.vector();
        let len_sq = d.norm_squared();
        if len_sq < EPSILON * EPSILON {
            return 0.0;
        }
        (p - self.start).dot(&d) / len_sq
    }

    /// Orthogonal projection of `p` on the infinite line.
    pub fn foot(&self, p: &Point2) -> Point2 {
        self.point_at(self.project_param(p))
    }

    /// Positive when `p` is left of the segment direction.
    pub fn side(&self, p: &Point2) -> f64 {
        cross(&self.vector(), &(p - self.start))
    }

    pub fn translated(&self, offset: &Vector2) -> Segment2 {
        Segment2::new(self.start + offset, self.end + offset)
    }

    /// Copy of the segment moved `distance` along its normal, towards the
    /// side on which `toward` lies (left when `toward` is on the line).
    pub fn offset_toward(&self, distance: f64, toward: &Point2) -> Segment2 {
        if distance == 0.0 {
            return *self;
        }
        let sign = if self.side(toward) < 0.0 { -1.0 } else { 1.0 };
        self.translated(&(self.normal() * (sign * distance)))
    }

    pub fn intersect(&self, other: &Segment2) -> SegmentIntersection {
        let d1 = self.vector();
        let d2 = other.vector();
        let denom = cross(&d1, &d2);
        let w = other.start - self.start;

        if denom.abs() <= EPSILON * d1.norm() * d2.norm() {
            let offset = cross(&w, &d1);
            return if offset.abs() <= EPSILON * d1.norm().max(1.0) {
                SegmentIntersection::Coincident
            } else {
                SegmentIntersection::Parallel
            };
        }

        let t = cross(&w, &d2) / denom;
        let u = cross(&w, &d1) / denom;
        let point = self.point_at(t);
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            SegmentIntersection::Point { point, t, u }
        } else {
            SegmentIntersection::Outside { point, t, u }
        }
    }

    /// Solves `a*u^2 + b*u + c = 0` for the line's parameter `u` where it
    /// meets the circle.
    pub fn circle_roots(&self, circle: &Circle2) -> LineCircleRoots {
        let d = self.vector();
        let f = self.start - circle.center;
        let a = d.norm_squared();
        let b = 2.0 * f.dot(&d);
        let c = f.norm_squared() - circle.radius * circle.radius;

        if a == 0.0 {
            return if c == 0.0 {
                LineCircleRoots::Tangent(0.0)
            } else {
                LineCircleRoots::Miss
            };
        }

        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            LineCircleRoots::Miss
        } else if disc == 0.0 {
            LineCircleRoots::Tangent(-b / (2.0 * a))
        } else {
            let s = disc.sqrt();
            LineCircleRoots::Secant((-b - s) / (2.0 * a), (-b + s) / (2.0 * a))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle2 {
    pub center: Point2,
    pub radius: f64,
}

impl Circle2 {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Standard circle-circle intersection:
    /// `a = (r1^2 - r2^2 + d^2) / 2d`, `h = sqrt(r1^2 - a^2)`.
    pub fn intersect(&self, other: &Circle2) -> CircleIntersection {
        let (r1, r2) = (self.radius, other.radius);
        let delta = other.center - self.center;
        let d = delta.norm();

        if d > r1 + r2 {
            return CircleIntersection::TooFar { gap: d - (r1 + r2) };
        }
        if d < (r1 - r2).abs() {
            return CircleIntersection::TooClose { gap: (r1 - r2).abs() - d };
        }
        if d == 0.0 {
            return CircleIntersection::Concentric;
        }

        let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
        // Rounding can push r1^2 - a^2 slightly negative at tangency.
        let h = (r1 * r1 - a * a).max(0.0).sqrt();
        let base = self.center + delta * (a / d);
        let off = Vector2::new(-delta.y, delta.x) * (h / d);

        CircleIntersection::Points(base + off, base - off)
    }
}
