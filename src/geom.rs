// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Geometric predicates on sweep-plane (s, t) coordinates.
//
// Every predicate that does arithmetic checks its result. A non-finite gap,
// product or interpolant is reported as `InvalidInput::PredicateOverflow`
// so no NaN or infinity ever reaches the mesh or the active edge ordering.

use std::mem::swap;

use crate::error::{finite, Result};

pub type Real = f32;

/// A position on the sweep plane. `s` is the sweep direction, `t` the
/// direction along the sweep line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub s: Real,
    pub t: Real,
}

impl Point {
    #[inline]
    pub const fn new(s: Real, t: Real) -> Self {
        Self { s, t }
    }

    #[inline]
    pub fn transpose(self) -> Self {
        Self {
            s: self.t,
            t: self.s,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.s.is_finite() && self.t.is_finite()
    }
}

/// Axis-aligned box on the sweep plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// The smallest box holding every point, or `None` for no points.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut b = Bounds {
            min: first,
            max: first,
        };
        for p in points {
            b.min.s = b.min.s.min(p.s);
            b.min.t = b.min.t.min(p.t);
            b.max.s = b.max.s.max(p.s);
            b.max.t = b.max.t.max(p.t);
        }
        Some(b)
    }
}

/// Sweep order: `u` comes no later than `v` (s first, then t).
#[inline]
pub fn vert_leq(u: Point, v: Point) -> bool {
    u.s < v.s || (u.s == v.s && u.t <= v.t)
}

#[inline]
pub fn vert_eq(u: Point, v: Point) -> bool {
    u.s == v.s && u.t == v.t
}

/// Sweep order with s and t transposed.
#[inline]
pub fn trans_leq(u: Point, v: Point) -> bool {
    u.t < v.t || (u.t == v.t && u.s <= v.s)
}

/// Signed distance from edge `uw` to `v`, measured along t at `v.s`.
///
/// Requires `vert_leq(u, v) && vert_leq(v, w)`. Positive when `v` lies above
/// the edge, zero for a vertical edge.
pub fn edge_eval(u: Point, v: Point, w: Point) -> Result<Real> {
    let gap_l = v.s - u.s;
    let gap_r = w.s - v.s;
    let span = finite(gap_l + gap_r, "edge_eval")?;
    if span <= 0.0 {
        return Ok(0.0);
    }
    let value = if gap_l < gap_r {
        (v.t - u.t) + (u.t - w.t) * (gap_l / span)
    } else {
        (v.t - w.t) + (w.t - u.t) * (gap_r / span)
    };
    finite(value, "edge_eval")
}

/// Same sign as [`edge_eval`]. Evaluated through the ratio form, which keeps
/// its accuracy when the s coordinates are nearly equal.
#[inline]
pub fn edge_sign(u: Point, v: Point, w: Point) -> Result<Real> {
    edge_eval(u, v, w)
}

/// [`edge_eval`] with s and t transposed.
#[inline]
pub fn trans_eval(u: Point, v: Point, w: Point) -> Result<Real> {
    edge_eval(u.transpose(), v.transpose(), w.transpose())
}

/// [`edge_sign`] with s and t transposed.
#[inline]
pub fn trans_sign(u: Point, v: Point, w: Point) -> Result<Real> {
    edge_sign(u.transpose(), v.transpose(), w.transpose())
}

/// True when `u`, `v`, `w` turn counter-clockwise (or are collinear).
pub fn vert_ccw(u: Point, v: Point, w: Point) -> Result<bool> {
    let area = u.s * (v.t - w.t) + v.s * (w.t - u.t) + w.s * (u.t - v.t);
    Ok(finite(area, "vert_ccw")? >= 0.0)
}

/// True when `u`, `v` and `w` lie on one line.
pub fn vert_flat(u: Point, v: Point, w: Point) -> Result<bool> {
    let area = u.s * (v.t - w.t) + v.s * (w.t - u.t) + w.s * (u.t - v.t);
    Ok(finite(area, "vert_flat")? == 0.0)
}

pub fn vert_l1_dist(u: Point, v: Point) -> Result<Real> {
    finite((u.s - v.s).abs() + (u.t - v.t).abs(), "vert_l1_dist")
}

/// Returns `(b*x + a*y) / (a + b)`, or the midpoint of `x` and `y` when both
/// weights are zero. Negative weights are clamped to zero, which keeps the
/// result between `x` and `y`.
pub fn real_interpolate(a: Real, x: Real, b: Real, y: Real) -> Result<Real> {
    let a = a.max(0.0);
    let b = b.max(0.0);
    let total = finite(a + b, "real_interpolate")?;
    let value = if a <= b {
        if b == 0.0 {
            x / 2.0 + y / 2.0
        } else {
            x + (y - x) * (a / total)
        }
    } else {
        y + (x - y) * (b / total)
    };
    finite(value, "real_interpolate")
}

/// Intersection of segments `o1 d1` and `o2 d2`.
///
/// Each coordinate is interpolated between the two innermost endpoints along
/// that axis, so the result always lies inside the bounding boxes of both
/// segments, even when they barely touch.
pub fn edge_intersect(o1: Point, d1: Point, o2: Point, d2: Point) -> Result<Point> {
    let s = intersect_along_s(o1, d1, o2, d2)?;
    let t = intersect_along_s(o1.transpose(), d1.transpose(), o2.transpose(), d2.transpose())?;
    Ok(Point { s, t })
}

fn intersect_along_s(o1: Point, d1: Point, o2: Point, d2: Point) -> Result<Real> {
    let (mut a, mut b, mut c, mut d) = (o1, d1, o2, d2);
    if !vert_leq(a, b) {
        swap(&mut a, &mut b);
    }
    if !vert_leq(c, d) {
        swap(&mut c, &mut d);
    }
    if !vert_leq(a, c) {
        swap(&mut a, &mut c);
        swap(&mut b, &mut d);
    }

    if !vert_leq(c, b) {
        // No overlap in s: split the gap.
        return finite(c.s / 2.0 + b.s / 2.0, "edge_intersect");
    }
    if vert_leq(b, d) {
        // Overlap is [c, b].
        let mut z1 = edge_eval(a, c, b)?;
        let mut z2 = edge_eval(c, b, d)?;
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        real_interpolate(z1, c.s, z2, b.s)
    } else {
        // Second segment lies inside the first.
        let mut z1 = edge_sign(a, c, b)?;
        let mut z2 = -edge_sign(a, d, b)?;
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        real_interpolate(z1, c.s, z2, d.s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(s: Real, t: Real) -> Point {
        Point::new(s, t)
    }

    #[test]
    fn vert_leq_orders_by_s_then_t() {
        assert!(vert_leq(p(0.0, 0.0), p(1.0, 0.0)));
        assert!(vert_leq(p(0.0, 0.0), p(0.0, 1.0)));
        assert!(vert_leq(p(0.0, 0.0), p(0.0, 0.0)));
        assert!(!vert_leq(p(1.0, 0.0), p(0.0, 0.0)));
    }

    #[test]
    fn trans_leq_orders_by_t_then_s() {
        assert!(trans_leq(p(0.0, 0.0), p(0.0, 1.0)));
        assert!(trans_leq(p(0.0, 0.0), p(1.0, 0.0)));
        assert!(!trans_leq(p(0.0, 1.0), p(0.0, 0.0)));
    }

    #[test]
    fn edge_eval_measures_height_above_edge() {
        let r = edge_eval(p(0.0, 0.0), p(0.5, 1.0), p(1.0, 0.0)).unwrap();
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-6);
        let r = edge_eval(p(0.0, 0.0), p(0.5, -2.0), p(1.0, 0.0)).unwrap();
        assert_abs_diff_eq!(r, -2.0, epsilon = 1e-6);
    }

    #[test]
    fn edge_eval_vertical_is_zero() {
        assert_eq!(edge_eval(p(0.0, 0.0), p(0.0, 0.5), p(0.0, 1.0)), Ok(0.0));
    }

    #[test]
    fn edge_eval_overflow_is_reported() {
        let err = edge_eval(p(-Real::MAX, 0.0), p(0.0, 1.0), p(Real::MAX, 0.0));
        assert!(err.is_err());
        let err = edge_eval(p(0.0, -Real::MAX), p(1.0, Real::MAX), p(2.0, 0.0));
        assert!(err.is_err());
    }

    #[test]
    fn trans_eval_transposes() {
        let r = trans_eval(p(1.0, 0.0), p(0.0, 0.5), p(1.0, 1.0)).unwrap();
        assert_abs_diff_eq!(r, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn vert_ccw_detects_turn() {
        assert!(vert_ccw(p(0.0, 0.0), p(1.0, 0.0), p(0.5, 1.0)).unwrap());
        assert!(!vert_ccw(p(0.0, 0.0), p(0.5, 1.0), p(1.0, 0.0)).unwrap());
        assert!(vert_ccw(p(Real::MAX, 0.0), p(0.0, Real::MAX), p(-Real::MAX, -Real::MAX)).is_err());
    }

    #[test]
    fn vert_flat_only_for_collinear_points() {
        assert!(vert_flat(p(0.0, 0.0), p(1.0, 1.0), p(3.0, 3.0)).unwrap());
        assert!(vert_flat(p(2.0, 0.0), p(2.0, 0.0), p(5.0, 1.0)).unwrap());
        assert!(!vert_flat(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 1e-3)).unwrap());
    }

    #[test]
    fn real_interpolate_midpoint_when_weights_vanish() {
        assert_abs_diff_eq!(real_interpolate(0.0, 0.0, 0.0, 1.0).unwrap(), 0.5);
    }

    #[test]
    fn real_interpolate_weighted() {
        assert_abs_diff_eq!(real_interpolate(1.0, 0.0, 1.0, 2.0).unwrap(), 1.0);
        assert_abs_diff_eq!(real_interpolate(3.0, 0.0, 1.0, 4.0).unwrap(), 3.0);
    }

    #[test]
    fn real_interpolate_clamps_negative_weights() {
        assert_abs_diff_eq!(real_interpolate(-1.0, 2.0, 1.0, 6.0).unwrap(), 2.0);
    }

    #[test]
    fn edge_intersect_crossing() {
        let x = edge_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(1.0, 0.0)).unwrap();
        assert_abs_diff_eq!(x.s, 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(x.t, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn edge_intersect_stays_in_both_boxes() {
        let x = edge_intersect(p(0.0, 0.0), p(4.0, 1.0), p(1.0, 1.0), p(3.0, 0.0)).unwrap();
        assert!((1.0..=3.0).contains(&x.s), "s={}", x.s);
        assert!((0.0..=1.0).contains(&x.t), "t={}", x.t);
    }

    #[test]
    fn bounds_enclose_all_points() {
        let b = Bounds::enclosing([p(1.0, 5.0), p(-2.0, 3.0), p(4.0, -1.0)]).unwrap();
        assert_eq!(b.min, p(-2.0, -1.0));
        assert_eq!(b.max, p(4.0, 5.0));
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn edge_intersect_extreme_coordinates_fail_cleanly() {
        let big = Real::MAX;
        let r = edge_intersect(p(-big, -big), p(big, big), p(-big, big), p(big, -big));
        assert!(r.is_err());
    }
}
