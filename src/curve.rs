//! Link curve geometry used for pointer hit-testing.

use crate::types::Point;

/// Horizontal-biased cubic bezier, the shape the editor draws links with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkCurve {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl LinkCurve {
    /// Build the curve a link between `start` and `end` is drawn with.
    ///
    /// Control points extend horizontally by half the horizontal distance,
    /// but at least `min_offset * zoom`. Endpoints closer than `10 * zoom`
    /// collapse to a straight segment.
    pub fn between(start: Point, end: Point, zoom: f32, min_offset: f32) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let threshold = 10.0 * zoom;

        if dx * dx + dy * dy < threshold * threshold {
            return Self { p0: start, p1: start, p2: end, p3: end };
        }

        let offset = (dx.abs() * 0.5).max(min_offset * zoom);
        Self {
            p0: start,
            p1: start.offset(offset, 0.0),
            p2: end.offset(-offset, 0.0),
            p3: end,
        }
    }

    /// Point on the curve at `t` in `0.0..=1.0`.
    pub fn eval(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.p0.x + b * self.p1.x + c * self.p2.x + d * self.p3.x,
            a * self.p0.y + b * self.p1.y + c * self.p2.y + d * self.p3.y,
        )
    }

    /// Approximate distance from `point` to the curve, flattening it into
    /// `samples` segments (`0` means 20).
    pub fn distance_to(&self, point: Point, samples: usize) -> f32 {
        let samples = if samples == 0 { 20 } else { samples };

        let mut best = f32::MAX;
        let mut prev = self.eval(0.0);
        for i in 1..=samples {
            let curr = self.eval(i as f32 / samples as f32);
            best = best.min(segment_distance_sq(point, prev, curr));
            prev = curr;
        }
        best.sqrt()
    }
}

fn segment_distance_sq(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let (apx, apy) = (p.x - a.x, p.y - a.y);
    let len_sq = abx * abx + aby * aby;

    if len_sq < f32::EPSILON {
        return apx * apx + apy * apy;
    }

    let t = ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0);
    let dx = p.x - (a.x + t * abx);
    let dy = p.y - (a.y + t * aby);
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> LinkCurve {
        LinkCurve::between(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1.0, 50.0)
    }

    #[test]
    fn test_control_points_extend_horizontally() {
        let curve = LinkCurve::between(Point::new(0.0, 0.0), Point::new(100.0, 100.0), 1.0, 50.0);
        assert_eq!(curve.p1, Point::new(50.0, 0.0));
        assert_eq!(curve.p2, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_min_offset_scales_with_zoom() {
        let curve = LinkCurve::between(Point::new(0.0, 0.0), Point::new(40.0, 0.0), 2.0, 50.0);
        assert_eq!(curve.p1.x, 100.0);
    }

    #[test]
    fn test_short_link_collapses_to_segment() {
        let curve = LinkCurve::between(Point::new(0.0, 0.0), Point::new(5.0, 0.0), 1.0, 50.0);
        assert_eq!(curve.p1, curve.p0);
        assert_eq!(curve.p2, curve.p3);
    }

    #[test]
    fn test_eval_endpoints() {
        let curve = LinkCurve::between(Point::new(10.0, 20.0), Point::new(100.0, 80.0), 1.0, 50.0);
        let start = curve.eval(0.0);
        let end = curve.eval(1.0);
        assert!((start.x - 10.0).abs() < 0.001 && (start.y - 20.0).abs() < 0.001);
        assert!((end.x - 100.0).abs() < 0.001 && (end.y - 80.0).abs() < 0.001);
    }

    #[test]
    fn test_distance_on_and_off_curve() {
        let curve = horizontal();
        assert!(curve.distance_to(Point::new(50.0, 0.0), 20) < 0.5);
        let far = curve.distance_to(Point::new(50.0, 30.0), 20);
        assert!((far - 30.0).abs() < 0.5);
    }

    #[test]
    fn test_zero_samples_uses_default() {
        let curve = horizontal();
        let p = Point::new(30.0, 7.0);
        assert_eq!(curve.distance_to(p, 0), curve.distance_to(p, 20));
    }

    #[test]
    fn test_degenerate_curve_distance_is_point_distance() {
        let p = Point::new(5.0, 5.0);
        let curve = LinkCurve { p0: p, p1: p, p2: p, p3: p };
        assert!((curve.distance_to(Point::new(8.0, 9.0), 4) - 5.0).abs() < 0.001);
    }
}
