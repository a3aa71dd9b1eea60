use crate::point::Point;

/// Tolerance used by every geometric predicate in the crate.
pub const EPSILON: f64 = 1e-7;

/// Padding factor applied to the diagram bounding box. Aesthetics only.
pub const BOX_PADDING: f64 = 0.362160297;

pub fn soft_eq(x: f64, y: f64) -> bool {
    (x - y).abs() < EPSILON
}

pub fn soft_eq_pt(a: Point, b: Point) -> bool {
    (a.x() - b.x()).abs() < EPSILON && (a.y() - b.y()).abs() < EPSILON
}

/// Signed doubled area of the triangle `a b c`. Negative means the points
/// run clockwise.
pub fn determinant_test(a: Point, b: Point, c: Point) -> f64 {
    a.x() * (b.y() - c.y()) + b.x() * (c.y() - a.y()) + c.x() * (a.y() - b.y())
}

/// Center of the circle through three points, or `None` when they are
/// collinear within tolerance.
pub fn circle_center(a: Point, b: Point, c: Point) -> Option<Point> {
    let det = 2.0 * determinant_test(a, b, c);
    if det.abs() < EPSILON {
        return None;
    }

    let sq = |p: Point| p.x() * p.x() + p.y() * p.y();
    let ux = (sq(a) * (b.y() - c.y()) + sq(b) * (c.y() - a.y()) + sq(c) * (a.y() - b.y())) / det;
    let uy = (sq(a) * (c.x() - b.x()) + sq(b) * (a.x() - c.x()) + sq(c) * (b.x() - a.x())) / det;

    Some(Point::new(ux, uy))
}

/// Value at `x` of the parabola with the given focus and horizontal
/// directrix. Not finite when the focus sits on the directrix.
pub fn parabola_y(x: f64, focus: Point, directrix: f64) -> f64 {
    let dx = x - focus.x();
    (dx * dx + focus.y() * focus.y() - directrix * directrix) / (2.0 * (focus.y() - directrix))
}

/// Slope of the same parabola at `x`; `+inf` when the parabola is
/// degenerate (focus on the directrix).
pub fn parabola_gradient(x: f64, focus: Point, directrix: f64) -> f64 {
    let dy = x - focus.x();
    let dx = focus.y() - directrix;

    if dx == 0.0 { f64::INFINITY } else { dy / dx }
}

/// X coordinate of the intersection of two parabolas sharing a directrix,
/// taking the branch that separates `left` (on the left) from `right`.
///
/// Tie-breaks: foci at the same height meet at their x midpoint; a focus
/// on the directrix pins the intersection to that focus' x; a vanishing
/// discriminant yields NaN, which callers replace with the x midpoint.
pub fn breakpoint_x(left: Point, right: Point, directrix: f64) -> f64 {
    let (a, b) = (left.x(), left.y());
    let (u, v) = (right.x(), right.y());
    let d = directrix;

    if soft_eq(b, v) {
        return (a + u) * 0.5;
    }
    if soft_eq(v, d) {
        return u;
    }
    if soft_eq(b, d) {
        return a;
    }

    let discriminant = (d - b) * (d - v) * ((a - u) * (a - u) + (b - v) * (b - v));
    if discriminant < EPSILON {
        return f64::NAN;
    }
    (a * d - a * v + b * u - d * u - discriminant.sqrt()) / (b - v)
}

/// Slope of the perpendicular bisector of the segment `l r`; `+inf` when
/// the bisector is vertical.
pub fn bisector_slope(l: Point, r: Point) -> f64 {
    let dy = r.x() - l.x();
    let dx = l.y() - r.y();

    if dx == 0.0 { f64::INFINITY } else { dy / dx }
}

/// Angle of the perpendicular bisector of `l r`, normalised into
/// `(-PI, 0]` so the direction points down the sweep.
pub fn downward_bisector_angle(l: Point, r: Point) -> f64 {
    let angle = bisector_slope(l, r).atan();
    if angle > 0.0 { angle - std::f64::consts::PI } else { angle }
}

/// Nearest forward intersection of the ray from `pos` at `angle` with the
/// axis-aligned box. `pos` must lie inside or on the box; returns `None`
/// only when that precondition is broken.
pub fn ray_box_intersection(pos: Point, angle: f64, bottom_left: Point, top_right: Point) -> Option<Point> {
    let cos_theta = angle.cos();
    let sin_theta = angle.sin();

    let mut intersections: Vec<Point> = Vec::new();

    // Vertical boundaries
    if cos_theta != 0.0 {
        let t1 = (bottom_left.x() - pos.x()) / cos_theta;
        let y1 = pos.y() + t1 * sin_theta;
        if t1 >= 0.0 && y1 >= bottom_left.y() && y1 <= top_right.y() {
            intersections.push(Point::new(bottom_left.x(), y1));
        }

        let t2 = (top_right.x() - pos.x()) / cos_theta;
        let y2 = pos.y() + t2 * sin_theta;
        if t2 >= 0.0 && y2 >= bottom_left.y() && y2 <= top_right.y() {
            intersections.push(Point::new(top_right.x(), y2));
        }
    }

    // Horizontal boundaries
    if sin_theta != 0.0 {
        let t3 = (bottom_left.y() - pos.y()) / sin_theta;
        let x3 = pos.x() + t3 * cos_theta;
        if t3 >= 0.0 && x3 >= bottom_left.x() && x3 <= top_right.x() {
            intersections.push(Point::new(x3, bottom_left.y()));
        }

        let t4 = (top_right.y() - pos.y()) / sin_theta;
        let x4 = pos.x() + t4 * cos_theta;
        if t4 >= 0.0 && x4 >= bottom_left.x() && x4 <= top_right.x() {
            intersections.push(Point::new(x4, top_right.y()));
        }
    }

    intersections
        .into_iter()
        .min_by(|p, q| {
            let dp = p.distance_to(pos);
            let dq = q.distance_to(pos);
            dp.partial_cmp(&dq).unwrap_or(std::cmp::Ordering::Equal)
        })
}

pub fn normalize_radians(angle: f64) -> f64 {
    use std::f64::consts::PI;
    let mut a = (angle + PI) % (2.0 * PI);
    if a <= 0.0 {
        a += 2.0 * PI;
    }
    a - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_circle_center() {
        let c = circle_center(Point::new(-1.0, 0.0), Point::new(0.0, 1.0), Point::new(1.0, 0.0));
        assert_eq!(c.unwrap(), Point::new(0.0, 0.0));
    }

    #[test]
    fn degenerate_circle() {
        let c = circle_center(Point::new(-1.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 0.0));
        assert_eq!(c, None);
    }

    #[test]
    fn determinant_orientation() {
        // counter-clockwise positive, clockwise negative
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        let c = Point::new(0.0, 1.0);
        assert!(determinant_test(a, b, c) > 0.0);
        assert!(determinant_test(a, c, b) < 0.0);
    }

    #[test]
    fn parabola_vertex_and_symmetry() {
        let focus = Point::new(0.0, 1.0);
        // Halfway between focus and directrix at the axis of symmetry
        assert!(soft_eq(parabola_y(0.0, focus, -1.0), 0.0));
        assert!(soft_eq(
            parabola_y(2.0, focus, -1.0),
            parabola_y(-2.0, focus, -1.0)
        ));
        // The parabola point is equidistant from focus and directrix
        let y = parabola_y(3.0, focus, -1.0);
        let p = Point::new(3.0, y);
        assert!(soft_eq(p.distance_to(focus), y - -1.0));
    }

    #[test]
    fn breakpoint_between_equal_height_foci() {
        let l = Point::new(-1.0, 0.0);
        let r = Point::new(1.0, 0.0);
        assert!(soft_eq(breakpoint_x(l, r, -1.0), 0.0));
    }

    #[test]
    fn breakpoint_focus_on_directrix() {
        let l = Point::new(0.0, 1.0);
        let r = Point::new(2.0, 0.0);
        // right focus sits on the directrix: breakpoint pinned to its x
        assert!(soft_eq(breakpoint_x(l, r, 0.0), 2.0));
        // mirrored
        assert!(soft_eq(breakpoint_x(r, l, 0.0), 2.0));
    }

    #[test]
    fn breakpoint_lies_on_both_parabolas() {
        let l = Point::new(-1.0, 2.0);
        let r = Point::new(2.0, 1.0);
        let d = -1.0;
        let x = breakpoint_x(l, r, d);
        assert!(soft_eq(parabola_y(x, l, d), parabola_y(x, r, d)));
    }

    #[test]
    fn bisector_slopes() {
        assert!(bisector_slope(Point::new(-1.0, 0.0), Point::new(1.0, 0.0)).is_infinite());
        assert!(soft_eq(
            bisector_slope(Point::new(0.0, -1.0), Point::new(0.0, 1.0)),
            0.0
        ));
        // perpendicular to a 45-degree segment
        assert!(soft_eq(
            bisector_slope(Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
            -1.0
        ));
    }

    #[test]
    fn downward_angles_point_down() {
        let a = downward_bisector_angle(Point::new(-1.0, 0.0), Point::new(1.0, 0.0));
        assert!(soft_eq(a, -std::f64::consts::FRAC_PI_2));
        let b = downward_bisector_angle(Point::new(-1.0, 0.0), Point::new(0.0, -4.0));
        assert!(b <= 0.0 && b > -std::f64::consts::PI);
    }

    #[test]
    fn ray_box_hits_nearest_wall() {
        let bl = Point::new(-1.0, -1.0);
        let tr = Point::new(1.0, 1.0);
        let hit = ray_box_intersection(Point::new(0.0, 0.0), 0.0, bl, tr).unwrap();
        assert!(soft_eq_pt(hit, Point::new(1.0, 0.0)));

        let hit = ray_box_intersection(Point::new(0.5, 0.0), std::f64::consts::PI, bl, tr).unwrap();
        assert!(soft_eq_pt(hit, Point::new(-1.0, 0.0)));

        let hit = ray_box_intersection(
            Point::new(0.0, 0.0),
            std::f64::consts::FRAC_PI_2,
            bl,
            tr,
        )
        .unwrap();
        assert!(soft_eq_pt(hit, Point::new(0.0, 1.0)));
    }

    #[test]
    fn normalize_radians_range() {
        use std::f64::consts::PI;
        assert!(soft_eq(normalize_radians(3.0 * PI / 2.0), -PI / 2.0));
        assert!(soft_eq(normalize_radians(-3.0 * PI / 2.0), PI / 2.0));
        assert!(soft_eq(normalize_radians(0.25), 0.25));
    }
}
