use std::f64::consts::{FRAC_PI_2, PI};

use log::{debug, trace};
use ordered_float::OrderedFloat;

use crate::dcel::{Dcel, VoronoiDiagram};
use crate::geom::{ray_box_intersection, soft_eq, soft_eq_pt, BOX_PADDING, EPSILON};
use crate::point::{Point, Site};
use crate::skeleton::{EdgeFactory, PairEnd};

/// Tight bounds of a point set, squared up around the centroid.
/// Returns (bottom-left, top-right, centroid, major axis) before padding.
pub(crate) fn squared_bounds<I>(points: I) -> (Point, Point, Point, f64)
where
    I: IntoIterator<Item = Point>,
{
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x());
        min_y = min_y.min(p.y());
        max_x = max_x.max(p.x());
        max_y = max_y.max(p.y());
    }

    let mut major_axis = (max_x - min_x).max(max_y - min_y);
    if major_axis < EPSILON {
        // a lone site (or a fully degenerate set) still needs a box
        major_axis = 1.0;
    }

    let centroid = Point::new((max_x + min_x) * 0.5, (max_y + min_y) * 0.5);
    let half = Point::new(major_axis, major_axis) * 0.5;
    (centroid - half, centroid + half, centroid, major_axis)
}

/// Position of a boundary point along the box perimeter, counter-clockwise
/// from the bottom-left corner. Used to close the boundary off in order.
fn perimeter_t(p: Point, bottom_left: Point, top_right: Point) -> f64 {
    let w = top_right.x() - bottom_left.x();
    let h = top_right.y() - bottom_left.y();
    if soft_eq(p.y(), bottom_left.y()) {
        p.x() - bottom_left.x()
    } else if soft_eq(p.x(), top_right.x()) {
        w + (p.y() - bottom_left.y())
    } else if soft_eq(p.y(), top_right.y()) {
        w + h + (top_right.x() - p.x())
    } else if soft_eq(p.x(), bottom_left.x()) {
        w + h + w + (top_right.y() - p.y())
    } else {
        panic!("boundary vertex {:?} lies off the bounding box", p);
    }
}

struct Clipper {
    dcel: Dcel,
    bottom_left: Point,
    top_right: Point,
    boundary_labels: i64,
    fwd_edges: Vec<usize>,
}

impl Clipper {
    /// A boundary vertex at `pos`, reusing any existing boundary vertex
    /// there (the four corners included).
    fn boundary_vertex_at(&mut self, pos: Point) -> usize {
        for (i, v) in self.dcel.vertices.iter().enumerate() {
            if v.is_boundary && soft_eq_pt(v.pos, pos) {
                return i;
            }
        }
        self.boundary_labels += 1;
        self.dcel.insert_vertex(self.boundary_labels, pos, true)
    }

    /// Boundary vertex where the ray from `pos` at `angle` leaves the box.
    fn boundary_hit(&mut self, pos: Point, angle: f64) -> usize {
        let hit = ray_box_intersection(pos, angle, self.bottom_left, self.top_right)
            .unwrap_or_else(|| {
                panic!(
                    "ray from {:?} at {:.4} rad does not reach the bounding box",
                    pos, angle
                )
            });
        self.boundary_vertex_at(hit)
    }
}

/// Consumes the factory the sweep filled in and assembles the truncated
/// Voronoi DCEL: bounding box, ray clipping, cell assignment, boundary
/// closure, consolidation.
pub fn build_voronoi_dcel(sites: Vec<Site>, factory: EdgeFactory) -> VoronoiDiagram {
    let (bottom_left, top_right, centroid, major_axis) = squared_bounds(
        sites
            .iter()
            .map(|s| s.pos)
            .chain(factory.vertices.iter().map(|v| v.pos)),
    );

    let padding = Point::new(major_axis, major_axis) * BOX_PADDING;
    let bottom_left = bottom_left - padding;
    let top_right = top_right + padding;
    debug!(
        "clipping into box {:?} .. {:?} ({} vertices, {} pairs)",
        bottom_left,
        top_right,
        factory.vertices.len(),
        factory.pairs.len()
    );

    let mut dcel = Dcel::new(sites);

    // one cell per site, in site order, plus the outer face
    for i in 0..dcel.sites.len() {
        let site = dcel.sites[i];
        dcel.insert_face(site.id, Some(site), false);
    }
    let outer_face = dcel.insert_face(0, None, true);

    // real Voronoi vertices keep their factory order and labels
    for v in &factory.vertices {
        dcel.insert_vertex(v.label, v.pos, false);
    }

    dcel.bottom_left = bottom_left;
    dcel.top_right = top_right;
    dcel.centroid = centroid;
    dcel.major_axis = major_axis * (1.0 + 2.0 * BOX_PADDING) * 0.5;

    let mut clipper = Clipper {
        dcel,
        bottom_left,
        top_right,
        boundary_labels: 0,
        fwd_edges: Vec::new(),
    };

    // the four corners, counter-clockwise from bottom-left
    clipper.boundary_vertex_at(bottom_left);
    clipper.boundary_vertex_at(Point::new(top_right.x(), bottom_left.y()));
    clipper.boundary_vertex_at(top_right);
    clipper.boundary_vertex_at(Point::new(bottom_left.x(), top_right.y()));

    // factory vertex indices and dcel vertex indices coincide: the
    // factory vertices were inserted first into an empty vertex vector

    for pair in &factory.pairs {
        let (v1, v2) = (pair.v1, pair.v2);
        let angle = pair.angle;

        let Some(v1) = v1 else {
            debug!("pair between #{} and #{} never opened, dropping", pair.site_a, pair.site_b);
            continue;
        };

        if let (PairEnd::Real(a), Some(PairEnd::Real(b))) = (v1, v2) {
            if a == b {
                trace!("pair collapsed to vertex v{}, dropping", factory.vertices[a].label);
                continue;
            }
        }

        let (va, vb) = match (v1, v2) {
            // fully unbounded bisector, never closed on either side
            (PairEnd::ProxyVertical(x), None) => {
                let a = clipper.boundary_vertex_at(Point::new(x, top_right.y()));
                let b = clipper.boundary_vertex_at(Point::new(x, bottom_left.y()));
                (a, b)
            }
            (PairEnd::Proxy(p), None) => {
                if soft_eq(angle.abs(), FRAC_PI_2) {
                    let a = clipper.boundary_vertex_at(Point::new(p.x(), top_right.y()));
                    let b = clipper.boundary_vertex_at(Point::new(p.x(), bottom_left.y()));
                    (a, b)
                } else {
                    let a = clipper.boundary_hit(p, angle + PI);
                    let b = clipper.boundary_hit(p, angle);
                    (a, b)
                }
            }
            // one side closed at a real vertex, the proxy side still open:
            // cast away from wherever the proxy started
            (PairEnd::Proxy(p), Some(PairEnd::Real(v2))) => {
                let v2_pos = clipper.dcel.vertices[v2].pos;
                let ray_angle = if p.x() < v2_pos.x() { angle + PI } else { angle };
                let a = clipper.boundary_hit(v2_pos, ray_angle);
                (a, v2)
            }
            (PairEnd::ProxyVertical(x), Some(PairEnd::Real(v2))) => {
                let v2_pos = clipper.dcel.vertices[v2].pos;
                let ray_angle = if x < v2_pos.x() { angle + PI } else { angle };
                let a = clipper.boundary_hit(v2_pos, ray_angle);
                (a, v2)
            }
            // open-ended growth from a real vertex
            (PairEnd::Real(v1), None) => {
                let v1_pos = clipper.dcel.vertices[v1].pos;
                let b = clipper.boundary_hit(v1_pos, angle);
                (v1, b)
            }
            (PairEnd::Real(v1), Some(PairEnd::Real(v2))) => (v1, v2),
            (_, Some(end)) => {
                panic!("pair closed with a synthetic endpoint {:?}", end);
            }
        };

        let (fwd, twin) = clipper.dcel.insert_edge_pair(va, vb);

        // the two incident sites sit on opposite sides of the edge; the
        // cross product sign against the edge direction says which
        let origin = clipper.dcel.vertices[va].pos;
        let dir = clipper.dcel.vertices[vb].pos - origin;
        let dir_a = clipper.dcel.sites[pair.site_a].pos - origin;
        let dir_b = clipper.dcel.sites[pair.site_b].pos - origin;

        let (left_cell, right_cell) = if dir.cross(dir_a) > 0.0 {
            debug_assert!(dir.cross(dir_b) <= EPSILON);
            (pair.site_a, pair.site_b)
        } else {
            debug_assert!(dir.cross(dir_a) <= EPSILON);
            (pair.site_b, pair.site_a)
        };

        clipper.dcel.half_edges[fwd].face = Some(left_cell);
        clipper.dcel.half_edges[twin].face = Some(right_cell);
        clipper.dcel.offer_face_component(left_cell, fwd);
        clipper.dcel.offer_face_component(right_cell, twin);
        clipper.fwd_edges.push(fwd);
    }

    close_boundary(&mut clipper, outer_face);

    let Clipper { mut dcel, fwd_edges, .. } = clipper;
    dcel.consolidate();
    VoronoiDiagram { dcel, fwd_edges }
}

/// Joins consecutive boundary vertices around the box perimeter so every
/// cell boundary closes into a cycle; the inner side of each stretch
/// belongs to the nearest site's cell, the outer side to the outer face.
fn close_boundary(clipper: &mut Clipper, outer_face: usize) {
    let mut boundary: Vec<(usize, f64)> = clipper
        .dcel
        .vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_boundary)
        .map(|(i, v)| (i, perimeter_t(v.pos, clipper.bottom_left, clipper.top_right)))
        .collect();
    boundary.sort_by_key(|&(_, t)| OrderedFloat(t));

    let n = boundary.len();
    for k in 0..n {
        let (a, _) = boundary[k];
        let (b, _) = boundary[(k + 1) % n];
        if a == b {
            continue;
        }

        let (fwd, twin) = clipper.dcel.insert_edge_pair(a, b);

        let midpoint = (clipper.dcel.vertices[a].pos + clipper.dcel.vertices[b].pos) * 0.5;
        let mut cell = 0;
        let mut best = f64::INFINITY;
        for (i, s) in clipper.dcel.sites.iter().enumerate() {
            let d = s.pos.distance_to(midpoint);
            if d < best {
                best = d;
                cell = i;
            }
        }

        clipper.dcel.half_edges[fwd].face = Some(cell);
        clipper.dcel.half_edges[twin].face = Some(outer_face);
        clipper.dcel.offer_face_component(cell, fwd);
        clipper.dcel.offer_face_component(outer_face, twin);
    }
}
