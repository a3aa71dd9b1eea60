use log::{debug, trace};

use crate::clip::squared_bounds;
use crate::dcel::{Dcel, VoronoiDiagram};
use crate::geom::BOX_PADDING;
use crate::point::Site;

/// Builds the Delaunay DCEL as the straight-line dual of a consolidated
/// Voronoi diagram: one vertex per site, one face per interior Voronoi
/// vertex plus the unbounded face, one edge per interior Voronoi edge.
pub fn build_dual(diagram: &VoronoiDiagram) -> Dcel {
    let voronoi = &diagram.dcel;
    assert!(voronoi.consolidated, "dual construction needs a consolidated Voronoi DCEL");
    assert!(!voronoi.faces.is_empty());

    let mut dual = Dcel::new(voronoi.sites.clone());

    let (bottom_left, top_right, centroid, major_axis) =
        squared_bounds(dual.sites.iter().map(|s| s.pos));
    dual.bottom_left = bottom_left;
    dual.top_right = top_right;
    dual.centroid = centroid;
    dual.major_axis = major_axis * (1.0 + 2.0 * BOX_PADDING) * 0.5;

    // one Delaunay vertex per site; vertex index == site index
    for i in 0..dual.sites.len() {
        let site = dual.sites[i];
        dual.insert_vertex(site.id, site.pos, false);
    }

    // one face per interior Voronoi vertex, labelled by a pseudo-site at
    // the circumcenter, plus the unbounded face
    let mut triangle_of: Vec<Option<usize>> = vec![None; voronoi.vertices.len()];
    for (i, v) in voronoi.vertices.iter().enumerate() {
        if v.is_boundary {
            continue;
        }
        let label = dual.num_faces() as i64 + 1;
        let face = dual.insert_face(label, Some(Site { pos: v.pos, id: label }), false);
        triangle_of[i] = Some(face);
    }
    let unbounded_face = dual.insert_face(0, None, true);

    for &e in &diagram.fwd_edges {
        let edge = &voronoi.half_edges[e];
        let twin = &voronoi.half_edges[edge.twin];

        let (Some(left_face), Some(right_face)) = (edge.face, twin.face) else {
            continue;
        };
        if left_face == right_face {
            continue;
        }
        // cells only; the outer face carries no site
        if voronoi.faces[left_face].site.is_none() || voronoi.faces[right_face].site.is_none() {
            continue;
        }

        // cell face indices and site indices coincide, which makes them
        // dual vertex indices too
        let (fwd, back) = dual.insert_edge_pair(left_face, right_face);

        let left_dual_face = if voronoi.vertices[edge.dest].is_boundary {
            unbounded_face
        } else {
            triangle_of[edge.dest].expect("interior vertex has a dual face")
        };
        let right_dual_face = if voronoi.vertices[edge.origin].is_boundary {
            unbounded_face
        } else {
            triangle_of[edge.origin].expect("interior vertex has a dual face")
        };

        dual.half_edges[fwd].face = Some(left_dual_face);
        dual.half_edges[back].face = Some(right_dual_face);
        dual.offer_face_component(left_dual_face, fwd);
        dual.offer_face_component(right_dual_face, back);

        trace!(
            "dual edge {} -> {} (faces {} / {})",
            voronoi.faces[left_face].label,
            voronoi.faces[right_face].label,
            left_dual_face,
            right_dual_face
        );
    }

    dual.consolidate();
    debug!(
        "dual graph: {} vertices, {} edges, {} faces",
        dual.num_vertices(),
        dual.num_edges(),
        dual.num_faces()
    );
    dual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{circle_center, soft_eq_pt, EPSILON};
    use crate::point::Point;
    use crate::sweep::FortuneSweeper;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn dual_of(points: &[(f64, f64)]) -> Dcel {
        let sites: Vec<Site> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(x, y, i as i64 + 1))
            .collect();
        let diagram = FortuneSweeper::new(sites).compute();
        build_dual(&diagram)
    }

    #[test]
    fn two_sites_share_one_edge() {
        let dual = dual_of(&[(-1.0, 0.0), (1.0, 0.0)]);
        assert_eq!(dual.num_vertices(), 2);
        assert_eq!(dual.num_edges(), 1);
        // no interior Voronoi vertex: just the unbounded face
        assert_eq!(dual.num_faces(), 1);
        assert!(dual.faces[0].unbounded);

        let e = &dual.half_edges[0];
        let labels = (dual.vertices[e.origin].label, dual.vertices[e.dest].label);
        assert!(labels == (1, 2) || labels == (2, 1));
    }

    #[test]
    fn three_sites_form_a_triangle() {
        let dual = dual_of(&[(0.0, 2.0), (-2.0, -1.0), (2.0, -1.0)]);
        assert_eq!(dual.num_vertices(), 3);
        assert_eq!(dual.num_edges(), 3);
        // one triangle plus the unbounded face
        assert_eq!(dual.num_faces(), 2);

        let triangle = dual
            .faces
            .iter()
            .position(|f| !f.unbounded)
            .expect("bounded triangle face");
        let cycle = dual.face_cycle(dual.faces[triangle].outer.expect("triangle has an outer"));
        assert_eq!(cycle.len(), 3);
        // the triangle face is anchored at the Voronoi vertex
        assert!(soft_eq_pt(
            dual.faces[triangle].site.expect("pseudo-site").pos,
            Point::new(0.0, -1.0 / 6.0)
        ));
    }

    #[test]
    fn grid_dual_counts() {
        let mut points = Vec::new();
        for j in [-1.0, 0.0, 1.0] {
            for i in [-1.0, 0.0, 1.0] {
                points.push((i, j));
            }
        }
        let dual = dual_of(&points);
        assert_eq!(dual.num_vertices(), 9);
        // one edge per interior Voronoi edge, one face per interior
        // Voronoi vertex plus the unbounded face
        assert_eq!(dual.num_edges(), 12);
        assert_eq!(dual.num_faces(), 5);
        // Euler
        assert_eq!(9 - 12 + 5, 2);
    }

    #[test]
    fn delaunay_triangles_have_empty_circumcircles() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<(f64, f64)> = (0..30)
            .map(|_| (rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0)))
            .collect();
        let dual = dual_of(&points);

        let mut triangles = 0;
        for (fi, face) in dual.faces.iter().enumerate() {
            if face.unbounded {
                continue;
            }
            let polygon: Vec<Point> = dual
                .face_cycle(face.outer.expect("bounded face has an outer component"))
                .into_iter()
                .map(|e| dual.vertices[dual.half_edges[e].origin].pos)
                .collect();
            if polygon.len() != 3 {
                // cocircular degeneracies leave larger dual faces
                continue;
            }
            triangles += 1;
            let center = circle_center(polygon[0], polygon[1], polygon[2])
                .expect("triangle corners are not collinear");
            let radius = center.distance_to(polygon[0]);
            for s in &dual.sites {
                assert!(
                    radius - center.distance_to(s.pos) <= EPSILON,
                    "site p{} sits inside the circumcircle of face {}",
                    s.id,
                    fi
                );
            }
        }
        assert!(triangles > 0, "random input produced no triangles");
    }

    #[test]
    fn dual_edges_match_voronoi_interior_edges() {
        let sites: Vec<Site> = [(0.0, 3.0), (-2.0, 0.0), (2.0, 0.5), (0.0, -2.5)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(x, y, i as i64 + 1))
            .collect();
        let diagram = FortuneSweeper::new(sites).compute();
        let dual = build_dual(&diagram);
        assert_eq!(dual.num_edges(), diagram.fwd_edges.len());
    }
}
