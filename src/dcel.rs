use std::fmt::Write as _;

use log::trace;
use ordered_float::OrderedFloat;

use crate::point::{Point, Site};

/// A DCEL vertex. Real Voronoi vertices carry positive labels; vertices
/// minted on the bounding box carry the boundary flag and their own
/// label space.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub label: i64,
    pub pos: Point,
    pub incident_edge: Option<usize>,
    pub is_boundary: bool,
}

#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub origin: usize,
    pub dest: usize,
    /// atan2 of dest - origin; drives the incidence sort during
    /// consolidation.
    pub angle: f64,
    pub twin: usize,
    pub next: Option<usize>,
    pub prev: Option<usize>,
    pub face: Option<usize>,
    pub unbounded: bool,
}

#[derive(Debug, Clone)]
pub struct Face {
    pub label: i64,
    /// The defining site for Voronoi cells; the circumcenter pseudo-site
    /// for Delaunay triangles; nothing for the outer faces.
    pub site: Option<Site>,
    pub outer: Option<usize>,
    pub inner: Option<usize>,
    pub unbounded: bool,
}

/// Index-based doubly connected edge list. Handles are positions in the
/// three vectors, so the cyclic twin/next/prev structure needs no
/// ownership juggling.
#[derive(Debug)]
pub struct Dcel {
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,
    pub sites: Vec<Site>,

    pub bottom_left: Point,
    pub top_right: Point,
    pub centroid: Point,
    pub major_axis: f64,

    pub consolidated: bool,
}

/// A computed Voronoi diagram: the DCEL plus the forward half-edge of
/// every interior edge, which is what the dual builder walks.
#[derive(Debug)]
pub struct VoronoiDiagram {
    pub dcel: Dcel,
    pub fwd_edges: Vec<usize>,
}

impl Dcel {
    pub fn new(sites: Vec<Site>) -> Self {
        Dcel {
            vertices: Vec::new(),
            half_edges: Vec::new(),
            faces: Vec::new(),
            sites,
            bottom_left: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            top_right: Point::new(f64::INFINITY, f64::INFINITY),
            centroid: Point::new(0.0, 0.0),
            major_axis: f64::INFINITY,
            consolidated: false,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    pub fn num_edges(&self) -> usize {
        self.half_edges.len() / 2
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Rendering scale helpers: world coordinates mapped so the diagram
    /// spans roughly [-1, 1] around its centroid.
    pub fn centered_x(&self, x: f64) -> f64 {
        (x - self.centroid.x()) / self.major_axis
    }

    pub fn centered_y(&self, y: f64) -> f64 {
        (y - self.centroid.y()) / self.major_axis
    }

    pub fn insert_vertex(&mut self, label: i64, pos: Point, is_boundary: bool) -> usize {
        self.vertices.push(Vertex { label, pos, incident_edge: None, is_boundary });
        self.vertices.len() - 1
    }

    pub fn insert_face(&mut self, label: i64, site: Option<Site>, unbounded: bool) -> usize {
        self.faces.push(Face { label, site, outer: None, inner: None, unbounded });
        self.faces.len() - 1
    }

    /// Inserts a half-edge and its twin, bound together, with angles from
    /// the endpoint positions. Edges touching the boundary are flagged
    /// unbounded.
    pub fn insert_edge_pair(&mut self, v1: usize, v2: usize) -> (usize, usize) {
        let unbounded = self.vertices[v1].is_boundary || self.vertices[v2].is_boundary;
        let p1 = self.vertices[v1].pos;
        let p2 = self.vertices[v2].pos;
        let fwd = self.half_edges.len();
        let twin = fwd + 1;
        self.half_edges.push(HalfEdge {
            origin: v1,
            dest: v2,
            angle: (p2.y() - p1.y()).atan2(p2.x() - p1.x()),
            twin,
            next: None,
            prev: None,
            face: None,
            unbounded,
        });
        self.half_edges.push(HalfEdge {
            origin: v2,
            dest: v1,
            angle: (p1.y() - p2.y()).atan2(p1.x() - p2.x()),
            twin: fwd,
            next: None,
            prev: None,
            face: None,
            unbounded,
        });
        (fwd, twin)
    }

    /// A face keeps the last bounded component it was offered in `outer`;
    /// the first unbounded component flips it to unbounded and moves the
    /// component to `inner`.
    pub fn offer_face_component(&mut self, face: usize, edge: usize) {
        let unbounded_edge = self.half_edges[edge].unbounded;
        let f = &mut self.faces[face];
        if unbounded_edge {
            f.unbounded = true;
            f.outer = None;
            f.inner = Some(edge);
        } else if !f.unbounded {
            f.outer = Some(edge);
        } else {
            f.inner = Some(edge);
        }
    }

    fn chain_next(&mut self, edge: usize, next: usize) {
        self.half_edges[edge].next = Some(next);
        self.half_edges[next].prev = Some(edge);
    }

    /// Threads prev/next around every vertex: incident half-edges are
    /// sorted by angle, each one's twin chains to its angular
    /// predecessor, and the vertex adopts the largest-angle edge as its
    /// incident edge. Degree-one vertices close on themselves through
    /// the twin.
    pub fn consolidate(&mut self) {
        let mut incidence: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for (i, e) in self.half_edges.iter().enumerate() {
            incidence[e.origin].push(i);
        }

        for (v, mut edges) in incidence.into_iter().enumerate() {
            if edges.is_empty() {
                continue;
            }
            edges.sort_by_key(|&e| OrderedFloat(self.half_edges[e].angle));

            if edges.len() == 1 {
                let e = edges[0];
                self.vertices[v].incident_edge = Some(e);
                let twin = self.half_edges[e].twin;
                self.chain_next(twin, e);
                continue;
            }

            let last = *edges.last().expect("non-empty incidence set");
            self.vertices[v].incident_edge = Some(last);
            let mut prev_edge = last;
            for &e in &edges {
                let twin = self.half_edges[e].twin;
                self.chain_next(twin, prev_edge);
                prev_edge = e;
            }
        }

        self.consolidated = true;
        trace!(
            "consolidated DCEL: {} vertices, {} half-edges, {} faces",
            self.num_vertices(),
            self.num_half_edges(),
            self.num_faces()
        );
    }

    /// The cycle of half-edge indices reached by following `next` from
    /// `start`. Panics if the cycle does not close within the number of
    /// half-edges, which would mean consolidation left a broken chain.
    pub fn face_cycle(&self, start: usize) -> Vec<usize> {
        let mut cycle = vec![start];
        let mut current = start;
        loop {
            current = self.half_edges[current]
                .next
                .unwrap_or_else(|| panic!("half-edge {} has no next after consolidation", current));
            if current == start {
                return cycle;
            }
            cycle.push(current);
            assert!(
                cycle.len() <= self.half_edges.len(),
                "face cycle starting at half-edge {} does not close",
                start
            );
        }
    }

    /// The boundary polygon of a face, as origin points of its component
    /// cycle.
    pub fn face_polygon(&self, face: usize) -> Vec<Point> {
        let f = &self.faces[face];
        let start = match f.outer.or(f.inner) {
            Some(e) => e,
            None => return Vec::new(),
        };
        self.face_cycle(start)
            .into_iter()
            .map(|e| self.vertices[self.half_edges[e].origin].pos)
            .collect()
    }

    /// The line segments of the diagram, one per edge, for rendering.
    pub fn line_segments(&self) -> Vec<[Point; 2]> {
        let mut result = Vec::with_capacity(self.num_edges());
        for (i, e) in self.half_edges.iter().enumerate() {
            if i < e.twin {
                result.push([self.vertices[e.origin].pos, self.vertices[e.dest].pos]);
            }
        }
        result
    }

    fn vertex_name(&self, v: usize) -> String {
        let vert = &self.vertices[v];
        if vert.is_boundary {
            format!("b{}", vert.label)
        } else {
            format!("v{}", vert.label)
        }
    }

    fn edge_name(&self, e: usize) -> String {
        let he = &self.half_edges[e];
        let name_of = |v: usize| {
            let vert = &self.vertices[v];
            if vert.is_boundary {
                format!("b{}", vert.label)
            } else {
                vert.label.to_string()
            }
        };
        format!("e{},{}", name_of(he.origin), name_of(he.dest))
    }

    fn opt_edge_name(&self, e: Option<usize>) -> String {
        match e {
            Some(e) => self.edge_name(e),
            None => "nil".to_string(),
        }
    }

    /// Deterministic line-oriented dump of a Voronoi DCEL: a block of
    /// vertices, a block of cells, a block of half-edges.
    pub fn dump_voronoi(&self) -> String {
        let mut out = String::new();

        for (i, v) in self.vertices.iter().enumerate() {
            let _ = writeln!(
                out,
                "{} ({:.6}, {:.6}) {}",
                self.vertex_name(i),
                v.pos.x(),
                v.pos.y(),
                self.opt_edge_name(v.incident_edge)
            );
        }

        let _ = writeln!(out);
        for f in &self.faces {
            let _ = writeln!(
                out,
                "c{} {} {}",
                f.label,
                self.opt_edge_name(f.outer),
                self.opt_edge_name(f.inner)
            );
        }

        let _ = writeln!(out);
        for (i, e) in self.half_edges.iter().enumerate() {
            let face = match e.face {
                Some(f) => format!("c{}", self.faces[f].label),
                None => "nil".to_string(),
            };
            let _ = writeln!(
                out,
                "{} {} {} {} {} {}",
                self.edge_name(i),
                self.vertex_name(e.origin),
                self.edge_name(e.twin),
                face,
                self.opt_edge_name(e.next),
                self.opt_edge_name(e.prev)
            );
        }

        out
    }

    fn delaunay_edge_name(&self, e: usize) -> String {
        let he = &self.half_edges[e];
        format!(
            "d{},{}",
            self.vertices[he.origin].label, self.vertices[he.dest].label
        )
    }

    fn delaunay_face_name(&self, f: usize) -> String {
        let face = &self.faces[f];
        if face.unbounded {
            "uf".to_string()
        } else {
            format!("t{}", face.label)
        }
    }

    /// Deterministic dump of a Delaunay DCEL: `p` vertices, `t`/`uf`
    /// faces, `d` half-edges.
    pub fn dump_delaunay(&self) -> String {
        let mut out = String::new();

        for v in &self.vertices {
            let edge = match v.incident_edge {
                Some(e) => self.delaunay_edge_name(e),
                None => "nil".to_string(),
            };
            let _ = writeln!(out, "p{} ({:.6}, {:.6}) {}", v.label, v.pos.x(), v.pos.y(), edge);
        }

        let _ = writeln!(out);
        for (i, f) in self.faces.iter().enumerate() {
            let outer = match f.outer {
                Some(e) => self.delaunay_edge_name(e),
                None => "nil".to_string(),
            };
            let inner = match f.inner {
                Some(e) => self.delaunay_edge_name(e),
                None => "nil".to_string(),
            };
            let _ = writeln!(out, "{} {} {}", self.delaunay_face_name(i), outer, inner);
        }

        let _ = writeln!(out);
        for (i, e) in self.half_edges.iter().enumerate() {
            let face = match e.face {
                Some(f) => self.delaunay_face_name(f),
                None => "nil".to_string(),
            };
            let next = match e.next {
                Some(n) => self.delaunay_edge_name(n),
                None => "nil".to_string(),
            };
            let prev = match e.prev {
                Some(p) => self.delaunay_edge_name(p),
                None => "nil".to_string(),
            };
            let _ = writeln!(
                out,
                "{} p{} {} {} {} {}",
                self.delaunay_edge_name(i),
                self.vertices[e.origin].label,
                self.delaunay_edge_name(e.twin),
                face,
                next,
                prev
            );
        }

        out
    }
}
