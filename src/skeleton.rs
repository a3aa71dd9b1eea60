use log::{trace, warn};

use crate::event::SiteIdx;
use crate::geom::{soft_eq_pt, EPSILON};
use crate::point::Point;

pub type PairId = usize;

/// Index into the factory's Voronoi vertex list.
pub type VertexIdx = usize;

/// One endpoint of an edge skeleton under construction.
///
/// `Proxy` marks the synthetic origin minted when a breakpoint is born at
/// a site event: a point on the split arc where the two breakpoints start
/// diverging. `ProxyVertical` is the same origin when the split arc was
/// degenerate (new site level with the old focus), where only the x is
/// known until a later event or the clipper pins down a y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairEnd {
    Real(VertexIdx),
    Proxy(Point),
    ProxyVertical(f64),
}

impl PairEnd {
    pub fn is_real(&self) -> bool {
        matches!(self, PairEnd::Real(_))
    }
}

/// A directed edge skeleton: the segment a breakpoint (or a pair of
/// breakpoints sharing a bisector) traces between the cells of its two
/// incident sites.
#[derive(Debug, Clone)]
pub struct VertexPair {
    pub v1: Option<PairEnd>,
    pub v2: Option<PairEnd>,
    pub angle: f64,
    pub site_a: SiteIdx,
    pub site_b: SiteIdx,
}

/// A Voronoi vertex accumulated during the sweep. Labels are dense and
/// 1-based; boundary vertices minted later by the clipper use their own
/// label space.
#[derive(Debug, Clone, Copy)]
pub struct FactoryVertex {
    pub label: i64,
    pub pos: Point,
}

/// Accumulates vertices and vertex pairs while the sweep runs; the
/// clipper consumes it to assemble the DCEL. Both lists keep insertion
/// order so the output is deterministic.
#[derive(Debug, Default)]
pub struct EdgeFactory {
    pub vertices: Vec<FactoryVertex>,
    pub pairs: Vec<VertexPair>,
}

impl EdgeFactory {
    pub fn new() -> Self {
        EdgeFactory::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Registers a Voronoi vertex, reusing an existing one at the same
    /// position (within tolerance). Cocircular resolutions and the
    /// site-on-breakpoint branch funnel through this to converge on a
    /// single vertex.
    pub fn offer_vertex(&mut self, pos: Point) -> VertexIdx {
        for (i, v) in self.vertices.iter().enumerate() {
            if soft_eq_pt(v.pos, pos) {
                trace!("vertex at {:?} already known as v{}", pos, v.label);
                return i;
            }
        }
        let label = self.vertices.len() as i64 + 1;
        trace!("new vertex v{} at {:?}", label, pos);
        self.vertices.push(FactoryVertex { label, pos });
        self.vertices.len() - 1
    }

    pub fn vertex(&self, idx: VertexIdx) -> FactoryVertex {
        self.vertices[idx]
    }

    /// Opens a new pair with its first endpoint and growth angle.
    pub fn new_pair(&mut self, v1: PairEnd, angle: f64, site_a: SiteIdx, site_b: SiteIdx) -> PairId {
        trace!(
            "new pair from {:?} at angle {:.4} between sites #{} and #{}",
            v1, angle, site_a, site_b
        );
        self.pairs.push(VertexPair { v1: Some(v1), v2: None, angle, site_a, site_b });
        self.pairs.len() - 1
    }

    pub fn pair(&self, id: PairId) -> &VertexPair {
        &self.pairs[id]
    }

    /// Offers a real vertex as an endpoint. The first offer after the
    /// synthetic origin closes one side; a second closes the other. A
    /// third offer happens when both breakpoints sharing the pair were
    /// already closed: it must be collinear with the segment, and it only
    /// replaces an endpoint when it extends the segment outward.
    pub fn offer_pair_vertex(&mut self, id: PairId, vertex: VertexIdx) {
        let end = PairEnd::Real(vertex);
        let (v1, v2) = {
            let p = &self.pairs[id];
            (p.v1, p.v2)
        };
        match (v1, v2) {
            (None, _) => self.pairs[id].v1 = Some(end),
            (Some(_), None) => self.pairs[id].v2 = Some(end),
            (Some(a), Some(b)) => {
                let p1 = self.end_pos(a);
                let p2 = self.end_pos(b);
                let p3 = self.vertices[vertex].pos;

                let d12 = (p2 - p1).norm();
                let d13 = (p3 - p1).norm();
                let d23 = (p3 - p2).norm();

                // same as an existing endpoint, nothing to extend
                if d13 < EPSILON || d23 < EPSILON {
                    return;
                }

                let cross = (p2 - p1).cross(p3 - p1);
                if cross.abs() > EPSILON {
                    warn!(
                        "third vertex {:?} offered to pair {} is off the segment (cross {})",
                        p3, id, cross
                    );
                }

                if d13 > d12 && d13 > d23 {
                    // order 1-2-3: the new vertex extends past v2
                    self.pairs[id].v2 = Some(end);
                } else if d23 > d12 && d23 > d13 {
                    // order 2-1-3: the new vertex extends past v1
                    self.pairs[id].v1 = Some(end);
                }
                // otherwise the new vertex lies between the endpoints
            }
        }
    }

    fn end_pos(&self, end: PairEnd) -> Point {
        match end {
            PairEnd::Real(v) => self.vertices[v].pos,
            PairEnd::Proxy(p) => p,
            PairEnd::ProxyVertical(_) => {
                unreachable!("vertical proxies never take part in three-way reconciliation")
            }
        }
    }
}
