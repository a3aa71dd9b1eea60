use log::{debug, trace};

use crate::beachline::{BeachLine, Chain, ChainValue, PendingCircle};
use crate::clip;
use crate::dcel::VoronoiDiagram;
use crate::event::{Event, EventKind, EventQueue, SiteIdx};
use crate::geom::{
    circle_center, determinant_test, downward_bisector_angle, parabola_gradient, parabola_y,
    soft_eq, soft_eq_pt, EPSILON,
};
use crate::point::{Point, Site};
use crate::skeleton::{EdgeFactory, PairEnd};
use crate::splay::NodeId;

/// Fortune's sweep over a fixed site set. One sweeper performs one
/// computation: drain the events (`step_next_event` or `compute`), then
/// the factory's accumulated skeleton is clipped into a DCEL.
pub struct FortuneSweeper {
    sites: Vec<Site>,
    sweep_y: f64,
    queue: EventQueue,
    beach: BeachLine,
    factory: EdgeFactory,
    events_handled: u64,
    /// How many site events landed exactly on a breakpoint.
    pub degenerate_site_events: u64,
}

impl FortuneSweeper {
    /// Seeds the queue with one site event per input point. Site labels
    /// must be unique and positive; coincident positions are allowed.
    pub fn new(sites: Vec<Site>) -> Self {
        assert!(!sites.is_empty(), "cannot sweep an empty site set");
        debug_assert!(sites.iter().all(|s| s.id > 0), "site labels must be positive");

        let mut queue = EventQueue::new();
        for (i, s) in sites.iter().enumerate() {
            queue.push_site(s.pos, i);
        }
        let sweep_y = queue
            .peek()
            .map(|e| e.pos.y())
            .expect("seeded queue cannot be empty");

        FortuneSweeper {
            sites,
            sweep_y,
            queue,
            beach: BeachLine::new(),
            factory: EdgeFactory::new(),
            events_handled: 0,
            degenerate_site_events: 0,
        }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn sweep_y(&self) -> f64 {
        self.sweep_y
    }

    pub fn done(&mut self) -> bool {
        self.queue.is_empty()
    }

    /// Completed skeleton segments so far, for animation.
    pub fn partial_segments(&self) -> Vec<[Point; 2]> {
        self.factory
            .pairs
            .iter()
            .filter_map(|p| match (p.v1, p.v2) {
                (Some(PairEnd::Real(a)), Some(PairEnd::Real(b))) if a != b => {
                    Some([self.factory.vertex(a).pos, self.factory.vertex(b).pos])
                }
                _ => None,
            })
            .collect()
    }

    /// Handles the next event. Returns false once the queue is drained.
    pub fn step_next_event(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        self.sweep_y = event.pos.y();
        self.events_handled += 1;
        trace!("event #{}: {:?}", self.events_handled, event);

        match event.kind {
            EventKind::Site { site } => self.handle_site_event(site),
            EventKind::Circle { .. } => self.handle_circle_event(&event),
        }
        true
    }

    /// Runs the sweep to completion and clips the result.
    pub fn compute(mut self) -> VoronoiDiagram {
        while self.step_next_event() {}
        self.finish()
    }

    /// Clips the accumulated skeleton. Call after the queue is drained.
    pub fn finish(self) -> VoronoiDiagram {
        debug!(
            "sweep finished after {} events: {} vertices, {} pairs",
            self.events_handled,
            self.factory.num_vertices(),
            self.factory.pairs.len()
        );
        clip::build_voronoi_dcel(self.sites, self.factory)
    }

    /// Keyed insert into the beach line, ordered at the current sweep
    /// position.
    fn beach_insert(&mut self, key: Chain, value: ChainValue, splay: bool) -> NodeId {
        let directrix = self.sweep_y;
        let sites = &self.sites;
        self.beach.insert(
            key,
            value,
            |a, b| a.ordering_x(sites, directrix) < b.ordering_x(sites, directrix),
            splay,
        )
    }

    fn arc_focus(&self, node: NodeId) -> SiteIdx {
        match *self.beach.key(node) {
            Chain::Arc { focus } => focus,
            Chain::Breakpoint { .. } => panic!("expected an arc node"),
        }
    }

    fn invalidate_pending(&mut self, arc_node: NodeId) {
        if let Some(pending) = self.beach.value(arc_node).circle_event {
            self.queue.invalidate(pending.id);
            self.beach.value_mut(arc_node).circle_event = None;
        }
    }

    fn handle_site_event(&mut self, site_idx: SiteIdx) {
        let pos = self.sites[site_idx].pos;
        trace!("site event for {:?}", self.sites[site_idx]);

        if self.beach.is_empty() {
            self.beach_insert(Chain::Arc { focus: site_idx }, ChainValue::arc(), true);
            trace!("first arc, beach line started");
            return;
        }

        // Find the arc directly above the new site. A breakpoint whose
        // current x coincides with the site is the degenerate branch.
        let mut cur = self.beach.root;
        let mut arc_above = None;
        while let Some(n) = cur {
            let key = *self.beach.key(n);
            if key.is_arc() {
                arc_above = Some(n);
                break;
            }
            let bx = key.ordering_x(&self.sites, self.sweep_y);
            if soft_eq(pos.x(), bx) {
                self.handle_site_on_breakpoint(site_idx, n);
                return;
            }
            cur = if pos.x() < bx {
                self.beach.node(n).left
            } else {
                self.beach.node(n).right
            };
        }
        let arc_above_node =
            arc_above.unwrap_or_else(|| panic!("site descent fell off the beach line at {:?}", pos));
        let old_focus = self.arc_focus(arc_above_node);
        trace!(
            "arc above is {}",
            Chain::Arc { focus: old_focus }.describe(&self.sites)
        );

        // the split arc's pending squeeze can no longer happen
        self.invalidate_pending(arc_above_node);

        let old_prev = self.beach.node(arc_above_node).prev;
        let old_next = self.beach.node(arc_above_node).next;
        let old_parent = self.beach.node(arc_above_node).parent;
        self.beach.remove_node(arc_above_node, false);

        let old_focus_pos = self.sites[old_focus].pos;
        let level_equal = soft_eq(old_focus_pos.y(), pos.y());

        // The two breakpoints born here diverge along one bisector, so
        // they share a single skeleton seeded with a synthetic origin on
        // the old arc.
        let proxy_y = parabola_y(pos.x(), old_focus_pos, self.sweep_y);
        let origin = if proxy_y.is_finite() {
            PairEnd::Proxy(Point::new(pos.x(), proxy_y))
        } else {
            debug_assert!(level_equal);
            PairEnd::ProxyVertical((pos.x() + old_focus_pos.x()) / 2.0)
        };
        let angle = parabola_gradient(pos.x(), old_focus_pos, self.sweep_y).atan();
        let pair = self.factory.new_pair(origin, angle, old_focus, site_idx);

        let (left_arc, right_arc) = if !level_equal {
            // standard split: left copy, breakpoint, new arc, breakpoint,
            // right copy, dropped into the hole the old arc left behind
            let left_bp = self.beach_insert(
                Chain::Breakpoint { left: old_focus, right: site_idx },
                ChainValue::breakpoint(pair),
                false,
            );
            debug_assert!(self
                .beach
                .node(left_bp)
                .parent
                .map_or(true, |p| !self.beach.key(p).is_arc()));
            let right_bp = self.beach_insert(
                Chain::Breakpoint { left: site_idx, right: old_focus },
                ChainValue::breakpoint(pair),
                false,
            );
            debug_assert_eq!(self.beach.node(left_bp).right, Some(right_bp));

            let left_arc = self.beach.alloc_detached(Chain::Arc { focus: old_focus }, ChainValue::arc());
            let new_arc = self.beach.alloc_detached(Chain::Arc { focus: site_idx }, ChainValue::arc());
            let right_arc = self.beach.alloc_detached(Chain::Arc { focus: old_focus }, ChainValue::arc());

            self.beach.set_left_child(left_bp, Some(left_arc));
            self.beach.set_left_child(right_bp, Some(new_arc));
            self.beach.set_right_child(right_bp, Some(right_arc));

            self.beach.link_prev(left_arc, old_prev);
            self.beach.link_next(left_arc, Some(left_bp));
            self.beach.link_prev(new_arc, Some(left_bp));
            self.beach.link_next(new_arc, Some(right_bp));
            self.beach.link_prev(right_arc, Some(right_bp));
            self.beach.link_next(right_arc, old_next);

            debug_assert_eq!(self.beach.node(left_bp).parent, old_parent);
            (left_arc, right_arc)
        } else {
            // the new site is level with the old focus: the parabola
            // above has zero height, so only one breakpoint separates
            // the two arcs, ordered by focus x
            let new_is_left = pos.x() < old_focus_pos.x();
            let (left_focus, right_focus) = if new_is_left {
                (site_idx, old_focus)
            } else {
                (old_focus, site_idx)
            };
            let bp = self.beach_insert(
                Chain::Breakpoint { left: left_focus, right: right_focus },
                ChainValue::breakpoint(pair),
                false,
            );

            let left_arc = self.beach.alloc_detached(Chain::Arc { focus: left_focus }, ChainValue::arc());
            let right_arc = self.beach.alloc_detached(Chain::Arc { focus: right_focus }, ChainValue::arc());

            self.beach.set_left_child(bp, Some(left_arc));
            self.beach.set_right_child(bp, Some(right_arc));

            self.beach.link_prev(left_arc, old_prev);
            self.beach.link_next(left_arc, Some(bp));
            self.beach.link_prev(right_arc, Some(bp));
            self.beach.link_next(right_arc, old_next);
            (left_arc, right_arc)
        };

        let c1 = self.check_and_create_circle_event(left_arc);
        let c2 = self.check_and_create_circle_event(right_arc);
        self.offer_circle_event_pair(c1, c2);
    }

    /// The new site falls exactly under an existing breakpoint: a
    /// Voronoi vertex materialises right there, the breakpoint's edge
    /// ends at it, and the new arc is spliced between the two bounding
    /// arcs with two fresh breakpoints growing out of the vertex.
    fn handle_site_on_breakpoint(&mut self, site_idx: SiteIdx, bp_node: NodeId) {
        let pos = self.sites[site_idx].pos;
        self.degenerate_site_events += 1;
        debug!(
            "site {:?} lands on breakpoint {}",
            self.sites[site_idx],
            self.beach.key(bp_node).describe(&self.sites)
        );

        self.beach.splay(bp_node, None);
        let left_arc = self.beach.node(bp_node).prev.expect("breakpoint without a left arc");
        let right_arc = self.beach.node(bp_node).next.expect("breakpoint without a right arc");
        let l_focus = self.arc_focus(left_arc);
        let r_focus = self.arc_focus(right_arc);
        let l_pos = self.sites[l_focus].pos;
        let r_pos = self.sites[r_focus].pos;

        // the breakpoint's current position is equidistant from both
        // bounding foci and the new site on the directrix
        let mut vy = parabola_y(pos.x(), l_pos, self.sweep_y);
        if !vy.is_finite() {
            vy = parabola_y(pos.x(), r_pos, self.sweep_y);
        }
        let v = self.factory.offer_vertex(Point::new(pos.x(), vy));

        if let Some(pair) = self.beach.value(bp_node).edge {
            self.factory.offer_pair_vertex(pair, v);
        }

        self.invalidate_pending(left_arc);
        self.invalidate_pending(right_arc);

        let pair_l = self.factory.new_pair(
            PairEnd::Real(v),
            downward_bisector_angle(l_pos, pos),
            l_focus,
            site_idx,
        );
        let pair_r = self.factory.new_pair(
            PairEnd::Real(v),
            downward_bisector_angle(pos, r_pos),
            site_idx,
            r_focus,
        );

        let new_arc = self.beach.alloc_detached(Chain::Arc { focus: site_idx }, ChainValue::arc());
        let bp_l = self.beach.alloc_detached(
            Chain::Breakpoint { left: l_focus, right: site_idx },
            ChainValue::breakpoint(pair_l),
        );
        let bp_r = self.beach.alloc_detached(
            Chain::Breakpoint { left: site_idx, right: r_focus },
            ChainValue::breakpoint(pair_r),
        );

        // the old breakpoint was splayed to the root: replace it with
        // the two-breakpoint subtree around the new arc
        let left_subtree = self.beach.node(bp_node).left;
        let right_subtree = self.beach.node(bp_node).right;
        self.beach.set_left_child(bp_l, left_subtree);
        self.beach.set_right_child(bp_l, Some(bp_r));
        self.beach.set_left_child(bp_r, Some(new_arc));
        self.beach.set_right_child(bp_r, right_subtree);
        self.beach.replace(bp_node, Some(bp_l));

        self.beach.link_next(left_arc, Some(bp_l));
        self.beach.link_next(bp_l, Some(new_arc));
        self.beach.link_next(new_arc, Some(bp_r));
        self.beach.link_next(bp_r, Some(right_arc));

        self.beach.discard(bp_node);

        let c1 = self.check_and_create_circle_event(left_arc);
        let c2 = self.check_and_create_circle_event(right_arc);
        self.offer_circle_event_pair(c1, c2);
    }

    fn handle_circle_event(&mut self, event: &Event) {
        let EventKind::Circle { center, arc_node } = event.kind else {
            panic!("circle handler dispatched on a site event");
        };
        trace!(
            "circle event for {} at {:?}",
            self.beach.key(arc_node).describe(&self.sites),
            event.pos
        );
        debug_assert!(self.beach.key(arc_node).is_arc());

        let node = self.beach.node(arc_node);
        let (Some(mut left_bp), Some(mut right_bp)) = (node.prev, node.next) else {
            panic!("squeezed arc is missing a flanking breakpoint");
        };
        self.beach.value_mut(arc_node).circle_event = None;

        // Cocircular expansion: neighbours whose own registered circle
        // event sits at this very position vanish in the same vertex, so
        // the merge range widens past them.
        loop {
            let Some(flank) = self.beach.node(left_bp).prev else { break };
            let Some(pending) = self.beach.value(flank).circle_event else { break };
            if self.queue.is_invalidated(pending.id) || !soft_eq_pt(pending.pos, event.pos) {
                break;
            }
            trace!(
                "cocircular: {} joins the collapse",
                self.beach.key(flank).describe(&self.sites)
            );
            self.queue.invalidate(pending.id);
            self.beach.value_mut(flank).circle_event = None;
            let Some(outer_bp) = self.beach.node(flank).prev else { break };
            left_bp = outer_bp;
        }
        loop {
            let Some(flank) = self.beach.node(right_bp).next else { break };
            let Some(pending) = self.beach.value(flank).circle_event else { break };
            if self.queue.is_invalidated(pending.id) || !soft_eq_pt(pending.pos, event.pos) {
                break;
            }
            trace!(
                "cocircular: {} joins the collapse",
                self.beach.key(flank).describe(&self.sites)
            );
            self.queue.invalidate(pending.id);
            self.beach.value_mut(flank).circle_event = None;
            let Some(outer_bp) = self.beach.node(flank).next else { break };
            right_bp = outer_bp;
        }
        debug_assert_ne!(left_bp, right_bp);

        // gather everything strictly between the two mergers
        let mut vanishing_arcs = Vec::new();
        let mut vanishing_bps = vec![left_bp];
        let mut n = left_bp;
        while n != right_bp {
            let arc = self
                .beach
                .node(n)
                .next
                .expect("vanishing chain broke before the right merger");
            debug_assert!(self.beach.key(arc).is_arc());
            vanishing_arcs.push(arc);
            let bp = self
                .beach
                .node(arc)
                .next
                .expect("vanishing chain broke before the right merger");
            debug_assert!(!self.beach.key(bp).is_arc());
            vanishing_bps.push(bp);
            n = bp;
        }
        debug_assert!(!vanishing_arcs.is_empty());

        // every vanishing arc's pending event is now meaningless
        for &an in &vanishing_arcs {
            if let Some(pending) = self.beach.value(an).circle_event {
                self.queue.invalidate(pending.id);
            }
        }

        // all merging skeletons converge on one Voronoi vertex
        let v = self.factory.offer_vertex(center);
        for &bn in &vanishing_bps {
            match self.beach.value(bn).edge {
                Some(pair) => self.factory.offer_pair_vertex(pair, v),
                None => {
                    // a merger minted at a site-on-breakpoint degeneracy
                    // that never materialised its skeleton gets one now
                    let Chain::Breakpoint { left, right } = *self.beach.key(bn) else {
                        unreachable!("vanishing breakpoint list holds an arc")
                    };
                    let angle =
                        downward_bisector_angle(self.sites[left].pos, self.sites[right].pos);
                    let pair = self.factory.new_pair(PairEnd::Real(v), angle, left, right);
                    self.beach.value_mut(bn).edge = Some(pair);
                }
            }
        }

        // one merged breakpoint spans the collapsed range
        let Chain::Breakpoint { left: merged_left, .. } = *self.beach.key(left_bp) else {
            unreachable!("left merger is not a breakpoint")
        };
        let Chain::Breakpoint { right: merged_right, .. } = *self.beach.key(right_bp) else {
            unreachable!("right merger is not a breakpoint")
        };
        let angle =
            downward_bisector_angle(self.sites[merged_left].pos, self.sites[merged_right].pos);
        let pair = self.factory.new_pair(PairEnd::Real(v), angle, merged_left, merged_right);
        let merged = self.beach.alloc_detached(
            Chain::Breakpoint { left: merged_left, right: merged_right },
            ChainValue::breakpoint(pair),
        );

        let prev_arc = self.beach.node(left_bp).prev.expect("merger without a left neighbour arc");
        let next_arc = self.beach.node(right_bp).next.expect("merger without a right neighbour arc");
        self.beach.link_prev(merged, Some(prev_arc));
        self.beach.link_next(merged, Some(next_arc));

        for &an in &vanishing_arcs {
            debug_assert!(
                self.beach.node(an).left.is_none() && self.beach.node(an).right.is_none(),
                "vanishing arc is not a leaf"
            );
            self.beach.remove_node(an, false);
        }
        for &bn in &vanishing_bps[1..vanishing_bps.len() - 1] {
            self.beach.remove_node(bn, false);
        }

        // splay both mergers; the left one normally lands as the right
        // one's left child, but the other shape is brought into line
        // with a bounded splay instead of being assumed away
        self.beach.splay(left_bp, None);
        self.beach.splay(right_bp, None);
        if self.beach.node(right_bp).left != Some(left_bp) {
            self.beach.splay(left_bp, Some(right_bp));
        }
        assert_eq!(
            self.beach.node(right_bp).left,
            Some(left_bp),
            "mergers failed to collapse into one subtree"
        );
        debug_assert!(self.beach.node(left_bp).right.is_none());

        let left_subtree = self.beach.node(left_bp).left;
        let right_subtree = self.beach.node(right_bp).right;
        self.beach.set_left_child(merged, left_subtree);
        self.beach.set_right_child(merged, right_subtree);
        self.beach.replace(right_bp, Some(merged));
        self.beach.discard(left_bp);
        self.beach.discard(right_bp);

        // the surviving flanks converge against new neighbours now
        self.invalidate_pending(prev_arc);
        self.invalidate_pending(next_arc);
        let c1 = self.check_and_create_circle_event(prev_arc);
        let c2 = self.check_and_create_circle_event(next_arc);
        self.offer_circle_event_pair(c1, c2);
    }

    /// Considers the triple around an arc for a future squeeze. Rejects
    /// non-convergent or degenerate triples, events above the sweep
    /// line, and circles with another site inside them.
    fn check_and_create_circle_event(&mut self, arc_node: NodeId) -> Option<Event> {
        let node = self.beach.node(arc_node);
        let Chain::Arc { focus } = node.key else {
            return None;
        };
        let (Some(prev_bp), Some(next_bp)) = (node.prev, node.next) else {
            return None;
        };
        let Chain::Breakpoint { left: a_site, .. } = *self.beach.key(prev_bp) else {
            panic!("beach chain alternation broken left of an arc");
        };
        let Chain::Breakpoint { right: c_site, .. } = *self.beach.key(next_bp) else {
            panic!("beach chain alternation broken right of an arc");
        };

        if a_site == focus || focus == c_site || a_site == c_site {
            return None;
        }

        let a = self.sites[a_site].pos;
        let b = self.sites[focus].pos;
        let c = self.sites[c_site].pos;
        trace!(
            "considering circle through p{} p{} p{}",
            self.sites[a_site].id,
            self.sites[focus].id,
            self.sites[c_site].id
        );

        // only clockwise triples converge
        if determinant_test(a, b, c) >= 0.0 {
            return None;
        }

        let center = circle_center(a, b, c)?;
        let radius = center.distance_to(a);
        let event_y = center.y() - radius;

        // resolves above the sweep line: the squeeze already happened
        if event_y - EPSILON > self.sweep_y {
            trace!("circle bottom {:.6} is above the sweep line, discarding", event_y);
            return None;
        }

        if let Some(pending) = self.beach.value(arc_node).circle_event {
            if !self.queue.is_invalidated(pending.id) {
                if pending.pos.y() < event_y {
                    return None;
                }
                self.queue.invalidate(pending.id);
            }
        }

        // a site strictly inside the circle means the triple is blocked
        for s in &self.sites {
            if radius - center.distance_to(s.pos) > EPSILON {
                return None;
            }
        }

        let id = self.queue.new_event_id();
        let pos = Point::new(center.x(), event_y);
        self.beach.value_mut(arc_node).circle_event = Some(PendingCircle { id, pos });
        Some(Event { id, pos, kind: EventKind::Circle { center, arc_node } })
    }

    /// Queues up to two freshly minted circle events, skipping the
    /// second when it duplicates the first (same position, same focus).
    fn offer_circle_event_pair(&mut self, c1: Option<Event>, c2: Option<Event>) {
        let add2 = match (&c1, &c2) {
            (Some(a), Some(b)) => {
                let (EventKind::Circle { arc_node: na, .. }, EventKind::Circle { arc_node: nb, .. }) =
                    (&a.kind, &b.kind)
                else {
                    unreachable!("candidates are always circle events")
                };
                !soft_eq(a.pos.x(), b.pos.x())
                    || !soft_eq(a.pos.y(), b.pos.y())
                    || self.arc_focus(*na) != self.arc_focus(*nb)
            }
            _ => true,
        };
        if let Some(a) = c1 {
            self.queue.push(a);
        }
        if add2 {
            if let Some(b) = c2 {
                self.queue.push(b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcel::Dcel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn diagram_of(points: &[(f64, f64)]) -> VoronoiDiagram {
        let sites: Vec<Site> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(x, y, i as i64 + 1))
            .collect();
        FortuneSweeper::new(sites).compute()
    }

    fn interior_vertices(dcel: &Dcel) -> Vec<usize> {
        (0..dcel.vertices.len())
            .filter(|&v| !dcel.vertices[v].is_boundary)
            .collect()
    }

    fn vertex_degree(dcel: &Dcel, v: usize) -> usize {
        dcel.half_edges.iter().filter(|e| e.origin == v).count()
    }

    /// Structural invariants every diagram must satisfy: twin symmetry,
    /// mutual next/prev, closed face cycles with a consistent incident
    /// face, Euler's formula, one cell per site plus the outer face,
    /// and interior vertices strictly inside the box.
    fn check_invariants(diagram: &VoronoiDiagram) {
        let dcel = &diagram.dcel;
        let n = dcel.sites.len();

        assert_eq!(dcel.num_faces(), n + 1);
        assert_eq!(dcel.num_half_edges() % 2, 0);

        for (i, e) in dcel.half_edges.iter().enumerate() {
            let t = &dcel.half_edges[e.twin];
            assert_ne!(e.twin, i);
            assert_eq!(t.twin, i);
            assert_eq!(t.origin, e.dest);
            assert_eq!(t.dest, e.origin);

            let next = e.next.expect("edge left unthreaded");
            assert_eq!(dcel.half_edges[next].prev, Some(i));
            assert_eq!(dcel.half_edges[next].origin, e.dest);

            for &c in &dcel.face_cycle(i) {
                assert_eq!(dcel.half_edges[c].face, e.face);
            }
        }

        let v = dcel.num_vertices() as i64;
        let e = dcel.num_edges() as i64;
        let f = dcel.num_faces() as i64;
        assert_eq!(v - e + f, 2, "Euler's formula violated: V={} E={} F={}", v, e, f);

        for vert in &dcel.vertices {
            if !vert.is_boundary {
                assert!(vert.pos.x() > dcel.bottom_left.x());
                assert!(vert.pos.x() < dcel.top_right.x());
                assert!(vert.pos.y() > dcel.bottom_left.y());
                assert!(vert.pos.y() < dcel.top_right.y());
            }
        }

        // every cell's site is the nearest site to the cell's interior
        for (fi, face) in dcel.faces.iter().enumerate() {
            let Some(site) = face.site else { continue };
            let polygon = dcel.face_polygon(fi);
            assert!(!polygon.is_empty(), "cell c{} has no boundary", face.label);
            let mut cx = 0.0;
            let mut cy = 0.0;
            for p in &polygon {
                cx += p.x();
                cy += p.y();
            }
            let probe = Point::new(cx / polygon.len() as f64, cy / polygon.len() as f64);
            let own = site.pos.distance_to(probe);
            for other in &dcel.sites {
                assert!(
                    own <= other.pos.distance_to(probe) + EPSILON,
                    "cell c{} contains a point closer to p{}",
                    face.label,
                    other.id
                );
            }
        }
    }

    #[test]
    fn single_site() {
        let diagram = diagram_of(&[(0.0, 0.0)]);
        check_invariants(&diagram);
        assert_eq!(interior_vertices(&diagram.dcel).len(), 0);
        assert_eq!(diagram.dcel.num_vertices(), 4);
        assert_eq!(diagram.dcel.num_edges(), 4);
        assert!(diagram.fwd_edges.is_empty());
    }

    #[test]
    fn two_sites_vertical_bisector() {
        let diagram = diagram_of(&[(-1.0, 0.0), (1.0, 0.0)]);
        check_invariants(&diagram);
        let dcel = &diagram.dcel;

        assert_eq!(interior_vertices(dcel).len(), 0);
        assert_eq!(diagram.fwd_edges.len(), 1);
        // the bisector is the y axis, clipped to two boundary vertices
        let e = &dcel.half_edges[diagram.fwd_edges[0]];
        assert!(soft_eq(dcel.vertices[e.origin].pos.x(), 0.0));
        assert!(soft_eq(dcel.vertices[e.dest].pos.x(), 0.0));
        assert_eq!(dcel.num_faces(), 3);
    }

    #[test]
    fn three_sites_single_vertex() {
        let diagram = diagram_of(&[(0.0, 2.0), (-2.0, -1.0), (2.0, -1.0)]);
        check_invariants(&diagram);
        let dcel = &diagram.dcel;

        let interior = interior_vertices(dcel);
        assert_eq!(interior.len(), 1);
        let v = interior[0];
        // the circumcenter of the three sites
        assert!(soft_eq_pt(dcel.vertices[v].pos, Point::new(0.0, -1.0 / 6.0)));
        assert_eq!(vertex_degree(dcel, v), 3);
        assert_eq!(diagram.fwd_edges.len(), 3);
        assert_eq!(dcel.num_faces(), 4);
    }

    #[test]
    fn four_cocircular_sites() {
        let diagram = diagram_of(&[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]);
        check_invariants(&diagram);
        let dcel = &diagram.dcel;

        // one vertex of degree four at the shared circumcenter
        let interior = interior_vertices(dcel);
        assert_eq!(interior.len(), 1);
        let v = interior[0];
        assert!(soft_eq_pt(dcel.vertices[v].pos, Point::new(0.0, 0.0)));
        assert_eq!(vertex_degree(dcel, v), 4);
        assert_eq!(diagram.fwd_edges.len(), 4);
        assert_eq!(dcel.num_faces(), 5);

        // the four rays head into the four diagonal quadrants
        let mut quadrants = [false; 4];
        for &e in &diagram.fwd_edges {
            let he = &dcel.half_edges[e];
            let (a, b) = (dcel.vertices[he.origin].pos, dcel.vertices[he.dest].pos);
            let outward = if dcel.vertices[he.origin].is_boundary { a - b } else { b - a };
            let q = match (outward.x() > 0.0, outward.y() > 0.0) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            };
            quadrants[q] = true;
        }
        assert_eq!(quadrants, [true; 4]);
    }

    #[test]
    fn grid_three_by_three() {
        let mut points = Vec::new();
        for j in [-1.0, 0.0, 1.0] {
            for i in [-1.0, 0.0, 1.0] {
                points.push((i, j));
            }
        }
        let diagram = diagram_of(&points);
        check_invariants(&diagram);
        let dcel = &diagram.dcel;

        let interior = interior_vertices(dcel);
        assert_eq!(interior.len(), 4);
        for &v in &interior {
            let p = dcel.vertices[v].pos;
            assert!(soft_eq(p.x().abs(), 0.5), "vertex at {:?}", p);
            assert!(soft_eq(p.y().abs(), 0.5), "vertex at {:?}", p);
            assert_eq!(vertex_degree(dcel, v), 4);
        }
        assert_eq!(diagram.fwd_edges.len(), 12);
        assert_eq!(dcel.num_faces(), 10);
    }

    #[test]
    fn site_on_breakpoint_degeneracy() {
        // the fourth site lies exactly on the bisector of sites 2 and 3
        let exact = [(0.0, 2.0), (-1.0, 0.0), (1.0, 0.0), (0.0, -4.0)];
        let sites: Vec<Site> = exact
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Site::new(x, y, i as i64 + 1))
            .collect();
        let mut sweeper = FortuneSweeper::new(sites);
        while sweeper.step_next_event() {}
        assert_eq!(sweeper.degenerate_site_events, 1);
        let diagram = sweeper.finish();
        check_invariants(&diagram);

        // perturbing the fourth site off the bisector must not change
        // the combinatorial shape
        let perturbed = diagram_of(&[(0.0, 2.0), (-1.0, 0.0), (1.0, 0.0), (0.001, -4.0)]);
        check_invariants(&perturbed);

        assert_eq!(
            interior_vertices(&diagram.dcel).len(),
            interior_vertices(&perturbed.dcel).len()
        );
        assert_eq!(diagram.fwd_edges.len(), perturbed.fwd_edges.len());

        let degrees = |d: &VoronoiDiagram| {
            let mut ds: Vec<usize> = d
                .dcel
                .faces
                .iter()
                .enumerate()
                .filter(|(_, f)| f.site.is_some())
                .map(|(fi, _)| d.dcel.face_polygon(fi).len())
                .collect();
            ds.sort_unstable();
            ds
        };
        assert_eq!(degrees(&diagram), degrees(&perturbed));

        // and the two expected vertices sit at the two circumcenters
        let mut ys: Vec<f64> = interior_vertices(&diagram.dcel)
            .into_iter()
            .map(|v| diagram.dcel.vertices[v].pos.y())
            .collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(ys.len(), 2);
        assert!(soft_eq(ys[0], -1.875));
        assert!(soft_eq(ys[1], 0.75));
    }

    #[test]
    fn coincident_sites_do_not_crash() {
        let diagram = diagram_of(&[(0.0, 0.0), (0.0, 0.0), (2.0, 1.0)]);
        // both duplicates get a cell; one of them is empty or degenerate
        // but the sweep and clip must still terminate cleanly
        assert_eq!(diagram.dcel.num_faces(), 4);
    }

    #[test]
    fn random_sites_satisfy_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..4 {
            let n = 10 + round * 15;
            let points: Vec<(f64, f64)> = (0..n)
                .map(|_| (rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)))
                .collect();
            let diagram = diagram_of(&points);
            check_invariants(&diagram);
            assert!(!diagram.fwd_edges.is_empty());
        }
    }

    #[test]
    fn determinism_byte_identical_dumps() {
        let points: Vec<(f64, f64)> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..25)
                .map(|_| (rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0)))
                .collect()
        };
        let d1 = diagram_of(&points).dcel.dump_voronoi();
        let d2 = diagram_of(&points).dcel.dump_voronoi();
        assert_eq!(d1, d2);
    }

    #[test]
    fn collinear_sites() {
        let diagram = diagram_of(&[(-2.0, 0.0), (0.0, 0.0), (2.0, 0.0)]);
        check_invariants(&diagram);
        // no circumcenters exist: two parallel bisectors, no interior
        // vertices
        assert_eq!(interior_vertices(&diagram.dcel).len(), 0);
        assert_eq!(diagram.fwd_edges.len(), 2);
    }
}
