use crate::event::{EventId, SiteIdx};
use crate::geom::breakpoint_x;
use crate::point::{Point, Site};
use crate::skeleton::PairId;
use crate::splay::LinkedSplayTree;

/// A link in the beach chain: arcs are leaf nodes, breakpoints lie
/// between two arcs and are internal nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Arc { focus: SiteIdx },
    Breakpoint { left: SiteIdx, right: SiteIdx },
}

impl Chain {
    pub fn is_arc(&self) -> bool {
        matches!(self, Chain::Arc { .. })
    }

    /// The coordinate the beach line is ordered by at the given sweep
    /// position: an arc sits at its focus' x, a breakpoint at the
    /// intersection of its two parabolas (midpoint fallback when the
    /// closed form degenerates).
    pub fn ordering_x(&self, sites: &[Site], directrix: f64) -> f64 {
        match *self {
            Chain::Arc { focus } => sites[focus].x(),
            Chain::Breakpoint { left, right } => {
                let l = sites[left].pos;
                let r = sites[right].pos;
                let x = breakpoint_x(l, r, directrix);
                if x.is_nan() { (l.x() + r.x()) / 2.0 } else { x }
            }
        }
    }

    pub fn describe(&self, sites: &[Site]) -> String {
        match *self {
            Chain::Arc { focus } => format!("Arc[{}]", sites[focus].id),
            Chain::Breakpoint { left, right } => {
                format!("BP[{},{}]", sites[left].id, sites[right].id)
            }
        }
    }
}

/// A circle event registered on an arc: the queue entry is the weak side
/// of the pair, so the arc remembers enough (id and position) to
/// invalidate or match it without touching the heap.
#[derive(Debug, Clone, Copy)]
pub struct PendingCircle {
    pub id: EventId,
    pub pos: Point,
}

/// Per-node payload: breakpoints carry the edge skeleton they trace,
/// arcs carry their pending circle event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValue {
    pub edge: Option<PairId>,
    pub circle_event: Option<PendingCircle>,
}

impl ChainValue {
    pub fn breakpoint(edge: PairId) -> Self {
        ChainValue { edge: Some(edge), circle_event: None }
    }

    pub fn arc() -> Self {
        ChainValue::default()
    }
}

pub type BeachLine = LinkedSplayTree<Chain, ChainValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::soft_eq;

    #[test]
    fn arc_orders_at_its_focus() {
        let sites = vec![Site::new(2.0, 5.0, 1)];
        let arc = Chain::Arc { focus: 0 };
        assert!(soft_eq(arc.ordering_x(&sites, -3.0), 2.0));
    }

    #[test]
    fn breakpoint_midpoint_fallback() {
        // equal-height foci: the closed form short-circuits to the midpoint
        let sites = vec![Site::new(-1.0, 0.0, 1), Site::new(3.0, 0.0, 2)];
        let bp = Chain::Breakpoint { left: 0, right: 1 };
        assert!(soft_eq(bp.ordering_x(&sites, -2.0), 1.0));
    }

    #[test]
    fn breakpoint_tracks_the_sweep() {
        let sites = vec![Site::new(0.0, 2.0, 1), Site::new(1.0, 1.0, 2)];
        let bp = Chain::Breakpoint { left: 0, right: 1 };
        let x1 = bp.ordering_x(&sites, 0.0);
        let x2 = bp.ordering_x(&sites, -5.0);
        assert!(x1.is_finite() && x2.is_finite());
        assert!(x1 != x2);
    }
}
