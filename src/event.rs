use std::fmt;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fnv::FnvHashSet;
use log::trace;

use crate::geom::soft_eq;
use crate::point::Point;
use crate::splay::NodeId;

pub type EventId = usize;

/// Index into the sweeper's site vector.
pub type SiteIdx = usize;

#[derive(Clone, Copy)]
pub enum EventKind {
    Site { site: SiteIdx },
    /// The lowest point of the circumcircle through three consecutive
    /// arc foci. Remembers the circle center and the squeezed arc.
    Circle { center: Point, arc_node: NodeId },
}

#[derive(Clone, Copy)]
pub struct Event {
    pub id: EventId,
    pub pos: Point,
    pub kind: EventKind,
}

impl Event {
    pub fn is_site(&self) -> bool {
        matches!(self.kind, EventKind::Site { .. })
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            EventKind::Site { site } => write!(f, "Site #{} at {:?}", site, self.pos),
            EventKind::Circle { center, arc_node } => write!(
                f,
                "Circle for node {} at {:?}, center {:?}",
                arc_node, self.pos, center
            ),
        }
    }
}

/// Sweep order: the line moves top to bottom, so higher y resolves first;
/// ties within tolerance break to lower x, then site events before circle
/// events. `BinaryHeap` is a max-heap, so "resolves first" maps to
/// `Ordering::Greater`.
impl Ord for Event {
    fn cmp(&self, other: &Event) -> Ordering {
        if !soft_eq(self.pos.y(), other.pos.y()) {
            return self
                .pos
                .y()
                .partial_cmp(&other.pos.y())
                .unwrap_or(Ordering::Equal);
        }
        if !soft_eq(self.pos.x(), other.pos.x()) {
            return other
                .pos
                .x()
                .partial_cmp(&self.pos.x())
                .unwrap_or(Ordering::Equal);
        }
        match (self.is_site(), other.is_site()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Event) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Event) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// Event queue with lazy invalidation: superseded circle events stay in
/// the heap, flagged by id, and are dropped when they surface.
#[derive(Default)]
pub struct EventQueue {
    next_event_id: EventId,
    events: BinaryHeap<Event>,
    invalidated: FnvHashSet<EventId>,
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f)?;
        for (index, event) in self.events.iter().enumerate() {
            writeln!(f, "{}: {:?}", index, event)?;
        }
        Ok(())
    }
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue::default()
    }

    /// Hands out the id for an event that may or may not be pushed later;
    /// arcs register their pending circle event under this id before the
    /// de-duplication step decides whether it enters the heap.
    pub fn new_event_id(&mut self) -> EventId {
        let id = self.next_event_id;
        self.next_event_id += 1;
        id
    }

    pub fn push(&mut self, event: Event) {
        trace!("queueing event {:?}", event);
        self.events.push(event);
    }

    pub fn push_site(&mut self, pos: Point, site: SiteIdx) {
        let id = self.new_event_id();
        self.push(Event { id, pos, kind: EventKind::Site { site } });
    }

    pub fn invalidate(&mut self, id: EventId) {
        self.invalidated.insert(id);
    }

    pub fn is_invalidated(&self, id: EventId) -> bool {
        self.invalidated.contains(&id)
    }

    /// Next live event; invalidated ones are discarded on the way.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(event) = self.events.pop() {
            if self.invalidated.remove(&event.id) {
                trace!("discarding invalidated event {:?}", event);
                continue;
            }
            return Some(event);
        }
        None
    }

    /// Next live event without removing it.
    pub fn peek(&mut self) -> Option<&Event> {
        loop {
            let stale = match self.events.peek() {
                Some(event) => self.invalidated.contains(&event.id),
                None => break,
            };
            if !stale {
                break;
            }
            let event = self.events.pop().expect("peeked event vanished");
            self.invalidated.remove(&event.id);
        }
        self.events.peek()
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: EventId, x: f64, y: f64) -> Event {
        Event { id, pos: Point::new(x, y), kind: EventKind::Site { site: id } }
    }

    fn circle(id: EventId, x: f64, y: f64) -> Event {
        Event {
            id,
            pos: Point::new(x, y),
            kind: EventKind::Circle { center: Point::new(x, y + 1.0), arc_node: 0 },
        }
    }

    #[test]
    fn higher_y_resolves_first() {
        let mut q = EventQueue::new();
        q.push(site(0, 0.0, -1.0));
        q.push(site(1, 0.0, 2.0));
        q.push(site(2, 0.0, 1.0));
        let order: Vec<EventId> = std::iter::from_fn(|| q.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn equal_y_breaks_to_lower_x() {
        let mut q = EventQueue::new();
        q.push(site(0, 3.0, 0.0));
        q.push(site(1, -1.0, 0.0));
        q.push(site(2, 1.0, 0.0));
        let order: Vec<EventId> = std::iter::from_fn(|| q.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn sites_beat_circles_at_the_same_position() {
        let mut q = EventQueue::new();
        q.push(circle(0, 0.0, 0.0));
        q.push(site(1, 0.0, 0.0));
        let first = q.pop().unwrap();
        assert!(first.is_site());
    }

    #[test]
    fn invalidated_events_are_skipped() {
        let mut q = EventQueue::new();
        q.push(circle(0, 0.0, 5.0));
        q.push(site(1, 0.0, 1.0));
        q.invalidate(0);
        assert_eq!(q.pop().unwrap().id, 1);
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn peek_filters_stale_events() {
        let mut q = EventQueue::new();
        q.push(circle(0, 0.0, 5.0));
        q.push(circle(1, 0.0, 4.0));
        q.invalidate(0);
        assert_eq!(q.peek().unwrap().id, 1);
        assert_eq!(q.pop().unwrap().id, 1);
    }
}
