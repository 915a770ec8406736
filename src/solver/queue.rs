use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap};

use crate::solver::node::{ArcId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueItem {
    complexity: u32,
    seq: u64,
    arc: ArcId,
}

/// The pending-work list of one propagation episode.
///
/// Arcs drain in ascending [`complexity`](crate::solver::arc::PropagationArc::complexity)
/// order, FIFO among equals, and an arc queued again before being drained
/// is processed once. Each pending arc carries at most one "dirty source":
/// the node whose change scheduled it, collapsed to `None` as soon as a
/// second distinct source (or a sourceless add) schedules it again, so the
/// engine knows when the delta-based `propagate_from` path applies.
///
/// A complexity floor ([`set_required_min_complexity`](ArcQueue::set_required_min_complexity))
/// defers cheaper arcs, which is how staged consistency levels run the
/// expensive arcs only once the cheap ones are at fixed point. The queue is
/// transient working state and is never choicepoint-tracked.
#[derive(Debug, Default)]
pub struct ArcQueue {
    heap: BinaryHeap<Reverse<QueueItem>>,
    /// Membership and dirty-source tracking for pending arcs.
    pending: BTreeMap<ArcId, Option<NodeId>>,
    /// Arcs below the complexity floor, parked until the floor drops.
    deferred: Vec<(ArcId, u32)>,
    min_complexity: u32,
    next_seq: u64,
}

impl ArcQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Schedules `arc`, recording `source` as the change that caused it.
    /// Pass `None` for sourceless scheduling (a newly posted arc).
    pub fn add(&mut self, arc: ArcId, complexity: u32, source: Option<NodeId>) {
        match self.pending.get_mut(&arc) {
            Some(dirty) => {
                // A second cause collapses the single-dirty-source tracking.
                if *dirty != source {
                    *dirty = None;
                }
            }
            None => {
                let _ = self.pending.insert(arc, source);
                if complexity < self.min_complexity {
                    self.deferred.push((arc, complexity));
                } else {
                    self.push_item(arc, complexity);
                }
            }
        }
    }

    /// Next arc to evaluate, with its dirty source if exactly one change
    /// scheduled it. `None` once all admissible work is drained.
    pub fn pop(&mut self) -> Option<(ArcId, Option<NodeId>)> {
        while let Some(Reverse(item)) = self.heap.pop() {
            if !self.pending.contains_key(&item.arc) {
                // Removed or already drained via a stale heap entry.
                continue;
            }
            if item.complexity < self.min_complexity {
                // Floor was raised after this entry was pushed.
                self.deferred.push((item.arc, item.complexity));
                continue;
            }
            let dirty = self
                .pending
                .remove(&item.arc)
                .expect("pending entry checked above");
            return Some((item.arc, dirty));
        }
        None
    }

    /// Forgets the dirty-source tracking of everything still pending.
    ///
    /// Called at the end of a propagation episode: the delta logs the
    /// dirty sources point at are about to be cleared, so a later
    /// delta-based re-evaluation of a parked arc would miss removals.
    pub fn collapse_dirty_sources(&mut self) {
        for dirty in self.pending.values_mut() {
            *dirty = None;
        }
    }

    /// Discards a specific pending arc (a retracted constraint).
    pub fn remove(&mut self, arc: ArcId) {
        let _ = self.pending.remove(&arc);
        self.deferred.retain(|(a, _)| *a != arc);
        // The heap entry, if any, goes stale and is skipped on pop.
    }

    /// Defers arcs cheaper than `min`; lowering the floor re-admits the
    /// deferred ones.
    pub fn set_required_min_complexity(&mut self, min: u32) {
        self.min_complexity = min;
        let readmitted: Vec<(ArcId, u32)> = self
            .deferred
            .iter()
            .filter(|(_, c)| *c >= min)
            .copied()
            .collect();
        self.deferred.retain(|(_, c)| *c < min);
        for (arc, complexity) in readmitted {
            self.push_item(arc, complexity);
        }
    }

    pub fn required_min_complexity(&self) -> u32 {
        self.min_complexity
    }

    /// Discards all pending work (propagation aborted by failure).
    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
        self.deferred.clear();
    }

    fn push_item(&mut self, arc: ArcId, complexity: u32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(QueueItem {
            complexity,
            seq,
            arc,
        }));
    }
}
