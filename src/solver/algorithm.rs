use std::time::Instant;

use tracing::{debug, trace};

use crate::error::PropagationFailure;
use crate::solver::arc::PropagationContext;
use crate::solver::choicepoint::ChoicePointStack;
use crate::solver::graph::NodeArcGraph;
use crate::solver::node::{ArcId, NodeChangeEvent};
use crate::solver::queue::ArcQueue;
use crate::solver::stats::PropagationStats;

/// The AC-5-style propagation engine: drains the arc queue to a fixed
/// point, feeding each arc's change events back through the graph's
/// dependency indices.
///
/// One call frame, never suspended, never re-entrant: arcs only mutate
/// domains, which queues more work for the current drain. On failure the
/// queue is discarded and the caller must roll back; the graph is
/// known-inconsistent at that point.
#[derive(Debug, Default)]
pub struct Ac5 {
    queue: ArcQueue,
}

impl Ac5 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defers arcs cheaper than `min` until the floor is lowered again
    /// (staged consistency: cheap arcs first).
    pub fn set_required_min_complexity(&mut self, min: u32) {
        self.queue.set_required_min_complexity(min);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Schedules a newly posted arc ("arc just appeared").
    pub(crate) fn enqueue_new_arc(&mut self, graph: &NodeArcGraph, arc: ArcId) {
        self.queue.add(arc, graph.complexity(arc), None);
    }

    /// Schedules every arc a node-change event re-triggers.
    pub(crate) fn enqueue_event(&mut self, graph: &NodeArcGraph, event: NodeChangeEvent) {
        for arc in graph.dependent_arcs(event.node, event.kind) {
            self.queue.add(arc, graph.complexity(arc), Some(event.node));
        }
    }

    /// Discards pending work for an arc that left the graph.
    pub(crate) fn remove_from_queue(&mut self, arc: ArcId) {
        self.queue.remove(arc);
    }

    pub(crate) fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Drains the queue to a fixed point.
    ///
    /// On success every node's delta log is cleared (one clear per
    /// propagation pass), and any arc still parked below the complexity
    /// floor loses its dirty source so it takes the ground-truth
    /// `propagate` path when it finally runs. On failure the queue is
    /// cleared and the failure surfaces; every domain mutated so far stays
    /// mutated until the caller pops the choicepoint.
    pub(crate) fn propagate(
        &mut self,
        graph: &mut NodeArcGraph,
        cps: &mut ChoicePointStack,
        stats: &mut PropagationStats,
    ) -> Result<(), PropagationFailure> {
        stats.episodes += 1;
        let mut events: Vec<NodeChangeEvent> = Vec::new();

        while let Some((arc_id, dirty)) = self.queue.pop() {
            events.clear();
            let started = Instant::now();
            let result = {
                let (arc, nodes) = graph.arc_and_nodes_mut(arc_id);
                let mut ctx = PropagationContext::new(nodes, cps, &mut events);
                match dirty {
                    Some(source) => arc.propagate_from(source, &mut ctx),
                    None => arc.propagate(&mut ctx),
                }
            };
            let elapsed = started.elapsed().as_micros() as u64;

            stats.evaluations += 1;
            stats.prunings += events.len() as u64;
            let per_arc = stats.arc_stats.entry(arc_id).or_default();
            per_arc.evaluations += 1;
            per_arc.prunings += events.len() as u64;
            per_arc.time_spent_micros += elapsed;

            if let Err(failure) = result {
                debug!(arc = %arc_id, "arc failed, aborting propagation");
                stats.failures += 1;
                self.queue.clear();
                return Err(failure);
            }

            for event in &events {
                trace!(node = %event.node, kind = ?event.kind, "domain narrowed");
                for dependent in graph.dependent_arcs(event.node, event.kind) {
                    self.queue
                        .add(dependent, graph.complexity(dependent), Some(event.node));
                }
            }
        }

        // Delta logs are per-pass. Parked arcs lose their dirty source
        // along with the logs; the delta they were scheduled against no
        // longer exists once the logs reset.
        self.queue.collapse_dirty_sources();
        for node in graph.nodes_mut().iter_mut() {
            node.domain_mut().clear_delta();
        }
        debug!("propagation reached fixed point");
        Ok(())
    }
}
