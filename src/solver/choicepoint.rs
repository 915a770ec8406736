use crate::solver::domain::DomainSnapshot;
use crate::solver::graph::GraphDelta;
use crate::solver::node::{NodeId, StackToken};

/// One undoable mutation recorded into a choicepoint frame.
///
/// Entries are appended in mutation order; rollback replays the frame in
/// reverse, which restores exactly the pre-push state no matter how domain
/// and structural changes interleaved.
#[derive(Debug)]
pub enum ChoicePointEntry {
    /// Complete capture of a node's domain, taken on the first mutation of
    /// that node within the frame.
    DomainSaved {
        node: NodeId,
        snapshot: DomainSnapshot,
    },
    /// A structural addition made to the graph within the frame.
    Graph(GraphDelta),
    /// A constraint appended to the store's registry within the frame; the
    /// value is the registry length before the append, to truncate back to.
    ConstraintPosted(usize),
}

/// One frame of undo information, bracketed by a `push`/`pop` pair.
#[derive(Debug)]
pub struct ChoicePointFrame {
    serial: u64,
    entries: Vec<ChoicePointEntry>,
}

impl ChoicePointFrame {
    /// Serial of this frame; serials increase monotonically across the
    /// lifetime of the stack and are never reused, so "already saved in the
    /// current frame" is a single integer compare.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the frame, yielding entries newest-first for rollback.
    pub fn into_rollback_order(self) -> impl Iterator<Item = ChoicePointEntry> {
        self.entries.into_iter().rev()
    }
}

/// A stack of [`ChoicePointFrame`]s providing transactional, stack-discipline
/// undo of all domain and structural mutations.
///
/// The search layer calls [`push`](ChoicePointStack::push) once per tree
/// edge descended and exactly one matching pop per backtrack. Mutations made
/// while no frame is open are permanent (root-level problem setup).
///
/// Exactly one stack owns transactional authority over a given set of
/// nodes; the [`StackToken`] enforces this through the nodes' set-once
/// binding guard.
#[derive(Debug)]
pub struct ChoicePointStack {
    token: StackToken,
    frames: Vec<ChoicePointFrame>,
    next_serial: u64,
}

impl ChoicePointStack {
    pub fn new(token: StackToken) -> Self {
        Self {
            token,
            frames: Vec::new(),
            next_serial: 0,
        }
    }

    pub fn token(&self) -> StackToken {
        self.token
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens a new frame and returns the resulting depth.
    pub fn push(&mut self) -> usize {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.frames.push(ChoicePointFrame {
            serial,
            entries: Vec::new(),
        });
        self.frames.len()
    }

    /// Removes and returns the top frame. The caller undoes its entries in
    /// rollback order.
    ///
    /// # Panics
    ///
    /// Panics on an empty stack; an unmatched pop is a caller contract
    /// violation, not a runtime condition.
    pub fn pop(&mut self) -> ChoicePointFrame {
        self.frames
            .pop()
            .expect("choicepoint pop without a matching push")
    }

    /// Appends an entry to the top frame. Dropped when no frame is open.
    pub fn record(&mut self, entry: ChoicePointEntry) {
        if let Some(frame) = self.frames.last_mut() {
            frame.entries.push(entry);
        }
    }

    /// Serial of the currently open frame, if any.
    pub fn active_frame_serial(&self) -> Option<u64> {
        self.frames.last().map(|f| f.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::domain::{DomainSnapshot, IntDomain};

    fn entry(node: u32) -> ChoicePointEntry {
        ChoicePointEntry::DomainSaved {
            node: NodeId(node),
            snapshot: DomainSnapshot::Int(IntDomain::new(0, 1).snapshot()),
        }
    }

    #[test]
    fn entries_come_back_newest_first() {
        let mut cps = ChoicePointStack::new(StackToken(0));
        let _ = cps.push();
        cps.record(entry(0));
        cps.record(entry(1));
        cps.record(entry(2));

        let order: Vec<NodeId> = cps
            .pop()
            .into_rollback_order()
            .map(|e| match e {
                ChoicePointEntry::DomainSaved { node, .. } => node,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![NodeId(2), NodeId(1), NodeId(0)]);
    }

    #[test]
    fn records_outside_any_frame_are_permanent() {
        let mut cps = ChoicePointStack::new(StackToken(0));
        cps.record(entry(0));
        assert_eq!(cps.depth(), 0);
        let _ = cps.push();
        assert!(cps.pop().is_empty());
    }

    #[test]
    fn frame_serials_are_never_reused() {
        let mut cps = ChoicePointStack::new(StackToken(0));
        let _ = cps.push();
        let first = cps.active_frame_serial().unwrap();
        let _ = cps.pop();
        let _ = cps.push();
        let second = cps.active_frame_serial().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn nested_frames_pop_independently() {
        let mut cps = ChoicePointStack::new(StackToken(0));
        assert_eq!(cps.push(), 1);
        cps.record(entry(0));
        assert_eq!(cps.push(), 2);
        cps.record(entry(1));

        assert_eq!(cps.pop().len(), 1);
        assert_eq!(cps.depth(), 1);
        assert_eq!(cps.pop().len(), 1);
        assert_eq!(cps.depth(), 0);
    }

    #[test]
    #[should_panic(expected = "without a matching push")]
    fn popping_an_empty_stack_panics() {
        let mut cps = ChoicePointStack::new(StackToken(0));
        let _ = cps.pop();
    }
}
