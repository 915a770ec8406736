use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::error::PropagationFailure;

/// The strength of a domain change, ordered from weakest to strongest.
///
/// - [`ChangeKind::Value`]: one or more interior values were removed, but
///   neither bound moved.
/// - [`ChangeKind::Range`]: the minimum or maximum moved.
/// - [`ChangeKind::Domain`]: the value set was replaced wholesale.
///
/// The same lattice is used on both sides of the dependency protocol: a
/// mutation reports the strongest kind it implicated, and an arc declares
/// the minimum kind that must re-trigger it. An event of strength `k`
/// re-triggers every arc whose declared dependency is `<= k`, so a
/// `Domain`-level change also re-triggers `Value`- and `Range`-dependent
/// arcs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ChangeKind {
    Value,
    Range,
    Domain,
}

/// Outcome of a successful domain mutation: `None` when nothing changed,
/// otherwise the strongest [`ChangeKind`] implicated.
pub type DomainChange = Option<ChangeKind>;

/// A finite integer domain backed by a persistent ordered set.
///
/// All mutators uphold two invariants:
///
/// 1. The domain is never left empty. A restriction that would remove the
///    last value fails with [`PropagationFailure`] and leaves the domain
///    untouched.
/// 2. Within one propagation episode the domain only shrinks. Values come
///    back only through [`IntDomain::restore`], driven by choicepoint
///    rollback.
///
/// Every removal is appended to a delta log so that incremental arc
/// revisions ([`removed_since_clear`](IntDomain::removed_since_clear)) and
/// change-kind classification only ever look at what changed, not the whole
/// set. The log is reset once per propagation pass via
/// [`clear_delta`](IntDomain::clear_delta).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntDomain {
    values: OrdSet<i64>,
    removed: OrdSet<i64>,
}

/// An opaque, complete capture of an [`IntDomain`]'s value set.
///
/// Snapshots share structure with the live domain, so taking one is cheap
/// regardless of domain size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntDomainSnapshot {
    values: OrdSet<i64>,
}

impl IntDomain {
    /// Creates the interval domain `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`; a variable cannot be born empty.
    pub fn new(min: i64, max: i64) -> Self {
        assert!(min <= max, "empty initial domain [{min}, {max}]");
        Self {
            values: (min..=max).collect(),
            removed: OrdSet::new(),
        }
    }

    /// Creates a domain from an explicit value set.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields no values.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        let values: OrdSet<i64> = values.into_iter().collect();
        assert!(!values.is_empty(), "empty initial domain");
        Self {
            values,
            removed: OrdSet::new(),
        }
    }

    pub fn min(&self) -> i64 {
        *self.values.get_min().expect("domain is never empty")
    }

    pub fn max(&self) -> i64 {
        *self.values.get_max().expect("domain is never empty")
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_bound(&self) -> bool {
        self.values.len() == 1
    }

    /// The bound value, if the domain is a singleton.
    pub fn bound_value(&self) -> Option<i64> {
        if self.is_bound() {
            Some(self.min())
        } else {
            None
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.values.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().copied()
    }

    /// The current value set. Shares structure; cheap to clone.
    pub fn values(&self) -> &OrdSet<i64> {
        &self.values
    }

    /// Values removed since the last [`clear_delta`](IntDomain::clear_delta).
    pub fn removed_since_clear(&self) -> &OrdSet<i64> {
        &self.removed
    }

    /// Resets the incremental-change log without altering the value set.
    pub fn clear_delta(&mut self) {
        self.removed = OrdSet::new();
    }

    /// Captures the complete value set, independent of the delta log.
    pub fn snapshot(&self) -> IntDomainSnapshot {
        IntDomainSnapshot {
            values: self.values.clone(),
        }
    }

    /// Reinstates a previously captured value set and resets the delta log.
    pub fn restore(&mut self, snapshot: IntDomainSnapshot) {
        self.values = snapshot.values;
        self.removed = OrdSet::new();
    }

    /// Removes all values below `min`.
    pub fn set_min(&mut self, min: i64) -> Result<DomainChange, PropagationFailure> {
        if min <= self.min() {
            return Ok(None);
        }
        if min > self.max() {
            return Err(PropagationFailure);
        }
        let doomed: Vec<i64> = self.iter().take_while(|&v| v < min).collect();
        self.remove_all(&doomed);
        Ok(Some(ChangeKind::Range))
    }

    /// Removes all values above `max`.
    pub fn set_max(&mut self, max: i64) -> Result<DomainChange, PropagationFailure> {
        if max >= self.max() {
            return Ok(None);
        }
        if max < self.min() {
            return Err(PropagationFailure);
        }
        let doomed: Vec<i64> = self.iter().skip_while(|&v| v <= max).collect();
        self.remove_all(&doomed);
        Ok(Some(ChangeKind::Range))
    }

    /// Restricts the domain to the interval `[min, max]`.
    pub fn set_range(&mut self, min: i64, max: i64) -> Result<DomainChange, PropagationFailure> {
        // Reject up front so a failing call leaves the domain untouched.
        if !self.iter().any(|v| min <= v && v <= max) {
            return Err(PropagationFailure);
        }
        let low = self.set_min(min)?;
        let high = self.set_max(max)?;
        Ok(low.max(high))
    }

    /// Binds the domain to a single value.
    pub fn set_value(&mut self, value: i64) -> Result<DomainChange, PropagationFailure> {
        if !self.contains(value) {
            return Err(PropagationFailure);
        }
        if self.is_bound() {
            return Ok(None);
        }
        let doomed: Vec<i64> = self.iter().filter(|&v| v != value).collect();
        self.remove_all(&doomed);
        Ok(Some(ChangeKind::Range))
    }

    /// Removes a single value.
    pub fn remove_value(&mut self, value: i64) -> Result<DomainChange, PropagationFailure> {
        if !self.contains(value) {
            return Ok(None);
        }
        if self.is_bound() {
            return Err(PropagationFailure);
        }
        let at_bound = value == self.min() || value == self.max();
        self.remove_all(&[value]);
        Ok(Some(if at_bound {
            ChangeKind::Range
        } else {
            ChangeKind::Value
        }))
    }

    /// Removes every value in the interval `[min, max]`.
    pub fn remove_range(&mut self, min: i64, max: i64) -> Result<DomainChange, PropagationFailure> {
        let doomed: Vec<i64> = self.iter().filter(|&v| min <= v && v <= max).collect();
        if doomed.is_empty() {
            return Ok(None);
        }
        if doomed.len() == self.size() {
            return Err(PropagationFailure);
        }
        let at_bound = doomed.contains(&self.min()) || doomed.contains(&self.max());
        self.remove_all(&doomed);
        Ok(Some(if at_bound {
            ChangeKind::Range
        } else {
            ChangeKind::Value
        }))
    }

    /// Restricts the domain to its intersection with `allowed`.
    ///
    /// This is the wholesale-replacement operation; any resulting change is
    /// reported as [`ChangeKind::Domain`]. Intersection (rather than plain
    /// assignment) preserves the monotonic-shrinking invariant.
    pub fn set_domain(&mut self, allowed: &OrdSet<i64>) -> Result<DomainChange, PropagationFailure> {
        let doomed: Vec<i64> = self.iter().filter(|v| !allowed.contains(v)).collect();
        if doomed.is_empty() {
            return Ok(None);
        }
        if doomed.len() == self.size() {
            return Err(PropagationFailure);
        }
        self.remove_all(&doomed);
        Ok(Some(ChangeKind::Domain))
    }

    fn remove_all(&mut self, doomed: &[i64]) {
        for v in doomed {
            let _ = self.values.remove(v);
            let _ = self.removed.insert(*v);
        }
    }
}

/// A three-state boolean domain: unbound, true, or false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolDomain {
    possible_true: bool,
    possible_false: bool,
}

impl BoolDomain {
    pub fn new() -> Self {
        Self {
            possible_true: true,
            possible_false: true,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.possible_true != self.possible_false
    }

    pub fn bound_value(&self) -> Option<bool> {
        match (self.possible_true, self.possible_false) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    pub fn size(&self) -> usize {
        usize::from(self.possible_true) + usize::from(self.possible_false)
    }

    /// Binds the domain. Re-binding to the held value is a no-op; binding
    /// the complement fails.
    pub fn set_value(&mut self, value: bool) -> Result<DomainChange, PropagationFailure> {
        match self.bound_value() {
            Some(held) if held == value => Ok(None),
            Some(_) => Err(PropagationFailure),
            None => {
                self.possible_true = value;
                self.possible_false = !value;
                // Both bounds collapse onto the value, hence Range.
                Ok(Some(ChangeKind::Range))
            }
        }
    }

    pub fn snapshot(&self) -> BoolDomain {
        *self
    }

    pub fn restore(&mut self, snapshot: BoolDomain) {
        *self = snapshot;
    }
}

impl Default for BoolDomain {
    fn default() -> Self {
        Self::new()
    }
}

/// A set-typed domain: the set variable's eventual value must contain every
/// `required` element and may only draw from the `possible` set.
///
/// Bound when `possible == required`. Fails when a restriction would force
/// `required` outside `possible`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDomain {
    possible: OrdSet<i64>,
    required: OrdSet<i64>,
}

/// Complete capture of a [`SetDomain`]'s two sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDomainSnapshot {
    possible: OrdSet<i64>,
    required: OrdSet<i64>,
}

impl SetDomain {
    pub fn new(possible: impl IntoIterator<Item = i64>) -> Self {
        Self {
            possible: possible.into_iter().collect(),
            required: OrdSet::new(),
        }
    }

    pub fn possible(&self) -> &OrdSet<i64> {
        &self.possible
    }

    pub fn required(&self) -> &OrdSet<i64> {
        &self.required
    }

    pub fn is_bound(&self) -> bool {
        self.possible == self.required
    }

    /// Number of still-undecided elements.
    pub fn size(&self) -> usize {
        self.possible.len() - self.required.len()
    }

    /// Marks `value` as required in the eventual set.
    pub fn require(&mut self, value: i64) -> Result<DomainChange, PropagationFailure> {
        if self.required.contains(&value) {
            return Ok(None);
        }
        if !self.possible.contains(&value) {
            return Err(PropagationFailure);
        }
        let _ = self.required.insert(value);
        Ok(Some(ChangeKind::Domain))
    }

    /// Removes `value` from the possible set.
    pub fn remove_possible(&mut self, value: i64) -> Result<DomainChange, PropagationFailure> {
        if !self.possible.contains(&value) {
            return Ok(None);
        }
        if self.required.contains(&value) {
            return Err(PropagationFailure);
        }
        let _ = self.possible.remove(&value);
        Ok(Some(ChangeKind::Domain))
    }

    pub fn snapshot(&self) -> SetDomainSnapshot {
        SetDomainSnapshot {
            possible: self.possible.clone(),
            required: self.required.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: SetDomainSnapshot) {
        self.possible = snapshot.possible;
        self.required = snapshot.required;
    }
}

/// The closed set of domain representations a node can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableDomain {
    Int(IntDomain),
    Bool(BoolDomain),
    Set(SetDomain),
}

/// Opaque capture of any [`VariableDomain`], for choicepoint frames and
/// whole-graph checkpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainSnapshot {
    Int(IntDomainSnapshot),
    Bool(BoolDomain),
    Set(SetDomainSnapshot),
}

impl VariableDomain {
    pub fn size(&self) -> usize {
        match self {
            VariableDomain::Int(d) => d.size(),
            VariableDomain::Bool(d) => d.size(),
            VariableDomain::Set(d) => d.size(),
        }
    }

    pub fn is_bound(&self) -> bool {
        match self {
            VariableDomain::Int(d) => d.is_bound(),
            VariableDomain::Bool(d) => d.is_bound(),
            VariableDomain::Set(d) => d.is_bound(),
        }
    }

    pub fn clear_delta(&mut self) {
        if let VariableDomain::Int(d) = self {
            d.clear_delta();
        }
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        match self {
            VariableDomain::Int(d) => DomainSnapshot::Int(d.snapshot()),
            VariableDomain::Bool(d) => DomainSnapshot::Bool(d.snapshot()),
            VariableDomain::Set(d) => DomainSnapshot::Set(d.snapshot()),
        }
    }

    /// Reinstates a snapshot taken from this same domain.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot kind does not match the domain kind; snapshots
    /// never migrate between nodes.
    pub fn restore(&mut self, snapshot: DomainSnapshot) {
        match (self, snapshot) {
            (VariableDomain::Int(d), DomainSnapshot::Int(s)) => d.restore(s),
            (VariableDomain::Bool(d), DomainSnapshot::Bool(s)) => d.restore(s),
            (VariableDomain::Set(d), DomainSnapshot::Set(s)) => d.restore(s),
            _ => panic!("domain snapshot kind mismatch"),
        }
    }

    /// # Panics
    ///
    /// Panics if this is not an integer domain; arcs that read integer
    /// bounds off a boolean or set node violate their posting contract.
    pub fn int(&self) -> &IntDomain {
        match self {
            VariableDomain::Int(d) => d,
            other => panic!("expected integer domain, found {other:?}"),
        }
    }

    /// Mutable counterpart of [`VariableDomain::int`].
    pub fn int_mut(&mut self) -> &mut IntDomain {
        match self {
            VariableDomain::Int(d) => d,
            other => panic!("expected integer domain, found {other:?}"),
        }
    }

    pub fn bool_mut(&mut self) -> &mut BoolDomain {
        match self {
            VariableDomain::Bool(d) => d,
            other => panic!("expected boolean domain, found {other:?}"),
        }
    }

    pub fn set_mut(&mut self) -> &mut SetDomain {
        match self {
            VariableDomain::Set(d) => d,
            other => panic!("expected set domain, found {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_and_membership() {
        let d = IntDomain::new(1, 4);
        assert_eq!(d.min(), 1);
        assert_eq!(d.max(), 4);
        assert_eq!(d.size(), 4);
        assert!(d.contains(3));
        assert!(!d.contains(5));
        assert!(!d.is_bound());
    }

    #[test]
    fn set_min_reports_range_change_and_logs_delta() {
        let mut d = IntDomain::new(1, 4);
        assert_eq!(d.set_min(3).unwrap(), Some(ChangeKind::Range));
        assert_eq!(d.min(), 3);
        let removed: Vec<i64> = d.removed_since_clear().iter().copied().collect();
        assert_eq!(removed, vec![1, 2]);

        // Re-applying the same restriction is a no-op.
        assert_eq!(d.set_min(3).unwrap(), None);
    }

    #[test]
    fn interior_removal_is_value_change_and_bound_removal_is_range() {
        let mut d = IntDomain::new(1, 4);
        assert_eq!(d.remove_value(2).unwrap(), Some(ChangeKind::Value));
        assert_eq!(d.remove_value(4).unwrap(), Some(ChangeKind::Range));
        assert_eq!(d.remove_value(9).unwrap(), None);
    }

    #[test]
    fn emptying_restriction_fails_and_leaves_domain_untouched() {
        let mut d = IntDomain::new(1, 4);
        assert_eq!(d.set_min(5), Err(PropagationFailure));
        assert_eq!(d.min(), 1);
        assert_eq!(d.size(), 4);

        let mut bound = IntDomain::from_values([7]);
        assert_eq!(bound.remove_value(7), Err(PropagationFailure));
        assert!(bound.contains(7));
    }

    #[test]
    fn set_value_binds_and_is_idempotent() {
        let mut d = IntDomain::new(1, 4);
        assert_eq!(d.set_value(2).unwrap(), Some(ChangeKind::Range));
        assert_eq!(d.bound_value(), Some(2));
        assert_eq!(d.set_value(2).unwrap(), None);
        assert_eq!(d.set_value(3), Err(PropagationFailure));
    }

    #[test]
    fn remove_range_distinguishes_interior_from_bounds() {
        let mut d = IntDomain::new(1, 6);
        assert_eq!(d.remove_range(2, 3).unwrap(), Some(ChangeKind::Value));
        assert_eq!(d.remove_range(5, 6).unwrap(), Some(ChangeKind::Range));
        assert_eq!(d.remove_range(1, 10), Err(PropagationFailure));
    }

    #[test]
    fn set_domain_intersects_and_reports_domain_change() {
        let mut d = IntDomain::new(1, 5);
        let allowed: OrdSet<i64> = [2, 4, 9].into_iter().collect();
        assert_eq!(d.set_domain(&allowed).unwrap(), Some(ChangeKind::Domain));
        let left: Vec<i64> = d.iter().collect();
        assert_eq!(left, vec![2, 4]);

        let disjoint: OrdSet<i64> = [7, 8].into_iter().collect();
        assert_eq!(d.set_domain(&disjoint), Err(PropagationFailure));
    }

    #[test]
    fn snapshot_restore_round_trip_ignores_delta_log() {
        let mut d = IntDomain::new(1, 4);
        let snap = d.snapshot();
        d.set_min(3).unwrap();
        d.remove_value(4).unwrap();
        d.restore(snap);
        assert_eq!(d.min(), 1);
        assert_eq!(d.size(), 4);
        assert!(d.removed_since_clear().is_empty());
    }

    #[test]
    fn clear_delta_keeps_values() {
        let mut d = IntDomain::new(1, 4);
        d.set_max(2).unwrap();
        assert_eq!(d.removed_since_clear().len(), 2);
        d.clear_delta();
        assert!(d.removed_since_clear().is_empty());
        assert_eq!(d.max(), 2);
    }

    #[test]
    fn change_kind_ordering() {
        assert!(ChangeKind::Value < ChangeKind::Range);
        assert!(ChangeKind::Range < ChangeKind::Domain);
    }

    #[test]
    fn bool_domain_binding() {
        let mut b = BoolDomain::new();
        assert!(!b.is_bound());
        assert_eq!(b.set_value(true).unwrap(), Some(ChangeKind::Range));
        assert_eq!(b.bound_value(), Some(true));
        assert_eq!(b.set_value(true).unwrap(), None);
        assert_eq!(b.set_value(false), Err(PropagationFailure));
    }

    #[test]
    fn set_domain_require_and_remove() {
        let mut s = SetDomain::new([1, 2, 3]);
        assert_eq!(s.require(1).unwrap(), Some(ChangeKind::Domain));
        assert_eq!(s.require(1).unwrap(), None);
        assert_eq!(s.require(9), Err(PropagationFailure));
        assert_eq!(s.remove_possible(1), Err(PropagationFailure));
        assert_eq!(s.remove_possible(3).unwrap(), Some(ChangeKind::Domain));
        assert!(!s.is_bound());
        s.require(2).unwrap();
        assert!(s.is_bound());
    }
}
