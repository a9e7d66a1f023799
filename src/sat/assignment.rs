#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Truth values for propositions.
//!
//! Every proposition is in exactly one [`VarState`]. Values are only ever
//! added by [`Assignment::assign`] and [`Assignment::merge`]; asking for the
//! opposite value of a known proposition yields a [`ContradictionError`]
//! instead of overwriting it.

use crate::sat::literal::{Literal, Proposition};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Assigned(false))
    }
}

/// A proposition was required to be both true and false.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("contradiction: proposition {proposition} is forced both true and false")]
pub struct ContradictionError {
    pub proposition: Proposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    values: FxHashMap<Proposition, bool>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assigned propositions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn value(&self, proposition: Proposition) -> VarState {
        self.values
            .get(&proposition)
            .map_or(VarState::Unassigned, |&b| VarState::Assigned(b))
    }

    /// Truth value of `lit`, or `None` while its proposition is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.values
            .get(&lit.proposition())
            .map(|&b| b == lit.polarity())
    }

    /// Makes `lit` true.
    ///
    /// Returns `Ok(true)` when the proposition was previously unassigned and
    /// `Ok(false)` when it already held the requested value.
    ///
    /// # Errors
    ///
    /// [`ContradictionError`] if the proposition already holds the opposite
    /// value. The assignment is left unchanged.
    pub fn assign(&mut self, lit: Literal) -> Result<bool, ContradictionError> {
        let proposition = lit.proposition();
        match self.values.get(&proposition) {
            Some(&b) if b == lit.polarity() => Ok(false),
            Some(_) => Err(ContradictionError { proposition }),
            None => {
                self.values.insert(proposition, lit.polarity());
                Ok(true)
            }
        }
    }

    /// Right-biased union with `other`: facts in `other` fill unknown
    /// propositions, known facts are never reverted. Returns the number of
    /// newly assigned propositions.
    ///
    /// # Errors
    ///
    /// [`ContradictionError`] if `other` disagrees with a known fact. Nothing
    /// is merged in that case.
    pub fn merge(&mut self, other: &Self) -> Result<usize, ContradictionError> {
        if let Some((&proposition, _)) = other
            .values
            .iter()
            .find(|&(p, b)| self.values.get(p).is_some_and(|known| known != b))
        {
            return Err(ContradictionError { proposition });
        }

        let before = self.values.len();
        self.values
            .extend(other.values.iter().map(|(&p, &b)| (p, b)));
        Ok(self.values.len() - before)
    }

    /// Forgets the value of `proposition`. Only search undoes assignments;
    /// propagation never calls this.
    pub(crate) fn unassign(&mut self, proposition: Proposition) {
        self.values.remove(&proposition);
    }

    /// All assigned propositions in (row, column, value) order.
    pub fn iter(&self) -> impl Iterator<Item = (Proposition, bool)> + '_ {
        self.values
            .iter()
            .map(|(&p, &b)| (p, b))
            .sorted_unstable_by_key(|&(p, _)| p)
    }

    #[must_use]
    pub fn true_propositions(&self) -> Vec<Proposition> {
        self.iter().filter(|&(_, b)| b).map(|(p, _)| p).collect()
    }

    #[must_use]
    pub fn count_true(&self) -> usize {
        self.values.values().filter(|&&b| b).count()
    }

    #[must_use]
    pub fn count_false(&self) -> usize {
        self.values.len() - self.count_true()
    }
}

impl FromIterator<Literal> for Assignment {
    /// Collects literals without contradiction checks; a later literal on the
    /// same proposition wins. Intended for building expected values in tests
    /// and for trusted inputs.
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|lit| (lit.proposition(), lit.polarity()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: u8, col: u8, value: u8) -> Proposition {
        Proposition::new(row, col, value)
    }

    #[test]
    fn test_var_state() {
        assert!(VarState::Unassigned.is_unassigned());
        assert!(VarState::Assigned(true).is_true());
        assert!(VarState::Assigned(false).is_false());
        assert!(!VarState::Assigned(false).is_true());
        assert!(!VarState::Unassigned.is_false());
    }

    #[test]
    fn test_assign_and_value() {
        let mut a = Assignment::new();
        assert_eq!(a.value(p(1, 1, 1)), VarState::Unassigned);
        assert_eq!(a.assign(p(1, 1, 1).positive()), Ok(true));
        assert_eq!(a.assign(p(1, 1, 1).positive()), Ok(false));
        assert_eq!(a.value(p(1, 1, 1)), VarState::Assigned(true));
        assert_eq!(a.literal_value(p(1, 1, 1).negative()), Some(false));
        assert_eq!(a.literal_value(p(1, 1, 2).negative()), None);
    }

    #[test]
    fn test_assign_contradiction() {
        let mut a = Assignment::new();
        a.assign(p(1, 1, 1).positive()).unwrap();
        let err = a.assign(p(1, 1, 1).negative()).unwrap_err();
        assert_eq!(err.proposition, p(1, 1, 1));
        assert_eq!(a.value(p(1, 1, 1)), VarState::Assigned(true));
    }

    #[test]
    fn test_merge_is_right_biased_union() {
        let mut old: Assignment = [p(1, 1, 1).positive()].into_iter().collect();
        let new: Assignment = [p(1, 1, 1).positive(), p(1, 2, 1).negative()]
            .into_iter()
            .collect();

        assert_eq!(old.merge(&new), Ok(1));
        assert_eq!(old.value(p(1, 1, 1)), VarState::Assigned(true));
        assert_eq!(old.value(p(1, 2, 1)), VarState::Assigned(false));
    }

    #[test]
    fn test_merge_contradiction_leaves_receiver_untouched() {
        let mut old: Assignment = [p(1, 1, 1).positive()].into_iter().collect();
        let new: Assignment = [p(2, 2, 2).positive(), p(1, 1, 1).negative()]
            .into_iter()
            .collect();

        let err = old.merge(&new).unwrap_err();
        assert_eq!(err.proposition, p(1, 1, 1));
        assert_eq!(old.len(), 1);
        assert_eq!(old.value(p(2, 2, 2)), VarState::Unassigned);
    }

    #[test]
    fn test_iter_sorted_and_counts() {
        let a: Assignment = [
            p(2, 1, 1).positive(),
            p(1, 1, 1).negative(),
            p(1, 1, 2).positive(),
        ]
        .into_iter()
        .collect();

        let props: Vec<_> = a.iter().map(|(p, _)| p).collect();
        assert_eq!(props, vec![p(1, 1, 1), p(1, 1, 2), p(2, 1, 1)]);
        assert_eq!(a.true_propositions(), vec![p(1, 1, 2), p(2, 1, 1)]);
        assert_eq!(a.count_true(), 2);
        assert_eq!(a.count_false(), 1);
    }

    #[test]
    fn test_unassign() {
        let mut a = Assignment::new();
        a.assign(p(3, 3, 3).positive()).unwrap();
        a.unassign(p(3, 3, 3));
        assert!(a.is_empty());
        assert_eq!(a.assign(p(3, 3, 3).negative()), Ok(true));
    }
}
