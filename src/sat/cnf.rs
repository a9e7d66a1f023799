#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause store.
//!
//! A [`RuleSet`] is the static, board-independent part of a puzzle encoding.
//! [`Cnf::initialize`] joins it with the board's given facts to form the
//! working formula, which from then on only ever loses clauses.

use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Proposition};
use bit_vec::BitVec;
use rustc_hash::FxHashSet;
use std::fmt;

/// Structural constraints of a puzzle, independent of any given cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    /// The header line read ahead of the clauses, if the rules came from a
    /// file. It never takes part in the formula.
    pub header: Option<String>,
    pub clauses: Vec<Clause>,
}

impl RuleSet {
    #[must_use]
    pub const fn new(clauses: Vec<Clause>) -> Self {
        Self {
            header: None,
            clauses,
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Number of distinct propositions mentioned by the rules.
    #[must_use]
    pub fn num_propositions(&self) -> usize {
        self.clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|lit| lit.proposition())
            .collect::<FxHashSet<_>>()
            .len()
    }
}

impl FromIterator<Clause> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The working formula: a conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    #[must_use]
    pub const fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    /// Builds the initial formula: every rule clause followed by one unit
    /// clause per board fact. Rule entries without literals carry no
    /// constraint and are dropped.
    #[must_use]
    pub fn initialize(rules: &RuleSet, board: &[Literal]) -> Self {
        let mut clauses = Vec::with_capacity(rules.len() + board.len());
        clauses.extend(rules.iter().filter(|c| !c.is_empty()).cloned());

        let dropped = rules.len() - clauses.len();
        if dropped > 0 {
            log::debug!("Dropped {dropped} empty rule entries");
        }

        clauses.extend(board.iter().copied().map(Clause::unit));

        log::debug!(
            "Initialized formula with {} rule clauses and {} board facts",
            rules.len() - dropped,
            board.len()
        );

        Self { clauses }
    }

    /// Removes one occurrence of every listed clause. Clauses that are no
    /// longer present are skipped. Returns the number actually removed.
    pub fn remove(&mut self, clauses: &[Clause]) -> usize {
        let mut removed = 0;
        for clause in clauses {
            if let Some(pos) = self.clauses.iter().position(|c| c == clause) {
                self.clauses.remove(pos);
                removed += 1;
            }
        }
        removed
    }

    /// Drops every clause whose index is set in `marked`. `marked` must have
    /// been sized against the current clause list.
    pub(crate) fn remove_marked(&mut self, marked: &BitVec) -> usize {
        let before = self.clauses.len();
        let mut idx = 0;
        self.clauses.retain(|_| {
            let keep = !marked.get(idx).unwrap_or(false);
            idx += 1;
            keep
        });
        before - self.clauses.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn unit_clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| c.is_unit())
    }

    /// All literals of all clauses, in clause order.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.clauses.iter().flat_map(|c| c.iter().copied())
    }

    #[must_use]
    pub fn propositions(&self) -> FxHashSet<Proposition> {
        self.literals().map(Literal::proposition).collect()
    }
}

impl FromIterator<Clause> for Cnf {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<RuleSet> for Cnf {
    fn from(rules: RuleSet) -> Self {
        Self::initialize(&rules, &[])
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
