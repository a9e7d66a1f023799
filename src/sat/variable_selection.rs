#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Proposition;
use clap::ValueEnum;
use std::fmt::{self, Display};

/// Picks one literal uniformly from every literal left in `cnf` and returns
/// its proposition. `None` when the formula has no literals.
///
/// The assignment is not consulted, so the result may already be decided.
pub fn choose_branch_literal(cnf: &Cnf, rng: &mut fastrand::Rng) -> Option<Proposition> {
    let literals: Vec<_> = cnf.literals().collect();
    if literals.is_empty() {
        return None;
    }
    Some(literals[rng.usize(..literals.len())].proposition())
}

pub trait VariableSelection {
    /// An unassigned proposition to branch on, drawn from the clauses that
    /// the assignment does not satisfy yet.
    fn pick(&mut self, cnf: &Cnf, assignment: &Assignment) -> Option<Proposition>;
}

fn open_literals<'a>(
    cnf: &'a Cnf,
    assignment: &'a Assignment,
) -> impl Iterator<Item = Proposition> + 'a {
    cnf.iter()
        .filter(|clause| !is_satisfied(clause, assignment))
        .flat_map(Clause::iter)
        .map(|lit| lit.proposition())
        .filter(|&p| assignment.value(p).is_unassigned())
}

fn is_satisfied(clause: &Clause, assignment: &Assignment) -> bool {
    clause
        .iter()
        .any(|&lit| assignment.literal_value(lit) == Some(true))
}

#[derive(Debug, Clone)]
pub struct RandomLiteral {
    rng: fastrand::Rng,
}

impl RandomLiteral {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomLiteral {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableSelection for RandomLiteral {
    fn pick(&mut self, cnf: &Cnf, assignment: &Assignment) -> Option<Proposition> {
        let candidates: Vec<_> = open_literals(cnf, assignment).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.usize(..candidates.len())])
    }
}

/// Always the first open proposition in clause order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedOrder;

impl VariableSelection for FixedOrder {
    fn pick(&mut self, cnf: &Cnf, assignment: &Assignment) -> Option<Proposition> {
        open_literals(cnf, assignment).next()
    }
}

#[derive(Debug, Clone)]
pub enum VariableSelectionImpls {
    Random(RandomLiteral),
    Fixed(FixedOrder),
}

impl VariableSelection for VariableSelectionImpls {
    fn pick(&mut self, cnf: &Cnf, assignment: &Assignment) -> Option<Proposition> {
        match self {
            Self::Random(s) => s.pick(cnf, assignment),
            Self::Fixed(s) => s.pick(cnf, assignment),
        }
    }
}

/// Branching heuristic selectable from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum VariableSelectionType {
    /// Uniformly random open literal
    #[default]
    Random,
    /// First open literal in clause order
    Fixed,
}

impl Display for VariableSelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl VariableSelectionType {
    #[must_use]
    pub fn to_impl(self, seed: Option<u64>) -> VariableSelectionImpls {
        match self {
            Self::Random => VariableSelectionImpls::Random(
                seed.map_or_else(RandomLiteral::new, RandomLiteral::with_seed),
            ),
            Self::Fixed => VariableSelectionImpls::Fixed(FixedOrder),
        }
    }
}
