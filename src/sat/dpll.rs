#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! DPLL search on top of a propagated assignment.
//!
//! Propagation alone can leave a Sudoku formula undecided. `Dpll` finishes the
//! job with chronological backtracking:
//!
//! 1.  **Unit search:** every clause is evaluated under the current
//!     assignment. A clause with all literals false is a conflict; a clause
//!     with one unassigned literal and no true literal forces that literal.
//!     This repeats until nothing changes.
//! 2.  **Decision:** the selector names an open proposition, which is tried
//!     true first.
//! 3.  **Backtracking:** on conflict the latest decision level is undone
//!     through the [`Trail`] and the decision is retried negated. A level
//!     whose decision was already flipped is undone as well.
//!
//! Search never runs implicitly. Callers hand it the *initial* formula
//! together with the assignment produced by propagation, because propagation
//! consumes clauses it could not fully use.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::{FixedOrder, VariableSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    pub decisions: usize,
    pub conflicts: usize,
    pub propagations: usize,
    /// Deepest decision level reached.
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Satisfiable(Assignment),
    Unsatisfiable,
}

impl SearchResult {
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseState {
    Satisfied,
    Falsified,
    Unit(Literal),
    Open,
}

fn evaluate(clause: &Clause, assignment: &Assignment) -> ClauseState {
    let mut unassigned = None;
    let mut open = 0;

    for &lit in clause {
        match assignment.literal_value(lit) {
            Some(true) => return ClauseState::Satisfied,
            Some(false) => {}
            None => {
                open += 1;
                unassigned = Some(lit);
            }
        }
    }

    match (open, unassigned) {
        (0, _) => ClauseState::Falsified,
        (1, Some(lit)) => ClauseState::Unit(lit),
        _ => ClauseState::Open,
    }
}

/// Marker for a falsified clause found by unit search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Conflict;

#[derive(Debug, Clone)]
pub struct Dpll<V: VariableSelection = FixedOrder> {
    pub cnf: Cnf,
    pub assignment: Assignment,
    pub trail: Trail,
    pub selector: V,
    stats: SolutionStats,
}

impl<V: VariableSelection> Dpll<V> {
    /// `assignment` is taken as level-0 knowledge and is never undone.
    #[must_use]
    pub fn new(cnf: Cnf, assignment: Assignment, selector: V) -> Self {
        Self {
            cnf,
            assignment,
            trail: Trail::new(),
            selector,
            stats: SolutionStats::default(),
        }
    }

    pub fn solve(&mut self) -> SearchResult {
        loop {
            if self.unit_search().is_err() {
                self.stats.conflicts += 1;
                if !self.backtrack() {
                    log::debug!("Search exhausted after {} conflicts", self.stats.conflicts);
                    return SearchResult::Unsatisfiable;
                }
                continue;
            }

            let Some(proposition) = self.selector.pick(&self.cnf, &self.assignment) else {
                // every clause is satisfied: open clauses always offer a proposition
                log::debug!(
                    "Search finished after {} decisions and {} conflicts",
                    self.stats.decisions,
                    self.stats.conflicts
                );
                return SearchResult::Satisfiable(self.assignment.clone());
            };

            self.stats.decisions += 1;
            self.decide(proposition.positive(), Reason::Decision);
        }
    }

    #[must_use]
    pub const fn stats(&self) -> SolutionStats {
        self.stats
    }

    fn decide(&mut self, lit: Literal, reason: Reason) {
        self.trail.decide(lit, reason);
        // a decision is only ever made on an unassigned proposition
        let _ = self.assignment.assign(lit);
        self.stats.max_depth = self.stats.max_depth.max(self.trail.decision_level());
    }

    fn unit_search(&mut self) -> Result<(), Conflict> {
        loop {
            let mut changed = false;

            for clause in self.cnf.iter() {
                match evaluate(clause, &self.assignment) {
                    ClauseState::Satisfied | ClauseState::Open => {}
                    ClauseState::Falsified => return Err(Conflict),
                    ClauseState::Unit(lit) => {
                        if self.assignment.assign(lit).is_err() {
                            return Err(Conflict);
                        }
                        self.trail.push(lit, Reason::Propagated);
                        self.stats.propagations += 1;
                        changed = true;
                    }
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// Undoes levels until one whose decision can still be flipped. Returns
    /// `false` when the search space is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(step) = self.trail.backtrack(&mut self.assignment) {
            if step.reason == Reason::Decision {
                self.decide(step.lit.negated(), Reason::Flipped);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Proposition;
    use crate::sat::variable_selection::RandomLiteral;

    fn p(col: u8) -> Proposition {
        Proposition::new(1, col, 1)
    }

    fn satisfies(cnf: &Cnf, assignment: &Assignment) -> bool {
        cnf.iter()
            .all(|c| c.iter().any(|&l| assignment.literal_value(l) == Some(true)))
    }

    #[test]
    fn test_evaluate() {
        let clause = Clause::binary(p(1).negative(), p(2).positive());
        let mut a = Assignment::new();
        assert_eq!(evaluate(&clause, &a), ClauseState::Open);

        a.assign(p(1).positive()).unwrap();
        assert_eq!(evaluate(&clause, &a), ClauseState::Unit(p(2).positive()));

        a.assign(p(2).negative()).unwrap();
        assert_eq!(evaluate(&clause, &a), ClauseState::Falsified);
    }

    #[test]
    fn test_sat_requires_branching() {
        // exactly one of three
        let cnf = Cnf::new(vec![
            Clause::new(&[p(1).positive(), p(2).positive(), p(3).positive()]),
            Clause::binary(p(1).negative(), p(2).negative()),
            Clause::binary(p(1).negative(), p(3).negative()),
            Clause::binary(p(2).negative(), p(3).negative()),
        ]);

        let mut dpll = Dpll::new(cnf.clone(), Assignment::new(), FixedOrder);
        let SearchResult::Satisfiable(model) = dpll.solve() else {
            panic!("expected a model");
        };
        assert!(satisfies(&cnf, &model));
        assert_eq!(model.count_true(), 1);
        assert!(dpll.stats().decisions >= 1);
    }

    #[test]
    fn test_unsat_after_backtracking() {
        // every combination of two propositions is excluded
        let cnf = Cnf::new(vec![
            Clause::binary(p(1).positive(), p(2).positive()),
            Clause::binary(p(1).positive(), p(2).negative()),
            Clause::binary(p(1).negative(), p(2).positive()),
            Clause::binary(p(1).negative(), p(2).negative()),
        ]);

        let mut dpll = Dpll::new(cnf, Assignment::new(), RandomLiteral::with_seed(3));
        assert_eq!(dpll.solve(), SearchResult::Unsatisfiable);
        assert!(dpll.stats().conflicts >= 2);
    }

    #[test]
    fn test_seed_assignment_is_kept() {
        let cnf = Cnf::new(vec![Clause::binary(p(1).positive(), p(2).positive())]);
        let seed: Assignment = [p(1).negative()].into_iter().collect();

        let mut dpll = Dpll::new(cnf, seed, FixedOrder);
        let SearchResult::Satisfiable(model) = dpll.solve() else {
            panic!("expected a model");
        };
        assert_eq!(model.literal_value(p(1).negative()), Some(true));
        assert_eq!(model.literal_value(p(2).positive()), Some(true));
        assert_eq!(dpll.stats().decisions, 0);
    }

    #[test]
    fn test_conflicting_seed_is_unsat() {
        let cnf = Cnf::new(vec![Clause::unit(p(1).positive())]);
        let seed: Assignment = [p(1).negative()].into_iter().collect();

        let mut dpll = Dpll::new(cnf, seed, FixedOrder);
        assert_eq!(dpll.solve(), SearchResult::Unsatisfiable);
    }
}
