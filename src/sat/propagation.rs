#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation to a fixpoint.
//!
//! The engine works in two phases:
//!
//! 1.  **Bootstrap.** Every unit clause's literal is recorded in the
//!     assignment and all unit clauses are removed from the formula.
//! 2.  **Fixpoint.** Each pass looks at the binary clauses only. A clause
//!     that mentions a proposition which is currently true is consumed. When
//!     the literal on that true proposition is negated (so it is falsified)
//!     and the other literal is negated as well, the other literal is derived.
//!     This is exactly the "at most one of two" pattern the Sudoku rules are
//!     built from. Facts derived during a pass are merged and consumed clauses
//!     removed only once the pass is complete. Passes repeat until one leaves
//!     the clause count unchanged.
//!
//! Clauses longer than two literals are never simplified, so the engine can
//! stop with clauses left over and propositions still unassigned. Deciding
//! those needs search, see [`crate::sat::dpll`].

use crate::sat::assignment::{Assignment, ContradictionError};
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use bit_vec::BitVec;

/// What a single fixpoint pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassOutcome {
    /// Propositions newly assigned by this pass.
    pub derived: usize,
    /// Clauses consumed and removed by this pass.
    pub removed: usize,
    /// Clauses left afterwards.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropagationStats {
    /// Unit clauses recorded during bootstrap.
    pub units: usize,
    /// Fixpoint passes run, including the final one that changed nothing.
    pub passes: usize,
    pub derived: usize,
    /// Clauses removed over the whole run, unit clauses included.
    pub removed: usize,
    /// Clause count after bootstrap followed by the count after every pass.
    pub clause_counts: Vec<usize>,
}

/// Records every unit clause and removes them all from `cnf`.
///
/// Returns the number of unit clauses found.
///
/// # Errors
///
/// [`ContradictionError`] if two unit clauses, or a unit clause and an
/// existing fact, disagree on a proposition. Neither `cnf` nor `assignment`
/// is modified in that case.
pub fn bootstrap(cnf: &mut Cnf, assignment: &mut Assignment) -> Result<usize, ContradictionError> {
    let units: Vec<Clause> = cnf.unit_clauses().cloned().collect();

    let mut facts = Assignment::new();
    for clause in &units {
        facts.assign(clause[0])?;
    }
    assignment.merge(&facts)?;

    cnf.remove(&units);
    Ok(units.len())
}

/// Runs one fixpoint pass over the binary clauses of `cnf`.
///
/// # Errors
///
/// [`ContradictionError`] if a derived fact disagrees with the assignment.
/// Neither `cnf` nor `assignment` is modified in that case.
pub fn propagate_pass(
    cnf: &mut Cnf,
    assignment: &mut Assignment,
) -> Result<PassOutcome, ContradictionError> {
    let mut pending = Assignment::new();
    let mut consumed = BitVec::from_elem(cnf.len(), false);

    for (idx, clause) in cnf.iter().enumerate() {
        if !clause.is_binary() {
            continue;
        }

        for (pos, lit) in clause.iter().enumerate() {
            if !assignment.value(lit.proposition()).is_true() {
                continue;
            }

            consumed.set(idx, true);

            let Some(other) = clause.other(pos) else {
                continue;
            };

            if lit.is_negated() && other.is_negated() {
                pending.assign(other)?;
            }
        }
    }

    let derived = assignment.merge(&pending)?;
    let removed = cnf.remove_marked(&consumed);

    Ok(PassOutcome {
        derived,
        removed,
        remaining: cnf.len(),
    })
}

/// Owns a formula and its assignment for one propagation run.
#[derive(Debug, Clone, Default)]
pub struct UnitPropagator {
    cnf: Cnf,
    assignment: Assignment,
    stats: PropagationStats,
}

impl UnitPropagator {
    #[must_use]
    pub fn new(cnf: Cnf) -> Self {
        Self::with_assignment(cnf, Assignment::new())
    }

    #[must_use]
    pub fn with_assignment(cnf: Cnf, assignment: Assignment) -> Self {
        Self {
            cnf,
            assignment,
            stats: PropagationStats::default(),
        }
    }

    /// Phase A: record and drop unit clauses.
    ///
    /// # Errors
    ///
    /// See [`bootstrap`].
    pub fn bootstrap(&mut self) -> Result<usize, ContradictionError> {
        let before = self.cnf.len();
        let units = bootstrap(&mut self.cnf, &mut self.assignment)?;

        self.stats.units += units;
        self.stats.removed += before - self.cnf.len();
        self.stats.clause_counts.push(self.cnf.len());

        log::debug!(
            "Bootstrap recorded {units} unit clauses, {} clauses remain",
            self.cnf.len()
        );
        Ok(units)
    }

    /// A single Phase B pass.
    ///
    /// # Errors
    ///
    /// See [`propagate_pass`].
    pub fn step(&mut self) -> Result<PassOutcome, ContradictionError> {
        let outcome = propagate_pass(&mut self.cnf, &mut self.assignment)?;

        self.stats.passes += 1;
        self.stats.derived += outcome.derived;
        self.stats.removed += outcome.removed;
        self.stats.clause_counts.push(outcome.remaining);

        log::debug!(
            "Pass {}: derived {}, removed {}, {} clauses remain",
            self.stats.passes,
            outcome.derived,
            outcome.removed,
            outcome.remaining
        );
        Ok(outcome)
    }

    /// Phase B: repeats [`Self::step`] until the clause count stops changing.
    ///
    /// # Errors
    ///
    /// See [`propagate_pass`].
    pub fn run_to_fixpoint(&mut self) -> Result<(), ContradictionError> {
        loop {
            let before = self.cnf.len();
            let outcome = self.step()?;
            if outcome.remaining == before {
                return Ok(());
            }
        }
    }

    /// Bootstrap followed by the fixpoint loop.
    ///
    /// # Errors
    ///
    /// [`ContradictionError`] as soon as any phase finds one.
    pub fn run(&mut self) -> Result<&PropagationStats, ContradictionError> {
        self.bootstrap()?;
        self.run_to_fixpoint()?;

        log::info!(
            "Propagation reached a fixpoint after {} passes: {} propositions assigned, {} clauses remain",
            self.stats.passes,
            self.assignment.len(),
            self.cnf.len()
        );
        Ok(&self.stats)
    }

    #[must_use]
    pub const fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[must_use]
    pub const fn stats(&self) -> &PropagationStats {
        &self.stats
    }

    #[must_use]
    pub fn into_parts(self) -> (Cnf, Assignment) {
        (self.cnf, self.assignment)
    }
}
