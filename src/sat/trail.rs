#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use core::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    /// First branch tried at a decision level.
    #[default]
    Decision,
    /// Second branch, taken after the decision was refuted. Has no alternative
    /// left.
    Flipped,
    Propagated,
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct Step {
    pub lit: Literal,
    pub decision_level: usize,
    pub reason: Reason,
}

/// Undo log for search. Level 0 holds nothing: facts that were known before
/// search started are never undone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    steps: Vec<Step>,
    level_starts: Vec<usize>,
}

impl Index<usize> for Trail {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.steps[index]
    }
}

impl Trail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.level_starts.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Opens a new decision level starting with `lit`.
    pub fn decide(&mut self, lit: Literal, reason: Reason) {
        self.level_starts.push(self.steps.len());
        self.push(lit, reason);
    }

    /// Records `lit` at the current decision level.
    pub fn push(&mut self, lit: Literal, reason: Reason) {
        self.steps.push(Step {
            lit,
            decision_level: self.decision_level(),
            reason,
        });
    }

    /// Closes the current decision level, unassigning every literal recorded
    /// on it, and returns the step that opened it. `None` at level 0.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> Option<Step> {
        let start = self.level_starts.pop()?;
        let decision = self.steps.get(start).copied();

        for step in self.steps.drain(start..).rev() {
            assignment.unassign(step.lit.proposition());
        }

        decision
    }
}
