#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A disjunction of literals.
//!
//! Literal order is kept exactly as given so that clauses print the way they
//! were read or generated. Order carries no meaning for satisfiability.

use crate::sat::literal::Literal;
use core::ops::Index;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    literals: SmallVec<[Literal; 4]>,
}

impl Clause {
    #[must_use]
    pub fn new(literals: &[Literal]) -> Self {
        Self {
            literals: SmallVec::from_slice(literals),
        }
    }

    #[must_use]
    pub fn unit(literal: Literal) -> Self {
        Self::new(&[literal])
    }

    #[must_use]
    pub fn binary(a: Literal, b: Literal) -> Self {
        Self::new(&[a, b])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.len() == 2
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// The literal opposite to position `index` in a binary clause.
    #[must_use]
    pub fn other(&self, index: usize) -> Option<Literal> {
        if self.is_binary() && index < 2 {
            Some(self.literals[1 - index])
        } else {
            None
        }
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self {
            literals: SmallVec::from_vec(literals),
        }
    }
}

impl From<&[Literal]> for Clause {
    fn from(literals: &[Literal]) -> Self {
        Self::new(literals)
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self {
            literals: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Literal;
    type IntoIter = std::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

/// Prints the clause as one sentinel-terminated line, e.g. `-111 -112 0`.
impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        write!(f, "{} 0", self.literals.iter().join(" "))
    }
}
