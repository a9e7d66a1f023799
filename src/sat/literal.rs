#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Propositions and literals over Sudoku cell-value hypotheses.
//!
//! A [`Proposition`] states "cell (`row`, `col`) holds `value`". A [`Literal`]
//! asserts or negates one proposition. Both are plain `Copy` values compared
//! field by field, so two literals only match when they talk about exactly the
//! same cell and value.

use core::ops::{Neg, Not};
use std::fmt;

/// A cell-value hypothesis. All three coordinates are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Proposition {
    pub row: u8,
    pub col: u8,
    pub value: u8,
}

impl Proposition {
    #[must_use]
    pub const fn new(row: u8, col: u8, value: u8) -> Self {
        Self { row, col, value }
    }

    /// The conventional DIMACS variable index of this proposition on a board
    /// with side length `size`.
    #[must_use]
    pub const fn encode(self, size: usize) -> usize {
        let row = self.row as usize;
        let col = self.col as usize;
        let value = self.value as usize;

        ((row - 1) * size * size + (col - 1) * size + (value - 1)) + 1
    }

    #[must_use]
    pub const fn positive(self) -> Literal {
        Literal::new(self, true)
    }

    #[must_use]
    pub const fn negative(self) -> Literal {
        Literal::new(self, false)
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.row, self.col, self.value)
    }
}

/// A proposition together with the truth value it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    proposition: Proposition,
    polarity: bool,
}

impl Literal {
    #[must_use]
    pub const fn new(proposition: Proposition, polarity: bool) -> Self {
        Self {
            proposition,
            polarity,
        }
    }

    #[must_use]
    pub const fn proposition(self) -> Proposition {
        self.proposition
    }

    /// `true` for an asserted literal, `false` for a negated one.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.polarity
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self {
            proposition: self.proposition,
            polarity: !self.polarity,
        }
    }
}

impl From<Proposition> for Literal {
    fn from(proposition: Proposition) -> Self {
        proposition.positive()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negated() {
            write!(f, "-{}", self.proposition)
        } else {
            write!(f, "{}", self.proposition)
        }
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for &Literal {
    type Output = Literal;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}
