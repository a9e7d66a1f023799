#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Sudoku boards and their CNF encoding.

/// Grid parsing, the constraint encoders and decoding of assignments.
pub mod solver;
