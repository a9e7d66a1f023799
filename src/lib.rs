//! Sudoku constraint encoding and propagation over CNF formulas.

/// CNF formulas over Sudoku propositions, the propagation engine, the rule
/// and board file formats, and an optional DPLL search.
pub mod sat;

/// Board handling and the generation of Sudoku rules.
pub mod sudoku;
