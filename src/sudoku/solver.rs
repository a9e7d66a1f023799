use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::{Cnf, RuleSet};
use crate::sat::literal::{Literal, Proposition};
use itertools::Itertools;
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SudokuError {
    #[error("Unsupported board size {0}, expected 4, 9, 16 or 25")]
    InvalidSize(usize),
    #[error("row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell ({row}, {col}) holds {value}, which exceeds the board size {size}")]
    InvalidCell {
        row: usize,
        col: usize,
        value: usize,
        size: usize,
    },
    #[error("line {line}: Invalid cell '{token}'")]
    InvalidToken { line: usize, token: String },
    #[error("Failed to read sudoku: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board(Vec<Vec<usize>>);

impl Board {
    #[must_use]
    pub const fn new(board: Vec<Vec<usize>>) -> Self {
        Self(board)
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.iter().flatten().all(|&n| n != 0)
    }

    /// Whether every row, column and box holds each value exactly once.
    #[must_use]
    pub fn is_valid_solution(&self) -> bool {
        let Ok(size) = Size::try_from(self.0.len()) else {
            return false;
        };
        let n = size as usize;
        let b = size.block_size();

        if self.0.iter().any(|row| row.len() != n) || !self.is_complete() {
            return false;
        }

        let all_distinct = |cells: Vec<usize>| cells.iter().all_unique() && cells.iter().all(|&v| v <= n);

        let rows_ok = self.0.iter().all(|row| all_distinct(row.clone()));
        let cols_ok = (0..n).all(|c| all_distinct(self.0.iter().map(|row| row[c]).collect()));
        let boxes_ok = (0..n).step_by(b).cartesian_product((0..n).step_by(b)).all(|(br, bc)| {
            all_distinct(
                (br..br + b)
                    .cartesian_product(bc..bc + b)
                    .map(|(r, c)| self.0[r][c])
                    .collect(),
            )
        });

        rows_ok && cols_ok && boxes_ok
    }

    /// Whether every given cell of `puzzle` keeps its value in `self`.
    #[must_use]
    pub fn agrees_with(&self, puzzle: &Self) -> bool {
        self.0.len() == puzzle.0.len()
            && self.0.iter().zip(&puzzle.0).all(|(mine, given)| {
                mine.len() == given.len()
                    && mine.iter().zip(given).all(|(&m, &g)| g == 0 || m == g)
            })
    }
}

impl From<Vec<Vec<usize>>> for Board {
    fn from(board: Vec<Vec<usize>>) -> Self {
        Self::new(board)
    }
}

impl From<Board> for Vec<Vec<usize>> {
    fn from(board: Board) -> Self {
        board.0
    }
}

impl<const N: usize> From<[[usize; N]; N]> for Board {
    fn from(board: [[usize; N]; N]) -> Self {
        Self::new(board.iter().map(|r| r.to_vec()).collect())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.len();
        let width = n.to_string().len();
        let block = Size::try_from(n).map_or(n.max(1), Size::block_size);

        for (r, row) in self.0.iter().enumerate() {
            if r > 0 && r % block == 0 {
                let dashes = (0..n / block)
                    .map(|_| "-".repeat(block * (width + 1) - 1))
                    .join("-+-");
                writeln!(f, "{dashes}")?;
            }

            let line = row
                .chunks(block)
                .map(|chunk| {
                    chunk
                        .iter()
                        .map(|&v| {
                            if v == 0 {
                                format!("{:>width$}", ".")
                            } else {
                                format!("{v:>width$}")
                            }
                        })
                        .join(" ")
                })
                .join(" | ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub const EXAMPLE_FOUR: [[usize; 4]; 4] = [[1, 0, 0, 4], [0, 4, 1, 0], [0, 1, 4, 0], [4, 0, 0, 1]];

pub const EXAMPLE_NINE: [[usize; 9]; 9] = [
    [5, 3, 0, 0, 7, 0, 0, 0, 0],
    [6, 0, 0, 1, 9, 5, 0, 0, 0],
    [0, 9, 8, 0, 0, 0, 0, 6, 0],
    [8, 0, 0, 0, 6, 0, 0, 0, 3],
    [4, 0, 0, 8, 0, 3, 0, 0, 1],
    [7, 0, 0, 0, 2, 0, 0, 0, 6],
    [0, 6, 0, 0, 0, 0, 2, 8, 0],
    [0, 0, 0, 4, 1, 9, 0, 0, 5],
    [0, 0, 0, 0, 8, 0, 0, 7, 9],
];

pub const EXAMPLE_SIXTEEN: [[usize; 16]; 16] = [
    [0, 11, 0, 0, 0, 2, 3, 14, 0, 0, 9, 12, 0, 0, 0, 16],
    [15, 12, 0, 0, 0, 11, 0, 1, 13, 10, 0, 0, 0, 0, 7, 2],
    [0, 0, 10, 0, 0, 0, 0, 0, 16, 11, 0, 1, 6, 4, 12, 3],
    [0, 16, 14, 1, 0, 4, 0, 6, 0, 3, 0, 15, 0, 8, 0, 0],
    [1, 6, 5, 12, 0, 0, 11, 0, 0, 9, 8, 0, 0, 0, 0, 0],
    [0, 0, 0, 7, 14, 1, 8, 0, 0, 15, 6, 0, 13, 5, 0, 4],
    [4, 15, 8, 0, 9, 13, 0, 0, 0, 0, 7, 16, 3, 0, 0, 0],
    [0, 9, 13, 0, 0, 0, 0, 15, 10, 0, 0, 0, 7, 6, 0, 11],
    [14, 0, 6, 11, 0, 0, 0, 12, 7, 0, 0, 0, 0, 3, 13, 0],
    [0, 0, 0, 5, 8, 14, 0, 0, 0, 0, 13, 11, 0, 1, 2, 6],
    [13, 0, 16, 4, 0, 15, 5, 0, 0, 1, 12, 6, 8, 0, 0, 0],
    [0, 0, 0, 0, 0, 16, 10, 0, 0, 8, 0, 0, 11, 9, 4, 5],
    [0, 0, 11, 0, 1, 0, 14, 0, 5, 0, 3, 0, 15, 7, 16, 0],
    [5, 13, 15, 3, 16, 0, 4, 7, 0, 0, 0, 0, 0, 2, 0, 0],
    [16, 1, 0, 0, 0, 0, 12, 2, 14, 0, 15, 0, 0, 0, 3, 8],
    [9, 0, 0, 0, 13, 5, 0, 0, 8, 6, 16, 0, 0, 0, 10, 0],
];

#[derive(Debug, Clone, PartialEq, Eq, Copy, PartialOrd, Ord, Hash, Default)]
pub enum Size {
    Four = 4,
    #[default]
    Nine = 9,
    Sixteen = 16,
    TwentyFive = 25,
}

impl TryFrom<usize> for Size {
    type Error = SudokuError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            9 => Ok(Self::Nine),
            16 => Ok(Self::Sixteen),
            25 => Ok(Self::TwentyFive),
            _ => Err(SudokuError::InvalidSize(value)),
        }
    }
}

impl From<Size> for usize {
    fn from(size: Size) -> Self {
        size as Self
    }
}

impl Size {
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Four => 2,
            Self::Nine => 3,
            Self::Sixteen => 4,
            Self::TwentyFive => 5,
        }
    }

    const fn side(self) -> u8 {
        self as u8
    }

    const fn block(self) -> u8 {
        self.block_size() as u8
    }
}

/// The group of cells a uniqueness constraint ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Row,
    Column,
    Box,
}

/// Negative unit clauses ruling out `cell`'s value elsewhere in one unit.
///
/// - [`UnitKind::Row`]: the same value in every other column of the row
///   (`size - 1` clauses).
/// - [`UnitKind::Column`]: the same value in every other row of the column
///   (`size - 1` clauses).
/// - [`UnitKind::Box`]: the same value at every position of the cell's box,
///   the cell's own position included (`size` clauses).
#[must_use]
pub fn encode_unit_constraints(cell: Proposition, kind: UnitKind, size: Size) -> Vec<Clause> {
    let n = size.side();
    let b = size.block();
    let Proposition { row, col, value } = cell;

    let forbid = |r: u8, c: u8| Clause::unit(Proposition::new(r, c, value).negative());

    match kind {
        UnitKind::Row => (1..=n).filter(|&c| c != col).map(|c| forbid(row, c)).collect(),
        UnitKind::Column => (1..=n).filter(|&r| r != row).map(|r| forbid(r, col)).collect(),
        UnitKind::Box => {
            let br = (row - 1) / b * b;
            let bc = (col - 1) / b * b;
            (br + 1..=br + b)
                .cartesian_product(bc + 1..=bc + b)
                .map(|(r, c)| forbid(r, c))
                .collect()
        }
    }
}

/// Pairwise "not both" clauses over a group of propositions.
fn at_most_one(props: &[Proposition], clauses: &mut Vec<Clause>) {
    clauses.extend(
        props
            .iter()
            .tuple_combinations()
            .map(|(a, b)| Clause::binary(a.negative(), b.negative())),
    );
}

fn at_least_one(props: &[Proposition], clauses: &mut Vec<Clause>) {
    clauses.push(props.iter().map(|p| p.positive()).collect());
}

fn cells(size: Size) -> impl Iterator<Item = (u8, u8)> {
    let n = size.side();
    (1..=n).cartesian_product(1..=n)
}

fn generate_cell_clauses(size: Size, clauses: &mut Vec<Clause>) {
    let n = size.side();
    for (row, col) in cells(size) {
        let props = (1..=n).map(|v| Proposition::new(row, col, v)).collect_vec();
        at_least_one(&props, clauses);
    }
    for (row, col) in cells(size) {
        let props = (1..=n).map(|v| Proposition::new(row, col, v)).collect_vec();
        at_most_one(&props, clauses);
    }
}

fn generate_row_clauses(size: Size, clauses: &mut Vec<Clause>) {
    let n = size.side();
    for (row, value) in cells(size) {
        let props = (1..=n).map(|c| Proposition::new(row, c, value)).collect_vec();
        at_most_one(&props, clauses);
    }
}

fn generate_col_clauses(size: Size, clauses: &mut Vec<Clause>) {
    let n = size.side();
    for (col, value) in cells(size) {
        let props = (1..=n).map(|r| Proposition::new(r, col, value)).collect_vec();
        at_most_one(&props, clauses);
    }
}

fn box_propositions(size: Size, box_row: u8, box_col: u8, value: u8) -> Vec<Proposition> {
    let b = size.block();
    (box_row * b + 1..=box_row * b + b)
        .cartesian_product(box_col * b + 1..=box_col * b + b)
        .map(|(r, c)| Proposition::new(r, c, value))
        .collect()
}

fn generate_block_clauses(size: Size, clauses: &mut Vec<Clause>) {
    let n = size.side();
    let b = size.block();
    for value in 1..=n {
        for (br, bc) in (0..b).cartesian_product(0..b) {
            at_most_one(&box_propositions(size, br, bc, value), clauses);
        }
    }
}

fn generate_unit_coverage_clauses(size: Size, clauses: &mut Vec<Clause>) {
    let n = size.side();
    let b = size.block();
    for (row, value) in cells(size) {
        let props = (1..=n).map(|c| Proposition::new(row, c, value)).collect_vec();
        at_least_one(&props, clauses);
    }
    for (col, value) in cells(size) {
        let props = (1..=n).map(|r| Proposition::new(r, col, value)).collect_vec();
        at_least_one(&props, clauses);
    }
    for value in 1..=n {
        for (br, bc) in (0..b).cartesian_product(0..b) {
            at_least_one(&box_propositions(size, br, bc, value), clauses);
        }
    }
}

/// The complete structural encoding of a `size`×`size` Sudoku: every cell
/// holds exactly one value and every row, column and box holds every value
/// exactly once.
#[must_use]
pub fn generate_rules(size: Size) -> RuleSet {
    let mut clauses = Vec::new();

    generate_cell_clauses(size, &mut clauses);
    generate_row_clauses(size, &mut clauses);
    generate_col_clauses(size, &mut clauses);
    generate_block_clauses(size, &mut clauses);
    generate_unit_coverage_clauses(size, &mut clauses);

    RuleSet::new(clauses)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    pub board: Board,
    pub size: Size,
}

impl Sudoku {
    /// # Errors
    ///
    /// If the board is not square with a supported side length, or a cell
    /// exceeds that length.
    pub fn new(board: Board) -> Result<Self, SudokuError> {
        let size = Size::try_from(board.0.len())?;
        let n = size as usize;

        for (r, row) in board.0.iter().enumerate() {
            if row.len() != n {
                return Err(SudokuError::RaggedRow {
                    row: r + 1,
                    expected: n,
                    found: row.len(),
                });
            }
            if let Some((c, &value)) = row.iter().find_position(|&&v| v > n) {
                return Err(SudokuError::InvalidCell {
                    row: r + 1,
                    col: c + 1,
                    value,
                    size: n,
                });
            }
        }

        Ok(Self { board, size })
    }

    /// Reads a grid: one row per line, cells separated by whitespace or
    /// written as single characters, with `0` or `.` for a blank. A single
    /// line of `size²` characters is accepted as well. Empty lines and lines
    /// starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// [`SudokuError::InvalidToken`] for an unreadable cell, otherwise as
    /// [`Sudoku::new`].
    pub fn parse(text: &str) -> Result<Self, SudokuError> {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
            .collect_vec();

        let cell = |token: &str, line: usize| -> Result<usize, SudokuError> {
            match token {
                "." | "0" => Ok(0),
                _ => token.parse().map_err(|_| SudokuError::InvalidToken {
                    line,
                    token: token.to_string(),
                }),
            }
        };

        let mut rows = Vec::with_capacity(lines.len());
        for &(line, text) in &lines {
            let row = if text.contains(char::is_whitespace) {
                text.split_whitespace()
                    .map(|t| cell(t, line))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                text.chars()
                    .map(|ch| cell(ch.encode_utf8(&mut [0; 4]), line))
                    .collect::<Result<Vec<_>, _>>()?
            };
            rows.push(row);
        }

        if let [single] = rows.as_slice() {
            if let Some(size) = [Size::Four, Size::Nine]
                .into_iter()
                .find(|&s| single.len() == (s as usize).pow(2))
            {
                let n = size as usize;
                rows = single.chunks(n).map(<[usize]>::to_vec).collect();
            }
        }

        Self::new(Board::new(rows))
    }

    /// # Errors
    ///
    /// [`SudokuError::Io`] if the file cannot be read, otherwise as
    /// [`Sudoku::parse`].
    pub fn parse_file(path: &Path) -> Result<Self, SudokuError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// One positive literal per filled cell.
    #[must_use]
    pub fn facts(&self) -> Vec<Literal> {
        let mut facts = Vec::new();
        for (r, row) in (1u8..).zip(&self.board.0) {
            for (c, &n) in (1u8..).zip(row) {
                if let Ok(value) = u8::try_from(n) {
                    if value != 0 {
                        facts.push(Proposition::new(r, c, value).positive());
                    }
                }
            }
        }
        facts
    }

    #[must_use]
    pub fn rules(&self) -> RuleSet {
        generate_rules(self.size)
    }

    #[must_use]
    pub fn to_cnf(&self) -> Cnf {
        Cnf::initialize(&self.rules(), &self.facts())
    }

    /// The board implied by `assignment`: each cell shows the value whose
    /// proposition is true, or 0 when none is.
    #[must_use]
    pub fn decode(&self, assignment: &Assignment) -> Board {
        let n = self.size.side();
        let board = (1..=n)
            .map(|row| {
                (1..=n)
                    .map(|col| {
                        (1..=n)
                            .find(|&v| assignment.value(Proposition::new(row, col, v)).is_true())
                            .map_or(0, usize::from)
                    })
                    .collect()
            })
            .collect();
        Board::new(board)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.board.0.iter()
    }
}

impl TryFrom<Board> for Sudoku {
    type Error = SudokuError;

    fn try_from(board: Board) -> Result<Self, Self::Error> {
        Self::new(board)
    }
}

impl From<Sudoku> for Board {
    fn from(sudoku: Sudoku) -> Self {
        sudoku.board
    }
}

impl fmt::Display for Sudoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::propagation::UnitPropagator;

    #[test]
    fn test_row_constraints() {
        let cell = Proposition::new(1, 1, 5);
        let clauses = encode_unit_constraints(cell, UnitKind::Row, Size::Nine);

        assert_eq!(clauses.len(), 8);
        assert!(clauses.iter().all(|c| c.is_unit() && c[0].is_negated()));
        assert!(clauses.iter().all(|c| {
            let p = c[0].proposition();
            p.row == 1 && p.value == 5 && p.col != 1
        }));
    }

    #[test]
    fn test_column_constraints() {
        let cell = Proposition::new(4, 7, 2);
        let clauses = encode_unit_constraints(cell, UnitKind::Column, Size::Nine);

        assert_eq!(clauses.len(), 8);
        assert!(clauses.iter().all(|c| {
            let p = c[0].proposition();
            p.col == 7 && p.value == 2 && p.row != 4
        }));
    }

    #[test]
    fn test_box_constraints() {
        let cell = Proposition::new(5, 6, 3);
        let clauses = encode_unit_constraints(cell, UnitKind::Box, Size::Nine);

        assert_eq!(clauses.len(), 9);
        assert!(clauses.iter().all(|c| {
            let p = c[0].proposition();
            (4..=6).contains(&p.row) && (4..=6).contains(&p.col) && p.value == 3
        }));
        assert_eq!(
            encode_unit_constraints(Proposition::new(1, 1, 1), UnitKind::Box, Size::Four).len(),
            4
        );
    }

    #[test]
    fn test_size() {
        assert_eq!(Size::try_from(9).unwrap(), Size::Nine);
        assert!(matches!(Size::try_from(10), Err(SudokuError::InvalidSize(10))));
        assert_eq!(Size::Sixteen.block_size(), 4);
        assert_eq!(usize::from(Size::TwentyFive), 25);
    }

    #[test]
    fn test_rule_count() {
        assert_eq!(generate_rules(Size::Nine).len(), 11_988);
        assert_eq!(generate_rules(Size::Nine).num_propositions(), 729);
        // 16 cells + 4 groups * 16 * 6 pairs + 3 * 16 coverage clauses
        assert_eq!(generate_rules(Size::Four).len(), 16 + 4 * 16 * 6 + 3 * 16);
    }

    #[test]
    fn test_new_rejects_bad_boards() {
        assert!(matches!(
            Sudoku::new(Board::new(vec![vec![0; 3]; 3])),
            Err(SudokuError::InvalidSize(3))
        ));

        let mut rows = vec![vec![0; 4]; 4];
        rows[2].pop();
        assert!(matches!(
            Sudoku::new(Board::new(rows)),
            Err(SudokuError::RaggedRow { row: 3, expected: 4, found: 3 })
        ));

        let mut rows = vec![vec![0; 4]; 4];
        rows[0][1] = 5;
        assert!(matches!(
            Sudoku::new(Board::new(rows)),
            Err(SudokuError::InvalidCell { row: 1, col: 2, value: 5, size: 4 })
        ));
    }

    #[test]
    fn test_parse_formats() {
        let spaced = Sudoku::parse("1 0 0 4\n0 4 1 0\n\n# comment\n0 1 4 0\n4 . . 1\n").unwrap();
        let compact = Sudoku::parse("1..4\n.41.\n.14.\n4..1\n").unwrap();
        let single = Sudoku::parse("1..4.41..14.4..1").unwrap();

        assert_eq!(spaced.board, Board::from(EXAMPLE_FOUR));
        assert_eq!(compact, spaced);
        assert_eq!(single, spaced);
        assert!(matches!(
            Sudoku::parse("1 x 0 4\n"),
            Err(SudokuError::InvalidToken { line: 1, .. })
        ));
    }

    #[test]
    fn test_facts() {
        let sudoku = Sudoku::new(Board::from(EXAMPLE_FOUR)).unwrap();
        let facts = sudoku.facts();
        assert_eq!(facts.len(), 8);
        assert_eq!(facts[0], Proposition::new(1, 1, 1).positive());
        assert_eq!(facts[1], Proposition::new(1, 4, 4).positive());
    }

    #[test]
    fn test_propagation_excludes_peers_of_givens() {
        let sudoku = Sudoku::new(Board::from(EXAMPLE_NINE)).unwrap();
        let mut engine = UnitPropagator::new(sudoku.to_cnf());
        engine.run().unwrap();
        let a = engine.assignment();

        for fact in sudoku.facts() {
            let given = fact.proposition();
            assert!(a.value(given).is_true());
            for clause in encode_unit_constraints(given, UnitKind::Row, sudoku.size) {
                assert!(a.value(clause[0].proposition()).is_false());
            }
        }

        // the restricted rule cannot fill blanks on its own
        assert!(!engine.cnf().is_empty());
        assert_eq!(sudoku.decode(a), sudoku.board);
    }

    #[test]
    fn test_board_validity() {
        let solved = Board::from([[1, 2, 3, 4], [3, 4, 1, 2], [2, 1, 4, 3], [4, 3, 2, 1]]);
        assert!(solved.is_valid_solution());
        assert!(solved.agrees_with(&Board::from(EXAMPLE_FOUR)));

        let broken = Board::from([[1, 2, 3, 4], [2, 1, 4, 3], [3, 4, 1, 2], [4, 3, 2, 1]]);
        // rows and columns fine, top-left box holds 1 twice
        assert!(!broken.is_valid_solution());
        assert!(!Board::from(EXAMPLE_FOUR).is_valid_solution());
    }

    #[test]
    fn test_display() {
        let board = Board::from(EXAMPLE_FOUR);
        assert_eq!(board.to_string(), "1 . | . 4\n. 4 | 1 .\n----+----\n. 1 | 4 .\n4 . | . 1\n");
    }
}
