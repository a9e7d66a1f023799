#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Reader and writer for the line-based rule and board files.
//!
//! Both files are plain text with one record per line, in a DIMACS-like
//! layout:
//!
//! - The first line of a rule file is a header (typically
//!   `p cnf <variables> <clauses>`) and is never part of the formula.
//! - Lines starting with `c` are comments. Blank lines are skipped.
//! - Every other rule line is a clause: whitespace-separated literals
//!   terminated by a `0` sentinel.
//! - A literal is an optional `-` followed by three digits giving row,
//!   column and value, e.g. `-112` for "cell (1, 1) does not hold 2". Digits
//!   run from 1 to 9, so this format covers boards up to 9×9.
//! - A board line holds a single given, optionally followed by the sentinel.

use crate::sat::clause::Clause;
use crate::sat::cnf::RuleSet;
use crate::sat::literal::{Literal, Proposition};
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Possible errors while reading a rule or board file. Line numbers are
/// 1-based.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("Rule input is empty, expected a header line")]
    MissingHeader,
    #[error("line {line}: Clause is not terminated by '0'")]
    MissingTerminator { line: usize },
    #[error("line {line}: Clause has no literals")]
    EmptyClause { line: usize },
    #[error("line {line}: Invalid literal '{token}'")]
    InvalidLiteral { line: usize, token: String },
    #[error("line {line}: Unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },
}

/// Parses one literal token such as `115` or `-987`.
///
/// # Errors
///
/// [`ParseError::InvalidLiteral`] unless the token is an optional `-` and
/// exactly three digits in `1..=9`.
pub fn parse_literal(token: &str, line: usize) -> Result<Literal, ParseError> {
    let invalid = || ParseError::InvalidLiteral {
        line,
        token: token.to_string(),
    };

    let (polarity, digits) = token
        .strip_prefix('-')
        .map_or((true, token), |rest| (false, rest));

    let coords: Vec<u8> = digits
        .chars()
        .map(|c| {
            c.to_digit(10)
                .filter(|&d| d != 0)
                .and_then(|d| u8::try_from(d).ok())
        })
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;

    match coords.as_slice() {
        &[row, col, value] => Ok(Literal::new(Proposition::new(row, col, value), polarity)),
        _ => Err(invalid()),
    }
}

/// Parses a single clause line. Returns `Ok(None)` for blank and comment
/// lines.
///
/// # Errors
///
/// See [`ParseError`].
pub fn parse_clause_line(text: &str, line: usize) -> Result<Option<Clause>, ParseError> {
    let mut tokens = text.split_whitespace().peekable();

    match tokens.peek() {
        None => return Ok(None),
        Some(t) if t.starts_with('c') => return Ok(None),
        Some(_) => {}
    }

    let tokens = tokens.collect_vec();
    let Some((&last, literals)) = tokens.split_last() else {
        return Ok(None);
    };

    if last != "0" {
        return Err(ParseError::MissingTerminator { line });
    }
    if literals.is_empty() {
        return Err(ParseError::EmptyClause { line });
    }

    literals
        .iter()
        .map(|t| parse_literal(t, line))
        .collect::<Result<Clause, _>>()
        .map(Some)
}

/// Reads a rule set. The first line is kept as the header.
///
/// # Errors
///
/// See [`ParseError`]. Parsing stops at the first malformed line.
pub fn parse_rules<R: BufRead>(reader: R) -> Result<RuleSet, ParseError> {
    let mut lines = reader.lines();

    let header = lines.next().ok_or(ParseError::MissingHeader)??;
    let mut clauses = Vec::new();

    for (idx, text) in lines.enumerate() {
        let text = text?;
        if let Some(clause) = parse_clause_line(&text, idx + 2)? {
            clauses.push(clause);
        }
    }

    log::debug!("Parsed {} rule clauses", clauses.len());
    Ok(RuleSet::new(clauses).with_header(header.trim()))
}

/// Reads the board's given facts, one unit literal per line.
///
/// # Errors
///
/// See [`ParseError`]. A line with anything other than one literal and an
/// optional trailing `0` is rejected.
pub fn parse_board<R: BufRead>(reader: R) -> Result<Vec<Literal>, ParseError> {
    let mut facts = Vec::new();

    for (idx, text) in reader.lines().enumerate() {
        let text = text?;
        let line = idx + 1;
        let tokens = text.split_whitespace().collect_vec();

        match tokens.as_slice() {
            [] => {}
            [first, ..] if first.starts_with('c') => {}
            [lit] | [lit, "0"] => facts.push(parse_literal(lit, line)?),
            [_, extra, ..] => {
                return Err(ParseError::UnexpectedToken {
                    line,
                    token: (*extra).to_string(),
                });
            }
        }
    }

    log::debug!("Parsed {} board facts", facts.len());
    Ok(facts)
}

/// Opens and parses a rule file.
///
/// # Errors
///
/// [`ParseError::Io`] if the file cannot be opened, otherwise as
/// [`parse_rules`].
pub fn parse_rules_file(path: &Path) -> Result<RuleSet, ParseError> {
    let file = File::open(path)?;
    parse_rules(BufReader::new(file))
}

/// Opens and parses a board file.
///
/// # Errors
///
/// [`ParseError::Io`] if the file cannot be opened, otherwise as
/// [`parse_board`].
pub fn parse_board_file(path: &Path) -> Result<Vec<Literal>, ParseError> {
    let file = File::open(path)?;
    parse_board(BufReader::new(file))
}

/// Writes `rules` in the format read by [`parse_rules`], with a
/// `p cnf <variables> <clauses>` header. `<variables>` is the highest
/// DIMACS index of any proposition on the smallest board that holds them
/// all, so a full rule set for a 9×9 board reports 729.
///
/// # Errors
///
/// Any error from `writer`, or [`io::ErrorKind::InvalidInput`] if a
/// coordinate does not fit in a single digit.
pub fn write_rules<W: Write>(mut writer: W, rules: &RuleSet) -> io::Result<()> {
    if let Some(lit) = rules.iter().flat_map(Clause::iter).find(|lit| {
        let p = lit.proposition();
        p.row > 9 || p.col > 9 || p.value > 9
    }) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("literal {lit} cannot be written with single-digit coordinates"),
        ));
    }

    writeln!(writer, "p cnf {} {}", num_variables(rules), rules.len())?;
    for clause in rules.iter() {
        writeln!(writer, "{clause}")?;
    }
    writer.flush()
}

fn num_variables(rules: &RuleSet) -> usize {
    let propositions = || rules.iter().flat_map(Clause::iter).map(|lit| lit.proposition());

    let size = propositions()
        .map(|p| p.row.max(p.col).max(p.value))
        .max()
        .map_or(0, usize::from);

    propositions().map(|p| p.encode(size)).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn p(row: u8, col: u8, value: u8) -> Proposition {
        Proposition::new(row, col, value)
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("115", 1).unwrap(), p(1, 1, 5).positive());
        assert_eq!(parse_literal("-987", 1).unwrap(), p(9, 8, 7).negative());
    }

    #[test]
    fn test_parse_literal_rejects_malformed() {
        for token in ["", "-", "11", "1111", "1a1", "101", "--111", "+111"] {
            assert!(
                matches!(parse_literal(token, 4), Err(ParseError::InvalidLiteral { line: 4, .. })),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rules() {
        let content = "p cnf 729 3\n\
                       c comment\n\
                       -111 -211 0\n\
                       \n\
                       -111 -121 0\n\
                       111 112 113 0\n";
        let rules = parse_rules(Cursor::new(content)).unwrap();

        assert_eq!(rules.header.as_deref(), Some("p cnf 729 3"));
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.clauses[0],
            Clause::binary(p(1, 1, 1).negative(), p(2, 1, 1).negative())
        );
        assert_eq!(rules.clauses[2].len(), 3);
    }

    #[test]
    fn test_parse_rules_discards_first_line_even_if_clause_like() {
        let rules = parse_rules(Cursor::new("111 0\n-111 0\n")).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.clauses[0], Clause::unit(p(1, 1, 1).negative()));
    }

    #[test]
    fn test_parse_rules_empty_input() {
        assert!(matches!(
            parse_rules(Cursor::new("")),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn test_parse_rules_reports_line_numbers() {
        let err = parse_rules(Cursor::new("p cnf 1 1\n111 0\n-111 -121\n")).unwrap_err();
        assert!(matches!(err, ParseError::MissingTerminator { line: 3 }));
        assert_eq!(err.to_string(), "line 3: Clause is not terminated by '0'");

        let err = parse_rules(Cursor::new("p\n0\n")).unwrap_err();
        assert!(matches!(err, ParseError::EmptyClause { line: 2 }));

        let err = parse_rules(Cursor::new("p\n111 abc 0\n")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidLiteral { line: 2, ref token } if token == "abc"));
    }

    #[test]
    fn test_parse_board() {
        let board = parse_board(Cursor::new("115 0\n\n-223 0\n338\n")).unwrap();
        assert_eq!(
            board,
            vec![p(1, 1, 5).positive(), p(2, 2, 3).negative(), p(3, 3, 8).positive()]
        );
    }

    #[test]
    fn test_parse_board_rejects_extra_tokens() {
        let err = parse_board(Cursor::new("115 0\n116 117 0\n")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { line: 2, ref token } if token == "117"));
    }

    #[test]
    fn test_write_then_read() {
        let rules = RuleSet::new(vec![
            Clause::binary(p(1, 1, 1).negative(), p(2, 1, 1).negative()),
            Clause::new(&[p(1, 1, 1).positive(), p(1, 1, 2).positive()]),
        ]);
        let mut buf = Vec::new();
        write_rules(&mut buf, &rules).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        // 211 is the highest index on a 2x2 board
        assert!(text.starts_with("p cnf 5 2\n"));

        let parsed = parse_rules(Cursor::new(buf)).unwrap();
        assert_eq!(parsed.clauses, rules.clauses);
    }

    #[test]
    fn test_header_counts_dimacs_variables() {
        let rules = RuleSet::new(vec![Clause::binary(p(1, 1, 1).negative(), p(4, 4, 4).negative())]);
        let mut buf = Vec::new();
        write_rules(&mut buf, &rules).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().next(), Some("p cnf 64 1"));
    }

    #[test]
    fn test_write_rejects_wide_coordinates() {
        let rules = RuleSet::new(vec![Clause::unit(p(10, 1, 1).positive())]);
        let err = write_rules(Vec::new(), &rules).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
