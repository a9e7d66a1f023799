#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! # `sudoku_sat`
//!
//! Command-line front end for Sudoku unit propagation. A puzzle is encoded as
//! a CNF formula over propositions `rcv` ("cell (r, c) holds v"), its givens
//! are added as unit clauses, and unit propagation runs to a fixpoint. The
//! remaining formula can optionally be handed to a DPLL search.
//!
//! ## Usage
//!
//! ```sh
//! # Propagate every *.sudoku grid below a directory
//! sudoku_sat puzzles/
//!
//! # Propagate a rule file against a board file of givens
//! sudoku_sat propagate --rules sudoku-rules.txt --board board.txt --stats
//!
//! # Propagate a grid, export its rules and finish with search
//! sudoku_sat sudoku --path puzzle.sudoku --export-rules --search
//!
//! # Write the rules for a 4x4 board
//! sudoku_sat encode --size 4 --output rules4.cnf
//! ```
//!
//! Logging goes to stderr at `info` level, or `debug` with `--debug`. The
//! `SUDOKU_SAT_LOG` environment variable takes an `env_logger` filter and
//! overrides both.
//!
//! The exit code is 20 when a contradiction is found, 10 when search finds a
//! model and 0 otherwise.

use crate::command_line::cli::{
    Cli, Commands, CommonOptions, encode, solve_dir, solve_propagate, solve_sudoku,
};
use clap::{CommandFactory, Parser};
use env_logger::Builder;
use log::LevelFilter;
use std::env;

mod command_line;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            log::error!("{err:#}");
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging(debug: bool) {
    let mut builder = Builder::new();
    builder
        .format_timestamp(None)
        .filter(None, if debug { LevelFilter::Debug } else { LevelFilter::Info });

    if let Ok(ref filters) = env::var("SUDOKU_SAT_LOG") {
        builder.parse_filters(filters);
    }

    builder.init();
}

fn main_with_err() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let debug = match &cli.command {
        Some(
            Commands::Propagate { common, .. } | Commands::Sudoku { common, .. },
        ) => common.any_debug(&cli.common),
        _ => cli.common.debug,
    };
    init_logging(debug);

    match cli.command {
        Some(Commands::Propagate {
            rules,
            board,
            size,
            common,
        }) => solve_propagate(&rules, &board, size, &merge(&cli.common, common)),
        Some(Commands::Sudoku {
            grid,
            export_rules,
            common,
        }) => solve_sudoku(&grid, export_rules, &merge(&cli.common, common)),
        Some(Commands::Encode { size, output }) => encode(size, output.as_deref()),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(0)
        }
        None => match cli.path {
            Some(path) => solve_dir(&path, &cli.common),
            None => {
                Cli::command().print_help()?;
                Ok(1)
            }
        },
    }
}

/// Flags given before the subcommand apply as well as those given after it.
fn merge(global: &CommonOptions, local: CommonOptions) -> CommonOptions {
    CommonOptions {
        debug: global.debug || local.debug,
        stats: global.stats || local.stats,
        print_assignment: global.print_assignment || local.print_assignment,
        search: global.search || local.search,
        seed: local.seed.or(global.seed),
        ..local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_sat::sat::variable_selection::VariableSelectionType;

    #[test]
    fn test_merge_prefers_either_flag() {
        let global = CommonOptions {
            stats: true,
            seed: Some(1),
            ..CommonOptions::default()
        };
        let local = CommonOptions {
            search: true,
            variable_selection: VariableSelectionType::Fixed,
            ..CommonOptions::default()
        };

        let merged = merge(&global, local);
        assert!(merged.stats);
        assert!(merged.search);
        assert_eq!(merged.seed, Some(1));
        assert_eq!(merged.variable_selection, VariableSelectionType::Fixed);
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }
}
