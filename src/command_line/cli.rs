#![allow(clippy::cast_precision_loss)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sudoku_sat::sat::assignment::Assignment;
use sudoku_sat::sat::cnf::{Cnf, RuleSet};
use sudoku_sat::sat::dimacs::{parse_board_file, parse_rules_file, write_rules};
use sudoku_sat::sat::dpll::{Dpll, SearchResult, SolutionStats};
use sudoku_sat::sat::literal::Literal;
use sudoku_sat::sat::propagation::{PropagationStats, UnitPropagator};
use sudoku_sat::sat::variable_selection::VariableSelectionType;
use sudoku_sat::sudoku::solver::{Board, Size, Sudoku, generate_rules};
use tikv_jemalloc_ctl::{epoch, stats};

/// Exit code for a formula shown to be satisfiable by search.
pub(crate) const EXIT_SAT: i32 = 10;
/// Exit code for a contradiction, found by propagation or by search.
pub(crate) const EXIT_UNSAT: i32 = 20;

/// Command-line interface of the propagation engine.
#[derive(Parser, Debug)]
#[command(
    name = "sudoku_sat",
    version,
    about = "Unit propagation over Sudoku CNF encodings"
)]
pub(crate) struct Cli {
    /// A directory to walk. Every `.sudoku` grid file below it is propagated.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Propagate a rule file together with a board file of given facts.
    Propagate {
        /// Rule file: a header line, then one `0`-terminated clause per line.
        #[arg(long)]
        rules: PathBuf,

        /// Board file: one literal per line.
        #[arg(long)]
        board: PathBuf,

        /// Side length used to print the resulting grid.
        #[arg(long, default_value_t = 9)]
        size: usize,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Encode a grid file with the generated Sudoku rules and propagate it.
    Sudoku {
        /// Grid file, one row per line with `0` or `.` for blanks.
        #[arg(long = "path")]
        grid: PathBuf,

        /// Also write the generated rules next to the grid as `<path>.cnf`.
        #[arg(short, long, default_value_t = false)]
        export_rules: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Write the Sudoku rules for a board size in the rule file format.
    Encode {
        #[arg(long, default_value_t = 9)]
        size: usize,

        /// Output file. Standard output if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by the top-level command and the propagation subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log at debug level, including the clause count after every pass.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Print problem, propagation and memory statistics.
    #[arg(long, default_value_t = false)]
    pub(crate) stats: bool,

    /// Print every assigned proposition.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_assignment: bool,

    /// Continue with DPLL search once propagation reaches its fixpoint.
    #[arg(long, default_value_t = false)]
    pub(crate) search: bool,

    #[arg(long, default_value_t = VariableSelectionType::Random)]
    pub(crate) variable_selection: VariableSelectionType,

    /// Seed for the random branching heuristic.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

impl CommonOptions {
    pub(crate) const fn any_debug(&self, other: &Self) -> bool {
        self.debug || other.debug
    }
}

/// What a run established about the formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Propagation reached its fixpoint without a contradiction.
    Propagated(Assignment),
    Satisfiable(Assignment),
    Unsatisfiable,
}

impl Verdict {
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Propagated(_) => 0,
            Self::Satisfiable(_) => EXIT_SAT,
            Self::Unsatisfiable => EXIT_UNSAT,
        }
    }

    pub(crate) const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Propagated(a) | Self::Satisfiable(a) => Some(a),
            Self::Unsatisfiable => None,
        }
    }
}

/// Everything measured during one run, for the statistics table.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunReport {
    pub(crate) parse_time: Duration,
    pub(crate) propagate_time: Duration,
    pub(crate) search_time: Option<Duration>,
    pub(crate) propositions: usize,
    pub(crate) rules: usize,
    pub(crate) facts: usize,
    pub(crate) propagation: PropagationStats,
    pub(crate) search: Option<SolutionStats>,
}

/// Propagates `facts` against `rules`, then optionally searches.
///
/// A contradiction is a verdict, not an error.
pub(crate) fn run(
    rules: &RuleSet,
    facts: &[Literal],
    common: &CommonOptions,
    report: &mut RunReport,
) -> Verdict {
    let cnf = Cnf::initialize(rules, facts);
    report.propositions = rules.num_propositions();
    report.rules = rules.len();
    report.facts = facts.len();

    let initial = common.search.then(|| cnf.clone());

    let time = Instant::now();
    let mut engine = UnitPropagator::new(cnf);
    let result = engine.run().cloned();
    report.propagate_time = time.elapsed();

    let propagation = match result {
        Ok(stats) => stats,
        Err(e) => {
            log::info!("{e}");
            report.propagation = engine.stats().clone();
            return Verdict::Unsatisfiable;
        }
    };
    report.propagation = propagation;

    let (_, assignment) = engine.into_parts();

    let Some(initial) = initial else {
        return Verdict::Propagated(assignment);
    };

    let time = Instant::now();
    let selector = common.variable_selection.to_impl(common.seed);
    log::debug!("Searching with {} variable selection", common.variable_selection);

    let mut dpll = Dpll::new(initial, assignment, selector);
    let result = dpll.solve();

    report.search_time = Some(time.elapsed());
    report.search = Some(dpll.stats());

    match result {
        SearchResult::Satisfiable(model) => Verdict::Satisfiable(model),
        SearchResult::Unsatisfiable => Verdict::Unsatisfiable,
    }
}

/// Propagates a rule file and a board file.
///
/// # Errors
///
/// If either file cannot be read or parsed, or `size` is not a board size.
pub(crate) fn solve_propagate(
    rules_path: &Path,
    board_path: &Path,
    size: usize,
    common: &CommonOptions,
) -> anyhow::Result<i32> {
    let size = Size::try_from(size)?;

    let time = Instant::now();
    let rules = parse_rules_file(rules_path)
        .with_context(|| format!("Failed to parse rules {}", rules_path.display()))?;
    let facts = parse_board_file(board_path)
        .with_context(|| format!("Failed to parse board {}", board_path.display()))?;

    let mut report = RunReport {
        parse_time: time.elapsed(),
        ..RunReport::default()
    };

    log::info!(
        "Propagating {} with {} facts from {}",
        rules_path.display(),
        facts.len(),
        board_path.display()
    );

    let verdict = run(&rules, &facts, common, &mut report);

    let n = usize::from(size);
    let blank = Sudoku::new(Board::new(vec![vec![0; n]; n]))?;
    if let Some(assignment) = verdict.assignment() {
        println!("Grid:\n{}", blank.decode(assignment));
    }

    finish(&verdict, &report, common);
    Ok(verdict.exit_code())
}

/// Propagates a grid file under the generated rules for its size.
///
/// # Errors
///
/// If the grid cannot be read or parsed, the rules cannot be exported, or
/// search returns a grid that breaks the rules.
pub(crate) fn solve_sudoku(
    path: &Path,
    export_rules: bool,
    common: &CommonOptions,
) -> anyhow::Result<i32> {
    let time = Instant::now();
    let sudoku = Sudoku::parse_file(path)
        .with_context(|| format!("Failed to parse sudoku {}", path.display()))?;

    println!("Parsed Sudoku:\n{sudoku}");

    let rules = sudoku.rules();
    let facts = sudoku.facts();

    if export_rules {
        let rules_path = PathBuf::from(format!("{}.cnf", path.display()));
        let file = File::create(&rules_path)
            .with_context(|| format!("Unable to create {}", rules_path.display()))?;
        write_rules(BufWriter::new(file), &rules)
            .with_context(|| format!("Unable to write {}", rules_path.display()))?;
        log::info!("Rules written to: {}", rules_path.display());
    }

    let mut report = RunReport {
        parse_time: time.elapsed(),
        ..RunReport::default()
    };

    log::info!("Propagating {}", path.display());
    let verdict = run(&rules, &facts, common, &mut report);

    match &verdict {
        Verdict::Propagated(assignment) => {
            let grid = sudoku.decode(assignment);
            println!("Propagated:\n{grid}");
        }
        Verdict::Satisfiable(model) => {
            let grid = sudoku.decode(model);
            anyhow::ensure!(
                grid.is_valid_solution() && grid.agrees_with(&sudoku.board),
                "search returned a grid that breaks the rules:\n{grid}"
            );
            log::info!("Verified solution");
            println!("Solution:\n{grid}");
        }
        Verdict::Unsatisfiable => println!("No solution found"),
    }

    finish(&verdict, &report, common);
    Ok(verdict.exit_code())
}

/// Writes the rules for `size` to `output`, or standard output.
///
/// # Errors
///
/// If `size` is not a board size, or the rules cannot be written.
pub(crate) fn encode(size: usize, output: Option<&Path>) -> anyhow::Result<i32> {
    let rules = generate_rules(Size::try_from(size)?);
    log::info!("Generated {} clauses for size {size}", rules.len());

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Unable to create {}", path.display()))?;
            write_rules(BufWriter::new(file), &rules)?;
            log::info!("Rules written to: {}", path.display());
        }
        None => write_rules(io::stdout().lock(), &rules)?,
    }
    Ok(0)
}

/// Propagates every `.sudoku` file below `path`. Returns the exit code of the
/// last contradiction, if any.
///
/// # Errors
///
/// If `path` is not a directory, or any grid fails as in [`solve_sudoku`].
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> anyhow::Result<i32> {
    anyhow::ensure!(
        path.is_dir(),
        "Provided path is not a directory: {}",
        path.display()
    );

    let mut code = 0;
    let mut count = 0;

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() || file_path.extension().is_none_or(|ext| ext != "sudoku") {
            log::debug!("Skipping {}", file_path.display());
            continue;
        }

        count += 1;
        if solve_sudoku(file_path, false, common)? == EXIT_UNSAT {
            code = EXIT_UNSAT;
        }
    }

    log::info!("Processed {count} sudoku files");
    Ok(code)
}

fn finish(verdict: &Verdict, report: &RunReport, common: &CommonOptions) {
    if common.print_assignment {
        if let Some(assignment) = verdict.assignment() {
            print_assignment(assignment);
        }
    }

    if common.stats {
        print_stats(report, verdict.assignment());
    }

    match verdict {
        Verdict::Propagated(_) => println!("\nUNKNOWN"),
        Verdict::Satisfiable(_) => println!("\nSATISFIABLE"),
        Verdict::Unsatisfiable => println!("\nUNSATISFIABLE"),
    }
}

pub(crate) fn print_assignment(assignment: &Assignment) {
    let literals = assignment
        .iter()
        .map(|(p, value)| Literal::new(p, value))
        .join(" ");
    println!("Assignment: {literals}");
}

/// Allocated and resident memory in MiB, when jemalloc reports them.
fn memory_usage() -> Option<(f64, f64)> {
    const MIB: f64 = 1024.0 * 1024.0;

    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((allocated as f64 / MIB, resident as f64 / MIB))
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

pub(crate) fn print_stats(report: &RunReport, assignment: Option<&Assignment>) {
    let p = &report.propagation;

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", report.parse_time.as_secs_f64()));
    stat_line("Propositions", report.propositions);
    stat_line("Rule clauses", report.rules);
    stat_line("Board facts", report.facts);

    println!("=====================[ Propagation Statistics ]======================");
    stat_line("Units bootstrapped", p.units);
    stat_line("Passes", p.passes);
    stat_line("Facts derived", p.derived);
    stat_line("Clauses removed", p.removed);
    stat_line(
        "Clauses remaining",
        p.clause_counts.last().copied().unwrap_or_default(),
    );
    if let Some(a) = assignment {
        stat_line("Propositions true", a.count_true());
        stat_line("Propositions false", a.count_false());
    }
    stat_line(
        "Propagation time (s)",
        format!("{:.3}", report.propagate_time.as_secs_f64()),
    );

    if let (Some(s), Some(time)) = (report.search, report.search_time) {
        let elapsed = time.as_secs_f64();
        println!("========================[ Search Statistics ]========================");
        stat_line_with_rate("Decisions", s.decisions, elapsed);
        stat_line_with_rate("Conflicts", s.conflicts, elapsed);
        stat_line_with_rate("Propagations", s.propagations, elapsed);
        stat_line("Max depth", s.max_depth);
        stat_line("Search time (s)", format!("{elapsed:.3}"));
    }

    if let Some((allocated, resident)) = memory_usage() {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    println!("=====================================================================");
}
