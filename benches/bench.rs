use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use sudoku_sat::sat::dpll::Dpll;
use sudoku_sat::sat::propagation::UnitPropagator;
use sudoku_sat::sat::variable_selection::{FixedOrder, RandomLiteral};
use sudoku_sat::sudoku::solver::{
    Board, EXAMPLE_NINE, EXAMPLE_SIXTEEN, Size, Sudoku, generate_rules,
};

fn sudoku(board: Board) -> Sudoku {
    Sudoku::new(board).expect("example boards are well formed")
}

fn bench_sudoku(c: &mut Criterion) {
    let mut group = c.benchmark_group("sudoku - encoding");
    group.bench_function("rules 9x9", |b| {
        b.iter(|| black_box(generate_rules(black_box(Size::Nine))));
    });
    group.bench_function("rules 16x16", |b| {
        b.iter(|| black_box(generate_rules(black_box(Size::Sixteen))));
    });
    group.finish();

    let nine = sudoku(Board::from(EXAMPLE_NINE));
    let sixteen = sudoku(Board::from(EXAMPLE_SIXTEEN));
    let nine_cnf = nine.to_cnf();
    let sixteen_cnf = sixteen.to_cnf();

    let mut group = c.benchmark_group("sudoku - propagation");
    group.bench_function("9x9", |b| {
        b.iter(|| {
            let mut engine = UnitPropagator::new(nine_cnf.clone());
            black_box(engine.run().is_ok());
        });
    });
    group.bench_function("16x16", |b| {
        b.iter(|| {
            let mut engine = UnitPropagator::new(sixteen_cnf.clone());
            black_box(engine.run().is_ok());
        });
    });
    group.finish();

    let mut engine = UnitPropagator::new(nine_cnf.clone());
    engine.run().expect("example is consistent");
    let propagated = engine.assignment().clone();

    let mut group = c.benchmark_group("sudoku - variable selection");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(20));
    group.bench_function("Fixed Order", |b| {
        b.iter(|| {
            let mut dpll = Dpll::new(nine_cnf.clone(), propagated.clone(), FixedOrder);
            black_box(dpll.solve());
        });
    });
    group.bench_function("Random Literal", |b| {
        b.iter(|| {
            let mut dpll = Dpll::new(
                nine_cnf.clone(),
                propagated.clone(),
                RandomLiteral::with_seed(42),
            );
            black_box(dpll.solve());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_sudoku);
criterion_main!(benches);
