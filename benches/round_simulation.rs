use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Bencher, Criterion};
use fxhash::FxHashSet;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use snake_arena_core::{
    ai::pathing::{bfs, flood_fill},
    grid::Grid,
    types::TickInstruments,
    Controller, Features, Mode, Position, Round, RoundConfig,
};

#[derive(Debug)]
struct Instruments {}

impl TickInstruments for Instruments {
    fn observe_tick(&self, _: Duration) {}
}

fn ai_round(mode: Mode, snakes: usize, features: Features, seed: u64) -> Round {
    let mut config = RoundConfig::for_mode(mode, features, snakes);
    config.controllers = vec![Controller::Ai; snakes];
    config.seed = Some(seed);
    Round::new(config).expect("the default grid fits every mode")
}

fn bench_rounds(b: &mut Bencher, mode: Mode, snakes: usize, features: Features) {
    b.iter_custom(|iter_count| {
        let instruments = Instruments {};
        let mut rng = SmallRng::seed_from_u64(1);
        let mut round = ai_round(mode, snakes, features, rng.gen());
        let mut total_ticks = 0;

        let start = Instant::now();
        while total_ticks < iter_count {
            if round.is_over() {
                round = ai_round(mode, snakes, features, rng.gen());
            }
            let interval = round.tick_interval_ms();
            black_box(round.tick_instrumented(interval, &instruments));
            total_ticks += 1;
        }
        start.elapsed()
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let mut g = c.benchmark_group("Rounds");
    g.bench_function("single ai snake", |b| {
        bench_rounds(b, Mode::Single, 1, Features::default());
    });
    g.bench_function("four ai snakes", |b| {
        bench_rounds(b, Mode::Multi, 4, Features::default());
    });
    g.bench_function("four ai snakes with obstacles, wrapping", |b| {
        bench_rounds(
            b,
            Mode::Multi,
            4,
            Features {
                no_boundary: true,
                obstacles: true,
                time_limit: false,
            },
        );
    });
    g.finish();

    let grid = Grid::new(30, 30, false);
    let blocked = (5..25)
        .map(|y| Position::new(15, y))
        .collect::<FxHashSet<_>>();
    c.bench_function("bfs across a walled board", |b| {
        b.iter(|| {
            bfs(
                black_box(&grid),
                &blocked,
                Position::new(0, 15),
                Position::new(29, 15),
            )
        })
    });
    c.bench_function("flood fill capped", |b| {
        b.iter(|| flood_fill(black_box(&grid), &blocked, Position::new(0, 15), 100))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
