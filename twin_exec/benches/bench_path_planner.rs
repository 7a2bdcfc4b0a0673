//! # Path Planner Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use twin_lib::{
    env::{Cell, EnvParams, Environment},
    nav::{PathPlanner, PathPlannerParams},
};

fn path_planner_benchmark(c: &mut Criterion) {
    // ---- Build a random obstacle field ----

    let mut env = Environment::new(40, 40, EnvParams::default()).unwrap();
    env.set_start_and_goals(
        Some(Cell::new(1, 1)),
        vec![Cell::new(38, 38), Cell::new(38, 1), Cell::new(20, 30)],
    )
    .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    env.randomly_assign_obstacles(0.15, &mut rng);

    let planner = PathPlanner::new(PathPlannerParams::default());
    let start = env.start();
    let goals = env.goals().to_vec();

    // Clearance of the rover's axle width
    let width = 0.102 / env.tile_size_m();

    c.bench_function("PathPlanner::plan", |b| {
        b.iter(|| planner.plan(&env, start, &goals, width))
    });

    c.bench_function("PathPlanner::line_of_sight", |b| {
        b.iter(|| planner.line_of_sight(&env, Cell::new(1, 1), Cell::new(38, 38), width))
    });
}

criterion_group!(benches, path_planner_benchmark);
criterion_main!(benches);
