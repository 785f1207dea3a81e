//! Throughput comparison of the step algorithms

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use temporal_life::domain::{Algorithm, CellRect, CellState, Coordinate, GameOfLifeAlgorithm, presets};

/// Milliseconds per generation, stepping `batch` generations per call
fn benchmark(algorithm: &dyn GameOfLifeAlgorithm, start: &CellState, generations: u32, batch: u32) -> Option<f64> {
    let mut state = start.clone();
    let clock = Instant::now();
    let mut done = 0;
    while done < generations {
        let n = batch.min(generations - done);
        state = match algorithm.advance(&state, n) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("{} failed: {err}", algorithm.name());
                return None;
            }
        };
        done += n;
    }
    Some(clock.elapsed().as_secs_f64() * 1000.0 / f64::from(generations))
}

fn column(ms: Option<f64>) -> String {
    ms.map_or_else(|| format!("{:>12}", "-"), |ms| format!("{ms:>12.4}"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    println!("=== Game of Life Algorithm Benchmark ===\n");

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let soup = CellState::random(
        CellRect::new(Coordinate::new(0, 0), Coordinate::new(199, 199)),
        0.35,
        &mut rng,
    );
    let fixtures = [
        ("R-pentomino", presets::r_pentomino().cell_state(), 1_000),
        ("Acorn", presets::acorn().cell_state(), 2_000),
        ("Glider gun", presets::glider_gun().cell_state(), 1_000),
        ("Soup 200x200", soup, 200),
    ];

    println!(
        "{:>14} {:>8} {:>12} {:>12} {:>12} {:>12} {:>10}",
        "Pattern", "Gens", "Naive", "Naive+Par", "HashLife", "HL batch", "Speedup"
    );
    println!("{:-<86}", "");

    for (name, start, generations) in fixtures {
        let naive = benchmark(Algorithm::Naive.build(0).as_ref(), &start, generations, 1);
        let parallel = benchmark(Algorithm::NaiveParallel.build(0).as_ref(), &start, generations, 1);
        let hashlife = benchmark(Algorithm::HashLife.build(1_000_000).as_ref(), &start, generations, 1);
        // One call for the whole run lets HashLife reuse its memo across generations
        let batched = benchmark(Algorithm::HashLife.build(1_000_000).as_ref(), &start, generations, generations);

        let speedup = match (naive, batched) {
            (Some(slow), Some(fast)) if fast > 0.0 => format!("{:>9.1}x", slow / fast),
            _ => format!("{:>10}", "-"),
        };
        println!(
            "{:>14} {:>8} {} {} {} {} {}",
            name,
            generations,
            column(naive),
            column(parallel),
            column(hashlife),
            column(batched),
            speedup
        );
    }

    println!("\n=== Final populations ===\n");
    let acorn = presets::acorn().cell_state();
    for algorithm in Algorithm::all() {
        match algorithm.build(1_000_000).advance(&acorn, 5_206) {
            Ok(state) => println!("{:<10} acorn @5206: {} cells", algorithm.name(), state.population()),
            Err(err) => println!("{:<10} acorn @5206: {err}", algorithm.name()),
        }
    }
}
