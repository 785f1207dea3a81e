use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use super::algorithm::{GameOfLifeAlgorithm, StepError};
use super::cell_state::CellState;
use super::coordinate::Coordinate;
use super::naive::NaiveCellState;
use super::rule::next_state;

/// Sparse rule evaluation: only alive cells and their neighbours are visited
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveAlgorithm;

/// Same as [`NaiveAlgorithm`] with neighbour counts folded across rayon workers
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelNaiveAlgorithm;

fn count_neighbors(
    mut counts: HashMap<Coordinate, u8>,
    cell: Coordinate,
    generation: u32,
) -> Result<HashMap<Coordinate, u8>, StepError> {
    let neighbors = cell
        .neighbors()
        .ok_or(StepError::CoordinateOverflow { generation })?;
    for neighbor in neighbors {
        *counts.entry(neighbor).or_insert(0) += 1;
    }
    Ok(counts)
}

fn merge_counts(
    mut a: HashMap<Coordinate, u8>,
    mut b: HashMap<Coordinate, u8>,
) -> HashMap<Coordinate, u8> {
    if a.len() < b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    for (cell, n) in b {
        *a.entry(cell).or_insert(0) += n;
    }
    a
}

/// One generation over the flat set
pub fn step(alive: &HashSet<Coordinate>, generation: u32) -> Result<HashSet<Coordinate>, StepError> {
    let counts = alive
        .iter()
        .try_fold(HashMap::with_capacity(alive.len() * 4), |counts, &cell| {
            count_neighbors(counts, cell, generation)
        })?;

    // Alive cells with no neighbours never show up in `counts`; they die anyway
    Ok(counts
        .into_iter()
        .filter(|(cell, n)| next_state(alive.contains(cell), *n))
        .map(|(cell, _)| cell)
        .collect())
}

/// One generation over the flat set, in parallel
pub fn step_parallel(
    alive: &HashSet<Coordinate>,
    generation: u32,
) -> Result<HashSet<Coordinate>, StepError> {
    let counts = alive
        .par_iter()
        .try_fold(HashMap::new, |counts, &cell| {
            count_neighbors(counts, cell, generation)
        })
        .try_reduce(HashMap::new, |a, b| Ok(merge_counts(a, b)))?;

    Ok(counts
        .into_par_iter()
        .filter(|(cell, n)| next_state(alive.contains(cell), *n))
        .map(|(cell, _)| cell)
        .collect())
}

fn advance_with(
    state: &CellState,
    generations: u32,
    step_fn: fn(&HashSet<Coordinate>, u32) -> Result<HashSet<Coordinate>, StepError>,
) -> Result<CellState, StepError> {
    if generations == 0 {
        return Ok(state.clone());
    }
    let mut current = state.to_naive();
    for generation in 0..generations {
        if current.is_empty() {
            break;
        }
        current = NaiveCellState::new(step_fn(current.alive_cells(), generation)?);
    }
    Ok(CellState::Naive(current))
}

impl GameOfLifeAlgorithm for NaiveAlgorithm {
    fn name(&self) -> &'static str {
        "Naive"
    }

    fn advance(&self, state: &CellState, generations: u32) -> Result<CellState, StepError> {
        advance_with(state, generations, step)
    }
}

impl GameOfLifeAlgorithm for ParallelNaiveAlgorithm {
    fn name(&self) -> &'static str {
        "Naive+Par"
    }

    fn advance(&self, state: &CellState, generations: u32) -> Result<CellState, StepError> {
        advance_with(state, generations, step_parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(i32, i32)]) -> CellState {
        coords.iter().map(|&c| Coordinate::from(c)).collect()
    }

    fn both() -> [Box<dyn GameOfLifeAlgorithm>; 2] {
        [Box::new(NaiveAlgorithm), Box::new(ParallelNaiveAlgorithm)]
    }

    #[test]
    fn test_single_cell_dies() {
        for algorithm in both() {
            let next = algorithm.advance(&cells(&[(3, -7)]), 1).unwrap();
            assert!(next.is_empty());
        }
    }

    #[test]
    fn test_block_is_still_life() {
        let block = cells(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        for algorithm in both() {
            for generations in [1, 2, 17] {
                assert_eq!(algorithm.advance(&block, generations).unwrap(), block);
            }
        }
    }

    #[test]
    fn test_blinker_oscillates() {
        let horizontal = cells(&[(-1, 0), (0, 0), (1, 0)]);
        let vertical = cells(&[(0, -1), (0, 0), (0, 1)]);
        for algorithm in both() {
            assert_eq!(algorithm.advance(&horizontal, 1).unwrap(), vertical);
            assert_eq!(algorithm.advance(&horizontal, 2).unwrap(), horizontal);
            assert_eq!(algorithm.advance(&vertical, 1).unwrap(), horizontal);
        }
    }

    #[test]
    fn test_zero_generations_is_identity() {
        let state = cells(&[(0, 0), (5, 5)]);
        for algorithm in both() {
            assert_eq!(algorithm.advance(&state, 0).unwrap(), state);
        }
    }

    #[test]
    fn test_deterministic() {
        let r_pentomino = cells(&[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)]);
        for algorithm in both() {
            let a = algorithm.advance(&r_pentomino, 40).unwrap();
            let b = algorithm.advance(&r_pentomino, 40).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let edge = cells(&[(i32::MAX, 0), (i32::MAX, 1), (i32::MAX, 2)]);
        for algorithm in both() {
            assert_eq!(
                algorithm.advance(&edge, 3),
                Err(StepError::CoordinateOverflow { generation: 0 })
            );
        }
    }
}
