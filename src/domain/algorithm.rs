//! Step algorithm selection.
//!
//! Every algorithm implements [`GameOfLifeAlgorithm`] so the evolution driver
//! and the benchmark can swap them freely. Implementations must agree
//! cell-for-cell on every input.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cell_state::CellState;
use super::hashlife_algorithm::HashLifeAlgorithm;
use super::naive_algorithm::{NaiveAlgorithm, ParallelNaiveAlgorithm};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("generation {generation} of the batch would place alive cells outside the i32 plane")]
    CoordinateOverflow { generation: u32 },
}

/// Advances a cell state by whole generations under B3/S23
pub trait GameOfLifeAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply `generations` generations in order. Zero returns the input.
    fn advance(&self, state: &CellState, generations: u32) -> Result<CellState, StepError>;
}

/// Available step algorithms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Sparse neighbour counting over the flat set, serial
    Naive,
    /// Sparse neighbour counting, counts folded in parallel with rayon
    NaiveParallel,
    /// Memoized quadtree evaluation
    #[default]
    #[serde(rename = "hashlife")]
    HashLife,
}

impl Algorithm {
    pub fn all() -> Vec<Algorithm> {
        vec![Algorithm::Naive, Algorithm::NaiveParallel, Algorithm::HashLife]
    }

    /// Display name for the viewer HUD
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Naive => "Naive",
            Algorithm::NaiveParallel => "Naive+Par",
            Algorithm::HashLife => "HashLife",
        }
    }

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::Naive => "naive",
            Algorithm::NaiveParallel => "naive-parallel",
            Algorithm::HashLife => "hashlife",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::Naive => "Hash set of alive cells, serial neighbour counts",
            Algorithm::NaiveParallel => "Hash set of alive cells, parallel neighbour counts",
            Algorithm::HashLife => "Hash-consed quadtree with memoized successors",
        }
    }

    /// Cycle to the next algorithm, wrapping around
    pub fn next(&self) -> Algorithm {
        let all = Self::all();
        let index = all.iter().position(|a| a == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }

    /// Instantiate the algorithm. `max_cache_entries` bounds the HashLife node table.
    pub fn build(&self, max_cache_entries: usize) -> Arc<dyn GameOfLifeAlgorithm> {
        match self {
            Algorithm::Naive => Arc::new(NaiveAlgorithm),
            Algorithm::NaiveParallel => Arc::new(ParallelNaiveAlgorithm),
            Algorithm::HashLife => Arc::new(HashLifeAlgorithm::new(max_cache_entries)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm `{0}` (expected naive, naive-parallel or hashlife)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|a| a.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}
