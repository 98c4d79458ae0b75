//! Metaheuristics for the TSP.
//!
//! This module exports the Ant Colony System and the simulated annealing
//! Markov chain. Both share the instance's distance matrix and nothing else.

pub mod aco;
pub mod annealing;

pub use aco::*;
pub use annealing::*;

use crate::error::{SolverError, SolverResult};

/// Smallest instance the optimizers accept.
pub const MIN_TOUR_CITIES: usize = 3;

pub(crate) fn check_city_count(n: usize) -> SolverResult<()> {
    if n < MIN_TOUR_CITIES {
        return Err(SolverError::DegenerateInput {
            found: n,
            required: MIN_TOUR_CITIES,
        });
    }
    Ok(())
}
