//! Step snapshots and final run summaries.

use serde::{Deserialize, Serialize};

/// Snapshot handed to the driving loop after each iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Best tour found so far
    pub best_path: Vec<usize>,
    /// Cost of `best_path`
    pub best_cost: f64,
    /// Number of completed iterations
    pub iteration: usize,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The driving loop reached its iteration cap
    IterationLimit,
    /// The optimizer signalled it was exhausted
    Stagnation,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::IterationLimit => write!(f, "iteration limit"),
            StopReason::Stagnation => write!(f, "stagnation"),
        }
    }
}

/// Final result of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a cycle of city indices
    pub tour: Vec<usize>,
    /// Total tour length
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations performed
    pub iterations: usize,
    pub stop_reason: StopReason,
}

impl Solution {
    /// Position of a city in the tour
    pub fn position(&self, city: usize) -> Option<usize> {
        self.tour.iter().position(|&c| c == city)
    }

    /// Tour rotated so that it starts at `city`, for stable display.
    pub fn rotated_to(&self, city: usize) -> Vec<usize> {
        let mut tour = self.tour.clone();
        if let Some(pos) = self.position(city) {
            tour.rotate_left(pos);
        }
        tour
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Stopped by: {}", self.stop_reason)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}
