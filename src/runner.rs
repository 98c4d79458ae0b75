//! Driving loop shared by both optimizers.
//!
//! The loop pulls one snapshot per iteration and forwards it to an
//! [`Observer`]. It stops at the optimizer's iteration cap or as soon as the
//! optimizer reports it is exhausted.

use std::time::Instant;

use crate::heuristics::{AntColonySystem, SimulatedAnnealing};
use crate::random::RandomSource;
use crate::solution::{Solution, StepResult, StopReason};

/// Common stepping interface over the optimizers
pub trait Optimizer {
    fn name(&self) -> &str;
    fn max_iterations(&self) -> usize;
    /// Perform one iteration; `None` means the optimizer stopped itself.
    fn advance(&mut self) -> Option<StepResult>;
    fn best_path(&self) -> &[usize];
    fn best_cost(&self) -> f64;
    fn iteration(&self) -> usize;
}

impl<R: RandomSource> Optimizer for AntColonySystem<R> {
    fn name(&self) -> &str {
        "ACS"
    }

    fn max_iterations(&self) -> usize {
        self.config().max_iterations
    }

    fn advance(&mut self) -> Option<StepResult> {
        Some(self.step())
    }

    fn best_path(&self) -> &[usize] {
        AntColonySystem::best_path(self)
    }

    fn best_cost(&self) -> f64 {
        AntColonySystem::best_cost(self)
    }

    fn iteration(&self) -> usize {
        AntColonySystem::iteration(self)
    }
}

impl<R: RandomSource> Optimizer for SimulatedAnnealing<R> {
    fn name(&self) -> &str {
        "SA-MC"
    }

    fn max_iterations(&self) -> usize {
        self.config().max_iterations
    }

    fn advance(&mut self) -> Option<StepResult> {
        self.step()
    }

    fn best_path(&self) -> &[usize] {
        SimulatedAnnealing::best_path(self)
    }

    fn best_cost(&self) -> f64 {
        SimulatedAnnealing::best_cost(self)
    }

    fn iteration(&self) -> usize {
        SimulatedAnnealing::iteration(self)
    }
}

/// Receives the snapshots produced by the driving loop
pub trait Observer {
    fn on_step(&mut self, algorithm: &str, step: &StepResult);

    fn on_finish(&mut self, _solution: &Solution) {}
}

/// Ignores everything
#[derive(Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_step(&mut self, _algorithm: &str, _step: &StepResult) {}
}

/// Logs every `every`-th snapshot at info level
#[derive(Debug)]
pub struct LogObserver {
    every: usize,
}

impl LogObserver {
    pub fn new(every: usize) -> Self {
        LogObserver { every: every.max(1) }
    }
}

impl Observer for LogObserver {
    fn on_step(&mut self, algorithm: &str, step: &StepResult) {
        if step.iteration % self.every == 0 {
            log::info!(
                "{} iteration {}: best distance {:.2}",
                algorithm,
                step.iteration,
                step.best_cost
            );
        }
    }

    fn on_finish(&mut self, solution: &Solution) {
        log::info!(
            "{} finished after {} iterations ({}): {:.2}",
            solution.algorithm,
            solution.iterations,
            solution.stop_reason,
            solution.cost
        );
    }
}

/// Records the best-cost trajectory
#[derive(Debug, Default)]
pub struct HistoryObserver {
    pub costs: Vec<f64>,
}

impl Observer for HistoryObserver {
    fn on_step(&mut self, _algorithm: &str, step: &StepResult) {
        self.costs.push(step.best_cost);
    }
}

/// Step `optimizer` until its iteration cap or until it stops itself.
pub fn run<P, O>(optimizer: &mut P, observer: &mut O) -> Solution
where
    P: Optimizer + ?Sized,
    O: Observer + ?Sized,
{
    let start = Instant::now();
    let mut stop_reason = StopReason::IterationLimit;

    for _ in 0..optimizer.max_iterations() {
        match optimizer.advance() {
            Some(step) => observer.on_step(optimizer.name(), &step),
            None => {
                stop_reason = StopReason::Stagnation;
                break;
            }
        }
    }

    let solution = Solution {
        tour: optimizer.best_path().to_vec(),
        cost: optimizer.best_cost(),
        algorithm: optimizer.name().to_string(),
        computation_time: start.elapsed().as_secs_f64(),
        iterations: optimizer.iteration(),
        stop_reason,
    };

    observer.on_finish(&solution);
    solution
}
