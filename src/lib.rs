//! TSP Solver Library
//!
//! Approximate solvers for the symmetric Euclidean Traveling Salesman Problem.
//!
//! # Features
//!
//! - Shared Euclidean distance model with tour evaluation
//! - Ant Colony System with per-ant pheromone deposition and optional
//!   parallel tour construction
//! - Simulated annealing Markov chain with Metropolis acceptance, geometric
//!   cooling and stagnation-based termination
//! - Step-by-step API with an observer-driven run loop
//! - Multi-seed benchmarking with CSV export
//!
//! # Example
//!
//! ```no_run
//! use tsp_meta_solver::instance::TspInstance;
//! use tsp_meta_solver::heuristics::{AcoConfig, AntColonySystem, SaConfig, SimulatedAnnealing};
//! use tsp_meta_solver::runner::{run, NoopObserver};
//!
//! let instance = TspInstance::random(37, 800, 600, 50, 42).unwrap();
//!
//! let mut aco = AntColonySystem::new(&instance, AcoConfig::default()).unwrap();
//! let step = aco.step();
//! println!("ACS iteration {}: {:.2}", step.iteration, step.best_cost);
//!
//! let mut sa = SimulatedAnnealing::new(&instance, SaConfig::default()).unwrap();
//! let solution = run(&mut sa, &mut NoopObserver);
//! println!("SA-MC: {:.2} ({})", solution.cost, solution.stop_reason);
//! ```

pub mod benchmark;
pub mod config;
pub mod distance;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod random;
pub mod runner;
pub mod solution;

pub use distance::DistanceMatrix;
pub use error::{SolverError, SolverResult};
pub use instance::{City, TspInstance};
pub use solution::{Solution, StepResult, StopReason};
