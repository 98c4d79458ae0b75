//! Ant Colony System for the TSP.
//!
//! Each iteration lets a colony of ants build complete tours city by city,
//! choosing the next city with probability proportional to
//! `pheromone^alpha * (1 / distance)^beta`. Afterwards every pheromone trail
//! evaporates and each ant deposits `intensity / tour_cost` on the edges of
//! its own tour.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::{inverse_or_max, DistanceMatrix};
use crate::error::{SolverError, SolverResult};
use crate::heuristics::check_city_count;
use crate::instance::TspInstance;
use crate::random::{RandomSource, SeededRandom};
use crate::solution::StepResult;

/// Lowest value a pheromone trail can evaporate to.
pub const PHEROMONE_FLOOR: f64 = 1e-12;

/// ACO configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcoConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Iteration cap applied by the driving loop
    pub max_iterations: usize,
    /// Evaporation rate (rho), in [0, 1)
    pub evaporation_rate: f64,
    /// Pheromone deposit factor (Q)
    pub deposit_intensity: f64,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Build the ants' tours on the rayon thread pool
    pub parallel: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for AcoConfig {
    fn default() -> Self {
        AcoConfig {
            num_ants: 100,
            max_iterations: 400,
            evaporation_rate: 0.1,
            deposit_intensity: 1.0,
            alpha: 1.0,
            beta: 2.0,
            initial_pheromone: 1.0,
            parallel: false,
            seed: 42,
        }
    }
}

impl AcoConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if self.num_ants == 0 {
            return Err(SolverError::invalid_config("num_ants", self.num_ants));
        }
        if !(0.0..1.0).contains(&self.evaporation_rate) {
            return Err(SolverError::invalid_config("evaporation_rate", self.evaporation_rate));
        }
        if !(self.deposit_intensity >= 0.0 && self.deposit_intensity.is_finite()) {
            return Err(SolverError::invalid_config("deposit_intensity", self.deposit_intensity));
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(SolverError::invalid_config("alpha", self.alpha));
        }
        if !(self.beta >= 0.0 && self.beta.is_finite()) {
            return Err(SolverError::invalid_config("beta", self.beta));
        }
        if !(self.initial_pheromone > 0.0 && self.initial_pheromone.is_finite()) {
            return Err(SolverError::invalid_config("initial_pheromone", self.initial_pheromone));
        }
        Ok(())
    }
}

/// Square matrix of edge desirabilities, kept strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneMatrix {
    n: usize,
    values: Vec<f64>,
    /// Largest entry, kept current by `evaporate` and `deposit`
    max: f64,
}

impl PheromoneMatrix {
    pub fn new(n: usize, initial: f64) -> Self {
        PheromoneMatrix {
            n,
            values: vec![initial; n * n],
            max: if n > 0 { initial } else { 0.0 },
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Multiply every trail by `1 - rate`, never dropping below
    /// [`PHEROMONE_FLOOR`].
    pub fn evaporate(&mut self, rate: f64) {
        let keep = 1.0 - rate;
        for value in self.values.iter_mut() {
            *value = (*value * keep).max(PHEROMONE_FLOOR);
        }
        // scaling and flooring are monotone, so the largest entry stays largest
        if self.n > 0 {
            self.max = (self.max * keep).max(PHEROMONE_FLOOR);
        }
    }

    /// Add `amount` to both directions of every edge of the closed tour.
    pub fn deposit(&mut self, tour: &[usize], amount: f64) {
        let m = tour.len();
        for i in 0..m {
            let from = tour[i];
            let to = tour[(i + 1) % m];

            self.values[from * self.n + to] += amount;
            if from != to {
                self.values[to * self.n + from] += amount;
            }
            self.max = self.max.max(self.values[from * self.n + to]);
        }
    }

    /// Largest trail value.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Trail value relative to the current maximum, in `[0, 1]`.
    pub fn intensity(&self, i: usize, j: usize) -> f64 {
        if self.max > 0.0 {
            self.get(i, j) / self.max
        } else {
            0.0
        }
    }

    /// Relative intensity of every undirected edge `(i, j, intensity)` with
    /// `i < j`, for drawing the whole overlay in one pass.
    pub fn intensities(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| {
            (i + 1..self.n).map(move |j| (i, j, self.intensity(i, j)))
        })
    }
}

/// Ant Colony System solver
pub struct AntColonySystem<R: RandomSource = SeededRandom> {
    config: AcoConfig,
    distances: Arc<DistanceMatrix>,
    pheromones: PheromoneMatrix,
    best_path: Vec<usize>,
    best_cost: f64,
    iteration: usize,
    rng: R,
}

impl AntColonySystem<SeededRandom> {
    /// Solver seeded from `config.seed`.
    pub fn new(instance: &TspInstance, config: AcoConfig) -> SolverResult<Self> {
        let rng = SeededRandom::new(config.seed);
        Self::with_random(instance, config, rng)
    }
}

impl<R: RandomSource> AntColonySystem<R> {
    /// Solver drawing from an injected random source.
    pub fn with_random(instance: &TspInstance, config: AcoConfig, rng: R) -> SolverResult<Self> {
        check_city_count(instance.dimension())?;
        config.validate()?;

        let n = instance.dimension();
        let pheromones = PheromoneMatrix::new(n, config.initial_pheromone);

        log::debug!(
            "ACS on {} ({} cities, {} ants, alpha={}, beta={}, rho={})",
            instance.name,
            n,
            config.num_ants,
            config.alpha,
            config.beta,
            config.evaporation_rate
        );

        Ok(AntColonySystem {
            config,
            distances: instance.distances(),
            pheromones,
            best_path: Vec::new(),
            best_cost: f64::INFINITY,
            iteration: 0,
            rng,
        })
    }

    /// Run one colony iteration: construct, evaluate, evaporate, deposit.
    pub fn step(&mut self) -> StepResult {
        // One stream per ant, forked in order so the outcome does not depend
        // on how rayon schedules the constructions.
        let mut streams: Vec<R> = (0..self.config.num_ants).map(|_| self.rng.fork()).collect();

        let distances = self.distances.as_ref();
        let pheromones = &self.pheromones;
        let config = &self.config;

        let tours: Vec<Vec<usize>> = if config.parallel {
            streams
                .par_iter_mut()
                .map(|rng| construct_tour(distances, pheromones, config, rng))
                .collect()
        } else {
            streams
                .iter_mut()
                .map(|rng| construct_tour(distances, pheromones, config, rng))
                .collect()
        };

        let costs: Vec<f64> = tours.iter().map(|tour| distances.cost(tour)).collect();

        if let Some((idx, &cost)) = costs
            .iter()
            .enumerate()
            .min_by_key(|&(_, &c)| OrderedFloat(c))
        {
            if cost < self.best_cost {
                log::debug!(
                    "ACS iteration {}: new best {:.2} (was {:.2})",
                    self.iteration + 1,
                    cost,
                    self.best_cost
                );
                self.best_cost = cost;
                self.best_path = tours[idx].clone();
            }
        }

        self.pheromones.evaporate(self.config.evaporation_rate);
        for (tour, &cost) in tours.iter().zip(costs.iter()) {
            let amount = self.config.deposit_intensity * inverse_or_max(cost);
            self.pheromones.deposit(tour, amount);
        }

        self.iteration += 1;
        self.snapshot()
    }

    pub fn snapshot(&self) -> StepResult {
        StepResult {
            best_path: self.best_path.clone(),
            best_cost: self.best_cost,
            iteration: self.iteration,
        }
    }

    pub fn best_path(&self) -> &[usize] {
        &self.best_path
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn pheromones(&self) -> &PheromoneMatrix {
        &self.pheromones
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }
}

/// Build one ant's tour from a uniformly random start city.
fn construct_tour<R: RandomSource>(
    distances: &DistanceMatrix,
    pheromones: &PheromoneMatrix,
    config: &AcoConfig,
    rng: &mut R,
) -> Vec<usize> {
    let n = distances.len();
    let mut tour = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut candidates: Vec<(usize, f64)> = Vec::with_capacity(n);

    let mut current = rng.uniform_index(n);
    tour.push(current);
    visited[current] = true;

    while tour.len() < n {
        candidates.clear();
        for j in 0..n {
            if visited[j] {
                continue;
            }
            let tau = pheromones.get(current, j).powf(config.alpha);
            let eta = distances.inverse(current, j).powf(config.beta);
            candidates.push((j, tau * eta));
        }

        let next = select_candidate(&candidates, rng);
        tour.push(next);
        visited[next] = true;
        current = next;
    }

    tour
}

/// Roulette-wheel choice over `(city, weight)` pairs.
///
/// Collapsed weights fall back to a uniform pick; overflowing weights to a
/// uniform pick among the saturated candidates.
fn select_candidate<R: RandomSource>(candidates: &[(usize, f64)], rng: &mut R) -> usize {
    let total: f64 = candidates.iter().map(|&(_, w)| w).sum();

    if total.is_nan() || total <= 0.0 {
        log::trace!("roulette weights collapsed, choosing uniformly");
        return candidates[rng.uniform_index(candidates.len())].0;
    }

    if total.is_infinite() {
        let saturated: Vec<usize> = candidates
            .iter()
            .filter(|&&(_, w)| w.is_infinite())
            .map(|&(j, _)| j)
            .collect();
        log::trace!("roulette weights overflowed, choosing uniformly");
        return if saturated.is_empty() {
            candidates[rng.uniform_index(candidates.len())].0
        } else {
            saturated[rng.uniform_index(saturated.len())]
        };
    }

    let mut pick = rng.uniform_real() * total;
    for &(j, weight) in candidates {
        if pick < weight {
            return j;
        }
        pick -= weight;
    }

    candidates
        .iter()
        .rev()
        .find(|&&(_, w)| w > 0.0)
        .map(|&(j, _)| j)
        .unwrap_or(candidates[candidates.len() - 1].0)
}
