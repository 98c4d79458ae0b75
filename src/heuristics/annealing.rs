//! Simulated annealing Markov chain for the TSP.
//!
//! A single tour evolves by random two-city swaps. Improving swaps are
//! always taken; worsening swaps pass the Metropolis test
//! `u < exp(-delta / T)` under a geometric cooling schedule. The chain stops
//! itself once too many accepted moves have failed to improve the best tour.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{SolverError, SolverResult};
use crate::heuristics::check_city_count;
use crate::instance::TspInstance;
use crate::random::{RandomSource, SeededRandom};
use crate::solution::StepResult;

/// Simulated annealing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaConfig {
    /// Iteration cap applied by the driving loop
    pub max_iterations: usize,
    /// Initial temperature
    pub initial_temperature: f64,
    /// Geometric cooling factor, in (0, 1)
    pub cooling_rate: f64,
    /// Accepted non-improving moves tolerated before the chain stops
    pub stagnation_limit: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        SaConfig {
            max_iterations: 1000,
            initial_temperature: 100.0,
            cooling_rate: 0.99,
            stagnation_limit: 50,
            seed: 42,
        }
    }
}

impl SaConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return Err(SolverError::invalid_config(
                "initial_temperature",
                self.initial_temperature,
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(SolverError::invalid_config("cooling_rate", self.cooling_rate));
        }
        if self.stagnation_limit == 0 {
            return Err(SolverError::invalid_config("stagnation_limit", self.stagnation_limit));
        }
        Ok(())
    }
}

/// Simulated annealing solver over two-city swaps
pub struct SimulatedAnnealing<R: RandomSource = SeededRandom> {
    config: SaConfig,
    distances: Arc<DistanceMatrix>,
    current_path: Vec<usize>,
    current_cost: f64,
    best_path: Vec<usize>,
    best_cost: f64,
    temperature: f64,
    stagnation: usize,
    iteration: usize,
    exhausted: bool,
    rng: R,
}

impl SimulatedAnnealing<SeededRandom> {
    /// Solver seeded from `config.seed`.
    pub fn new(instance: &TspInstance, config: SaConfig) -> SolverResult<Self> {
        let rng = SeededRandom::new(config.seed);
        Self::with_random(instance, config, rng)
    }
}

impl<R: RandomSource> SimulatedAnnealing<R> {
    /// Solver drawing from an injected random source, already initialized.
    pub fn with_random(instance: &TspInstance, config: SaConfig, rng: R) -> SolverResult<Self> {
        check_city_count(instance.dimension())?;
        config.validate()?;

        log::debug!(
            "SA on {} ({} cities, T0={}, cooling={}, stagnation limit={})",
            instance.name,
            instance.dimension(),
            config.initial_temperature,
            config.cooling_rate,
            config.stagnation_limit
        );

        let mut sa = SimulatedAnnealing {
            temperature: config.initial_temperature,
            config,
            distances: instance.distances(),
            current_path: Vec::new(),
            current_cost: f64::INFINITY,
            best_path: Vec::new(),
            best_cost: f64::INFINITY,
            stagnation: 0,
            iteration: 0,
            exhausted: false,
            rng,
        };
        sa.initialize();
        Ok(sa)
    }

    /// Start (or restart) the chain from a uniformly random tour.
    pub fn initialize(&mut self) {
        let mut path: Vec<usize> = (0..self.distances.len()).collect();
        self.rng.shuffle(&mut path);

        self.current_cost = self.distances.cost(&path);
        self.best_path = path.clone();
        self.best_cost = self.current_cost;
        self.current_path = path;
        self.temperature = self.config.initial_temperature;
        self.stagnation = 0;
        self.iteration = 0;
        self.exhausted = false;
    }

    /// Run one Metropolis step. Returns `None` once the chain has stagnated.
    pub fn step(&mut self) -> Option<StepResult> {
        if self.exhausted {
            return None;
        }

        let n = self.current_path.len();
        let i = self.rng.uniform_index(n);
        let mut j = self.rng.uniform_index(n - 1);
        if j >= i {
            j += 1;
        }

        let mut candidate = self.current_path.clone();
        candidate.swap(i, j);
        let candidate_cost = self.distances.cost(&candidate);

        if self.accept(candidate_cost) {
            self.current_path = candidate;
            self.current_cost = candidate_cost;

            if candidate_cost < self.best_cost {
                self.best_path = self.current_path.clone();
                self.best_cost = candidate_cost;
                self.stagnation = 0;
            } else {
                self.stagnation += 1;
            }
        }

        self.temperature *= self.config.cooling_rate;
        self.iteration += 1;

        if self.stagnation >= self.config.stagnation_limit {
            log::debug!(
                "SA stagnated after {} iterations (best {:.2}, T={:.4})",
                self.iteration,
                self.best_cost,
                self.temperature
            );
            self.exhausted = true;
            return None;
        }

        Some(self.snapshot())
    }

    /// Metropolis criterion. Improvements are taken without drawing.
    fn accept(&mut self, candidate_cost: f64) -> bool {
        if candidate_cost < self.current_cost {
            return true;
        }
        let probability = acceptance_probability(self.current_cost, candidate_cost, self.temperature);
        probability > 0.0 && self.rng.uniform_real() < probability
    }

    pub fn snapshot(&self) -> StepResult {
        StepResult {
            best_path: self.best_path.clone(),
            best_cost: self.best_cost,
            iteration: self.iteration,
        }
    }

    pub fn current_path(&self) -> &[usize] {
        &self.current_path
    }

    pub fn current_cost(&self) -> f64 {
        self.current_cost
    }

    pub fn best_path(&self) -> &[usize] {
        &self.best_path
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }
}

/// `exp((current - candidate) / T)`, or 0 when the temperature is unusable
/// or the result is not a probability.
pub fn acceptance_probability(current_cost: f64, candidate_cost: f64, temperature: f64) -> f64 {
    if !(temperature > 0.0 && temperature.is_finite()) {
        return 0.0;
    }
    let p = ((current_cost - candidate_cost) / temperature).exp();
    if p.is_nan() {
        0.0
    } else {
        p.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::is_permutation;
    use crate::instance::City;
    use proptest::prelude::*;

    fn square_instance() -> TspInstance {
        let cities = vec![
            City::new(0.0, 0.0),
            City::new(0.0, 10.0),
            City::new(10.0, 10.0),
            City::new(10.0, 0.0),
        ];
        TspInstance::new("square", cities).unwrap()
    }

    /// Counts real-valued draws and can force their value.
    struct CountingRandom {
        inner: SeededRandom,
        real_draws: usize,
        forced_real: Option<f64>,
    }

    impl CountingRandom {
        fn new(seed: u64, forced_real: Option<f64>) -> Self {
            CountingRandom {
                inner: SeededRandom::new(seed),
                real_draws: 0,
                forced_real,
            }
        }
    }

    impl RandomSource for CountingRandom {
        fn uniform_index(&mut self, upper: usize) -> usize {
            self.inner.uniform_index(upper)
        }

        fn uniform_real(&mut self) -> f64 {
            self.real_draws += 1;
            match self.forced_real {
                Some(u) => u,
                None => self.inner.uniform_real(),
            }
        }

        fn fork(&mut self) -> Self {
            CountingRandom {
                inner: self.inner.fork(),
                real_draws: 0,
                forced_real: self.forced_real,
            }
        }
    }

    #[test]
    fn test_sa_square() {
        let instance = square_instance();
        let mut sa = SimulatedAnnealing::new(&instance, SaConfig::default()).unwrap();

        let mut steps = 0;
        while steps < sa.config().max_iterations && sa.step().is_some() {
            steps += 1;
        }

        assert!((sa.best_cost() - 40.0).abs() < 1e-9);
        assert!(is_permutation(sa.best_path(), 4));
    }

    #[test]
    fn test_initialize_state() {
        let instance = TspInstance::random(20, 800, 600, 50, 4).unwrap();
        let sa = SimulatedAnnealing::new(&instance, SaConfig::default()).unwrap();

        assert!(is_permutation(sa.current_path(), 20));
        assert_eq!(sa.current_path(), sa.best_path());
        assert_eq!(sa.current_cost(), instance.tour_length(sa.current_path()));
        assert_eq!(sa.best_cost(), sa.current_cost());
        assert_eq!(sa.temperature(), 100.0);
        assert_eq!(sa.stagnation(), 0);
        assert_eq!(sa.iteration(), 0);
    }

    #[test]
    fn test_rejects_two_cities() {
        let instance =
            TspInstance::new("pair", vec![City::new(0.0, 0.0), City::new(3.0, 4.0)]).unwrap();
        let result = SimulatedAnnealing::new(&instance, SaConfig::default());
        assert!(matches!(
            result,
            Err(SolverError::DegenerateInput { found: 2, required: 3 })
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let instance = square_instance();
        let bad = [
            SaConfig { initial_temperature: 0.0, ..Default::default() },
            SaConfig { initial_temperature: f64::INFINITY, ..Default::default() },
            SaConfig { cooling_rate: 1.0, ..Default::default() },
            SaConfig { cooling_rate: 0.0, ..Default::default() },
            SaConfig { stagnation_limit: 0, ..Default::default() },
        ];
        for config in bad {
            let result = SimulatedAnnealing::new(&instance, config);
            assert!(matches!(result, Err(SolverError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn test_invariants_hold_every_step() {
        let instance = TspInstance::random(25, 800, 600, 50, 10).unwrap();
        let config = SaConfig {
            stagnation_limit: 500,
            ..Default::default()
        };
        let mut sa = SimulatedAnnealing::new(&instance, config).unwrap();

        let mut previous_best = sa.best_cost();
        let mut temperature = sa.temperature();
        for i in 0..500 {
            let Some(step) = sa.step() else { break };
            assert_eq!(step.iteration, i + 1);
            assert!(is_permutation(&step.best_path, 25));
            assert!(is_permutation(sa.current_path(), 25));
            assert!(step.best_cost <= previous_best);
            assert!(sa.best_cost() <= sa.current_cost());
            assert_eq!(sa.current_cost(), instance.tour_length(sa.current_path()));
            assert!((temperature * 0.99 - sa.temperature()).abs() < 1e-12);
            previous_best = step.best_cost;
            temperature = sa.temperature();
        }
    }

    #[test]
    fn test_improvement_accepted_without_sampling() {
        let instance = TspInstance::random(12, 800, 600, 50, 6).unwrap();
        // u = 0.999.. would reject nearly every worsening move if it were drawn
        let rng = CountingRandom::new(1, Some(1.0 - f64::EPSILON));
        let mut sa = SimulatedAnnealing::with_random(&instance, SaConfig::default(), rng).unwrap();

        for _ in 0..200 {
            let before_cost = sa.current_cost();
            let before_draws = sa.rng.real_draws;
            if sa.step().is_none() {
                break;
            }
            if sa.current_cost() < before_cost {
                assert_eq!(sa.rng.real_draws, before_draws);
            }
        }
    }

    #[test]
    fn test_worsening_move_rejected_at_zero_temperature_limit() {
        let instance = TspInstance::random(10, 800, 600, 50, 2).unwrap();
        let config = SaConfig {
            initial_temperature: 1e-300,
            cooling_rate: 0.5,
            ..Default::default()
        };
        let mut sa = SimulatedAnnealing::new(&instance, config).unwrap();

        for _ in 0..300 {
            let before = sa.current_cost();
            if sa.step().is_none() {
                break;
            }
            // with T ~ 0 a worsening swap is never taken
            assert!(sa.current_cost() <= before);
        }
    }

    #[test]
    fn test_rejection_does_not_count_as_stagnation() {
        let instance = TspInstance::random(10, 800, 600, 50, 12).unwrap();
        // forced u close to 1 plus tiny temperature: worsening moves are rejected
        let rng = CountingRandom::new(3, Some(1.0 - f64::EPSILON));
        let config = SaConfig {
            initial_temperature: 1e-9,
            ..Default::default()
        };
        let mut sa = SimulatedAnnealing::with_random(&instance, config, rng).unwrap();

        let mut rejections = 0;
        for _ in 0..100 {
            let before_path = sa.current_path().to_vec();
            let before_stagnation = sa.stagnation();
            if sa.step().is_none() {
                break;
            }
            // a swap always changes the path, so an unchanged path means rejection
            if sa.current_path() == before_path.as_slice() {
                rejections += 1;
                assert_eq!(sa.stagnation(), before_stagnation);
            }
        }
        assert!(rejections > 0);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let instance = TspInstance::random(8, 800, 600, 50, 7).unwrap();
        let config = SaConfig {
            stagnation_limit: 1,
            initial_temperature: 1e6,
            cooling_rate: 0.999,
            ..Default::default()
        };
        let mut sa = SimulatedAnnealing::new(&instance, config).unwrap();

        let mut steps = 0;
        while sa.step().is_some() {
            steps += 1;
            assert!(steps < 10_000, "chain never stagnated");
        }

        assert!(sa.is_exhausted());
        let iteration = sa.iteration();
        let best = sa.best_path().to_vec();
        for _ in 0..5 {
            assert!(sa.step().is_none());
        }
        assert_eq!(sa.iteration(), iteration);
        assert_eq!(sa.best_path(), best.as_slice());

        sa.initialize();
        assert!(!sa.is_exhausted());
        assert_eq!(sa.iteration(), 0);
    }

    #[test]
    fn test_acceptance_probability() {
        assert_eq!(acceptance_probability(10.0, 12.0, 0.0), 0.0);
        assert_eq!(acceptance_probability(10.0, 12.0, -1.0), 0.0);
        assert_eq!(acceptance_probability(10.0, 12.0, f64::NAN), 0.0);
        assert_eq!(acceptance_probability(10.0, 1e6, 1e-300), 0.0);
        assert!((acceptance_probability(10.0, 12.0, 2.0) - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(acceptance_probability(10.0, 10.0, 5.0), 1.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_chain_keeps_permutations_and_best_bound(
            num_cities in 3usize..30,
            instance_seed in any::<u64>(),
            seed in any::<u64>(),
        ) {
            let instance = TspInstance::random(num_cities, 800, 600, 50, instance_seed).unwrap();
            let config = SaConfig {
                max_iterations: 300,
                seed,
                ..Default::default()
            };
            let mut sa = SimulatedAnnealing::new(&instance, config).unwrap();

            let mut previous = sa.best_cost();
            for _ in 0..300 {
                let Some(step) = sa.step() else { break };
                prop_assert!(is_permutation(&step.best_path, num_cities));
                prop_assert!(is_permutation(sa.current_path(), num_cities));
                prop_assert!(step.best_cost <= previous);
                prop_assert!(sa.best_cost() <= sa.current_cost());
                let recomputed = instance.tour_length(&step.best_path);
                prop_assert!((recomputed - step.best_cost).abs() <= 1e-9 * recomputed.max(1.0));
                previous = step.best_cost;
            }
        }
    }
}
