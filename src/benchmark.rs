//! Benchmarking module.
//!
//! Runs both optimizers over several seeds, collects per-run records and
//! aggregates them into per-algorithm statistics.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::SolverResult;
use crate::heuristics::{AcoConfig, AntColonySystem, SaConfig, SimulatedAnnealing};
use crate::instance::TspInstance;
use crate::runner::{run, NoopObserver};
use crate::solution::{Solution, StopReason};

/// Algorithms compared by the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Acs,
    Sa,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Acs => write!(f, "ACS"),
            Algorithm::Sa => write!(f, "SA-MC"),
        }
    }
}

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub algorithm: Algorithm,
    pub instance: String,
    pub dimension: usize,
    pub seed: u64,
    pub cost: f64,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// Computation time in seconds
    pub time: f64,
    /// Gap to best known in percent (if available)
    pub gap_to_best: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: Algorithm,
    pub num_runs: usize,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub avg_cost: f64,
    /// Sample standard deviation of cost (0 for a single run)
    pub std_cost: f64,
    pub avg_time: f64,
    pub avg_iterations: f64,
    /// Runs that ended on the stagnation signal
    pub stagnation_stops: usize,
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeds per algorithm
    pub num_runs: usize,
    /// Run the seeds on the rayon thread pool
    pub parallel: bool,
    pub aco: AcoConfig,
    pub sa: SaConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            parallel: true,
            aco: AcoConfig::default(),
            sa: SaConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunRecord>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    /// Set best known solution for an instance
    pub fn set_best_known(&mut self, instance_name: &str, cost: f64) {
        self.best_known.insert(instance_name.to_string(), cost);
    }

    /// Run every algorithm for seeds `0..num_runs` on an instance
    pub fn run_instance(&mut self, instance: &TspInstance) -> SolverResult<()> {
        log::info!(
            "Running benchmark on instance: {} ({} runs per algorithm)",
            instance.name,
            self.config.num_runs
        );

        let jobs: Vec<(Algorithm, u64)> = [Algorithm::Acs, Algorithm::Sa]
            .iter()
            .flat_map(|&alg| (0..self.config.num_runs as u64).map(move |seed| (alg, seed)))
            .collect();

        let config = &self.config;
        let records: Vec<RunRecord> = if config.parallel {
            jobs.par_iter()
                .map(|&(alg, seed)| run_single(config, instance, alg, seed))
                .collect::<SolverResult<_>>()?
        } else {
            jobs.iter()
                .map(|&(alg, seed)| run_single(config, instance, alg, seed))
                .collect::<SolverResult<_>>()?
        };

        for mut record in records {
            if let Some(&best) = self.best_known.get(&record.instance) {
                record.gap_to_best = Some((record.cost - best) / best * 100.0);
            }
            self.results.push(record);
        }

        Ok(())
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<Algorithm, Vec<&RunRecord>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = stats_map
            .into_iter()
            .map(|(algorithm, records)| {
                let costs: Vec<f64> = records.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = records.iter().map(|r| r.time).collect();
                let iterations: Vec<f64> = records.iter().map(|r| r.iterations as f64).collect();
                let gaps: Vec<f64> = records.iter().filter_map(|r| r.gap_to_best).collect();

                let std_cost = if costs.len() > 1 {
                    costs.iter().std_dev()
                } else {
                    0.0
                };

                AlgorithmStatistics {
                    algorithm,
                    num_runs: records.len(),
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    avg_cost: costs.iter().mean(),
                    std_cost,
                    avg_time: times.iter().mean(),
                    avg_iterations: iterations.iter().mean(),
                    stagnation_stops: records
                        .iter()
                        .filter(|r| r.stop_reason == StopReason::Stagnation)
                        .count(),
                    avg_gap: if gaps.is_empty() {
                        None
                    } else {
                        Some(gaps.iter().mean())
                    },
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("         TSP Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<10} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10} {:>9}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Std", "Avg Gap%", "Avg Iter", "Avg Time"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in &self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<10} {:>6} {:>12.2} {:>12.2} {:>10.2} {:>10} {:>10.1} {:>9.4}\n",
                stat.algorithm.to_string(),
                stat.num_runs,
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                gap_str,
                stat.avg_iterations,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &RunRecord> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut names: Vec<&&str> = instance_best.keys().collect();
        names.sort();
        for name in names {
            let best = instance_best[*name];
            report.push_str(&format!(
                "  {}: {:.2} ({}, seed {})\n",
                name, best.cost, best.algorithm, best.seed
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunRecord] {
        &self.results
    }
}

fn run_single(
    config: &BenchmarkConfig,
    instance: &TspInstance,
    algorithm: Algorithm,
    seed: u64,
) -> SolverResult<RunRecord> {
    let solution: Solution = match algorithm {
        Algorithm::Acs => {
            let aco_config = AcoConfig {
                seed,
                // seeds already run in parallel
                parallel: false,
                ..config.aco.clone()
            };
            let mut aco = AntColonySystem::new(instance, aco_config)?;
            run(&mut aco, &mut NoopObserver)
        }
        Algorithm::Sa => {
            let sa_config = SaConfig {
                seed,
                ..config.sa.clone()
            };
            let mut sa = SimulatedAnnealing::new(instance, sa_config)?;
            run(&mut sa, &mut NoopObserver)
        }
    };

    log::debug!(
        "{} seed {} on {}: {:.2} after {} iterations",
        algorithm,
        seed,
        instance.name,
        solution.cost,
        solution.iterations
    );

    Ok(RunRecord {
        algorithm,
        instance: instance.name.clone(),
        dimension: instance.dimension(),
        seed,
        cost: solution.cost,
        iterations: solution.iterations,
        stop_reason: solution.stop_reason,
        time: solution.computation_time,
        gap_to_best: None,
    })
}

/// Load every `.tsp` file of a directory, smallest first. Files that fail
/// to parse are logged and skipped.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> SolverResult<Vec<TspInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "tsp").unwrap_or(false) {
            match TspInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("Skipping {:?}: {}", path, e),
            }
        }
    }

    // Sort by dimension
    instances.sort_by_key(|i| i.dimension());

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(parallel: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 3,
            parallel,
            aco: AcoConfig {
                num_ants: 5,
                max_iterations: 10,
                ..Default::default()
            },
            sa: SaConfig {
                max_iterations: 200,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
    }

    #[test]
    fn test_run_instance_records_every_seed() {
        let instance = TspInstance::random(10, 800, 600, 50, 1).unwrap();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.run_instance(&instance).unwrap();

        assert_eq!(benchmark.results().len(), 6);
        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 2);
        for stat in &stats {
            assert_eq!(stat.num_runs, 3);
            assert!(stat.best_cost <= stat.avg_cost && stat.avg_cost <= stat.worst_cost);
            assert!(stat.std_cost >= 0.0);
        }
        assert!(stats[0].avg_cost <= stats[1].avg_cost);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instance = TspInstance::random(9, 800, 600, 50, 4).unwrap();
        let mut sequential = Benchmark::new(quick_config(false));
        let mut parallel = Benchmark::new(quick_config(true));
        sequential.run_instance(&instance).unwrap();
        parallel.run_instance(&instance).unwrap();

        let costs = |b: &Benchmark| b.results().iter().map(|r| (r.algorithm, r.seed, r.cost)).collect::<Vec<_>>();
        assert_eq!(costs(&sequential), costs(&parallel));
    }

    #[test]
    fn test_gap_to_best_known() {
        let cities = vec![
            crate::instance::City::new(0.0, 0.0),
            crate::instance::City::new(0.0, 10.0),
            crate::instance::City::new(10.0, 10.0),
            crate::instance::City::new(10.0, 0.0),
        ];
        let instance = TspInstance::new("square", cities).unwrap();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.set_best_known("square", 40.0);
        benchmark.run_instance(&instance).unwrap();

        for record in benchmark.results() {
            let gap = record.gap_to_best.unwrap();
            assert!(gap >= -1e-9);
        }
        let report = benchmark.generate_report();
        assert!(report.contains("square: 40.00"));
    }

    #[test]
    fn test_load_instances_from_data_dir() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
        let instances = load_instances_from_dir(dir).unwrap();

        let names: Vec<(&str, usize)> = instances
            .iter()
            .map(|i| (i.name.as_str(), i.dimension()))
            .collect();
        assert_eq!(names, vec![("square4", 4), ("hexagon6", 6)]);
    }

    #[test]
    fn test_load_instances_skips_bad_files() {
        let dir = std::env::temp_dir().join(format!("tsp-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::copy(
            concat!(env!("CARGO_MANIFEST_DIR"), "/data/square4.tsp"),
            dir.join("square4.tsp"),
        )
        .unwrap();
        std::fs::write(dir.join("broken.tsp"), "NODE_COORD_SECTION\n1 x y\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "not an instance").unwrap();

        let instances = load_instances_from_dir(&dir).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "square4");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_run_over_instance_directory() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
        let instances = load_instances_from_dir(dir).unwrap();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.set_best_known("hexagon6", 60.0);
        for instance in &instances {
            benchmark.run_instance(instance).unwrap();
        }

        assert_eq!(benchmark.results().len(), 12);
        for record in benchmark.results() {
            assert_eq!(record.gap_to_best.is_some(), record.instance == "hexagon6");
        }
        let report = benchmark.generate_report();
        assert!(report.contains("square4: 40.00"));
        assert!(report.contains("hexagon6: "));
    }

    #[test]
    fn test_export_csv() {
        let instance = TspInstance::random(6, 800, 600, 50, 2).unwrap();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.run_instance(&instance).unwrap();

        let dir = std::env::temp_dir().join(format!("tsp-bench-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let results_path = dir.join("results.csv");
        let stats_path = dir.join("statistics.csv");
        benchmark.export_to_csv(&results_path).unwrap();
        benchmark.export_statistics_csv(&stats_path).unwrap();

        let results = std::fs::read_to_string(&results_path).unwrap();
        assert_eq!(results.lines().count(), 7);
        assert!(results.starts_with("algorithm,instance,dimension,seed"));
        let stats = std::fs::read_to_string(&stats_path).unwrap();
        assert_eq!(stats.lines().count(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
