//! TSP Solver - Command Line Interface
//!
//! Drives the Ant Colony System and the simulated annealing Markov chain on
//! TSP-LIB files or random instances.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tsp_meta_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use tsp_meta_solver::config::SolverConfig;
use tsp_meta_solver::error::SolverResult;
use tsp_meta_solver::heuristics::{AntColonySystem, SimulatedAnnealing};
use tsp_meta_solver::instance::TspInstance;
use tsp_meta_solver::runner::{run, LogObserver, Observer};
use tsp_meta_solver::solution::{Solution, StepResult};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tsp-meta-solver")]
#[command(version = "1.0")]
#[command(about = "Ant Colony System and simulated annealing for the TSP")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance
    Solve {
        #[command(flatten)]
        source: InstanceArgs,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "both")]
        algorithm: Algorithm,

        /// Random seed for the optimizers
        #[arg(short, long)]
        seed: Option<u64>,

        /// Iteration cap (overrides the configuration)
        #[arg(long)]
        iterations: Option<usize>,

        /// Number of ants (overrides the configuration)
        #[arg(long)]
        ants: Option<usize>,

        /// Build ant tours on all cores
        #[arg(long)]
        parallel: bool,

        /// Output solutions to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show a progress bar instead of periodic log lines
        #[arg(long)]
        progress: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare both algorithms over several seeds
    Compare {
        #[command(flatten)]
        source: InstanceArgs,

        /// Benchmark every .tsp file of this directory instead of one instance
        #[arg(long, conflicts_with = "instance")]
        instances_dir: Option<PathBuf>,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output directory for CSV results and the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Best known tour length, for gap reporting
        #[arg(long)]
        best_known: Option<f64>,

        /// Run seeds one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze an instance
    Analyze {
        #[command(flatten)]
        source: InstanceArgs,
    },
}

#[derive(clap::Args)]
struct InstanceArgs {
    /// TSP-LIB instance file; a random instance is generated when omitted
    #[arg(short, long)]
    instance: Option<PathBuf>,

    /// Number of random cities (overrides the configuration)
    #[arg(long)]
    cities: Option<usize>,

    /// Seed of the random instance (overrides the configuration)
    #[arg(long)]
    instance_seed: Option<u64>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Ant Colony System
    Acs,
    /// Simulated annealing Markov chain
    Sa,
    /// Both, one after the other
    Both,
}

/// Progress bar fed by the driving loop
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(len: usize, algorithm: &str) -> Self {
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template("{prefix:>6} [{bar:40}] {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar.set_prefix(algorithm.to_string());
        ProgressObserver { bar }
    }
}

impl Observer for ProgressObserver {
    fn on_step(&mut self, _algorithm: &str, step: &StepResult) {
        self.bar.set_position(step.iteration as u64);
        self.bar.set_message(format!("best {:.2}", step.best_cost));
    }

    fn on_finish(&mut self, solution: &Solution) {
        self.bar.finish_with_message(format!(
            "best {:.2} ({})",
            solution.cost, solution.stop_reason
        ));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Solve {
            source,
            algorithm,
            seed,
            iterations,
            ants,
            parallel,
            output,
            progress,
            verbose,
        } => solve_instance(
            config, &source, algorithm, seed, iterations, ants, parallel, output, progress, verbose,
        ),

        Commands::Compare {
            source,
            instances_dir,
            runs,
            output,
            best_known,
            sequential,
        } => compare_algorithms(
            config,
            &source,
            instances_dir,
            runs,
            output,
            best_known,
            sequential,
        ),

        Commands::Analyze { source } => analyze_instance(&config, &source),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> SolverResult<SolverConfig> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            SolverConfig::from_file(path)
        }
        None => Ok(SolverConfig::default()),
    }
}

fn load_instance(config: &SolverConfig, source: &InstanceArgs) -> SolverResult<TspInstance> {
    match &source.instance {
        Some(path) => {
            println!("Loading instance from {:?}...", path);
            TspInstance::from_file(path)
        }
        None => {
            let mut instance_config = config.instance.clone();
            if let Some(n) = source.cities {
                instance_config.num_cities = n;
            }
            if let Some(seed) = source.instance_seed {
                instance_config.seed = seed;
            }
            println!(
                "Generating {} random cities (seed {})...",
                instance_config.num_cities, instance_config.seed
            );
            instance_config.generate()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    mut config: SolverConfig,
    source: &InstanceArgs,
    algorithm: Algorithm,
    seed: Option<u64>,
    iterations: Option<usize>,
    ants: Option<usize>,
    parallel: bool,
    output: Option<PathBuf>,
    progress: bool,
    verbose: bool,
) -> SolverResult<()> {
    let instance = load_instance(&config, source)?;

    if let Some(seed) = seed {
        config.aco.seed = seed;
        config.sa.seed = seed;
    }
    if let Some(iterations) = iterations {
        config.aco.max_iterations = iterations;
        config.sa.max_iterations = iterations;
    }
    if let Some(ants) = ants {
        config.aco.num_ants = ants;
    }
    config.aco.parallel |= parallel;

    if verbose {
        println!("{}", instance.statistics());
        println!("ACS: {:?}", config.aco);
        println!("SA:  {:?}", config.sa);
    }

    let mut solutions = Vec::new();

    if matches!(algorithm, Algorithm::Acs | Algorithm::Both) {
        println!("Solving with ACS...");
        let mut aco = AntColonySystem::new(&instance, config.aco.clone())?;
        let solution = if progress {
            run(&mut aco, &mut ProgressObserver::new(config.aco.max_iterations, "ACS"))
        } else {
            run(&mut aco, &mut LogObserver::new(50))
        };
        solutions.push(solution);
    }

    if matches!(algorithm, Algorithm::Sa | Algorithm::Both) {
        println!("Solving with SA-MC...");
        let mut sa = SimulatedAnnealing::new(&instance, config.sa.clone())?;
        let solution = if progress {
            run(&mut sa, &mut ProgressObserver::new(config.sa.max_iterations, "SA-MC"))
        } else {
            run(&mut sa, &mut LogObserver::new(100))
        };
        solutions.push(solution);
    }

    println!("\n========== Results ==========");
    println!("Instance: {} ({} cities)", instance.name, instance.dimension());
    for solution in &solutions {
        println!("Algorithm: {}", solution.algorithm);
        println!("  Shortest distance: {:.2}", solution.cost);
        println!("  Iterations: {} ({})", solution.iterations, solution.stop_reason);
        println!("  Time: {:.4}s", solution.computation_time);
        if verbose {
            println!("  Tour: {:?}", solution.rotated_to(0));
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solutions)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolutions saved to {:?}", out_path);
    }

    Ok(())
}

fn compare_algorithms(
    config: SolverConfig,
    source: &InstanceArgs,
    instances_dir: Option<PathBuf>,
    runs: usize,
    output: Option<PathBuf>,
    best_known: Option<f64>,
    sequential: bool,
) -> SolverResult<()> {
    let instances = match &instances_dir {
        Some(dir) => {
            println!("Loading instances from {:?}...", dir);
            load_instances_from_dir(dir)?
        }
        None => vec![load_instance(&config, source)?],
    };
    if instances.is_empty() {
        println!("No instances found");
        return Ok(());
    }

    let bench_config = BenchmarkConfig {
        num_runs: runs,
        parallel: !sequential,
        aco: config.aco,
        sa: config.sa,
    };

    let mut benchmark = Benchmark::new(bench_config);
    if let Some(best) = best_known {
        if instances.len() == 1 {
            benchmark.set_best_known(&instances[0].name, best);
        } else {
            log::warn!("--best-known ignored for a directory of {} instances", instances.len());
        }
    }

    for instance in &instances {
        println!(
            "Comparing algorithms on {} (n={}, {} runs each)...",
            instance.name,
            instance.dimension(),
            runs
        );
        benchmark.run_instance(instance)?;
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)?;

        let results_path = dir.join("results.csv");
        benchmark.export_to_csv(&results_path)?;
        println!("Results exported to {:?}", results_path);

        let stats_path = dir.join("statistics.csv");
        benchmark.export_statistics_csv(&stats_path)?;
        println!("Statistics exported to {:?}", stats_path);

        let report_path = dir.join("report.txt");
        std::fs::write(&report_path, &report)?;
        println!("Report saved to {:?}", report_path);
    }

    Ok(())
}

fn analyze_instance(config: &SolverConfig, source: &InstanceArgs) -> SolverResult<()> {
    let instance = load_instance(config, source)?;
    println!("{}", instance.statistics());
    Ok(())
}
