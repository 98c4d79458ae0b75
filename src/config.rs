//! Solver configuration file.
//!
//! A JSON document with three optional sections:
//!
//! ```json
//! {
//!   "instance": { "num_cities": 37, "width": 800, "height": 600, "margin": 50, "seed": 7 },
//!   "aco": { "num_ants": 100, "max_iterations": 400, "evaporation_rate": 0.1 },
//!   "sa": { "max_iterations": 1000, "initial_temperature": 100.0, "cooling_rate": 0.99 }
//! }
//! ```
//!
//! Missing sections and fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::heuristics::{AcoConfig, SaConfig};
use crate::instance::TspInstance;

/// Parameters of a randomly generated instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub num_cities: usize,
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub seed: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        InstanceConfig {
            num_cities: 37,
            width: 800,
            height: 600,
            margin: 50,
            seed: 42,
        }
    }
}

impl InstanceConfig {
    pub fn generate(&self) -> SolverResult<TspInstance> {
        TspInstance::random(self.num_cities, self.width, self.height, self.margin, self.seed)
    }
}

/// Complete solver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub instance: InstanceConfig,
    pub aco: AcoConfig,
    pub sa: SaConfig,
}

impl SolverConfig {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> SolverResult<Self> {
        let config: SolverConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SolverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.instance.num_cities == 0 {
            return Err(SolverError::invalid_config("instance.num_cities", 0));
        }
        self.aco.validate()?;
        self.sa.validate()
    }
}
