//! Module for representing TSP instances.
//!
//! An instance is a named, ordered list of cities together with the shared
//! distance matrix built from them. Instances are read from TSP-LIB style
//! files (`NODE_COORD_SECTION`) or generated at random.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{SolverError, SolverResult};

/// A fixed point in the plane, identified by its index in the instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub x: f64,
    pub y: f64,
}

impl City {
    pub fn new(x: f64, y: f64) -> Self {
        City { x, y }
    }

    /// Euclidean distance to another city
    #[inline]
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Represents a complete TSP instance
#[derive(Debug, Clone)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Cities in index order
    pub cities: Vec<City>,
    /// Precomputed distance matrix, shared read-only with the optimizers
    distances: Arc<DistanceMatrix>,
}

impl TspInstance {
    /// Build an instance from an ordered city list.
    pub fn new(name: impl Into<String>, cities: Vec<City>) -> SolverResult<Self> {
        let distances = Arc::new(DistanceMatrix::build(&cities)?);
        Ok(TspInstance {
            name: name.into(),
            comment: String::new(),
            cities,
            distances,
        })
    }

    /// Generate `num_cities` cities with integer coordinates drawn uniformly
    /// inside `[margin, width - margin] x [margin, height - margin]`.
    pub fn random(
        num_cities: usize,
        width: u32,
        height: u32,
        margin: u32,
        seed: u64,
    ) -> SolverResult<Self> {
        if margin > width / 2 || margin > height / 2 {
            return Err(SolverError::invalid_config(
                "margin",
                format!("{} (canvas {}x{})", margin, width, height),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cities = (0..num_cities)
            .map(|_| {
                let x = rng.gen_range(margin..=width - margin);
                let y = rng.gen_range(margin..=height - margin);
                City::new(x as f64, y as f64)
            })
            .collect();

        let mut instance = Self::new(format!("random-{}-s{}", num_cities, seed), cities)?;
        instance.comment = format!("{} random cities on a {}x{} canvas", num_cities, width, height);
        Ok(instance)
    }

    /// Parse an instance from a TSP-LIB format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let file = File::open(&path)?;
        let mut instance = Self::from_reader(BufReader::new(file))?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse an instance from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> SolverResult<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<City> = Vec::new();
        let mut in_coords = false;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                in_coords = false;
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        dimension = Some(value.parse().map_err(|_| SolverError::Parse {
                            line: line_no,
                            message: format!("invalid dimension '{}'", value),
                        })?);
                    }
                    "EDGE_WEIGHT_TYPE" if value != "EUC_2D" => {
                        log::warn!("Edge weight type {} treated as EUC_2D", value);
                    }
                    _ => {}
                }
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(SolverError::Parse {
                        line: line_no,
                        message: format!("expected 'id x y', got '{}'", line),
                    });
                }
                let parse = |s: &str, what: &str| {
                    s.parse::<f64>().map_err(|_| SolverError::Parse {
                        line: line_no,
                        message: format!("invalid {} '{}'", what, s),
                    })
                };
                let x = parse(parts[1], "x coordinate")?;
                let y = parse(parts[2], "y coordinate")?;
                coords.push(City::new(x, y));
            }
        }

        if let Some(expected) = dimension {
            if expected != coords.len() {
                return Err(SolverError::Parse {
                    line: 0,
                    message: format!(
                        "DIMENSION is {} but {} coordinates were read",
                        expected,
                        coords.len()
                    ),
                });
            }
        }

        let mut instance = Self::new(name, coords)?;
        instance.comment = comment;
        Ok(instance)
    }

    /// Number of cities
    #[inline]
    pub fn dimension(&self) -> usize {
        self.cities.len()
    }

    /// Shared handle to the distance matrix
    pub fn distances(&self) -> Arc<DistanceMatrix> {
        Arc::clone(&self.distances)
    }

    /// Calculate total tour length, closing edge included
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        self.distances.cost(tour)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let distances: Vec<f64> = self.distances.edges().map(|(_, _, d)| d).collect();
        let avg_distance = distances.iter().sum::<f64>() / distances.len() as f64;
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);
        let coincident_pairs = distances.iter().filter(|&&d| d == 0.0).count();

        let (min_x, max_x, min_y, max_y) = self.cities.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), c| (x0.min(c.x), x1.max(c.x), y0.min(c.y), y1.max(c.y)),
        );

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension(),
            avg_distance,
            max_distance,
            coincident_pairs,
            bounding_box: (min_x, min_y, max_x, max_y),
        }
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub coincident_pairs: usize,
    /// (min_x, min_y, max_x, max_y)
    pub bounding_box: (f64, f64, f64, f64),
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)?;
        writeln!(f, "  Coincident pairs: {}", self.coincident_pairs)?;
        let (x0, y0, x1, y1) = self.bounding_box;
        writeln!(f, "  Bounding box: ({:.1}, {:.1}) - ({:.1}, {:.1})", x0, y0, x1, y1)
    }
}
