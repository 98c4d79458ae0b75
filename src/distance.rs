//! Euclidean distance model.
//!
//! Holds the symmetric pairwise distance table of an instance and evaluates
//! tour costs against it.

use crate::error::{SolverError, SolverResult};
use crate::instance::City;

/// Smallest number of cities a distance matrix accepts.
pub const MIN_MATRIX_CITIES: usize = 2;

/// Upper bound on `1 / d`, used when two cities coincide.
pub const MAX_INVERSE_DISTANCE: f64 = 1e6;

/// Symmetric, zero-diagonal distance matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    distances: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute all pairwise Euclidean distances.
    pub fn build(cities: &[City]) -> SolverResult<Self> {
        let n = cities.len();
        if n < MIN_MATRIX_CITIES {
            return Err(SolverError::DegenerateInput {
                found: n,
                required: MIN_MATRIX_CITIES,
            });
        }

        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let d = cities[i].distance_to(&cities[j]);
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }

        Ok(DistanceMatrix { n, distances })
    }

    /// Number of cities.
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
        self.distances[i * self.n + j]
    }

    /// Heuristic desirability of edge `(i, j)`.
    #[inline]
    pub fn inverse(&self, i: usize, j: usize) -> f64 {
        inverse_or_max(self.get(i, j))
    }

    /// Length of the closed cycle described by `path`.
    ///
    /// `path` must be a permutation of `0..len()`.
    pub fn cost(&self, path: &[usize]) -> f64 {
        if path.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for i in 0..path.len() - 1 {
            length += self.get(path[i], path[i + 1]);
        }

        length += self.get(path[path.len() - 1], path[0]);

        length
    }

    /// Iterator over the upper triangle `(i, j, d)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| (i + 1..self.n).map(move |j| (i, j, self.get(i, j))))
    }
}

/// `1 / value`, clamped to [`MAX_INVERSE_DISTANCE`] for zero or tiny values.
#[inline]
pub fn inverse_or_max(value: f64) -> f64 {
    if value > 1.0 / MAX_INVERSE_DISTANCE {
        1.0 / value
    } else {
        MAX_INVERSE_DISTANCE
    }
}

/// True when `path` visits each of `0..n` exactly once.
pub fn is_permutation(path: &[usize], n: usize) -> bool {
    if path.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &city in path {
        if city >= n || seen[city] {
            return false;
        }
        seen[city] = true;
    }
    true
}
