//! Seeded k-means clustering
//!
//! Centroids are seeded with k-means++ from a `StdRng` and refined with
//! Lloyd iterations until no assignment changes or the iteration cap is
//! reached. With `n_init > 1` the whole procedure is restarted from the same
//! random stream and the run with the lowest inertia wins.

use crate::error::{EmbedError, Result};
use ndarray::{Array2, ArrayView1, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for k-means
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Requested number of clusters (clamped to the number of points)
    pub n_clusters: usize,
    /// Seed for centroid initialization
    pub seed: u64,
    /// Maximum Lloyd iterations per run
    pub max_iterations: usize,
    /// Number of independent restarts
    pub n_init: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            seed: 0,
            max_iterations: 300,
            n_init: 1,
        }
    }
}

/// Outcome of a k-means fit
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster id per input row, each in `[0, k)`
    pub labels: Vec<usize>,
    /// One centroid per row
    pub centroids: Array2<f64>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations used by the winning run
    pub iterations: usize,
    /// Whether the winning run stopped because assignments settled
    pub converged: bool,
}

impl KMeansResult {
    /// Effective number of clusters
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

/// K-means cluster assigner
#[derive(Debug, Default, Clone)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    /// Create a cluster assigner
    pub const fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub const fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Partition the rows of `points`
    ///
    /// # Errors
    /// Returns [`EmbedError::EmptyInput`] when there are no rows and
    /// [`EmbedError::InvalidInput`] for a zero cluster count, iteration cap
    /// or restart count, or for non-finite coordinates.
    pub fn fit(&self, points: &Array2<f64>) -> Result<KMeansResult> {
        let n = points.nrows();
        if n == 0 {
            return Err(EmbedError::EmptyInput);
        }
        let KMeansConfig {
            n_clusters,
            seed,
            max_iterations,
            n_init,
        } = self.config;
        if n_clusters == 0 || max_iterations == 0 || n_init == 0 {
            return Err(EmbedError::InvalidInput(format!(
                "n_clusters, max_iterations and n_init must be positive \
                 (got {n_clusters}, {max_iterations}, {n_init})"
            )));
        }
        if points.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::InvalidInput(
                "points contain non-finite coordinates".to_string(),
            ));
        }

        let k = n_clusters.min(n);
        if k < n_clusters {
            tracing::debug!(requested = n_clusters, points = n, "clamping cluster count");
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut best: Option<KMeansResult> = None;
        for run in 0..n_init {
            let result = lloyd(points, init_plus_plus(points, k, &mut rng), max_iterations);
            tracing::debug!(
                run,
                inertia = result.inertia,
                iterations = result.iterations,
                converged = result.converged,
                "k-means run finished"
            );
            best = match best {
                Some(current) if current.inertia <= result.inertia => Some(current),
                _ => Some(result),
            };
        }

        best.ok_or(EmbedError::EmptyInput)
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    Zip::from(&a)
        .and(&b)
        .fold(0.0, |acc, &x, &y| acc + (x - y) * (x - y))
}

/// Index and squared distance of the closest centroid (lowest index on ties)
fn nearest(point: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
    centroids
        .rows()
        .into_iter()
        .enumerate()
        .map(|(c, centroid)| (c, squared_distance(point, centroid)))
        .fold((0, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

/// k-means++ seeding: each further centroid is drawn with probability
/// proportional to its squared distance from the centroids chosen so far.
fn init_plus_plus(points: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = points.nrows();
    let mut centroids = Array2::<f64>::zeros((k, points.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&points.row(first));

    let mut distances: Vec<f64> = points
        .rows()
        .into_iter()
        .map(|p| squared_distance(p, points.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = distances.iter().sum();
        let chosen = if total > 0.0 {
            let threshold = rng.r#gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, &d) in distances.iter().enumerate() {
                cumulative += d;
                if d > 0.0 && cumulative > threshold {
                    chosen = Some(i);
                    break;
                }
            }
            // Rounding can leave the threshold past the final sum
            chosen.unwrap_or_else(|| distances.iter().rposition(|&d| d > 0.0).unwrap_or(0))
        } else {
            // Every point coincides with a chosen centroid
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&points.row(chosen));
        for (d, p) in distances.iter_mut().zip(points.rows()) {
            *d = d.min(squared_distance(p, points.row(chosen)));
        }
    }

    centroids
}

fn lloyd(points: &Array2<f64>, mut centroids: Array2<f64>, max_iterations: usize) -> KMeansResult {
    let n = points.nrows();
    let k = centroids.nrows();
    let mut labels = vec![usize::MAX; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let mut changed = 0;
        for (label, point) in labels.iter_mut().zip(points.rows()) {
            let (c, _) = nearest(point, &centroids);
            if *label != c {
                *label = c;
                changed += 1;
            }
        }
        if changed == 0 {
            converged = true;
            break;
        }

        let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
        let mut counts = vec![0_usize; k];
        for (&label, point) in labels.iter().zip(points.rows()) {
            let mut sum = sums.row_mut(label);
            sum += &point;
            counts[label] += 1;
        }
        for (c, &count) in counts.iter().enumerate() {
            // An empty cluster keeps its previous centroid
            if count > 0 {
                let mean = &sums.row(c) / count as f64;
                centroids.row_mut(c).assign(&mean);
            }
        }
    }

    if !converged {
        for (label, point) in labels.iter_mut().zip(points.rows()) {
            *label = nearest(point, &centroids).0;
        }
    }

    let inertia = labels
        .iter()
        .zip(points.rows())
        .map(|(&label, point)| squared_distance(point, centroids.row(label)))
        .sum();

    KMeansResult {
        labels,
        centroids,
        inertia,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn two_groups() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
        ]
    }

    #[test]
    fn test_config_defaults() {
        let config = KMeansConfig::default();
        assert_eq!(config.n_clusters, 3);
        assert_eq!(config.seed, 0);
        assert_eq!(config.max_iterations, 300);
        assert_eq!(config.n_init, 1);
    }

    #[test]
    fn test_separates_two_groups() {
        let kmeans = KMeans::new(KMeansConfig {
            n_clusters: 2,
            ..Default::default()
        });
        let result = kmeans.fit(&two_groups()).unwrap();

        assert!(result.converged);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[0], result.labels[2]);
        assert_eq!(result.labels[3], result.labels[4]);
        assert_ne!(result.labels[0], result.labels[3]);
    }

    #[test]
    fn test_labels_in_range_and_deterministic() {
        let kmeans = KMeans::default();
        let a = kmeans.fit(&two_groups()).unwrap();
        let b = kmeans.fit(&two_groups()).unwrap();

        assert_eq!(a.labels.len(), 5);
        assert!(a.labels.iter().all(|&l| l < 3));
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
        assert!(a.converged);
        assert!(a.iterations <= 300);
    }

    #[test]
    fn test_inertia_matches_labels() {
        let points = two_groups();
        let result = KMeans::default().fit(&points).unwrap();

        let expected: f64 = points
            .rows()
            .into_iter()
            .zip(&result.labels)
            .map(|(p, &l)| squared_distance(p, result.centroids.row(l)))
            .sum();
        assert_relative_eq!(result.inertia, expected, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1, 3, 1)]
    #[case(2, 3, 2)]
    #[case(4, 3, 3)]
    fn test_cluster_count_clamped(#[case] n: usize, #[case] k: usize, #[case] effective: usize) {
        let points = Array2::from_shape_fn((n, 2), |(i, j)| (i * 3 + j) as f64);
        let result = KMeans::new(KMeansConfig {
            n_clusters: k,
            ..Default::default()
        })
        .fit(&points)
        .unwrap();

        assert_eq!(result.n_clusters(), effective);
        assert!(result.labels.iter().all(|&l| l < effective));
    }

    #[test]
    fn test_single_point() {
        let result = KMeans::default().fit(&array![[0.0, 0.0]]).unwrap();
        assert_eq!(result.labels, vec![0]);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_duplicate_points() {
        let points = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let result = KMeans::default().fit(&points).unwrap();
        assert_eq!(result.labels.len(), 4);
        assert!(result.labels.iter().all(|&l| l < 3));
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_restarts_never_worse() {
        let points = array![
            [0.0, 0.0],
            [1.0, 0.2],
            [0.3, 1.1],
            [5.0, 5.0],
            [5.5, 4.8],
            [9.0, 0.0],
            [9.4, 0.5],
        ];
        let single = KMeans::default().fit(&points).unwrap();
        let restarted = KMeans::new(KMeansConfig {
            n_init: 10,
            ..Default::default()
        })
        .fit(&points)
        .unwrap();

        assert!(restarted.inertia <= single.inertia + 1e-12);
    }

    #[rstest]
    #[case(KMeansConfig { n_clusters: 0, ..Default::default() })]
    #[case(KMeansConfig { max_iterations: 0, ..Default::default() })]
    #[case(KMeansConfig { n_init: 0, ..Default::default() })]
    fn test_invalid_config(#[case] config: KMeansConfig) {
        let result = KMeans::new(config).fit(&two_groups());
        assert!(matches!(result, Err(EmbedError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_input() {
        let result = KMeans::default().fit(&Array2::zeros((0, 2)));
        assert!(matches!(result, Err(EmbedError::EmptyInput)));
    }
}
