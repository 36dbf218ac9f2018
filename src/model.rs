//! K-Means segmentation: standardization, elbow sweep and final model

use crate::data::{CustomerData, StandardScaler};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Parameters of the segmentation stage
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Cluster count of the final model
    pub n_clusters: usize,
    /// Largest cluster count of the elbow sweep
    pub max_k: usize,
    /// RNG seed shared by every fit
    pub seed: u64,
    /// Restarts per fit, the best inertia wins
    pub n_runs: usize,
    pub max_iters: u64,
    pub tolerance: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            max_k: 10,
            seed: 42,
            n_runs: 10,
            max_iters: 300,
            tolerance: 1e-4,
        }
    }
}

/// Fitted K-Means parameters and training assignments
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignments for training data
    pub labels: Array1<usize>,
    /// Cluster centroids in standardized space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl KMeansModel {
    /// Customers per cluster, indexed by cluster id
    ///
    /// Clusters that received no customer report 0.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        (0..self.n_clusters)
            .map(|cluster| self.labels.iter().filter(|&&label| label == cluster).count())
            .collect()
    }

    /// Centroids mapped back to income and spending score units
    pub fn decoded_centers(&self, scaler: &StandardScaler) -> Array2<f64> {
        scaler.inverse_transform(&self.centroids)
    }
}

/// Inertia for each cluster count of the sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ElbowCurve {
    /// `(k, inertia)` pairs in increasing `k`
    pub points: Vec<(usize, f64)>,
}

impl ElbowCurve {
    pub fn inertias(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, inertia)| inertia).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything the segmentation stage produces
#[derive(Debug)]
pub struct Segmentation {
    pub model: KMeansModel,
    /// Standardized income and spending score, one row per customer
    pub features: Array2<f64>,
    pub scaler: StandardScaler,
    pub elbow: ElbowCurve,
}

impl Segmentation {
    pub fn labels(&self) -> &Array1<usize> {
        &self.model.labels
    }

    pub fn decoded_centers(&self) -> Array2<f64> {
        self.model.decoded_centers(&self.scaler)
    }
}

/// Standardize the clustering features of the dataset
///
/// # Returns
/// * The standardized (n, 2) matrix and the scaler fitted on all rows
pub fn standardize_features(data: &CustomerData) -> (Array2<f64>, StandardScaler) {
    let raw = data.segmentation_features();
    let scaler = StandardScaler::fit(&raw);
    let features = scaler.transform(&raw);
    (features, scaler)
}

/// Fit K-Means with a seeded k-means++ initialisation
///
/// # Arguments
/// * `features` - Standardized feature matrix
/// * `n_clusters` - Number of clusters
/// * `config` - Seed, restarts and convergence settings
///
/// # Returns
/// * Fitted `KMeansModel` with labels and inertia
pub fn fit_kmeans(
    features: &Array2<f64>,
    n_clusters: usize,
    config: &SegmentationConfig,
) -> crate::Result<KMeansModel> {
    check_cluster_count(features, n_clusters)?;

    let rng = StdRng::seed_from_u64(config.seed);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(config.n_runs)
        .max_n_iterations(config.max_iters)
        .tolerance(config.tolerance)
        .fit(&DatasetBase::from(features.clone()))?;

    Ok(finish_model(model, features, n_clusters))
}

/// Fit K-Means starting from the given centroids
fn fit_kmeans_from(
    features: &Array2<f64>,
    initial_centroids: Array2<f64>,
    config: &SegmentationConfig,
) -> crate::Result<KMeansModel> {
    let n_clusters = initial_centroids.nrows();
    check_cluster_count(features, n_clusters)?;

    let rng = StdRng::seed_from_u64(config.seed);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .init_method(KMeansInit::Precomputed(initial_centroids))
        .n_runs(1)
        .max_n_iterations(config.max_iters)
        .tolerance(config.tolerance)
        .fit(&DatasetBase::from(features.clone()))?;

    Ok(finish_model(model, features, n_clusters))
}

fn check_cluster_count(features: &Array2<f64>, n_clusters: usize) -> crate::Result<()> {
    if n_clusters == 0 {
        anyhow::bail!("Number of clusters must be at least 1");
    }

    if features.nrows() < n_clusters {
        anyhow::bail!(
            "Number of data points ({}) must be at least equal to number of clusters ({})",
            features.nrows(),
            n_clusters
        );
    }

    Ok(())
}

fn finish_model(
    model: KMeans<f64, L2Dist>,
    features: &Array2<f64>,
    n_clusters: usize,
) -> KMeansModel {
    let labels = model.predict(features);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(features, &labels, &centroids);

    KMeansModel {
        n_clusters,
        labels,
        centroids,
        inertia,
    }
}

/// Inertia for k = 1..=max_k
///
/// Each k > 1 is fitted twice: from the seeded k-means++ start and from
/// the previous centroids plus the point farthest from them. Lloyd
/// iterations never raise the inertia of their start, so keeping the
/// better fit makes the curve non-increasing.
pub fn elbow_sweep(
    features: &Array2<f64>,
    config: &SegmentationConfig,
) -> crate::Result<ElbowCurve> {
    let max_k = config.max_k.min(features.nrows());
    if max_k < config.max_k {
        log::warn!(
            "Only {} customers, elbow sweep capped at k = {}",
            features.nrows(),
            max_k
        );
    }

    let mut points = Vec::with_capacity(max_k);
    let mut previous: Option<KMeansModel> = None;

    for k in 1..=max_k {
        let seeded = fit_kmeans(features, k, config)?;
        let best = match previous {
            Some(prev) => {
                let warm = fit_kmeans_from(features, grow_centroids(features, &prev)?, config)?;
                if warm.inertia < seeded.inertia {
                    warm
                } else {
                    seeded
                }
            }
            None => seeded,
        };

        log::debug!("k = {:2}: inertia {:.4}", k, best.inertia);
        points.push((k, best.inertia));
        previous = Some(best);
    }

    Ok(ElbowCurve { points })
}

/// Previous centroids with the worst-served point appended
fn grow_centroids(features: &Array2<f64>, model: &KMeansModel) -> crate::Result<Array2<f64>> {
    let farthest = features
        .outer_iter()
        .zip(model.labels.iter())
        .map(|(point, &label)| squared_distance(&point, &model.centroids.row(label)))
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| {
            if d > best.1 {
                (i, d)
            } else {
                best
            }
        })
        .0;

    let mut centroids = model.centroids.clone();
    centroids.push(Axis(0), features.row(farthest))?;
    Ok(centroids)
}

/// Run the segmentation stage on the loaded customers
///
/// Fits the scaler, sweeps the elbow curve, then fits the final model
/// with `config.n_clusters` clusters.
pub fn segment_customers(
    data: &CustomerData,
    config: &SegmentationConfig,
) -> crate::Result<Segmentation> {
    let (features, scaler) = standardize_features(data);
    let elbow = elbow_sweep(&features, config)?;
    let model = fit_kmeans(&features, config.n_clusters, config)?;

    Ok(Segmentation {
        model,
        features,
        scaler,
        elbow,
    })
}

/// Compute within-cluster sum of squares (inertia)
pub fn compute_inertia(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array2<f64>,
) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            inertia += squared_distance(&features.row(i), &centroids.row(cluster));
        }
    }

    inertia
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
