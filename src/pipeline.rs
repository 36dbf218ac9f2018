//! The four analysis stages, run once in order

use crate::analysis::{self, GenderSpendingTest};
use crate::data::load_customers;
use crate::model::{segment_customers, SegmentationConfig};
use crate::output::OutputDir;
use crate::segments;
use polars::prelude::DataFrame;
use std::path::Path;
use std::time::Instant;

/// Results of a full run kept for callers that inspect them
#[derive(Debug)]
pub struct PipelineSummary {
    pub n_customers: usize,
    pub labels: Vec<usize>,
    /// Customers per cluster of the final model
    pub cluster_sizes: Vec<usize>,
    pub inertias: Vec<f64>,
    pub spending_test: GenderSpendingTest,
    pub characteristics: DataFrame,
}

/// Load, analyze, segment and visualize
///
/// # Arguments
/// * `input` - Customer CSV file
/// * `output_dir` - Directory for every artifact, created if absent
/// * `config` - Clustering parameters
pub fn run_pipeline(
    input: &Path,
    output_dir: &Path,
    config: &SegmentationConfig,
) -> crate::Result<PipelineSummary> {
    println!("Starting customer segmentation analysis...");
    let start_time = Instant::now();

    // Step 1: Load data
    log::info!("Step 1: Loading data from {}", input.display());
    let data = load_customers(input)?;
    data.print_overview();
    log::info!("Loaded {} customers", data.len());

    // Step 2: Exploratory analysis
    let step_start = Instant::now();
    log::info!("Step 2: Exploratory analysis into {}", output_dir.display());
    let out = OutputDir::create(output_dir)?;
    let spending_test = analysis::analyze(&data, &out)?;
    log::info!("Analysis time: {:.2}s", step_start.elapsed().as_secs_f64());

    // Step 3: Segmentation
    let step_start = Instant::now();
    log::info!(
        "Step 3: K-Means segmentation (k = {}, sweep 1..={}, seed {})",
        config.n_clusters,
        config.max_k,
        config.seed
    );
    let segmentation = segment_customers(&data, config)?;
    segments::write_segmentation(&segmentation, &out)?;
    log::info!(
        "Fitting time: {:.2}s, inertia {:.2}",
        step_start.elapsed().as_secs_f64(),
        segmentation.model.inertia
    );
    let cluster_sizes = segmentation.model.cluster_sizes();
    log::info!("Cluster sizes: {:?}", cluster_sizes);

    // Step 4: Segment visualization
    log::info!("Step 4: Visualizing segments");
    let characteristics = segments::visualize_segments(&data, &segmentation, &out)?;

    println!("\nCluster Characteristics:");
    println!("{}", characteristics);

    log::info!(
        "Pipeline complete in {:.2}s, artifacts in {}",
        start_time.elapsed().as_secs_f64(),
        out.root().display()
    );

    Ok(PipelineSummary {
        n_customers: data.len(),
        labels: segmentation.labels().to_vec(),
        cluster_sizes,
        inertias: segmentation.elbow.inertias(),
        spending_test,
        characteristics,
    })
}
