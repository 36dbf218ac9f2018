//! Command-line interface definitions and argument parsing

use crate::model::SegmentationConfig;
use clap::Parser;
use std::path::PathBuf;

/// Exploratory analysis and K-Means segmentation of mall customer data.
///
/// Every flag is optional; running without arguments reads
/// `data/Mall_Customers.csv` and writes all artifacts to `visualizations/`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data/Mall_Customers.csv")]
    pub input: PathBuf,

    /// Directory receiving tables, charts and reports
    #[arg(short, long, default_value = "visualizations")]
    pub output_dir: PathBuf,

    /// Number of clusters for the final K-Means model
    #[arg(short = 'k', long, default_value = "5")]
    pub clusters: usize,

    /// Largest cluster count tried by the elbow sweep
    #[arg(long, default_value = "10")]
    pub max_k: usize,

    /// Seed for the K-Means initialisation
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Clustering parameters gathered from the command line
    pub fn segmentation_config(&self) -> crate::Result<SegmentationConfig> {
        if self.clusters == 0 {
            anyhow::bail!("Number of clusters must be at least 1");
        }
        if self.max_k == 0 {
            anyhow::bail!("Elbow sweep needs at least one cluster count");
        }

        Ok(SegmentationConfig {
            n_clusters: self.clusters,
            max_k: self.max_k,
            seed: self.seed,
            ..SegmentationConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_pipeline() {
        let args = Args::parse_from(["mallseg"]);

        assert_eq!(args.input, PathBuf::from("data/Mall_Customers.csv"));
        assert_eq!(args.output_dir, PathBuf::from("visualizations"));

        let config = args.segmentation_config().unwrap();
        assert_eq!(config.n_clusters, 5);
        assert_eq!(config.max_k, 10);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_segmentation_config() {
        let mut args = Args::parse_from(["mallseg", "-k", "3", "--max-k", "6", "--seed", "7"]);

        let config = args.segmentation_config().unwrap();
        assert_eq!(config.n_clusters, 3);
        assert_eq!(config.max_k, 6);
        assert_eq!(config.seed, 7);

        args.clusters = 0;
        assert!(args.segmentation_config().is_err());

        args.clusters = 5;
        args.max_k = 0;
        assert!(args.segmentation_config().is_err());
    }
}
