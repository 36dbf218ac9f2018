//! Output directory layout and table/text writers

use anyhow::Context;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const BASIC_STATISTICS: &str = "basic_statistics.csv";
pub const GENDER_DISTRIBUTION: &str = "gender_distribution.csv";
pub const CORRELATION_MATRIX: &str = "correlation_matrix.csv";
pub const DETAILED_ANALYSIS: &str = "detailed_analysis.png";
pub const SEGMENTATION_3D: &str = "3d_segmentation.html";
pub const INTERACTIVE_ANALYSIS: &str = "interactive_analysis.html";
pub const STATISTICAL_TESTS: &str = "statistical_tests.txt";
pub const ELBOW_TABLE: &str = "elbow_method.csv";
pub const ELBOW_CHART: &str = "elbow_method.png";
pub const CLUSTER_CENTERS: &str = "cluster_centers.csv";
pub const SEGMENTATION_CHART: &str = "customer_segmentation.png";
pub const CLUSTER_ANALYSIS: &str = "detailed_cluster_analysis.csv";

/// Directory receiving every artifact of a run
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Create the directory (and parents) if absent
    pub fn create(root: impl Into<PathBuf>) -> crate::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create output directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Write a table as CSV with a header row
    pub fn write_table(&self, file_name: &str, df: &mut DataFrame) -> crate::Result<PathBuf> {
        let path = self.path(file_name);
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("Saved {}", path.display());
        Ok(path)
    }

    pub fn write_text(&self, file_name: &str, contents: &str) -> crate::Result<PathBuf> {
        let path = self.path(file_name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("Saved {}", path.display());
        Ok(path)
    }
}
