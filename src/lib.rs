//! MallSeg: exploratory analysis and K-Means segmentation of mall customers
//!
//! This library loads a customer table (age, gender, income, spending score),
//! writes descriptive statistics, charts and a gender t-test, and segments
//! customers with K-Means on standardized income and spending score.

pub mod analysis;
pub mod cli;
pub mod data;
pub mod interactive;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod segments;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_customers, Customer, CustomerData, StandardScaler};
pub use model::{elbow_sweep, fit_kmeans, segment_customers, KMeansModel, SegmentationConfig};
pub use pipeline::{run_pipeline, PipelineSummary};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
