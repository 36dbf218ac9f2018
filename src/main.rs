//! MallSeg: customer analysis and segmentation entrypoint
//!
//! Runs loading, exploratory analysis, segmentation and segment
//! visualization in order.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use mallseg::{run_pipeline, Args};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let config = args.segmentation_config()?;
    run_pipeline(&args.input, &args.output_dir, &config)?;

    Ok(())
}
