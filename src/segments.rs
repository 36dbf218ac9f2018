//! Segment tables: elbow curve, cluster centers and per-cluster aggregates

use crate::data::{
    CustomerData, NumericColumn, AGE_COLUMN, GENDER_COLUMN, ID_COLUMN, INCOME_COLUMN,
    SPENDING_COLUMN,
};
use crate::model::{ElbowCurve, Segmentation};
use crate::output::{self, OutputDir};
use crate::viz;
use polars::prelude::*;

pub const CLUSTER_COLUMN: &str = "Cluster";

/// Elbow sweep as a `k,inertia` table
pub fn elbow_table(curve: &ElbowCurve) -> crate::Result<DataFrame> {
    let ks: Vec<u32> = curve.points.iter().map(|&(k, _)| k as u32).collect();
    Ok(df!("k" => ks, "inertia" => curve.inertias())?)
}

/// Decoded cluster centers in income and spending score units
pub fn centers_table(segmentation: &Segmentation) -> crate::Result<DataFrame> {
    let centers = segmentation.decoded_centers();
    Ok(df!(
        INCOME_COLUMN => centers.column(0).to_vec(),
        SPENDING_COLUMN => centers.column(1).to_vec()
    )?)
}

/// Customer table with the assigned cluster appended
pub fn labeled_frame(data: &CustomerData, segmentation: &Segmentation) -> crate::Result<DataFrame> {
    let labels: Vec<u32> = segmentation.labels().iter().map(|&l| l as u32).collect();
    if labels.len() != data.len() {
        anyhow::bail!(
            "Got {} cluster labels for {} customers",
            labels.len(),
            data.len()
        );
    }

    Ok(df!(
        ID_COLUMN => data.customers.iter().map(|c| c.id).collect::<Vec<_>>(),
        GENDER_COLUMN => data.customers.iter().map(|c| c.gender.as_str()).collect::<Vec<_>>(),
        AGE_COLUMN => data.column(NumericColumn::Age),
        INCOME_COLUMN => data.column(NumericColumn::AnnualIncome),
        SPENDING_COLUMN => data.column(NumericColumn::SpendingScore),
        CLUSTER_COLUMN => labels
    )?)
}

/// Mean, std, min and max per cluster plus the gender counts
///
/// Rows are sorted by cluster id; empty clusters have no row.
pub fn cluster_analysis(labeled: &DataFrame) -> crate::Result<DataFrame> {
    let aggregates: Vec<Expr> = NumericColumn::ALL
        .iter()
        .flat_map(|column| {
            let name = column.header();
            [
                col(name).mean().round(2).alias(&format!("{}_mean", name)),
                col(name).std(1).round(2).alias(&format!("{}_std", name)),
                col(name).min().round(2).alias(&format!("{}_min", name)),
                col(name).max().round(2).alias(&format!("{}_max", name)),
            ]
        })
        .collect();

    let mut analysis = labeled
        .clone()
        .lazy()
        .group_by([col(CLUSTER_COLUMN)])
        .agg(aggregates)
        .sort([CLUSTER_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let counts = gender_counts(labeled)?;
    let clusters = analysis.column(CLUSTER_COLUMN)?.u32()?;
    let distributions: Vec<String> = clusters
        .into_no_null_iter()
        .map(|cluster| {
            let rows: Vec<(&str, u32)> = counts
                .iter()
                .filter(|(c, _, _)| *c == cluster)
                .map(|(_, gender, count)| (gender.as_str(), *count))
                .collect();
            format_counts(&rows)
        })
        .collect();

    analysis.with_column(Series::new(GENDER_COLUMN, distributions))?;
    Ok(analysis)
}

/// Customers per (cluster, gender), most frequent gender first within a cluster
fn gender_counts(labeled: &DataFrame) -> crate::Result<Vec<(u32, String, u32)>> {
    let counts = labeled
        .clone()
        .lazy()
        .group_by([col(CLUSTER_COLUMN), col(GENDER_COLUMN)])
        .agg([len().alias("count")])
        .sort(
            [CLUSTER_COLUMN, "count", GENDER_COLUMN],
            SortMultipleOptions::default().with_order_descending_multi([false, true, false]),
        )
        .collect()?;

    let clusters = counts.column(CLUSTER_COLUMN)?.u32()?;
    let genders = counts.column(GENDER_COLUMN)?.str()?;
    let sizes = counts.column("count")?.u32()?;

    Ok(clusters
        .into_no_null_iter()
        .zip(genders.into_no_null_iter())
        .zip(sizes.into_no_null_iter())
        .map(|((cluster, gender), count)| (cluster, gender.to_string(), count))
        .collect())
}

/// `Female: 12; Male: 9`
fn format_counts(counts: &[(&str, u32)]) -> String {
    counts
        .iter()
        .map(|(value, count)| format!("{}: {}", value, count))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Mean age, income and spending score per cluster
pub fn cluster_characteristics(labeled: &DataFrame) -> crate::Result<DataFrame> {
    let means: Vec<Expr> = NumericColumn::ALL
        .iter()
        .map(|column| col(column.header()).mean().round(2))
        .collect();

    Ok(labeled
        .clone()
        .lazy()
        .group_by([col(CLUSTER_COLUMN)])
        .agg(means)
        .sort([CLUSTER_COLUMN], SortMultipleOptions::default())
        .collect()?)
}

/// Write the segmentation stage tables and chart
pub fn write_segmentation(
    segmentation: &Segmentation,
    out: &OutputDir,
) -> crate::Result<()> {
    out.write_table(output::ELBOW_TABLE, &mut elbow_table(&segmentation.elbow)?)?;
    viz::create_elbow_chart(&segmentation.elbow, &out.path(output::ELBOW_CHART))?;
    out.write_table(output::CLUSTER_CENTERS, &mut centers_table(segmentation)?)?;
    Ok(())
}

/// Render the final segmentation and write the per-cluster analysis
///
/// # Returns
/// * The per-cluster means, for printing
pub fn visualize_segments(
    data: &CustomerData,
    segmentation: &Segmentation,
    out: &OutputDir,
) -> crate::Result<DataFrame> {
    viz::create_segmentation_chart(data, segmentation, &out.path(output::SEGMENTATION_CHART))?;

    let labeled = labeled_frame(data, segmentation)?;
    out.write_table(output::CLUSTER_ANALYSIS, &mut cluster_analysis(&labeled)?)?;

    cluster_characteristics(&labeled)
}
