//! Static charts using Plotters

use crate::data::{CustomerData, NumericColumn, INCOME_COLUMN, SPENDING_COLUMN};
use crate::model::{ElbowCurve, Segmentation};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Colors of the gender boxes
const GROUP_COLORS: [RGBColor; 2] = [RGBColor(76, 114, 176), RGBColor(221, 132, 82)];

/// Anchors of the viridis color map, from 0 to 1
const VIRIDIS: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

/// Color of `cluster` among `n_clusters`, spread over the viridis map
pub fn cluster_color(cluster: usize, n_clusters: usize) -> RGBColor {
    let t = if n_clusters > 1 {
        cluster as f64 / (n_clusters - 1) as f64
    } else {
        0.0
    };
    interpolate(&VIRIDIS, t)
}

/// Diverging blue-white-red scale for a correlation in [-1, 1]
pub fn coolwarm(r: f64) -> RGBColor {
    const ANCHORS: [RGBColor; 3] = [
        RGBColor(59, 76, 192),
        RGBColor(221, 221, 221),
        RGBColor(180, 4, 38),
    ];
    interpolate(&ANCHORS, (r + 1.0) / 2.0)
}

fn interpolate(anchors: &[RGBColor], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let scaled = t * (anchors.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(anchors.len() - 2);
    let f = scaled - i as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    let (a, b) = (anchors[i], anchors[i + 1]);
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Padded `(min, max)` of a non-empty sample
fn bounds(values: &[f64], padding: f64) -> (f64, f64) {
    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let pad = ((max - min) * padding).max(1.0);
    (min - pad, max + pad)
}

/// Boxplots by gender for three columns plus a correlation heatmap
///
/// # Arguments
/// * `data` - Loaded customers
/// * `correlations` - 3x3 Pearson matrix of age, income and spending score
/// * `output_path` - Path to save the PNG image
pub fn create_detailed_analysis(
    data: &CustomerData,
    correlations: &[Vec<f64>],
    output_path: &Path,
) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (2000, 1500)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((2, 2));
    for (panel, column) in panels.iter().zip(NumericColumn::ALL) {
        draw_gender_boxplot(panel, data, column)?;
    }
    draw_correlation_heatmap(&panels[3], correlations)?;

    root.present()?;
    log::info!("Detailed analysis chart saved to: {}", output_path.display());

    Ok(())
}

fn draw_gender_boxplot(
    area: &Panel<'_>,
    data: &CustomerData,
    column: NumericColumn,
) -> crate::Result<()> {
    let genders = data.genders();
    let groups: Vec<Vec<f64>> = genders
        .iter()
        .map(|g| data.column_for_gender(column, g))
        .collect();
    let (lo, hi) = bounds(&data.column(column), 0.05);

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("{} Distribution by Gender", column.label()),
            ("sans-serif", 26),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(genders[..].into_segmented(), lo as f32..hi as f32)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Gender")
        .y_desc(column.header())
        .axis_desc_style(("sans-serif", 18))
        .x_label_formatter(&|v| match v {
            SegmentValue::Exact(g) | SegmentValue::CenterOf(g) => g.to_string(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(genders.iter().zip(&groups).enumerate().map(|(i, (g, values))| {
        let color = GROUP_COLORS[i % GROUP_COLORS.len()];
        Boxplot::new_vertical(SegmentValue::CenterOf(g), &Quartiles::new(values.as_slice()))
            .width(60)
            .whisker_width(0.5)
            .style(color.stroke_width(2))
    }))?;

    Ok(())
}

fn draw_correlation_heatmap(area: &Panel<'_>, correlations: &[Vec<f64>]) -> crate::Result<()> {
    let names: Vec<&str> = NumericColumn::ALL.iter().map(|c| c.label()).collect();
    let n = correlations.len() as i32;

    let mut chart = ChartBuilder::on(area)
        .caption("Correlation Heatmap", ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(120)
        .build_cartesian_2d(0i32..n, n..0i32)?;

    let (width, height) = chart.plotting_area().dim_in_pixel();
    let cell_w = (width as i32) / n.max(1);
    let cell_h = (height as i32) / n.max(1);
    let label = |i: &i32| names.get(*i as usize).map(|s| s.to_string()).unwrap_or_default();

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(names.len() + 1)
        .y_labels(names.len() + 1)
        .x_label_offset(cell_w / 2)
        .y_label_offset(cell_h / 2)
        .x_label_formatter(&label)
        .y_label_formatter(&label)
        .label_style(("sans-serif", 18))
        .draw()?;

    let cells: Vec<(i32, i32, f64)> = correlations
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, &r)| (x as i32, y as i32, r))
        })
        .collect();

    chart.draw_series(
        cells
            .iter()
            .map(|&(x, y, r)| Rectangle::new([(x, y), (x + 1, y + 1)], coolwarm(r).filled())),
    )?;

    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        EmptyElement::at((x, y))
            + Text::new(
                format!("{:.2}", r),
                (cell_w / 2 - 20, cell_h / 2 - 10),
                ("sans-serif", 22).into_font(),
            )
    }))?;

    Ok(())
}

/// Line chart of inertia against cluster count
pub fn create_elbow_chart(curve: &ElbowCurve, output_path: &Path) -> crate::Result<()> {
    let max_k = curve.points.last().map(|&(k, _)| k).unwrap_or(1);
    let max_inertia = curve.inertias().into_iter().fold(0.0, f64::max);

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Elbow Method for K-means", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0.5f64..(max_k as f64 + 0.5), 0f64..(max_inertia * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("k")
        .y_desc("Inertia")
        .x_labels(max_k + 1)
        .x_label_formatter(&|k| format!("{:.0}", k))
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(f64, f64)> = curve
        .points
        .iter()
        .map(|&(k, inertia)| (k as f64, inertia))
        .collect();

    chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&point| Cross::new(point, 6, BLUE.stroke_width(2))),
    )?;

    root.present()?;
    log::info!("Elbow chart saved to: {}", output_path.display());

    Ok(())
}

/// Scatter of income vs spending score colored by cluster, with decoded centers
///
/// # Arguments
/// * `data` - Loaded customers
/// * `segmentation` - Final model, labels and scaler
/// * `output_path` - Path to save the PNG plot
pub fn create_segmentation_chart(
    data: &CustomerData,
    segmentation: &Segmentation,
    output_path: &Path,
) -> crate::Result<()> {
    let incomes = data.column(NumericColumn::AnnualIncome);
    let scores = data.column(NumericColumn::SpendingScore);
    let labels = segmentation.labels();
    let n_clusters = segmentation.model.n_clusters;

    let (x_min, x_max) = bounds(&incomes, 0.05);
    let (y_min, y_max) = bounds(&scores, 0.05);

    let root = BitMapBackend::new(output_path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Segmentation", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(INCOME_COLUMN)
        .y_desc(SPENDING_COLUMN)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for cluster in 0..n_clusters {
        let color = cluster_color(cluster, n_clusters);
        let members = incomes
            .iter()
            .zip(&scores)
            .zip(labels.iter())
            .filter(|(_, &label)| label == cluster)
            .map(|((&x, &y), _)| Circle::new((x, y), 5, color.filled()));

        chart
            .draw_series(members)?
            .label(format!("Cluster {}", cluster))
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    let centers = segmentation.decoded_centers();
    chart
        .draw_series(
            centers
                .outer_iter()
                .map(|center| Cross::new((center[0], center[1]), 12, RED.stroke_width(3))),
        )?
        .label("Cluster Centers")
        .legend(|(x, y)| Cross::new((x, y), 6, RED.stroke_width(3)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("Segmentation chart saved to: {}", output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sample_customers;
    use crate::model::{segment_customers, SegmentationConfig};
    use crate::stats::correlation_matrix;
    use tempfile::tempdir;

    #[test]
    fn test_color_scales() {
        assert_eq!(cluster_color(0, 5), VIRIDIS[0]);
        assert_eq!(cluster_color(4, 5), VIRIDIS[4]);
        assert_eq!(cluster_color(0, 1), VIRIDIS[0]);
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(f64::NAN), RGBColor(221, 221, 221));
    }

    #[test]
    fn test_create_detailed_analysis() {
        let data = sample_customers();
        let columns: Vec<Vec<f64>> = NumericColumn::ALL.iter().map(|&c| data.column(c)).collect();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("detailed_analysis.png");

        create_detailed_analysis(&data, &correlation_matrix(&columns), &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_elbow_chart() {
        let curve = ElbowCurve {
            points: vec![(1, 80.0), (2, 41.5), (3, 20.2), (4, 12.0)],
        };
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("elbow_method.png");

        create_elbow_chart(&curve, &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_segmentation_chart() {
        let data = sample_customers();
        let segmentation = segment_customers(&data, &SegmentationConfig::default()).unwrap();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("customer_segmentation.png");

        create_segmentation_chart(&data, &segmentation, &output_path).unwrap();
        assert!(output_path.exists());
    }
}
