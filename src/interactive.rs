//! Interactive HTML figures using Plotly

use crate::data::{CustomerData, NumericColumn};
use anyhow::Context;
use plotly::common::{Anchor, Marker, Mode, Title};
use plotly::layout::{Annotation, Axis, GridPattern, Layout, LayoutGrid, LayoutScene};
use plotly::{Histogram, Plot, Scatter, Scatter3D};
use std::fs;
use std::path::Path;

/// Subplot titles of the interactive panel, keyed by the x axis of each cell
const PANEL_TITLES: [(&str, &str); 4] = [
    ("x", "Age Distribution"),
    ("x2", "Income Distribution"),
    ("x3", "Spending Score Distribution"),
    ("x4", "Income vs Spending Score"),
];

/// 3D scatter of age, income and spending score with one trace per gender
pub fn build_3d_scatter(data: &CustomerData) -> Plot {
    let mut plot = Plot::new();

    for gender in data.genders() {
        let trace = Scatter3D::new(
            data.column_for_gender(NumericColumn::Age, gender),
            data.column_for_gender(NumericColumn::AnnualIncome, gender),
            data.column_for_gender(NumericColumn::SpendingScore, gender),
        )
        .mode(Mode::Markers)
        .marker(Marker::new().size(4))
        .name(gender);
        plot.add_trace(trace);
    }

    plot.set_layout(
        Layout::new()
            .title(Title::with_text("3D Customer Segmentation"))
            .scene(
                LayoutScene::new()
                    .x_axis(Axis::new().title(Title::with_text(NumericColumn::Age.header())))
                    .y_axis(Axis::new().title(Title::with_text(NumericColumn::AnnualIncome.header())))
                    .z_axis(Axis::new().title(Title::with_text(NumericColumn::SpendingScore.label()))),
            )
            .height(800)
            .width(1000),
    );
    plot
}

/// Histograms of the three numeric columns and an income vs spending scatter
pub fn build_interactive_panel(data: &CustomerData) -> Plot {
    let mut plot = Plot::new();

    let histograms = [
        (NumericColumn::Age, "x", "y"),
        (NumericColumn::AnnualIncome, "x2", "y2"),
        (NumericColumn::SpendingScore, "x3", "y3"),
    ];
    for (column, x_axis, y_axis) in histograms {
        let trace = Histogram::new(data.column(column))
            .name(column.label())
            .x_axis(x_axis)
            .y_axis(y_axis);
        plot.add_trace(trace);
    }

    let scatter = Scatter::new(
        data.column(NumericColumn::AnnualIncome),
        data.column(NumericColumn::SpendingScore),
    )
    .mode(Mode::Markers)
    .name("Income vs Spending")
    .x_axis("x4")
    .y_axis("y4");
    plot.add_trace(scatter);

    let axis = |title: &str| Axis::new().title(Title::with_text(title));
    let layout = Layout::new()
        .title(Title::with_text("Interactive Customer Analysis"))
        .height(800)
        .width(1200)
        .grid(
            LayoutGrid::new()
                .rows(2)
                .columns(2)
                .pattern(GridPattern::Independent),
        )
        .annotations(panel_titles())
        .x_axis(axis(NumericColumn::Age.header()))
        .y_axis(axis("Count"))
        .x_axis2(axis(NumericColumn::AnnualIncome.header()))
        .y_axis2(axis("Count"))
        .x_axis3(axis(NumericColumn::SpendingScore.header()))
        .y_axis3(axis("Count"))
        .x_axis4(axis(NumericColumn::AnnualIncome.header()))
        .y_axis4(axis(NumericColumn::SpendingScore.header()));
    plot.set_layout(layout);

    plot
}

/// One title per grid cell, centered just above its plot area
fn panel_titles() -> Vec<Annotation> {
    PANEL_TITLES
        .iter()
        .map(|(x_axis, title)| {
            let y_axis = x_axis.replacen('x', "y", 1);
            Annotation::new()
                .text(*title)
                .x_ref(format!("{} domain", x_axis))
                .y_ref(format!("{} domain", y_axis))
                .x(0.5)
                .y(1.0)
                .x_anchor(Anchor::Center)
                .y_anchor(Anchor::Bottom)
                .show_arrow(false)
        })
        .collect()
}

/// Write a figure as a standalone HTML document
pub fn write_html(plot: &Plot, output_path: &Path) -> crate::Result<()> {
    fs::write(output_path, plot.to_html())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    log::info!("Interactive figure saved to: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sample_customers;
    use tempfile::tempdir;

    #[test]
    fn test_3d_scatter_has_trace_per_gender() {
        let data = sample_customers();
        let html = build_3d_scatter(&data).to_html();

        assert!(html.contains("scatter3d"));
        assert!(html.contains("3D Customer Segmentation"));
        assert!(html.contains("\"Male\""));
        assert!(html.contains("\"Female\""));
    }

    #[test]
    fn test_3d_scatter_axis_titles() {
        let data = sample_customers();
        let html = build_3d_scatter(&data).to_html();

        assert!(html.contains("\"scene\""));
        assert!(html.contains("\"zaxis\""));
        assert!(html.contains("\"Age\""));
        assert!(html.contains("Annual Income (k$)"));
        assert!(html.contains("\"Spending Score\""));
    }

    #[test]
    fn test_interactive_panel() {
        let data = sample_customers();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("interactive_analysis.html");

        write_html(&build_interactive_panel(&data), &output_path).unwrap();

        let html = fs::read_to_string(&output_path).unwrap();
        assert!(html.contains("histogram"));
        assert!(html.contains("Interactive Customer Analysis"));
        assert!(html.contains("Income vs Spending"));
    }

    #[test]
    fn test_panel_titles_sit_above_each_cell() {
        let titles = panel_titles();
        assert_eq!(titles.len(), 4);

        let html = build_interactive_panel(&sample_customers()).to_html();
        assert!(html.contains("\"annotations\""));
        for (x_axis, title) in PANEL_TITLES {
            assert!(html.contains(title), "missing title {}", title);
            assert!(html.contains(&format!("\"{} domain\"", x_axis)));
        }
        assert!(html.contains("\"y4 domain\""));
        assert!(html.contains("\"showarrow\":false"));
    }
}
