//! Exploratory analysis: summary tables, charts and the gender t-test

use crate::data::{CustomerData, NumericColumn, GENDER_COLUMN, ID_COLUMN};
use crate::interactive;
use crate::output::{self, OutputDir};
use crate::stats::{self, Summary, TTestResult, Variance, ALPHA};
use crate::viz;
use polars::prelude::*;

/// Gender compared against `GROUP_B` in the spending test
pub const GROUP_A: &str = "Male";
pub const GROUP_B: &str = "Female";

/// Spending score t-tests between the two genders
#[derive(Debug, Clone, PartialEq)]
pub struct GenderSpendingTest {
    pub student: TTestResult,
    pub welch: TTestResult,
}

impl GenderSpendingTest {
    /// Plain-text report written next to the charts
    pub fn report(&self) -> String {
        format!(
            "Gender Differences in Spending:\n\
             t-statistic: {:.4}\n\
             p-value: {:.4}\n\
             \n\
             Interpretation: {} in spending patterns between genders\n\
             \n\
             Welch's t-test (unequal variances):\n\
             t-statistic: {:.4}\n\
             p-value: {:.4}\n\
             degrees of freedom: {:.2}\n",
            self.student.t_statistic,
            self.student.p_value,
            self.student.verdict(ALPHA),
            self.welch.t_statistic,
            self.welch.p_value,
            self.welch.degrees_of_freedom,
        )
    }
}

/// `describe()`-style table of the numeric columns, rounded to 2 decimals
pub fn summary_table(data: &CustomerData) -> crate::Result<DataFrame> {
    let names = std::iter::once(ID_COLUMN).chain(NumericColumn::ALL.iter().map(|c| c.header()));

    let mut columns = vec![Series::new("statistic", Summary::ROW_NAMES.to_vec())];
    for name in names {
        let summary = Summary::of(data.frame.column(name)?)?;
        columns.push(Series::new(name, summary.rounded_values().to_vec()));
    }

    Ok(DataFrame::new(columns)?)
}

/// Count per gender value, most frequent first
///
/// Equal counts are ordered by gender so the table is stable.
pub fn gender_distribution(data: &CustomerData) -> crate::Result<DataFrame> {
    Ok(data
        .frame
        .clone()
        .lazy()
        .group_by([col(GENDER_COLUMN)])
        .agg([len().alias("count")])
        .sort(
            ["count", GENDER_COLUMN],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?)
}

/// Pearson correlations of age, income and spending score
pub fn correlations(data: &CustomerData) -> Vec<Vec<f64>> {
    let columns: Vec<Vec<f64>> = NumericColumn::ALL.iter().map(|&c| data.column(c)).collect();
    stats::correlation_matrix(&columns)
}

fn correlation_table(matrix: &[Vec<f64>]) -> crate::Result<DataFrame> {
    let names: Vec<&str> = NumericColumn::ALL.iter().map(|c| c.header()).collect();
    let mut columns = vec![Series::new("column", names.clone())];
    for (j, name) in names.iter().enumerate() {
        let values: Vec<f64> = matrix.iter().map(|row| stats::round2(row[j])).collect();
        columns.push(Series::new(name, values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Compare spending scores of `GROUP_A` and `GROUP_B`
pub fn gender_spending_test(data: &CustomerData) -> crate::Result<GenderSpendingTest> {
    let group_a = data.column_for_gender(NumericColumn::SpendingScore, GROUP_A);
    let group_b = data.column_for_gender(NumericColumn::SpendingScore, GROUP_B);

    Ok(GenderSpendingTest {
        student: stats::t_test(&group_a, &group_b, Variance::Pooled)?,
        welch: stats::t_test(&group_a, &group_b, Variance::Unequal)?,
    })
}

/// Run the exploratory stage and write its artifacts
pub fn analyze(data: &CustomerData, out: &OutputDir) -> crate::Result<GenderSpendingTest> {
    out.write_table(output::BASIC_STATISTICS, &mut summary_table(data)?)?;
    out.write_table(output::GENDER_DISTRIBUTION, &mut gender_distribution(data)?)?;

    let matrix = correlations(data);
    out.write_table(output::CORRELATION_MATRIX, &mut correlation_table(&matrix)?)?;
    viz::create_detailed_analysis(data, &matrix, &out.path(output::DETAILED_ANALYSIS))?;

    interactive::write_html(
        &interactive::build_3d_scatter(data),
        &out.path(output::SEGMENTATION_3D),
    )?;
    interactive::write_html(
        &interactive::build_interactive_panel(data),
        &out.path(output::INTERACTIVE_ANALYSIS),
    )?;

    let test = gender_spending_test(data)?;
    out.write_text(output::STATISTICAL_TESTS, &test.report())?;
    log::info!(
        "Spending t-test: t = {:.4}, p = {:.4}",
        test.student.t_statistic,
        test.student.p_value
    );

    Ok(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sample_customers;
    use crate::data::Customer;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_summary_table() {
        let data = sample_customers();
        let table = summary_table(&data).unwrap();

        assert_eq!(table.shape(), (8, 5));
        let counts = table.column(ID_COLUMN).unwrap().f64().unwrap();
        assert_eq!(counts.get(0), Some(40.0));
        assert_eq!(counts.get(1), Some(20.5));
        assert_eq!(counts.get(3), Some(1.0));
        assert_eq!(counts.get(7), Some(40.0));
    }

    #[test]
    fn test_summary_table_quartiles() {
        let data = sample_customers();
        let table = summary_table(&data).unwrap();

        // CustomerID runs 1..=40: quartiles at ranks 9.75 and 29.25
        let ids = table.column(ID_COLUMN).unwrap().f64().unwrap();
        assert_eq!(ids.get(4), Some(10.75));
        assert_eq!(ids.get(5), Some(20.5));
        assert_eq!(ids.get(6), Some(30.25));
        assert_eq!(ids.get(2), Some(11.69));
    }

    #[test]
    fn test_gender_distribution() {
        let data = sample_customers();
        let table = gender_distribution(&data).unwrap();

        assert_eq!(table.height(), 2);
        let total: u32 = table
            .column("count")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .sum();
        assert_eq!(total, 40);
    }

    #[test]
    fn test_gender_distribution_order() {
        let customers = ["Male", "Female", "Female", "Male", "Female"]
            .iter()
            .enumerate()
            .map(|(i, gender)| Customer {
                id: i as i64 + 1,
                gender: gender.to_string(),
                age: 30,
                annual_income: 50.0,
                spending_score: 50,
            })
            .collect();
        let data = CustomerData::from_customers(customers).unwrap();

        let table = gender_distribution(&data).unwrap();
        let genders: Vec<&str> = table
            .column(GENDER_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let counts: Vec<u32> = table
            .column("count")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect();

        assert_eq!(genders, vec!["Female", "Male"]);
        assert_eq!(counts, vec![3, 2]);
    }

    #[test]
    fn test_report_format() {
        let data = sample_customers();
        let report = gender_spending_test(&data).unwrap().report();

        assert!(report.starts_with("Gender Differences in Spending:\nt-statistic: "));
        assert!(report.contains("p-value: "));
        assert!(report.contains("difference in spending patterns between genders"));
    }

    #[test]
    fn test_analyze_writes_artifacts() {
        let data = sample_customers();
        let temp_dir = tempdir().unwrap();
        let out = OutputDir::create(temp_dir.path().join("visualizations")).unwrap();

        analyze(&data, &out).unwrap();

        for name in [
            output::BASIC_STATISTICS,
            output::GENDER_DISTRIBUTION,
            output::CORRELATION_MATRIX,
            output::DETAILED_ANALYSIS,
            output::SEGMENTATION_3D,
            output::INTERACTIVE_ANALYSIS,
            output::STATISTICAL_TESTS,
        ] {
            assert!(out.path(name).exists(), "missing {}", name);
        }

        let stats = fs::read_to_string(out.path(output::BASIC_STATISTICS)).unwrap();
        assert!(stats.starts_with("statistic,CustomerID,Age,"));
    }
}
