//! Customer data loading and feature standardization using Polars

use anyhow::Context;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use std::path::Path;

pub const ID_COLUMN: &str = "CustomerID";
pub const GENDER_COLUMN: &str = "Gender";
pub const AGE_COLUMN: &str = "Age";
pub const INCOME_COLUMN: &str = "Annual Income (k$)";
pub const SPENDING_COLUMN: &str = "Spending Score (1-100)";

/// Number of rows shown in the data overview
const PREVIEW_ROWS: usize = 5;

/// One row of the customer file
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub gender: String,
    pub age: u32,
    /// Annual income in thousands of dollars
    pub annual_income: f64,
    /// Spending score, 1 to 100
    pub spending_score: u32,
}

/// Numeric attributes of a customer record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Age,
    AnnualIncome,
    SpendingScore,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 3] = [
        NumericColumn::Age,
        NumericColumn::AnnualIncome,
        NumericColumn::SpendingScore,
    ];

    /// Header of the column in the input file
    pub fn header(self) -> &'static str {
        match self {
            NumericColumn::Age => AGE_COLUMN,
            NumericColumn::AnnualIncome => INCOME_COLUMN,
            NumericColumn::SpendingScore => SPENDING_COLUMN,
        }
    }

    /// Short label used in chart titles
    pub fn label(self) -> &'static str {
        match self {
            NumericColumn::Age => "Age",
            NumericColumn::AnnualIncome => "Income",
            NumericColumn::SpendingScore => "Spending Score",
        }
    }

    fn value(self, customer: &Customer) -> f64 {
        match self {
            NumericColumn::Age => customer.age as f64,
            NumericColumn::AnnualIncome => customer.annual_income,
            NumericColumn::SpendingScore => customer.spending_score as f64,
        }
    }
}

/// Loaded customer dataset
#[derive(Debug, Clone)]
pub struct CustomerData {
    /// Table as read from disk, kept for display
    pub frame: DataFrame,
    /// Customer records in file order
    pub customers: Vec<Customer>,
}

impl CustomerData {
    /// Build a dataset from records, e.g. for tests or generated data
    pub fn from_customers(customers: Vec<Customer>) -> crate::Result<Self> {
        let frame = df!(
            ID_COLUMN => customers.iter().map(|c| c.id).collect::<Vec<_>>(),
            GENDER_COLUMN => customers.iter().map(|c| c.gender.as_str()).collect::<Vec<_>>(),
            AGE_COLUMN => customers.iter().map(|c| c.age).collect::<Vec<_>>(),
            INCOME_COLUMN => customers.iter().map(|c| c.annual_income).collect::<Vec<_>>(),
            SPENDING_COLUMN => customers.iter().map(|c| c.spending_score).collect::<Vec<_>>()
        )?;

        Ok(Self { frame, customers })
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Values of one numeric attribute, in record order
    pub fn column(&self, column: NumericColumn) -> Vec<f64> {
        self.customers.iter().map(|c| column.value(c)).collect()
    }

    /// Values of one numeric attribute for customers of the given gender
    pub fn column_for_gender(&self, column: NumericColumn, gender: &str) -> Vec<f64> {
        self.customers
            .iter()
            .filter(|c| c.gender == gender)
            .map(|c| column.value(c))
            .collect()
    }

    /// Distinct gender values in order of first appearance
    pub fn genders(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for customer in &self.customers {
            if !seen.contains(&customer.gender.as_str()) {
                seen.push(&customer.gender);
            }
        }
        seen
    }

    /// Income and spending score as an (n, 2) matrix, the clustering features
    pub fn segmentation_features(&self) -> Array2<f64> {
        let mut features = Array2::zeros((self.len(), 2));
        for (mut row, customer) in features.outer_iter_mut().zip(&self.customers) {
            row[0] = customer.annual_income;
            row[1] = customer.spending_score as f64;
        }
        features
    }

    /// Print the first rows and a per-column summary
    pub fn print_overview(&self) {
        println!("\nData Overview:");
        println!("{}", self.frame.head(Some(PREVIEW_ROWS)));

        println!("\nData Information:");
        println!("Rows: {}", self.frame.height());
        println!("  {:<3} {:<24} {:>14}  {}", "#", "Column", "Non-Null Count", "Dtype");
        for (i, series) in self.frame.get_columns().iter().enumerate() {
            let non_null = series.len() - series.null_count();
            println!(
                "  {:<3} {:<24} {:>14}  {}",
                i,
                series.name(),
                format!("{} non-null", non_null),
                series.dtype()
            );
        }
    }
}

/// Load the customer CSV file
///
/// # Arguments
/// * `file_path` - Path to a CSV file with the columns
///   `CustomerID,Gender,Age,Annual Income (k$),Spending Score (1-100)`
///
/// # Returns
/// * `CustomerData` holding the raw table and typed records
pub fn load_customers(file_path: &Path) -> crate::Result<CustomerData> {
    if !file_path.is_file() {
        anyhow::bail!("Input file not found: {}", file_path.display());
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", file_path.display()))?;

    if frame.height() == 0 {
        anyhow::bail!("No customer rows found in {}", file_path.display());
    }

    let customers = extract_customers(&frame)?;

    Ok(CustomerData { frame, customers })
}

/// Convert the typed columns of the table to customer records
fn extract_customers(df: &DataFrame) -> crate::Result<Vec<Customer>> {
    let ids = required_column(df, ID_COLUMN, &DataType::Int64)?;
    let ids: Vec<i64> = ids.i64()?.into_no_null_iter().collect();

    let genders = required_column(df, GENDER_COLUMN, &DataType::String)?;
    let genders: Vec<String> = genders
        .str()?
        .into_no_null_iter()
        .map(|g| g.trim().to_string())
        .collect();

    let ages = required_column(df, AGE_COLUMN, &DataType::UInt32)?;
    let ages: Vec<u32> = ages.u32()?.into_no_null_iter().collect();

    let incomes = required_column(df, INCOME_COLUMN, &DataType::Float64)?;
    let incomes: Vec<f64> = incomes.f64()?.into_no_null_iter().collect();

    let scores = required_column(df, SPENDING_COLUMN, &DataType::UInt32)?;
    let scores: Vec<u32> = scores.u32()?.into_no_null_iter().collect();

    let customers = ids
        .into_iter()
        .zip(genders)
        .zip(ages)
        .zip(incomes)
        .zip(scores)
        .map(|((((id, gender), age), annual_income), spending_score)| Customer {
            id,
            gender,
            age,
            annual_income,
            spending_score,
        })
        .collect();

    Ok(customers)
}

/// Fetch a column, cast it to the expected type and reject missing values
fn required_column(df: &DataFrame, name: &str, dtype: &DataType) -> crate::Result<Series> {
    let series = df
        .column(name)
        .with_context(|| format!("Missing column '{}'", name))?
        .strict_cast(dtype)
        .with_context(|| format!("Column '{}' is not of type {}", name, dtype))?;

    if series.null_count() > 0 {
        anyhow::bail!(
            "Column '{}' has {} missing values",
            name,
            series.null_count()
        );
    }

    Ok(series)
}

/// Standardizes features to zero mean and unit variance
///
/// Uses the population standard deviation. A constant feature keeps a
/// scale of one so it maps to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and standard deviation
    pub fn fit(data: &Array2<f64>) -> Self {
        let n_features = data.ncols();
        if data.nrows() == 0 {
            return Self {
                mean: Array1::zeros(n_features),
                scale: Array1::ones(n_features),
            };
        }

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        Self { mean, scale }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.scale
    }

    /// Map standardized values back to original units
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Array2<f64> {
        data * &self.scale + &self.mean
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const HEADER: &str =
        "CustomerID,Gender,Age,Annual Income (k$),Spending Score (1-100)";

    pub(crate) fn create_test_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    /// Small mall-like dataset with five visible income/spending groups
    pub(crate) fn sample_customers() -> CustomerData {
        let centers = [(25.0, 20.0), (25.0, 80.0), (55.0, 50.0), (85.0, 15.0), (85.0, 85.0)];
        let mut customers = Vec::new();
        for (group, &(income, score)) in centers.iter().enumerate() {
            for j in 0..8 {
                let id = (group * 8 + j + 1) as i64;
                customers.push(Customer {
                    id,
                    gender: if (group + j) % 2 == 0 { "Male" } else { "Female" }.to_string(),
                    age: 19 + ((group * 7 + j * 5) % 50) as u32,
                    annual_income: income + (j as f64 - 3.5),
                    spending_score: (score + ((j * 3) % 7) as f64 - 3.0) as u32,
                });
            }
        }
        CustomerData::from_customers(customers).unwrap()
    }

    #[test]
    fn test_load_customers() {
        let file = create_test_csv(&[
            "1,Male,19,15,39",
            "2,Male,21,15,81",
            "3,Female,20,16,6",
            "4,Female,23,16,77",
        ]);

        let data = load_customers(file.path()).unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.frame.shape(), (4, 5));
        assert_eq!(
            data.customers[2],
            Customer {
                id: 3,
                gender: "Female".to_string(),
                age: 20,
                annual_income: 16.0,
                spending_score: 6,
            }
        );
        assert_eq!(data.genders(), vec!["Male", "Female"]);
        assert_eq!(data.column(NumericColumn::SpendingScore), vec![39.0, 81.0, 6.0, 77.0]);
        assert_eq!(
            data.column_for_gender(NumericColumn::Age, "Female"),
            vec![20.0, 23.0]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_customers(Path::new("does/not/exist.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "CustomerID,Gender,Age").unwrap();
        writeln!(file, "1,Male,19").unwrap();

        assert!(load_customers(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_values() {
        let file = create_test_csv(&["1,Male,19,15,39", "2,Female,,16,81"]);
        assert!(load_customers(file.path()).is_err());
    }

    #[test]
    fn test_segmentation_features() {
        let data = sample_customers();
        let features = data.segmentation_features();

        assert_eq!(features.shape(), &[40, 2]);
        assert_eq!(features[[0, 0]], data.customers[0].annual_income);
        assert_eq!(features[[39, 1]], data.customers[39].spending_score as f64);
    }

    #[test]
    fn test_standard_scaler() {
        let raw = array![[15.0, 39.0], [16.0, 81.0], [17.0, 6.0], [99.0, 72.0], [98.0, 70.0]];
        let scaler = StandardScaler::fit(&raw);
        let scaled = scaler.transform(&raw);

        for column in scaled.axis_iter(Axis(1)) {
            assert!(column.mean().unwrap().abs() < 1e-12);
            assert!((column.std(0.0) - 1.0).abs() < 1e-12);
        }

        let restored = scaler.inverse_transform(&scaled);
        for (a, b) in restored.iter().zip(raw.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_standard_scaler_constant_feature() {
        let raw = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&raw);
        let scaled = scaler.transform(&raw);

        assert_eq!(scaler.scale[1], 1.0);
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }
}
