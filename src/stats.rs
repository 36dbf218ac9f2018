//! Descriptive statistics and the two-sample t-test

use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance level used for the test verdict
pub const ALPHA: f64 = 0.05;

/// Column summary in the layout of a `describe()` table
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    pub const ROW_NAMES: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Summarize a non-empty numeric column
    ///
    /// Nulls are skipped. Quantiles interpolate linearly between ranks
    /// and the standard deviation uses `n - 1`.
    pub fn of(column: &Series) -> crate::Result<Self> {
        let values = column.cast(&DataType::Float64)?;
        let ca = values.f64()?;
        let count = ca.len() - ca.null_count();
        if count == 0 {
            anyhow::bail!("Cannot summarize empty column '{}'", column.name());
        }

        let quantile = |q: f64| -> crate::Result<f64> {
            Ok(ca
                .quantile(q, QuantileInterpolOptions::Linear)?
                .unwrap_or(f64::NAN))
        };

        Ok(Self {
            count,
            mean: ca.mean().unwrap_or(f64::NAN),
            std: ca.std(1).unwrap_or(f64::NAN),
            min: ca.min().unwrap_or(f64::NAN),
            q25: quantile(0.25)?,
            median: quantile(0.5)?,
            q75: quantile(0.75)?,
            max: ca.max().unwrap_or(f64::NAN),
        })
    }

    /// Values in the order of `ROW_NAMES`, rounded to two decimals
    pub fn rounded_values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
        .map(round2)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with `n - 1` in the denominator
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Pearson correlation coefficient of two equally long samples
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    cov / (vx * vy).sqrt()
}

/// Pairwise Pearson correlations of the given columns
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

/// Variance assumption of the two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    /// Student's test with pooled variance
    Pooled,
    /// Welch's test for unequal variances
    Unequal,
}

/// Outcome of a two-sided, two-sample t-test
#[derive(Debug, Clone, PartialEq)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

impl TTestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn verdict(&self, alpha: f64) -> &'static str {
        if self.is_significant(alpha) {
            "Significant difference"
        } else {
            "No significant difference"
        }
    }
}

/// Two-sided t-test of the means of two independent samples
///
/// Zero variance in both samples gives non-finite statistics rather
/// than an error.
pub fn t_test(a: &[f64], b: &[f64], variance: Variance) -> crate::Result<TTestResult> {
    if a.len() < 2 || b.len() < 2 {
        anyhow::bail!(
            "t-test needs at least two samples per group (got {} and {})",
            a.len(),
            b.len()
        );
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let v1 = sample_variance(a);
    let v2 = sample_variance(b);
    let diff = mean(a) - mean(b);

    let (t_statistic, degrees_of_freedom) = match variance {
        Variance::Pooled => {
            let df = n1 + n2 - 2.0;
            let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
            (diff / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
        }
        Variance::Unequal => {
            let s1 = v1 / n1;
            let s2 = v2 / n2;
            let df = (s1 + s2).powi(2) / (s1.powi(2) / (n1 - 1.0) + s2.powi(2) / (n2 - 1.0));
            (diff / (s1 + s2).sqrt(), df)
        }
    };

    let p_value = if t_statistic.is_finite() && degrees_of_freedom.is_finite() {
        let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)?;
        (2.0 * dist.sf(t_statistic.abs())).min(1.0)
    } else {
        f64::NAN
    };

    Ok(TTestResult {
        t_statistic,
        p_value,
        degrees_of_freedom,
    })
}
