//! Descriptive statistics and weighting primitives.

use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("Sample is empty")]
    EmptySample,

    #[error("Degrees of freedom must be positive")]
    NonPositiveDegreesOfFreedom,
}

/// Arithmetic mean.
pub fn mean(xs: &[f64]) -> Result<f64, StatsError> {
    if xs.is_empty() {
        return Err(StatsError::EmptySample);
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Variance with `dof` degrees of freedom, `len - 1` by default.
pub fn variance(xs: &[f64], dof: Option<usize>) -> Result<f64, StatsError> {
    let m = mean(xs)?;
    let dof = dof.unwrap_or(xs.len() - 1);
    if dof == 0 {
        return Err(StatsError::NonPositiveDegreesOfFreedom);
    }
    let squares: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    Ok(squares / dof as f64)
}

/// Standard deviation; `population` divides by `len` instead of `len - 1`.
pub fn standard_deviation(xs: &[f64], population: bool) -> Result<f64, StatsError> {
    let dof = if population { Some(xs.len()) } else { None };
    variance(xs, dof).map(f64::sqrt)
}

/// Plain weighted value.
pub fn simple_weight(weight: f64, value: f64) -> f64 {
    weight * value
}

/// Shrink `value` toward `prior_mean` when `weight` (the sample size) is
/// small relative to `threshold`.
///
/// Returns `value` when `weight + threshold` is not positive.
pub fn bayesian_weight(weight: f64, value: f64, threshold: f64, prior_mean: f64) -> f64 {
    let total = weight + threshold;
    if total <= 0.0 {
        return value;
    }
    (weight * value + threshold * prior_mean) / total
}
