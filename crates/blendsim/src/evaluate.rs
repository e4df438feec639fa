//! Evaluation helpers for height maps and blending quality.

use crate::series::MaterialSeries;

/// Volume under a height map, following the bulk-density evaluator
/// convention: every sample owns a square of side `spacing / 2`.
pub fn heightmap_volume(heights: &[Vec<f64>], spacing: f64) -> f64 {
    let half = 0.5 * spacing;
    heights.iter().flatten().sum::<f64>() * half * half
}

/// Weighted standard deviation. Zero when the total weight is zero.
pub fn weighted_std(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mean = values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total;
    let variance = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum::<f64>()
        / total;
    variance.sqrt()
}

fn parameter_std(series: &MaterialSeries, parameter: usize) -> Option<f64> {
    let values = series.parameter_column(parameter)?;
    let weights: Vec<f64> = series.rows.iter().map(|r| r.volume).collect();
    Some(weighted_std(&values, &weights))
}

/// Ratio of input to output variability of one quality parameter.
///
/// Values above one mean the stockpile smoothed the stream. `None` when the
/// output shows no variability at all, or either stream lacks the parameter.
pub fn homogenization_effect(
    input: &MaterialSeries,
    output: &MaterialSeries,
    parameter: usize,
) -> Option<f64> {
    let out = parameter_std(output, parameter)?;
    if out <= 0.0 {
        return None;
    }
    Some(parameter_std(input, parameter)? / out)
}
