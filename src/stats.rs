//! Closed-form descriptive statistics over small in-memory series.
//!
//! Every function is total: degenerate inputs yield a documented default
//! (`0.0` or `None`) rather than a division by zero.

// =============================================================================
// Trend
// =============================================================================

/// Ordinary-least-squares slope of value against index `0..n`.
///
/// `slope = (n·Σ(i·y) − Σi·Σy) / (n·Σi² − (Σi)²)`. A series with fewer than
/// two points has no trend and returns `0.0`; for `n ≥ 2` the denominator
/// is strictly positive.
pub fn linear_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    // Measured from the first point so a flat series gives exactly 0
    let origin = values[0];
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().map(|y| y - origin).sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * (y - origin)).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x.powi(2))
}

/// Linear extrapolation `base + slope·k`
pub fn extrapolate(base: f64, slope: f64, k: f64) -> f64 {
    base + slope * k
}

/// Trailing `n` elements (the whole slice when shorter)
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

// =============================================================================
// Moments
// =============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (divides by `n`)
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

// =============================================================================
// Order statistics
// =============================================================================

/// Percentile `p` in `[0, 100]` by linear interpolation between order
/// statistics at rank `p/100 · (n − 1)`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !p.is_finite() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// =============================================================================
// Correlation
// =============================================================================

/// Pearson correlation coefficient (population form).
///
/// `None` when lengths differ, fewer than two points are given, or either
/// series has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    if is_constant(a) || is_constant(b) {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

// Deviations from an unrepresentable mean are not exactly zero
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}
