//! Sample statistics over return slices.
//!
//! Every function returns NaN instead of failing when the statistic is
//! undefined for its input.

/// Below this a dispersion measure counts as zero.
pub const ZERO_TOLERANCE: f64 = 1e-12;

/// Arithmetic mean; NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); NaN with fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mu = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Sample standard deviation of the strictly negative values only.
pub fn downside_std(values: &[f64]) -> f64 {
    let negatives: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();
    sample_std(&negatives)
}

/// `numerator / denominator`, or NaN when the denominator is zero or not finite.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if !denominator.is_finite() || denominator.abs() < ZERO_TOLERANCE {
        return f64::NAN;
    }
    numerator / denominator
}

/// Pearson correlation of two equally long slices.
///
/// NaN when either side has zero variance or fewer than two points. The
/// result is clamped to `[-1, 1]` against rounding.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom < ZERO_TOLERANCE {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_std() {
        assert_relative_eq!(sample_std(&[1.0, 2.0, 3.0, 4.0]), (5.0f64 / 3.0).sqrt());
        assert!(sample_std(&[1.0]).is_nan());
        assert_eq!(sample_std(&[0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_downside_std_ignores_gains() {
        let values = [0.02, -0.01, 0.03, -0.03];
        assert_relative_eq!(downside_std(&values), sample_std(&[-0.01, -0.03]));
        assert!(downside_std(&[0.01, -0.02]).is_nan());
    }

    #[test]
    fn test_ratio_guards_zero() {
        assert!(ratio(0.1, 0.0).is_nan());
        assert!(ratio(0.1, f64::NAN).is_nan());
        assert_relative_eq!(ratio(0.1, 0.2), 0.5);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0);
        assert_relative_eq!(pearson(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }
}
