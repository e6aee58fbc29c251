//! Descriptive and Bayesian summary statistics for MCMC chains
//!
//! This module provides the statistics computed per node-age chain:
//! - Arithmetic mean and population standard deviation
//! - Effective sample size (ESS) for mean estimation
//! - 95% highest-density interval (HDI)
//!
//! All functions are pure and deterministic; degenerate input (an empty
//! slice) yields NaN rather than a panic, matching how the callers guard
//! against empty chains upstream.

/// Probability mass covered by the highest-density interval
pub const HDI_PROB: f64 = 0.95;

/// Arithmetic mean of the samples
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation (not sample-corrected)
pub fn std_dev_population(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    let m = mean(samples);
    let variance = samples.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// Effective sample size of an autocorrelated chain, for mean estimation
///
/// Uses the autocovariance-based estimator with Geyer's initial monotone
/// positive sequence truncation: consecutive autocorrelation pairs
/// `rho(2k-1) + rho(2k)` are summed while positive and non-increasing, and
/// the integrated autocorrelation time tau = 1 + 2 * sum(pairs) gives
/// ESS = n / tau.
///
/// A zero-variance chain carries no autocorrelation information; its ESS is
/// defined as the chain length.
pub fn effective_sample_size(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n < 2 {
        return n as f64;
    }

    let m = mean(samples);
    let autocovariance = |lag: usize| -> f64 {
        let mut acc = 0.0;
        for i in 0..(n - lag) {
            acc += (samples[i] - m) * (samples[i + lag] - m);
        }
        acc / n as f64
    };

    let c0 = autocovariance(0);
    if !(c0 > 0.0) {
        return n as f64;
    }

    let mut tau = 1.0;
    let mut previous_pair = f64::INFINITY;
    let mut lag = 1;
    while lag + 1 < n {
        let pair = (autocovariance(lag) + autocovariance(lag + 1)) / c0;
        if pair <= 0.0 {
            break;
        }
        let pair = pair.min(previous_pair);
        tau += 2.0 * pair;
        previous_pair = pair;
        lag += 2;
    }

    n as f64 / tau
}

/// 95% highest-density interval of the samples
///
/// The shortest interval containing [`HDI_PROB`] of the mass: over the
/// sorted samples, every window spanning `floor(0.95 * n)` inclusive steps
/// is a candidate and the narrowest one wins. Returns `(lower, upper)`.
pub fn hdi_95(samples: &[f64]) -> (f64, f64) {
    let n = samples.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let step = ((HDI_PROB * n as f64).floor() as usize).min(n - 1);
    let mut best_start = 0;
    let mut best_width = f64::INFINITY;
    for start in 0..(n - step) {
        let width = sorted[start + step] - sorted[start];
        if width < best_width {
            best_width = width;
            best_start = start;
        }
    }

    (sorted[best_start], sorted[best_start + step])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random sequence for chain-shaped test data
    fn lcg_chain(seed: u64, len: usize) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64
            })
            .collect()
    }

    #[test]
    fn test_mean_and_std_dev() {
        let samples = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&samples) - 5.0).abs() < 1e-12);
        // Population standard deviation of the textbook example is exactly 2.
        assert!((std_dev_population(&samples) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev_population(&[]).is_nan());
        let (lower, upper) = hdi_95(&[]);
        assert!(lower.is_nan() && upper.is_nan());
    }

    #[test]
    fn test_constant_chain() {
        let samples = vec![100.0; 50];
        assert_eq!(mean(&samples), 100.0);
        assert_eq!(std_dev_population(&samples), 0.0);
        assert_eq!(effective_sample_size(&samples), 50.0);
        assert_eq!(hdi_95(&samples), (100.0, 100.0));
    }

    #[test]
    fn test_ess_near_n_for_uncorrelated_chain() {
        let samples = lcg_chain(42, 500);
        let ess = effective_sample_size(&samples);
        assert!(ess > 250.0, "ess = {ess}");
        assert!(ess <= 1000.0, "ess = {ess}");
    }

    #[test]
    fn test_ess_small_for_correlated_chain() {
        // Heavily smoothed random walk: consecutive samples are nearly equal.
        let noise = lcg_chain(7, 500);
        let mut samples = Vec::with_capacity(noise.len());
        let mut current = 0.0;
        for x in noise {
            current = 0.98 * current + 0.02 * (x - 0.5);
            samples.push(current);
        }
        let ess = effective_sample_size(&samples);
        assert!(ess < 125.0, "ess = {ess}");
    }

    #[test]
    fn test_ess_is_deterministic() {
        let samples = lcg_chain(99, 200);
        assert_eq!(
            effective_sample_size(&samples),
            effective_sample_size(&samples)
        );
    }

    #[test]
    fn test_hdi_bounds_enclose_mean() {
        let samples = lcg_chain(3, 400);
        let (lower, upper) = hdi_95(&samples);
        let m = mean(&samples);
        assert!(lower <= m && m <= upper);
        assert!(lower < upper);
    }

    #[test]
    fn test_hdi_shrinks_around_the_mode() {
        // 97 samples tightly clustered at 10, 3 distant outliers: the
        // shortest 95% window must exclude the outliers.
        let mut samples: Vec<f64> = (0..97).map(|i| 10.0 + i as f64 * 0.001).collect();
        samples.extend([500.0, 600.0, 700.0]);
        let (lower, upper) = hdi_95(&samples);
        assert!(lower >= 10.0);
        assert!(upper < 500.0);
    }

    #[test]
    fn test_hdi_single_sample() {
        assert_eq!(hdi_95(&[42.0]), (42.0, 42.0));
    }
}
