//! Normal approximation of the binomial hypothesis test

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

use super::SimError;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Probability density of a normal distribution at `x`.
pub fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    let z = (x - mean) / std_dev;
    (-0.5 * z * z).exp() / (std_dev * (2.0 * PI).sqrt())
}

/// Approximate `P(X < x)` for `X ~ Binomial(num_trials, prob)`.
///
/// The probability of each outcome below `x` is taken from the normal density with the binomial's
/// mean and standard deviation, and these are summed.
pub fn binomial_cdf_below(x: usize, num_trials: usize, prob: f64) -> f64 {
    let (mean, std_dev) = binomial_moments(num_trials, prob);

    (0..x).map(|i| normal_pdf(i as f64, mean, std_dev)).sum()
}

/// Get the critical value of a one sided test on the number of failed trials.
///
/// This is the largest `c` (no greater than `num_trials`) for which the approximate
/// `P(X < c) <= significance`. If fewer than `c` trials fail, the hypothesis that the failure
/// probability is at least `failure_prob` is rejected at the given significance.
///
/// An error is returned if the inputs are out of range or if no positive critical value exists,
/// since then no number of failures could ever be accepted.
pub fn critical_value(
    num_trials: usize,
    failure_prob: f64,
    significance: f64,
) -> Result<usize, SimError> {
    let invalid = || SimError::InvalidCriticalValue {
        num_trials,
        failure_prob,
        significance,
    };

    let in_unit = |v: f64| v > 0.0 && v < 1.0;
    if num_trials == 0 || !in_unit(failure_prob) || !in_unit(significance) {
        return Err(invalid());
    }

    let (mean, std_dev) = binomial_moments(num_trials, failure_prob);

    // Running P(X < c + 1)
    let mut c = 0;
    let mut cdf = normal_pdf(0.0, mean, std_dev);
    while c < num_trials && cdf <= significance {
        c += 1;
        cdf += normal_pdf(c as f64, mean, std_dev);
    }

    if c == 0 {
        return Err(invalid());
    }

    Ok(c)
}

fn binomial_moments(num_trials: usize, prob: f64) -> (f64, f64) {
    let n = num_trials as f64;
    (n * prob, (n * prob * (1.0 - prob)).sqrt())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normal_pdf() {
        assert!((normal_pdf(0.0, 0.0, 1.0) - 0.3989422804014327).abs() < 1e-12);
        assert!((normal_pdf(3.0, 2.0, 1.0) - normal_pdf(1.0, 2.0, 1.0)).abs() < 1e-15);
    }

    #[test]
    fn test_critical_value() {
        assert_eq!(critical_value(100, 0.05, 0.05).unwrap(), 2);
        assert_eq!(critical_value(20, 0.25, 0.05).unwrap(), 2);
        assert_eq!(critical_value(20, 0.4, 0.05).unwrap(), 4);

        // The defining property
        for &(n, p, alpha) in &[(100, 0.05, 0.05), (50, 0.3, 0.01), (500, 0.1, 0.1)] {
            let c = critical_value(n, p, alpha).unwrap();
            assert!(binomial_cdf_below(c, n, p) <= alpha);
            assert!(c == n || binomial_cdf_below(c + 1, n, p) > alpha);
        }
    }

    #[test]
    fn test_critical_value_monotonic() {
        let mut last = 0;
        for i in 1..10 {
            let c = critical_value(200, i as f64 * 0.05, 0.05).unwrap();
            assert!(c >= last);
            last = c;
        }
    }

    #[test]
    fn test_critical_value_reproducible() {
        assert_eq!(
            critical_value(1000, 0.02, 0.05).unwrap(),
            critical_value(1000, 0.02, 0.05).unwrap()
        );
    }

    #[test]
    fn test_invalid_critical_value() {
        for &(n, p, alpha) in &[
            (0, 0.05, 0.05),
            (100, 0.0, 0.05),
            (100, 1.0, 0.05),
            (100, 0.05, 0.0),
            (100, 0.05, 1.5),
            // P(X < 1) already exceeds the significance
            (10, 0.1, 0.05),
        ] {
            assert!(matches!(
                critical_value(n, p, alpha),
                Err(SimError::InvalidCriticalValue { .. })
            ));
        }
    }
}
