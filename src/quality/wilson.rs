//! Wilson score lower bound.
//!
//! ```text
//! n = pos + neg,  p = pos / n,  z = Φ⁻¹(1 − (1 − confidence) / 2)
//!
//! lower = (p + z²/2n − z·√(p(1 − p)/n + z²/4n²)) / (1 + z²/n)
//! ```
//!
//! A looser confidence (smaller z) never lowers the bound, so rankings built on
//! a lower confidence are more forgiving to small vote counts.

/// Lower bound of the Wilson interval for `pos` successes out of `pos + neg`.
///
/// Returns `None` when there are no votes.
pub fn wilson_score(pos: u64, neg: u64, confidence: f64) -> Option<f64> {
    let n = (pos + neg) as f64;
    if n == 0.0 {
        return None;
    }

    let p = pos as f64 / n;
    let z = z_for_confidence(confidence);
    let z2 = z * z;

    let centre = p + z2 / (2.0 * n);
    let spread = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    let bound = (centre - spread) / (1.0 + z2 / n);

    // Rounding can push p = 0 a hair below zero
    Some(bound.clamp(0.0, 1.0))
}

/// Two-sided normal quantile for a confidence level in (0, 1).
pub fn z_for_confidence(confidence: f64) -> f64 {
    inverse_normal_cdf(1.0 - (1.0 - confidence) / 2.0)
}

/// Inverse of the standard normal CDF (Acklam's rational approximation).
///
/// Relative error below 1.2e-9 on (0, 1). Returns ±∞ at the endpoints.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
