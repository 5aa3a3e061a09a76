//! Shared math utilities.

/// Probabilities are floored here before taking the log, so a zero-probability
/// token scores about -690.8 instead of `-inf`.
pub const PROBABILITY_FLOOR: f64 = 1e-300;

/// Natural log of a probability, computed in `f64` and never `-inf` or NaN
/// for inputs in `[0, 1]`.
pub fn safe_ln(p: f32) -> f64 {
    (p as f64).max(PROBABILITY_FLOOR).ln()
}

/// Softmax over raw logits, shifted by the max logit for stability.
///
/// Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ln_zero_is_finite() {
        let v = safe_ln(0.0);
        assert!(v.is_finite());
        assert!(v < -690.0);
    }

    #[test]
    fn test_safe_ln_tiny_beats_zero() {
        let tiny = safe_ln(1e-30);
        assert!(tiny.is_finite());
        assert!((tiny - (1e-30f32 as f64).ln()).abs() < 1e-9);
        assert!(tiny > safe_ln(0.0));
    }

    #[test]
    fn test_safe_ln_one_is_zero() {
        assert_eq!(safe_ln(1.0), 0.0);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }
}
