//! Evidence-combination maths shared by the scorer.
//! Raw evidence weights are probability-like values in [0, 1) combined
//! with the noisy-OR model: p = 1 - Π(1 - p_i).

/// Upper bound for a single raw weight; keeps `strength` finite.
pub const MAX_RAW_WEIGHT: f64 = 0.99;

/// Clamp a raw weight into [0, MAX_RAW_WEIGHT]. NaN maps to 0.
pub fn clamp_weight(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, MAX_RAW_WEIGHT)
}

/// Additive strength of one evidence weight: -ln(1 - p).
/// Summing strengths and applying [`saturate`] is exactly noisy-OR.
pub fn strength(p: f64) -> f64 {
    -(1.0 - clamp_weight(p)).ln()
}

/// Map a summed strength back into [0, 1).
pub fn saturate(total_strength: f64) -> f64 {
    if total_strength <= 0.0 || total_strength.is_nan() {
        return 0.0;
    }
    (1.0 - (-total_strength).exp()).clamp(0.0, 1.0)
}

/// Order-independent sum: values are sorted before summation so the
/// result is bit-identical for any permutation of the input.
pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.iter().sum()
}

/// Aggregate confidence from multiple independent evidence sources
/// using the noisy-OR model.
pub fn aggregate_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let strengths: Vec<f64> = confidences.iter().map(|&p| strength(p)).collect();
    saturate(stable_sum(&strengths))
}
