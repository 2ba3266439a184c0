//! Evidence-strength score.
//!
//! score = 10 × (1 − e^(−S)), S = Σ_types Σ_items −ln(1 − w_i)
//!
//! This is the noisy-OR 10 × (1 − Π(1 − w_i)) written as a saturating sum:
//! strengths add per type and across types, and the squash keeps the result
//! below the ceiling however many weak items pile up. A lone direct
//! association (0.75) scores 7.5; corroboration pushes it higher.

use std::collections::BTreeMap;

use kgscout_common::confidence::{saturate, stable_sum, strength};
use kgscout_common::entities::{MAX_SCORE, MIN_SCORE};
use kgscout_common::{EvidenceItem, EvidenceType};

/// Summed strength per evidence type.
pub fn type_strengths(evidence: &[EvidenceItem]) -> BTreeMap<EvidenceType, f64> {
    let mut per_type: BTreeMap<EvidenceType, Vec<f64>> = BTreeMap::new();
    for item in evidence {
        per_type.entry(item.evidence_type()).or_default().push(strength(item.raw_weight()));
    }
    per_type
        .into_iter()
        .map(|(t, strengths)| (t, stable_sum(&strengths)))
        .collect()
}

/// Reduce a candidate's evidence to a score in [0, 10]. Deterministic and
/// independent of input order; empty evidence scores 0.
pub fn aggregate(evidence: &[EvidenceItem]) -> f64 {
    if evidence.is_empty() {
        return MIN_SCORE;
    }
    let totals: Vec<f64> = type_strengths(evidence).into_values().collect();
    (MAX_SCORE * saturate(stable_sum(&totals))).clamp(MIN_SCORE, MAX_SCORE)
}
