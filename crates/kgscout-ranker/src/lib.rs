//! kgscout-ranker — Evidence collection, scoring, classification and ranking.
//!
//! Pipeline per candidate: [`evidence::EvidenceCollector`] gathers typed
//! evidence from the graph, [`aggregate::aggregate`] reduces it to a
//! bounded score, [`classify::classify`] labels it known/novel, and
//! [`rank::Ranker`] orders the candidates.

pub mod weights;
pub mod evidence;
pub mod aggregate;
pub mod classify;
pub mod rank;

pub use aggregate::aggregate;
pub use classify::classify;
pub use evidence::{CollectorSettings, DiseaseContext, EvidenceCollector};
pub use rank::Ranker;
pub use weights::EvidenceWeights;

use std::collections::BTreeSet;

use kgscout_common::{Candidate, EvidenceItem, GeneSymbol};

/// Score and label one candidate from its collected evidence.
pub fn evaluate(gene: GeneSymbol, evidence: Vec<EvidenceItem>, known: &BTreeSet<GeneSymbol>) -> Candidate {
    let score = aggregate(&evidence);
    let status = classify(&gene, known);
    Candidate::new(gene, evidence, score, status)
}
