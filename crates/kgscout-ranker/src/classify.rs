//! Known/novel labelling.

use std::collections::BTreeSet;

use kgscout_common::{GeneSymbol, TargetStatus};

/// A gene is known iff the disease's curated association set contains it.
/// The score plays no part.
pub fn classify(gene: &GeneSymbol, known: &BTreeSet<GeneSymbol>) -> TargetStatus {
    if known.contains(gene) {
        TargetStatus::Known
    } else {
        TargetStatus::Novel
    }
}
