//! Candidate ordering.
//!
//! Sort key: `score + known_bonus` (bonus only for known targets, never
//! written back into the score) descending, then gene symbol ascending.
//! Known targets are lifted in the order, never filtered out.

use std::cmp::Ordering;

use kgscout_common::{Candidate, GeneSymbol};

/// Ordering bonus for known targets. Scores live in [0, 10], so 100 puts
/// every known target ahead of every novel one.
pub const DEFAULT_KNOWN_BONUS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Ranker {
    known_bonus: f64,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_KNOWN_BONUS)
    }
}

impl Ranker {
    pub fn new(known_bonus: f64) -> Self {
        let known_bonus = if known_bonus.is_finite() { known_bonus.max(0.0) } else { 0.0 };
        Self { known_bonus }
    }

    pub fn known_bonus(&self) -> f64 {
        self.known_bonus
    }

    /// Effective ordering key of a candidate.
    pub fn rank_key(&self, candidate: &Candidate) -> f64 {
        if candidate.is_known() {
            candidate.score() + self.known_bonus
        } else {
            candidate.score()
        }
    }

    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        self.rank_key(b)
            .total_cmp(&self.rank_key(a))
            .then_with(|| a.gene().cmp(b.gene()))
    }

    /// Sort candidates in place into final rank order. Input order does not
    /// matter.
    pub fn sort(&self, candidates: &mut [Candidate]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }

    /// Gene identifiers in rank order.
    pub fn rank(&self, candidates: &[Candidate]) -> Vec<GeneSymbol> {
        let mut ordered: Vec<&Candidate> = candidates.iter().collect();
        ordered.sort_by(|a, b| self.compare(a, b));
        ordered.into_iter().map(|c| c.gene().clone()).collect()
    }
}
