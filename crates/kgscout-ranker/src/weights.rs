//! Raw evidence weights per evidence type.
//!
//! Each evidence item gets a probability-like raw weight in [0, 1):
//!
//! | type               | raw weight                                               |
//! |--------------------|----------------------------------------------------------|
//! | direct association | `direct_association`                                     |
//! | pathway overlap n  | `ppi + (pathway − ppi) × n / (n + pathway_overlap_half)` |
//! | PPI path of h hops | `ppi × ppi_hop_decay^(h − 1)`                            |
//! | other relation     | `other`                                                  |
//!
//! Pathway evidence starts above the one-hop PPI weight and saturates
//! towards `pathway`, so any pathway item outweighs any PPI item and no
//! pathway item reaches a direct association.

use kgscout_common::{EvidenceType, KgScoutError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceWeights {
    /// Curated disease–gene edge; the maximum base weight.
    #[serde(default = "default_direct")]
    pub direct_association: f64,
    /// Ceiling approached by large pathway overlaps. Must exceed `ppi`.
    #[serde(default = "default_pathway")]
    pub pathway: f64,
    /// Weight of a one-hop interaction with a disease gene.
    #[serde(default = "default_ppi")]
    pub ppi: f64,
    /// Configured extra relations.
    #[serde(default = "default_other")]
    pub other: f64,
    /// Multiplier per additional PPI hop.
    #[serde(default = "default_hop_decay")]
    pub ppi_hop_decay: f64,
    /// Overlap size at which pathway evidence is halfway from `ppi` to `pathway`.
    #[serde(default = "default_overlap_half")]
    pub pathway_overlap_half: f64,
}

fn default_direct()       -> f64 { 0.75 }
fn default_pathway()      -> f64 { 0.60 }
fn default_ppi()          -> f64 { 0.40 }
fn default_other()        -> f64 { 0.15 }
fn default_hop_decay()    -> f64 { 0.5 }
fn default_overlap_half() -> f64 { 2.0 }

impl Default for EvidenceWeights {
    fn default() -> Self {
        Self {
            direct_association:   default_direct(),
            pathway:              default_pathway(),
            ppi:                  default_ppi(),
            other:                default_other(),
            ppi_hop_decay:        default_hop_decay(),
            pathway_overlap_half: default_overlap_half(),
        }
    }
}

impl EvidenceWeights {
    pub fn base_weight(&self, evidence_type: EvidenceType) -> f64 {
        match evidence_type {
            EvidenceType::DirectAssociation => self.direct_association,
            EvidenceType::Pathway           => self.pathway,
            EvidenceType::Ppi               => self.ppi,
            EvidenceType::Other             => self.other,
        }
    }

    /// Weight of a PPI path with `hops` edges. Zero hops carries no evidence.
    pub fn ppi_weight(&self, hops: usize) -> f64 {
        if hops == 0 {
            return 0.0;
        }
        let exp = i32::try_from(hops - 1).unwrap_or(i32::MAX);
        self.ppi * self.ppi_hop_decay.powi(exp)
    }

    /// Weight of `overlap` shared pathways: above `ppi` from the first
    /// shared pathway, saturating towards `pathway`.
    pub fn pathway_weight(&self, overlap: usize) -> f64 {
        if overlap == 0 {
            return 0.0;
        }
        let n = overlap as f64;
        self.ppi + (self.pathway - self.ppi) * n / (n + self.pathway_overlap_half)
    }

    /// Check ranges and the direct ≥ pathway > PPI ordering.
    pub fn validate(&self) -> Result<()> {
        let bases = [
            ("direct_association", self.direct_association),
            ("pathway", self.pathway),
            ("ppi", self.ppi),
            ("other", self.other),
        ];
        for (name, w) in bases {
            if !(0.0..1.0).contains(&w) {
                return Err(KgScoutError::Config(format!("scoring.{name} must be in [0, 1), got {w}")));
            }
        }
        if !(self.direct_association >= self.pathway && self.pathway > self.ppi) {
            return Err(KgScoutError::Config(
                "scoring weights must satisfy direct_association >= pathway > ppi".into(),
            ));
        }
        if !(self.ppi_hop_decay > 0.0 && self.ppi_hop_decay <= 1.0) {
            return Err(KgScoutError::Config("scoring.ppi_hop_decay must be in (0, 1]".into()));
        }
        if !(self.pathway_overlap_half > 0.0) {
            return Err(KgScoutError::Config("scoring.pathway_overlap_half must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        assert!(EvidenceWeights::default().validate().is_ok());
    }

    #[test]
    fn test_type_ordering_direct_pathway_ppi() {
        let w = EvidenceWeights::default();
        assert!(w.base_weight(EvidenceType::DirectAssociation) > w.base_weight(EvidenceType::Pathway));
        assert!(w.base_weight(EvidenceType::Pathway) > w.base_weight(EvidenceType::Ppi));
    }

    #[test]
    fn test_shorter_paths_weigh_more() {
        let w = EvidenceWeights::default();
        assert!(w.ppi_weight(1) > w.ppi_weight(2));
        assert!(w.ppi_weight(2) > w.ppi_weight(3));
        assert_eq!(w.ppi_weight(0), 0.0);
        assert!((w.ppi_weight(1) - 0.40).abs() < 1e-12);
    }

    #[test]
    fn test_larger_overlaps_weigh_more_but_saturate() {
        let w = EvidenceWeights::default();
        assert!(w.pathway_weight(1) < w.pathway_weight(4));
        assert!(w.pathway_weight(1000) < w.pathway);
        assert_eq!(w.pathway_weight(0), 0.0);
        assert!((w.pathway_weight(1) - (0.40 + 0.20 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_any_pathway_item_outweighs_any_ppi_item() {
        let w = EvidenceWeights::default();
        for overlap in 1..=20 {
            let pathway = w.pathway_weight(overlap);
            assert!(pathway > w.ppi_weight(1), "overlap {overlap}: {pathway}");
            assert!(pathway < w.direct_association, "overlap {overlap}: {pathway}");
        }
        let steep = EvidenceWeights { pathway_overlap_half: 50.0, ..Default::default() };
        assert!(steep.pathway_weight(1) > steep.ppi_weight(1));
    }

    #[test]
    fn test_broken_ordering_rejected() {
        let w = EvidenceWeights { ppi: 0.7, ..Default::default() };
        assert!(w.validate().is_err());
        let tied = EvidenceWeights { pathway: 0.40, ..Default::default() };
        assert!(tied.validate().is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let w = EvidenceWeights { direct_association: 1.0, ..Default::default() };
        assert!(w.validate().is_err());
        let w = EvidenceWeights { ppi_hop_decay: 0.0, ..Default::default() };
        assert!(w.validate().is_err());
    }
}
