/// Core entity types for a pathfinding run.
/// Genes and evidence are created once per run and never mutated.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::clamp_weight;
use crate::normalise::normalise_gene_symbol;

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

/// Canonical gene symbol (uppercase, noise stripped).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneSymbol(String);

impl GeneSymbol {
    /// Normalise and wrap a raw symbol. `None` if the input has no symbol in it.
    pub fn parse(raw: &str) -> Option<Self> {
        normalise_gene_symbol(raw).map(GeneSymbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GeneSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GeneSymbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Evidence type enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Ppi,
    Pathway,
    DirectAssociation,
    Other,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Ppi               => "ppi",
            EvidenceType::Pathway           => "pathway",
            EvidenceType::DirectAssociation => "direct_association",
            EvidenceType::Other             => "other",
        }
    }

    /// Short label used in human-readable evidence details.
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceType::Ppi               => "PPI",
            EvidenceType::Pathway           => "Pathway",
            EvidenceType::DirectAssociation => "Direct association",
            EvidenceType::Other             => "Other",
        }
    }
}

// ---------------------------------------------------------------------------
// Evidence item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    gene: GeneSymbol,
    disease: String,
    evidence_type: EvidenceType,
    raw_weight: f64,
    description: String,
}

impl EvidenceItem {
    /// The raw weight is clamped into the noisy-OR domain [0, 0.99].
    pub fn new(
        gene: GeneSymbol,
        disease: impl Into<String>,
        evidence_type: EvidenceType,
        raw_weight: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            gene,
            disease: disease.into(),
            evidence_type,
            raw_weight: clamp_weight(raw_weight),
            description: description.into(),
        }
    }

    pub fn gene(&self) -> &GeneSymbol { &self.gene }
    pub fn disease(&self) -> &str { &self.disease }
    pub fn evidence_type(&self) -> EvidenceType { self.evidence_type }
    pub fn raw_weight(&self) -> f64 { self.raw_weight }
    pub fn description(&self) -> &str { &self.description }
}

// ---------------------------------------------------------------------------
// Known / novel status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Known,
    Novel,
}

impl TargetStatus {
    pub fn is_known(&self) -> bool {
        matches!(self, TargetStatus::Known)
    }

    /// Tag prefixed to evidence details in the report.
    pub fn tag(&self) -> &'static str {
        match self {
            TargetStatus::Known => "[已知靶点]",
            TargetStatus::Novel => "[潜在新靶点]",
        }
    }

    /// ASCII marker used in log lines.
    pub fn marker(&self) -> &'static str {
        match self {
            TargetStatus::Known => "[KNOWN]",
            TargetStatus::Novel => "[NOVEL]",
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// Score bounds for the evidence-strength score.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// A gene under evaluation. Score and status are computed once by the
/// ranker pipeline and cached here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    gene: GeneSymbol,
    evidence: Vec<EvidenceItem>,
    score: f64,
    status: TargetStatus,
}

impl Candidate {
    pub fn new(gene: GeneSymbol, evidence: Vec<EvidenceItem>, score: f64, status: TargetStatus) -> Self {
        let score = if score.is_nan() { MIN_SCORE } else { score.clamp(MIN_SCORE, MAX_SCORE) };
        Self { gene, evidence, score, status }
    }

    pub fn gene(&self) -> &GeneSymbol { &self.gene }
    pub fn evidence(&self) -> &[EvidenceItem] { &self.evidence }
    pub fn score(&self) -> f64 { self.score }
    pub fn status(&self) -> TargetStatus { self.status }
    pub fn is_known(&self) -> bool { self.status.is_known() }

    /// Human-readable evidence summary prefixed with the known/novel tag.
    pub fn evidence_summary(&self) -> String {
        if self.evidence.is_empty() {
            return format!("{} No direct KG evidence.", self.status.tag());
        }
        let parts: Vec<&str> = self.evidence.iter().map(|e| e.description()).collect();
        format!("{} {}", self.status.tag(), parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(s: &str) -> GeneSymbol {
        GeneSymbol::parse(s).unwrap()
    }

    #[test]
    fn test_gene_symbol_parse_normalises() {
        assert_eq!(gene(" tp53 ").as_str(), "TP53");
        assert!(GeneSymbol::parse("***").is_none());
    }

    #[test]
    fn test_gene_symbol_serialises_as_plain_string() {
        let json = serde_json::to_string(&vec![gene("EGFR"), gene("TP53")]).unwrap();
        assert_eq!(json, r#"["EGFR","TP53"]"#);
    }

    #[test]
    fn test_evidence_weight_is_clamped() {
        let item = EvidenceItem::new(gene("TP53"), "liver cancer", EvidenceType::Ppi, 3.0, "x");
        assert!(item.raw_weight() < 1.0);
    }

    #[test]
    fn test_candidate_score_is_clamped() {
        let c = Candidate::new(gene("TP53"), vec![], 42.0, TargetStatus::Known);
        assert_eq!(c.score(), MAX_SCORE);
        let c = Candidate::new(gene("TP53"), vec![], f64::NAN, TargetStatus::Novel);
        assert_eq!(c.score(), MIN_SCORE);
    }

    #[test]
    fn test_summary_without_evidence_keeps_tag() {
        let c = Candidate::new(gene("STAMBP"), vec![], 0.0, TargetStatus::Novel);
        assert_eq!(c.evidence_summary(), "[潜在新靶点] No direct KG evidence.");
    }

    #[test]
    fn test_summary_joins_descriptions() {
        let ev = vec![
            EvidenceItem::new(gene("TP53"), "liver cancer", EvidenceType::DirectAssociation, 0.75, "Direct association with liver cancer."),
            EvidenceItem::new(gene("TP53"), "liver cancer", EvidenceType::Ppi, 0.4, "PPI: interacts with MDM2 (1 hop)."),
        ];
        let c = Candidate::new(gene("TP53"), ev, 8.5, TargetStatus::Known);
        assert_eq!(
            c.evidence_summary(),
            "[已知靶点] Direct association with liver cancer. PPI: interacts with MDM2 (1 hop)."
        );
    }
}
