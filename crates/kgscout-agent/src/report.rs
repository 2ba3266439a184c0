//! Run report and its JSON shape.
//!
//! Success:
//! ```json
//! { "status": "success", "mode": "discovery", "disease": "Liver cancer",
//!   "discovered_targets": ["TP53", "MDM2"], "known_genes": ["TP53"],
//!   "novel_genes": ["MDM2"], "kg_scores": { "MDM2": 4.9, "TP53": 8.7 },
//!   "evidence_details": { "TP53": "[已知靶点] Direct association: ..." } }
//! ```
//! Validation reports carry `validated_genes`, `known_status` and
//! `warnings` instead of `discovered_targets`. Failures carry only
//! `status: "error"`, `mode` and `error: { kind, message }`.

use std::collections::BTreeMap;

use kgscout_common::{Candidate, GeneSymbol, KgScoutError, Result};
use serde::Serialize;
use serde_json::Value;

use crate::request::Mode;

/// Finished report. Built once from ranked candidates and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    mode: Mode,
    disease: String,
    ranked_genes: Vec<GeneSymbol>,
    known_genes: Vec<GeneSymbol>,
    novel_genes: Vec<GeneSymbol>,
    scores: BTreeMap<GeneSymbol, f64>,
    evidence_details: BTreeMap<GeneSymbol, String>,
    warnings: Vec<String>,
}

impl Report {
    /// `ranked` must already be in final rank order (and truncated).
    pub fn from_ranked(mode: Mode, disease: impl Into<String>, ranked: &[Candidate], warnings: Vec<String>) -> Self {
        let mut report = Self {
            mode,
            disease: disease.into(),
            ranked_genes: Vec::with_capacity(ranked.len()),
            known_genes: Vec::new(),
            novel_genes: Vec::new(),
            scores: BTreeMap::new(),
            evidence_details: BTreeMap::new(),
            warnings,
        };
        for c in ranked {
            let gene = c.gene().clone();
            if c.is_known() {
                report.known_genes.push(gene.clone());
            } else {
                report.novel_genes.push(gene.clone());
            }
            report.scores.insert(gene.clone(), c.score());
            report.evidence_details.insert(gene.clone(), c.evidence_summary());
            report.ranked_genes.push(gene);
        }
        report
    }

    pub fn mode(&self) -> Mode { self.mode }
    pub fn disease(&self) -> &str { &self.disease }
    pub fn ranked_genes(&self) -> &[GeneSymbol] { &self.ranked_genes }
    pub fn known_genes(&self) -> &[GeneSymbol] { &self.known_genes }
    pub fn novel_genes(&self) -> &[GeneSymbol] { &self.novel_genes }
    pub fn scores(&self) -> &BTreeMap<GeneSymbol, f64> { &self.scores }
    pub fn evidence_details(&self) -> &BTreeMap<GeneSymbol, String> { &self.evidence_details }
    pub fn warnings(&self) -> &[String] { &self.warnings }

    pub fn score(&self, gene: &str) -> Option<f64> {
        self.scores.get(gene).copied()
    }

    pub fn is_known(&self, gene: &str) -> Option<bool> {
        self.scores
            .contains_key(gene)
            .then(|| self.known_genes.iter().any(|g| g.as_str() == gene))
    }

    fn to_output(&self) -> SuccessOutput<'_> {
        let genes = self.ranked_genes.as_slice();
        let validation = self.mode == Mode::Validation;
        SuccessOutput {
            status: "success",
            mode: self.mode,
            disease: &self.disease,
            discovered_targets: (!validation).then_some(genes),
            validated_genes: validation.then_some(genes),
            known_genes: &self.known_genes,
            novel_genes: &self.novel_genes,
            kg_scores: self.scores.iter().map(|(g, s)| (g.as_str(), round1(*s))).collect(),
            evidence_details: self.evidence_details.iter().map(|(g, d)| (g.as_str(), d.as_str())).collect(),
            known_status: validation.then(|| {
                self.ranked_genes
                    .iter()
                    .map(|g| (g.as_str(), self.known_genes.contains(g)))
                    .collect()
            }),
            warnings: validation.then_some(self.warnings.as_slice()),
        }
    }
}

/// Round to one decimal place for display.
pub fn round1(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

#[derive(Serialize)]
struct SuccessOutput<'a> {
    status: &'static str,
    mode: Mode,
    disease: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovered_targets: Option<&'a [GeneSymbol]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validated_genes: Option<&'a [GeneSymbol]>,
    known_genes: &'a [GeneSymbol],
    novel_genes: &'a [GeneSymbol],
    kg_scores: BTreeMap<&'a str, f64>,
    evidence_details: BTreeMap<&'a str, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    known_status: Option<BTreeMap<&'a str, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<&'a [String]>,
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    status: &'static str,
    mode: &'a str,
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<&'a str>,
}

/// Result of one invocation: a complete report or a structured failure,
/// never a partial ranking.
#[derive(Debug)]
pub enum Outcome {
    Success(Report),
    Failure { mode: String, error: KgScoutError },
}

impl Outcome {
    pub fn failure(mode: impl Into<String>, error: KgScoutError) -> Self {
        Outcome::Failure { mode: mode.into(), error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn mode(&self) -> &str {
        match self {
            Outcome::Success(r) => r.mode().as_str(),
            Outcome::Failure { mode, .. } => mode,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Success(r) => Some(r),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&KgScoutError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            Outcome::Success(report) => serde_json::to_value(report.to_output())?,
            Outcome::Failure { mode, error } => serde_json::to_value(ErrorOutput {
                status: "error",
                mode,
                error: ErrorBody {
                    kind: error.kind(),
                    message: error.to_string(),
                    entity: match error {
                        KgScoutError::UnresolvedEntity { name, .. } => Some(name.as_str()),
                        _ => None,
                    },
                },
            })?,
        };
        Ok(value)
    }

    /// Pretty JSON with non-ASCII characters kept as-is.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }
}
