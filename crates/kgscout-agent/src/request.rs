//! Run requests: mode parsing and fail-fast parameter checks.
//!
//! Everything here runs before the first graph query; a malformed
//! mode/parameter combination is an `InvalidModeError`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use kgscout_common::normalise::normalise_gene_symbol;
use kgscout_common::{KgScoutError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Validation,
    Discovery,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Validation => "validation",
            Mode::Discovery  => "discovery",
        }
    }
}

impl FromStr for Mode {
    type Err = KgScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validation" => Ok(Mode::Validation),
            "discovery"  => Ok(Mode::Discovery),
            other => Err(KgScoutError::InvalidMode(format!(
                "unknown mode '{other}' (expected 'validation' or 'discovery')"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fallbacks for omitted parameters.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub disease: String,
    pub limit: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self { disease: "Liver Cancer".to_string(), limit: 20 }
    }
}

/// What a run does. Both variants funnel into the same scoring stages.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPlan {
    /// Score caller-supplied genes (deduplicated, input order kept).
    Validation { genes: Vec<String>, disease: String },
    /// Mine and rank candidates for a disease, keeping the top `limit`.
    Discovery { disease: String, limit: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathfinderRequest {
    pub plan: RunPlan,
    /// Output artifact name prefix.
    pub prefix: Option<String>,
}

impl PathfinderRequest {
    pub fn validation(genes: Vec<String>, disease: impl Into<String>) -> Result<Self> {
        Self::from_params(
            "validation",
            Some(genes),
            Some(disease.into()),
            None,
            None,
            &RequestDefaults::default(),
        )
    }

    pub fn discovery(disease: impl Into<String>, limit: usize) -> Result<Self> {
        Self::from_params(
            "discovery",
            None,
            Some(disease.into()),
            Some(limit),
            None,
            &RequestDefaults::default(),
        )
    }

    /// Validate raw parameters into a request.
    pub fn from_params(
        mode: &str,
        genes: Option<Vec<String>>,
        disease: Option<String>,
        limit: Option<usize>,
        prefix: Option<String>,
        defaults: &RequestDefaults,
    ) -> Result<Self> {
        let mode: Mode = mode.parse()?;
        if limit == Some(0) {
            return Err(KgScoutError::InvalidMode("limit must be at least 1".into()));
        }
        let disease = disease
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|d| !d.is_empty());

        let plan = match mode {
            Mode::Validation => {
                let genes = dedup_genes(genes.unwrap_or_default());
                if genes.is_empty() {
                    return Err(KgScoutError::InvalidMode(
                        "validation mode requires a non-empty gene list".into(),
                    ));
                }
                RunPlan::Validation {
                    genes,
                    disease: disease.unwrap_or_else(|| defaults.disease.clone()),
                }
            }
            Mode::Discovery => {
                let Some(disease) = disease else {
                    return Err(KgScoutError::InvalidMode("discovery mode requires a disease".into()));
                };
                RunPlan::Discovery { disease, limit: limit.unwrap_or(defaults.limit) }
            }
        };

        let prefix = prefix.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        Ok(Self { plan, prefix })
    }

    pub fn mode(&self) -> Mode {
        match self.plan {
            RunPlan::Validation { .. } => Mode::Validation,
            RunPlan::Discovery { .. }  => Mode::Discovery,
        }
    }

    pub fn disease(&self) -> &str {
        match &self.plan {
            RunPlan::Validation { disease, .. } | RunPlan::Discovery { disease, .. } => disease,
        }
    }
}

/// Drop blanks and duplicates (by normalised symbol, first occurrence wins).
/// Symbols that do not normalise are kept verbatim so they surface as
/// warnings instead of vanishing.
fn dedup_genes(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for gene in raw {
        let trimmed = gene.trim();
        if trimmed.is_empty() {
            continue;
        }
        let gene = normalise_gene_symbol(trimmed).unwrap_or_else(|| trimmed.to_string());
        if seen.insert(gene.clone()) {
            out.push(gene);
        }
    }
    out
}

/// Parse a gene list given either as a JSON array or comma-separated.
pub fn parse_gene_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    trimmed
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|g| g.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|g| !g.is_empty())
        .collect()
}
