//! Property-graph node and relation model.
//!
//! Relation names follow the Hetionet metagraph: `ASSOCIATES_DaG`
//! (disease–gene), `INTERACTS_GiG` (gene–gene), `PARTICIPATES_GpPW`
//! (gene–pathway). Anything else is carried as [`Relation::Custom`].

use std::fmt;

use kgscout_common::normalise::{normalise_gene_symbol, normalise_name_key};
use kgscout_common::{GeneSymbol, KgScoutError, Result};
use serde::{Deserialize, Serialize};

pub use kgscout_common::EntityKind as NodeKind;

/// Canonical reference to a graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub name: String,
}

impl NodeRef {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }

    pub fn gene(symbol: &GeneSymbol) -> Self {
        Self::new(NodeKind::Gene, symbol.as_str())
    }

    pub fn is_gene(&self) -> bool {
        self.kind == NodeKind::Gene
    }

    /// Gene symbol for gene nodes, `None` otherwise.
    pub fn as_gene(&self) -> Option<GeneSymbol> {
        if self.is_gene() { GeneSymbol::parse(&self.name) } else { None }
    }

    /// Case-insensitive lookup key for this kind of node.
    pub fn lookup_key(kind: NodeKind, name: &str) -> Option<String> {
        match kind {
            NodeKind::Gene => normalise_gene_symbol(name),
            NodeKind::Disease | NodeKind::Pathway => {
                let key = normalise_name_key(name);
                if key.is_empty() { None } else { Some(key) }
            }
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Gene symbols of the gene nodes in `nodes`.
pub fn genes_of(nodes: &std::collections::BTreeSet<NodeRef>) -> std::collections::BTreeSet<GeneSymbol> {
    nodes.iter().filter_map(NodeRef::as_gene).collect()
}

/// Node label as stored in the graph database.
pub fn label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Gene    => "Gene",
        NodeKind::Disease => "Disease",
        NodeKind::Pathway => "Pathway",
    }
}

pub fn kind_from_label(label: &str) -> Option<NodeKind> {
    match label {
        "Gene"    => Some(NodeKind::Gene),
        "Disease" => Some(NodeKind::Disease),
        "Pathway" => Some(NodeKind::Pathway),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relation {
    AssociatesDaG,
    InteractsGiG,
    ParticipatesGpPW,
    Custom(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Relation::AssociatesDaG    => "ASSOCIATES_DaG",
            Relation::InteractsGiG     => "INTERACTS_GiG",
            Relation::ParticipatesGpPW => "PARTICIPATES_GpPW",
            Relation::Custom(s)        => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ASSOCIATES_DaG"    => Relation::AssociatesDaG,
            "INTERACTS_GiG"     => Relation::InteractsGiG,
            "PARTICIPATES_GpPW" => Relation::ParticipatesGpPW,
            other               => Relation::Custom(other.to_string()),
        }
    }

    /// Relation types are spliced into Cypher, so only identifier
    /// characters are accepted.
    pub fn validate(&self) -> Result<()> {
        let s = self.as_str();
        let ok = !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !s.starts_with(|c: char| c.is_ascii_digit());
        if ok {
            Ok(())
        } else {
            Err(KgScoutError::Config(format!("invalid relation type '{s}'")))
        }
    }
}

impl From<String> for Relation {
    fn from(s: String) -> Self {
        Relation::parse(&s)
    }
}

impl From<Relation> for String {
    fn from(r: Relation) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
