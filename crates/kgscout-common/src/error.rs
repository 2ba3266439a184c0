use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of graph entity; doubles as the node label in the graph layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Gene,
    Disease,
    Pathway,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Gene    => "gene",
            EntityKind::Disease => "disease",
            EntityKind::Pathway => "pathway",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum KgScoutError {
    #[error("Unresolved {kind}: {name}")]
    UnresolvedEntity { kind: EntityKind, name: String },

    #[error("Graph unavailable: {0}")]
    GraphUnavailable(String),

    #[error("No candidate genes found in the knowledge graph for disease '{disease}'")]
    EmptyCandidateSet { disease: String },

    #[error("Invalid mode or parameters: {0}")]
    InvalidMode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KgScoutError {
    pub fn unresolved(kind: EntityKind, name: impl Into<String>) -> Self {
        KgScoutError::UnresolvedEntity { kind, name: name.into() }
    }

    /// Stable error kind reported in the `error.kind` field of failed reports.
    pub fn kind(&self) -> &'static str {
        match self {
            KgScoutError::UnresolvedEntity { .. }  => "UnresolvedEntityError",
            KgScoutError::GraphUnavailable(_)      => "GraphUnavailableError",
            KgScoutError::EmptyCandidateSet { .. } => "EmptyCandidateSetError",
            KgScoutError::InvalidMode(_)           => "InvalidModeError",
            KgScoutError::Config(_)                => "ConfigError",
            KgScoutError::Serialization(_)         => "SerializationError",
            KgScoutError::Io(_)                    => "IoError",
        }
    }

    /// Only connectivity failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, KgScoutError::GraphUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, KgScoutError>;
