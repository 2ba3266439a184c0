//! kgscout-common — Shared types and errors used across all kgscout crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod normalise;

// Re-export commonly used types
pub use entities::{Candidate, EvidenceItem, EvidenceType, GeneSymbol, TargetStatus};
pub use error::{EntityKind, KgScoutError, Result};
