//! kgscout-kg — Graph access layer over an external property graph.
//!
//! Traversal primitives only (resolution, neighbor lookup, path lookup,
//! known-association lookup); no scoring logic lives here.

pub mod model;
pub mod repository;
pub mod retry;
pub mod neo4j;
pub mod memory;
pub mod memo;

pub use memo::MemoizedGraph;
pub use memory::InMemoryGraph;
pub use model::{genes_of, NodeKind, NodeRef, Relation};
pub use neo4j::{Neo4jGraph, Neo4jSettings};
pub use repository::GraphRepository;
pub use retry::RetryPolicy;
