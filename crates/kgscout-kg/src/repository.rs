//! Graph repository - traversal primitives against a property graph.
//! Implementations: `Neo4jGraph` (remote), `InMemoryGraph` (fixtures/tests),
//! `MemoizedGraph` (per-run memoisation over either).

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use kgscout_common::{GeneSymbol, Result};

use crate::model::{NodeKind, NodeRef, Relation};

/// Read-only access to the knowledge graph.
///
/// Every method is idempotent within a run. Connectivity failures surface
/// as `GraphUnavailable`, unknown names as `UnresolvedEntity`; an entity
/// that resolves never yields a silent empty result because of an error.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Resolve a free-text name (or alias) to its canonical node.
    async fn resolve(&self, kind: NodeKind, name: &str) -> Result<NodeRef>;

    /// Nodes adjacent to `node` through any of `relations`, either direction.
    async fn neighbors(&self, node: &NodeRef, relations: &[Relation]) -> Result<BTreeSet<NodeRef>>;

    /// Curated gene associations of a resolved disease node.
    async fn known_associations(&self, disease: &NodeRef) -> Result<BTreeSet<GeneSymbol>>;

    /// Shortest hop count from `from` to each reachable node in `targets`
    /// over `relation`, up to `max_hops`. `from` itself is never reported.
    ///
    /// The default walks `neighbors` breadth-first; backends with a native
    /// shortest-path query should override it.
    async fn shortest_path_lengths(
        &self,
        from: &NodeRef,
        targets: &BTreeSet<NodeRef>,
        relation: &Relation,
        max_hops: usize,
    ) -> Result<BTreeMap<NodeRef, usize>> {
        let mut found = BTreeMap::new();
        if max_hops == 0 || targets.is_empty() {
            return Ok(found);
        }

        let relations = std::slice::from_ref(relation);
        let mut visited: BTreeSet<NodeRef> = BTreeSet::from([from.clone()]);
        let mut frontier: Vec<NodeRef> = vec![from.clone()];
        let wanted = targets.iter().filter(|t| *t != from).count();

        for depth in 1..=max_hops {
            let mut next = Vec::new();
            for node in &frontier {
                for neighbor in self.neighbors(node, relations).await? {
                    if !visited.insert(neighbor.clone()) {
                        continue;
                    }
                    if targets.contains(&neighbor) {
                        found.insert(neighbor.clone(), depth);
                    }
                    next.push(neighbor);
                }
            }
            if found.len() == wanted || next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(found)
    }
}
