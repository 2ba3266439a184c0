//! Per-run memoisation of `resolve()` and `known_associations()`.
//!
//! Built fresh for every pathfinding run and dropped with it; there is no
//! cross-request cache. Neighbor and path queries pass straight through.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use kgscout_common::{GeneSymbol, Result};
use tokio::sync::Mutex;

use crate::model::{NodeKind, NodeRef, Relation};
use crate::repository::GraphRepository;

pub struct MemoizedGraph {
    inner: Arc<dyn GraphRepository>,
    resolved: Mutex<HashMap<(NodeKind, String), NodeRef>>,
    known: Mutex<HashMap<NodeRef, BTreeSet<GeneSymbol>>>,
}

impl MemoizedGraph {
    pub fn new(inner: Arc<dyn GraphRepository>) -> Self {
        Self {
            inner,
            resolved: Mutex::new(HashMap::new()),
            known: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GraphRepository for MemoizedGraph {
    async fn resolve(&self, kind: NodeKind, name: &str) -> Result<NodeRef> {
        let key = (kind, NodeRef::lookup_key(kind, name).unwrap_or_else(|| name.to_string()));
        if let Some(hit) = self.resolved.lock().await.get(&key) {
            return Ok(hit.clone());
        }
        let node = self.inner.resolve(kind, name).await?;
        self.resolved.lock().await.insert(key, node.clone());
        Ok(node)
    }

    async fn neighbors(&self, node: &NodeRef, relations: &[Relation]) -> Result<BTreeSet<NodeRef>> {
        self.inner.neighbors(node, relations).await
    }

    async fn known_associations(&self, disease: &NodeRef) -> Result<BTreeSet<GeneSymbol>> {
        if let Some(hit) = self.known.lock().await.get(disease) {
            return Ok(hit.clone());
        }
        let genes = self.inner.known_associations(disease).await?;
        self.known.lock().await.insert(disease.clone(), genes.clone());
        Ok(genes)
    }

    async fn shortest_path_lengths(
        &self,
        from: &NodeRef,
        targets: &BTreeSet<NodeRef>,
        relation: &Relation,
        max_hops: usize,
    ) -> Result<BTreeMap<NodeRef, usize>> {
        self.inner.shortest_path_lengths(from, targets, relation, max_hops).await
    }
}
