//! In-memory property graph.
//!
//! Serves as the swappable test double for the remote graph service and as
//! the `fixture` backend, loaded from a JSON file:
//!
//! ```json
//! {
//!   "genes": ["TP53", "EGFR"],
//!   "aliases": [{ "kind": "gene", "alias": "P53", "canonical": "TP53" }],
//!   "associations": [{ "disease": "liver cancer", "gene": "TP53" }],
//!   "interactions": [["TP53", "MDM2"]],
//!   "pathways": [{ "name": "p53 signaling", "genes": ["TP53", "MDM2"] }],
//!   "edges": [{ "source": { "kind": "gene", "name": "TP53" },
//!               "relation": "REGULATES_GrG",
//!               "target": { "kind": "gene", "name": "CDKN1A" } }]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use kgscout_common::{GeneSymbol, KgScoutError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::model::{NodeKind, NodeRef, Relation};
use crate::repository::GraphRepository;

#[derive(Debug, Default)]
pub struct InMemoryGraph {
    /// (kind, lookup key) → canonical node; holds names and aliases.
    index: HashMap<(NodeKind, String), NodeRef>,
    /// Undirected typed adjacency.
    adjacency: HashMap<NodeRef, BTreeMap<Relation, BTreeSet<NodeRef>>>,
    unavailable: AtomicBool,
    queries: AtomicUsize,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Builder ───────────────────────────────────────────────────────────────

    /// Register a node, returning its canonical reference. Gene names are
    /// normalised; disease and pathway names keep their display form.
    pub fn add_node(&mut self, kind: NodeKind, name: &str) -> NodeRef {
        let Some(key) = NodeRef::lookup_key(kind, name) else {
            return NodeRef::new(kind, name);
        };
        if let Some(existing) = self.index.get(&(kind, key.clone())) {
            return existing.clone();
        }
        let display = match kind {
            NodeKind::Gene => key.clone(),
            _ => name.split_whitespace().collect::<Vec<_>>().join(" "),
        };
        let node = NodeRef::new(kind, display);
        self.index.insert((kind, key), node.clone());
        self.adjacency.entry(node.clone()).or_default();
        node
    }

    pub fn add_edge(&mut self, a: NodeRef, relation: Relation, b: NodeRef) {
        let a = self.add_node(a.kind, &a.name);
        let b = self.add_node(b.kind, &b.name);
        self.adjacency.entry(a.clone()).or_default()
            .entry(relation.clone()).or_default()
            .insert(b.clone());
        self.adjacency.entry(b).or_default()
            .entry(relation).or_default()
            .insert(a);
    }

    pub fn add_alias(&mut self, kind: NodeKind, alias: &str, canonical: &str) {
        let node = self.add_node(kind, canonical);
        if let Some(key) = NodeRef::lookup_key(kind, alias) {
            self.index.entry((kind, key)).or_insert(node);
        }
    }

    pub fn with_gene(mut self, symbol: &str) -> Self {
        self.add_node(NodeKind::Gene, symbol);
        self
    }

    pub fn with_disease(mut self, name: &str) -> Self {
        self.add_node(NodeKind::Disease, name);
        self
    }

    pub fn with_alias(mut self, kind: NodeKind, alias: &str, canonical: &str) -> Self {
        self.add_alias(kind, alias, canonical);
        self
    }

    /// Curated disease–gene association (`ASSOCIATES_DaG`).
    pub fn with_association(mut self, disease: &str, gene: &str) -> Self {
        self.add_edge(
            NodeRef::new(NodeKind::Disease, disease),
            Relation::AssociatesDaG,
            NodeRef::new(NodeKind::Gene, gene),
        );
        self
    }

    /// Protein–protein interaction (`INTERACTS_GiG`).
    pub fn with_interaction(mut self, a: &str, b: &str) -> Self {
        self.add_edge(
            NodeRef::new(NodeKind::Gene, a),
            Relation::InteractsGiG,
            NodeRef::new(NodeKind::Gene, b),
        );
        self
    }

    /// Pathway membership (`PARTICIPATES_GpPW`) for each gene.
    pub fn with_pathway(mut self, pathway: &str, genes: &[&str]) -> Self {
        for gene in genes {
            self.add_edge(
                NodeRef::new(NodeKind::Gene, *gene),
                Relation::ParticipatesGpPW,
                NodeRef::new(NodeKind::Pathway, pathway),
            );
        }
        self
    }

    pub fn with_edge(mut self, a: NodeRef, relation: Relation, b: NodeRef) -> Self {
        self.add_edge(a, relation, b);
        self
    }

    // ── Fixture loading ───────────────────────────────────────────────────────

    pub fn from_json_str(json: &str) -> Result<Self> {
        let fixture: GraphFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let graph = Self::from_json_str(&raw)?;
        debug!("Loaded fixture graph from {} ({} nodes)", path.as_ref().display(), graph.node_count());
        Ok(graph)
    }

    fn from_fixture(fixture: GraphFixture) -> Self {
        let mut g = Self::new();
        for gene in &fixture.genes {
            g.add_node(NodeKind::Gene, gene);
        }
        for disease in &fixture.diseases {
            g.add_node(NodeKind::Disease, disease);
        }
        for a in &fixture.aliases {
            g.add_alias(a.kind, &a.alias, &a.canonical);
        }
        for assoc in fixture.associations {
            g = g.with_association(&assoc.disease, &assoc.gene);
        }
        for (a, b) in fixture.interactions {
            g = g.with_interaction(&a, &b);
        }
        for pw in fixture.pathways {
            let genes: Vec<&str> = pw.genes.iter().map(String::as_str).collect();
            g = g.with_pathway(&pw.name, &genes);
        }
        for e in fixture.edges {
            g.add_edge(e.source, e.relation, e.target);
        }
        g
    }

    // ── Test hooks ────────────────────────────────────────────────────────────

    /// Make every subsequent query fail with `GraphUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn begin_query(&self) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KgScoutError::GraphUnavailable("in-memory graph marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraph {
    async fn resolve(&self, kind: NodeKind, name: &str) -> Result<NodeRef> {
        self.begin_query()?;
        NodeRef::lookup_key(kind, name)
            .and_then(|key| self.index.get(&(kind, key)).cloned())
            .ok_or_else(|| KgScoutError::unresolved(kind, name.trim()))
    }

    async fn neighbors(&self, node: &NodeRef, relations: &[Relation]) -> Result<BTreeSet<NodeRef>> {
        self.begin_query()?;
        let Some(by_relation) = self.adjacency.get(node) else {
            return Err(KgScoutError::unresolved(node.kind, node.name.clone()));
        };
        Ok(relations
            .iter()
            .filter_map(|r| by_relation.get(r))
            .flatten()
            .cloned()
            .collect())
    }

    async fn known_associations(&self, disease: &NodeRef) -> Result<BTreeSet<GeneSymbol>> {
        self.begin_query()?;
        let Some(by_relation) = self.adjacency.get(disease) else {
            return Err(KgScoutError::unresolved(disease.kind, disease.name.clone()));
        };
        Ok(by_relation
            .get(&Relation::AssociatesDaG)
            .into_iter()
            .flatten()
            .filter_map(NodeRef::as_gene)
            .collect())
    }
}

// ── Fixture format ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct GraphFixture {
    #[serde(default)]
    genes: Vec<String>,
    #[serde(default)]
    diseases: Vec<String>,
    #[serde(default)]
    aliases: Vec<AliasFixture>,
    #[serde(default)]
    associations: Vec<AssociationFixture>,
    #[serde(default)]
    interactions: Vec<(String, String)>,
    #[serde(default)]
    pathways: Vec<PathwayFixture>,
    #[serde(default)]
    edges: Vec<EdgeFixture>,
}

#[derive(Debug, Deserialize)]
struct AliasFixture {
    kind: NodeKind,
    alias: String,
    canonical: String,
}

#[derive(Debug, Deserialize)]
struct AssociationFixture {
    disease: String,
    gene: String,
}

#[derive(Debug, Deserialize)]
struct PathwayFixture {
    name: String,
    genes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EdgeFixture {
    source: NodeRef,
    relation: Relation,
    target: NodeRef,
}
