//! Evidence collection for one candidate gene against one disease.
//!
//! Disease-level facts (known associations, their pathways) are loaded once
//! into a [`DiseaseContext`]; the collector then issues only per-candidate
//! queries. A candidate without any evidence gets an empty list and stays
//! in the run with a zero score.

use std::collections::{BTreeMap, BTreeSet};

use futures_util::stream::{self, StreamExt, TryStreamExt};
use kgscout_common::{EvidenceItem, EvidenceType, GeneSymbol, Result};
use kgscout_kg::{GraphRepository, NodeKind, NodeRef, Relation};
use tracing::debug;

use crate::weights::EvidenceWeights;

/// Caps and extra relation types for evidence collection.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub max_ppi_hops: usize,
    pub max_ppi_items: usize,
    pub max_pathway_examples: usize,
    /// Relations whose disease-gene neighbors produce `Other` evidence.
    pub extra_relations: Vec<Relation>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            max_ppi_hops: 2,
            max_ppi_items: 5,
            max_pathway_examples: 3,
            extra_relations: vec![],
        }
    }
}

/// Disease-level facts shared by every candidate of a run.
#[derive(Debug, Clone)]
pub struct DiseaseContext {
    pub disease: NodeRef,
    pub known: BTreeSet<GeneSymbol>,
    seed_nodes: BTreeSet<NodeRef>,
    /// Pathway → known genes participating in it.
    pathway_seeds: BTreeMap<NodeRef, BTreeSet<GeneSymbol>>,
}

impl DiseaseContext {
    /// Load known associations and their pathways. Seed pathway lookups run
    /// with at most `concurrency` queries in flight.
    pub async fn load(graph: &dyn GraphRepository, disease: NodeRef, concurrency: usize) -> Result<Self> {
        let known = graph.known_associations(&disease).await?;
        let seed_nodes: BTreeSet<NodeRef> = known.iter().map(NodeRef::gene).collect();

        let memberships: Vec<(GeneSymbol, BTreeSet<NodeRef>)> = stream::iter(known.iter().cloned())
            .map(move |seed| async move {
                let pathways = graph
                    .neighbors(&NodeRef::gene(&seed), &[Relation::ParticipatesGpPW])
                    .await?;
                Ok::<_, kgscout_common::KgScoutError>((seed, pathways))
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

        let mut pathway_seeds: BTreeMap<NodeRef, BTreeSet<GeneSymbol>> = BTreeMap::new();
        for (seed, pathways) in memberships {
            for pw in pathways.into_iter().filter(|p| p.kind == NodeKind::Pathway) {
                pathway_seeds.entry(pw).or_default().insert(seed.clone());
            }
        }

        debug!(
            "Disease context for {}: {} known genes, {} seed pathways",
            disease.name,
            known.len(),
            pathway_seeds.len()
        );
        Ok(Self { disease, known, seed_nodes, pathway_seeds })
    }

    /// Build a context from already-known facts (no graph round-trips).
    pub fn from_parts(
        disease: NodeRef,
        known: BTreeSet<GeneSymbol>,
        pathway_seeds: BTreeMap<NodeRef, BTreeSet<GeneSymbol>>,
    ) -> Self {
        let seed_nodes = known.iter().map(NodeRef::gene).collect();
        Self { disease, known, seed_nodes, pathway_seeds }
    }

    pub fn seed_nodes(&self) -> &BTreeSet<NodeRef> {
        &self.seed_nodes
    }

    /// Seed pathways that contain at least one known gene other than `gene`.
    pub fn shared_pathways<'a>(&'a self, gene: &'a GeneSymbol, pathways: &'a BTreeSet<NodeRef>) -> impl Iterator<Item = &'a NodeRef> + 'a {
        pathways.iter().filter(move |p| {
            self.pathway_seeds
                .get(*p)
                .is_some_and(|seeds| seeds.iter().any(|s| s != gene))
        })
    }

    /// Every seed pathway node.
    pub fn seed_pathways(&self) -> impl Iterator<Item = &NodeRef> {
        self.pathway_seeds.keys()
    }
}

pub struct EvidenceCollector {
    weights: EvidenceWeights,
    settings: CollectorSettings,
}

impl EvidenceCollector {
    pub fn new(weights: EvidenceWeights, settings: CollectorSettings) -> Self {
        Self { weights, settings }
    }

    pub fn weights(&self) -> &EvidenceWeights {
        &self.weights
    }

    /// Gather all evidence for `gene`. Items come out in a fixed order:
    /// direct association, pathway, PPI (nearest first), other.
    pub async fn collect(
        &self,
        graph: &dyn GraphRepository,
        ctx: &DiseaseContext,
        gene: &GeneSymbol,
    ) -> Result<Vec<EvidenceItem>> {
        let node = NodeRef::gene(gene);
        let disease = ctx.disease.name.as_str();
        let mut items = Vec::new();

        if ctx.known.contains(gene) {
            items.push(EvidenceItem::new(
                gene.clone(),
                disease,
                EvidenceType::DirectAssociation,
                self.weights.direct_association,
                format!("{}: curated link to {disease}.", EvidenceType::DirectAssociation.label()),
            ));
        }

        let pathways = graph.neighbors(&node, &[Relation::ParticipatesGpPW]).await?;
        let shared: Vec<&NodeRef> = ctx.shared_pathways(gene, &pathways).collect();
        if !shared.is_empty() {
            let examples: Vec<&str> = shared
                .iter()
                .take(self.settings.max_pathway_examples)
                .map(|p| p.name.as_str())
                .collect();
            items.push(EvidenceItem::new(
                gene.clone(),
                disease,
                EvidenceType::Pathway,
                self.weights.pathway_weight(shared.len()),
                format!(
                    "{}: In {} shared pathways with disease genes (e.g., {}).",
                    EvidenceType::Pathway.label(),
                    shared.len(),
                    examples.join(", ")
                ),
            ));
        }

        let lengths = graph
            .shortest_path_lengths(&node, ctx.seed_nodes(), &Relation::InteractsGiG, self.settings.max_ppi_hops)
            .await?;
        let mut paths: Vec<(usize, &NodeRef)> = lengths
            .iter()
            .filter(|(seed, _)| **seed != node)
            .map(|(seed, hops)| (*hops, seed))
            .collect();
        paths.sort();
        for (hops, seed) in paths.into_iter().take(self.settings.max_ppi_items) {
            let unit = if hops == 1 { "hop" } else { "hops" };
            items.push(EvidenceItem::new(
                gene.clone(),
                disease,
                EvidenceType::Ppi,
                self.weights.ppi_weight(hops),
                format!("{}: Reaches disease gene {} in {hops} {unit}.", EvidenceType::Ppi.label(), seed.name),
            ));
        }

        for relation in &self.settings.extra_relations {
            let linked = graph.neighbors(&node, std::slice::from_ref(relation)).await?;
            for seed in linked.iter().filter(|n| ctx.seed_nodes.contains(*n) && **n != node) {
                items.push(EvidenceItem::new(
                    gene.clone(),
                    disease,
                    EvidenceType::Other,
                    self.weights.other,
                    format!("{}: {relation} link to disease gene {}.", EvidenceType::Other.label(), seed.name),
                ));
            }
        }

        debug!("{gene}: {} evidence items", items.len());
        Ok(items)
    }
}
