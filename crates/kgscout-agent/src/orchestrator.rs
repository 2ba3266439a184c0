//! Mode orchestrator.
//!
//! ```text
//! Init → ResolveInputs → ValidationPath | DiscoveryPath
//!      → Score → Classify → Rank → BuildReport → Done
//! ```
//! Any unrecoverable error moves the run to `Failed` and yields a
//! structured failure instead of a partial ranking. Both modes share the
//! Score/Classify/Rank stages; discovery truncates only after ranking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use kgscout_common::{Candidate, EvidenceItem, GeneSymbol, KgScoutError, Result};
use kgscout_kg::{genes_of, GraphRepository, MemoizedGraph, NodeKind, NodeRef, Relation};
use kgscout_ranker::rank::DEFAULT_KNOWN_BONUS;
use kgscout_ranker::{aggregate, classify, CollectorSettings, DiseaseContext, EvidenceCollector, EvidenceWeights, Ranker};
use tracing::{debug, info, instrument, warn};

use crate::report::{Outcome, Report};
use crate::request::{PathfinderRequest, RunPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ResolveInputs,
    ValidationPath,
    DiscoveryPath,
    Score,
    Classify,
    Rank,
    BuildReport,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// States visited by one run, in order.
#[derive(Debug, Clone, Default)]
pub struct RunTrace {
    states: Vec<RunState>,
}

impl RunTrace {
    fn enter(&mut self, state: RunState) {
        match self.states.last() {
            Some(prev) => debug!("{prev} → {state}"),
            None => debug!("→ {state}"),
        }
        self.states.push(state);
    }

    pub fn states(&self) -> &[RunState] {
        &self.states
    }

    pub fn last(&self) -> Option<RunState> {
        self.states.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct PathfinderSettings {
    pub weights: EvidenceWeights,
    pub collector: CollectorSettings,
    pub known_bonus: f64,
    /// Candidates (and seed lookups) in flight at once.
    pub concurrency: usize,
    pub min_mining_limit: usize,
    pub hub_blacklist: BTreeSet<GeneSymbol>,
}

impl Default for PathfinderSettings {
    fn default() -> Self {
        Self {
            weights: EvidenceWeights::default(),
            collector: CollectorSettings::default(),
            known_bonus: DEFAULT_KNOWN_BONUS,
            concurrency: 8,
            min_mining_limit: 50,
            hub_blacklist: ["UBC", "UBB", "RPS27A", "UBA52"]
                .iter()
                .filter_map(|g| GeneSymbol::parse(g))
                .collect(),
        }
    }
}

pub struct Pathfinder {
    graph: Arc<dyn GraphRepository>,
    collector: EvidenceCollector,
    ranker: Ranker,
    settings: PathfinderSettings,
}

/// Candidate set chosen by one of the two paths.
struct Selection {
    genes: Vec<GeneSymbol>,
    warnings: Vec<String>,
    limit: Option<usize>,
}

impl Pathfinder {
    pub fn new(graph: Arc<dyn GraphRepository>, settings: PathfinderSettings) -> Self {
        Self {
            graph,
            collector: EvidenceCollector::new(settings.weights.clone(), settings.collector.clone()),
            ranker: Ranker::new(settings.known_bonus),
            settings,
        }
    }

    pub fn settings(&self) -> &PathfinderSettings {
        &self.settings
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &PathfinderRequest) -> Outcome {
        self.run_traced(request).await.0
    }

    #[instrument(skip_all, fields(mode = %request.mode(), disease = %request.disease()))]
    pub async fn run_traced(&self, request: &PathfinderRequest) -> (Outcome, RunTrace) {
        let mut trace = RunTrace::default();
        trace.enter(RunState::Init);
        match self.execute(request, &mut trace).await {
            Ok(report) => {
                trace.enter(RunState::Done);
                info!(
                    "{} run finished: {} genes ranked ({} known, {} novel)",
                    report.mode(),
                    report.ranked_genes().len(),
                    report.known_genes().len(),
                    report.novel_genes().len()
                );
                (Outcome::Success(report), trace)
            }
            Err(error) => {
                warn!("{} run failed: {error}", request.mode());
                trace.enter(RunState::Failed);
                (Outcome::failure(request.mode().as_str(), error), trace)
            }
        }
    }

    async fn execute(&self, request: &PathfinderRequest, trace: &mut RunTrace) -> Result<Report> {
        // Memoisation lives exactly as long as this run.
        let memo = MemoizedGraph::new(Arc::clone(&self.graph));
        let graph: &dyn GraphRepository = &memo;

        trace.enter(RunState::ResolveInputs);
        let disease = graph.resolve(NodeKind::Disease, request.disease()).await?;
        let ctx = DiseaseContext::load(graph, disease, self.settings.concurrency).await?;

        let selection = match &request.plan {
            RunPlan::Validation { genes, .. } => {
                trace.enter(RunState::ValidationPath);
                let (genes, warnings) = self.resolve_genes(graph, genes).await?;
                Selection { genes, warnings, limit: None }
            }
            RunPlan::Discovery { disease, limit } => {
                trace.enter(RunState::DiscoveryPath);
                let genes = self.mine_candidates(graph, &ctx, *limit).await?;
                if genes.is_empty() {
                    return Err(KgScoutError::EmptyCandidateSet { disease: disease.clone() });
                }
                Selection { genes, warnings: Vec::new(), limit: Some(*limit) }
            }
        };

        trace.enter(RunState::Score);
        let scored = self.score(graph, &ctx, selection.genes).await?;

        trace.enter(RunState::Classify);
        let mut candidates: Vec<Candidate> = scored
            .into_iter()
            .map(|(gene, evidence, score)| {
                let status = classify(&gene, &ctx.known);
                debug!("{} {gene}", status.marker());
                Candidate::new(gene, evidence, score, status)
            })
            .collect();

        trace.enter(RunState::Rank);
        self.ranker.sort(&mut candidates);
        if let Some(limit) = selection.limit {
            candidates.truncate(limit);
        }

        trace.enter(RunState::BuildReport);
        Ok(Report::from_ranked(request.mode(), ctx.disease.name.clone(), &candidates, selection.warnings))
    }

    /// Resolve caller-supplied genes in input order. Unknown genes become
    /// warnings; any other failure aborts the run.
    async fn resolve_genes(
        &self,
        graph: &dyn GraphRepository,
        raw: &[String],
    ) -> Result<(Vec<GeneSymbol>, Vec<String>)> {
        let resolved: Vec<Result<NodeRef>> = stream::iter(raw)
            .map(move |name| graph.resolve(NodeKind::Gene, name))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut seen = BTreeSet::new();
        let mut genes = Vec::new();
        let mut warnings = Vec::new();
        for (name, result) in raw.iter().zip(resolved) {
            match result {
                Ok(node) => match node.as_gene() {
                    Some(gene) => {
                        if seen.insert(gene.clone()) {
                            genes.push(gene);
                        }
                    }
                    None => warnings.push(format!("Gene '{name}' did not resolve to a gene node; excluded from scoring.")),
                },
                Err(KgScoutError::UnresolvedEntity { .. }) => {
                    warn!("Gene '{name}' not found in knowledge graph");
                    warnings.push(format!("Gene '{name}' not found in knowledge graph; excluded from scoring."));
                }
                Err(e) => return Err(e),
            }
        }
        Ok((genes, warnings))
    }

    /// Known associations plus graph-mined neighbors of them: PPI partners
    /// counted by distinct seeds, pathway co-members counted by shared
    /// pathways. Each source is capped at `max(min_mining_limit, 3 × limit)`.
    async fn mine_candidates(
        &self,
        graph: &dyn GraphRepository,
        ctx: &DiseaseContext,
        limit: usize,
    ) -> Result<Vec<GeneSymbol>> {
        let cap = self.settings.min_mining_limit.max(limit.saturating_mul(3));
        let workers = self.settings.concurrency.max(1);

        let partners: Vec<BTreeSet<NodeRef>> = stream::iter(ctx.seed_nodes())
            .map(move |seed| async move { graph.neighbors(seed, &[Relation::InteractsGiG]).await })
            .buffer_unordered(workers)
            .try_collect()
            .await?;
        let members: Vec<BTreeSet<NodeRef>> = stream::iter(ctx.seed_pathways())
            .map(move |pathway| async move { graph.neighbors(pathway, &[Relation::ParticipatesGpPW]).await })
            .buffer_unordered(workers)
            .try_collect()
            .await?;

        let ppi = top_by_count(count_genes(&partners), &self.settings.hub_blacklist, cap);
        let pathway = top_by_count(count_genes(&members), &self.settings.hub_blacklist, cap);
        debug!(
            "Mined {} PPI and {} pathway candidates (cap {cap}) around {} known genes",
            ppi.len(),
            pathway.len(),
            ctx.known.len()
        );

        let union: BTreeSet<GeneSymbol> = ctx.known.iter().cloned().chain(ppi).chain(pathway).collect();
        Ok(union.into_iter().collect())
    }

    /// Collect evidence and aggregate it per candidate, at most
    /// `concurrency` candidates in flight. Completion order is irrelevant.
    async fn score(
        &self,
        graph: &dyn GraphRepository,
        ctx: &DiseaseContext,
        genes: Vec<GeneSymbol>,
    ) -> Result<Vec<(GeneSymbol, Vec<EvidenceItem>, f64)>> {
        let collector = &self.collector;
        stream::iter(genes)
            .map(move |gene| async move {
                let evidence = collector.collect(graph, ctx, &gene).await?;
                let score = aggregate(&evidence);
                debug!("{gene}: {} evidence items, score {score:.2}", evidence.len());
                Ok::<_, KgScoutError>((gene, evidence, score))
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .try_collect()
            .await
    }
}

/// How many of `groups` each gene appears in.
fn count_genes(groups: &[BTreeSet<NodeRef>]) -> BTreeMap<GeneSymbol, usize> {
    let mut counts = BTreeMap::new();
    for group in groups {
        for gene in genes_of(group) {
            *counts.entry(gene).or_insert(0) += 1;
        }
    }
    counts
}

/// Highest counts first (ties by symbol), blacklist removed, at most `cap`.
fn top_by_count(counts: BTreeMap<GeneSymbol, usize>, blacklist: &BTreeSet<GeneSymbol>, cap: usize) -> Vec<GeneSymbol> {
    let mut ranked: Vec<(GeneSymbol, usize)> = counts
        .into_iter()
        .filter(|(gene, _)| !blacklist.contains(gene))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(cap);
    ranked.into_iter().map(|(gene, _)| gene).collect()
}
