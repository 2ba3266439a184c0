//! Configuration loading for kgscout.
//! Reads kgscout.toml from the path in KGSCOUT_CONFIG or the current directory.
//! A missing default file falls back to built-in defaults.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kgscout_common::{GeneSymbol, KgScoutError, Result};
use kgscout_kg::{GraphRepository, InMemoryGraph, Neo4jGraph, Neo4jSettings, Relation, RetryPolicy};
use kgscout_ranker::{CollectorSettings, EvidenceWeights};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::orchestrator::PathfinderSettings;
use crate::request::RequestDefaults;

pub const CONFIG_ENV: &str = "KGSCOUT_CONFIG";
pub const PASSWORD_ENV: &str = "KGSCOUT_NEO4J_PASSWORD";
pub const DEFAULT_CONFIG_FILE: &str = "kgscout.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    #[default]
    Neo4j,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub backend: GraphBackend,
    #[serde(default = "default_graph_url")]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_user")]
    pub user: String,
    /// Empty → `KGSCOUT_NEO4J_PASSWORD`, then `neo4j`.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_graph_url()        -> String { "http://neo4j.het.io:7474".to_string() }
fn default_database()         -> String { "neo4j".to_string() }
fn default_user()             -> String { "neo4j".to_string() }
fn default_max_connections()  -> usize  { 4 }
fn default_timeout_secs()     -> u64    { 30 }
fn default_max_retries()      -> u32    { 2 }
fn default_retry_backoff_ms() -> u64    { 250 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend:          GraphBackend::default(),
            url:              default_graph_url(),
            database:         default_database(),
            user:             default_user(),
            password:         String::new(),
            fixture_path:     None,
            max_connections:  default_max_connections(),
            timeout_secs:     default_timeout_secs(),
            max_retries:      default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub weights: EvidenceWeights,
    #[serde(default = "default_known_bonus")]
    pub known_bonus: f64,
    #[serde(default = "default_max_ppi_hops")]
    pub max_ppi_hops: usize,
    #[serde(default = "default_max_ppi_items")]
    pub max_ppi_items: usize,
    #[serde(default = "default_max_pathway_examples")]
    pub max_pathway_examples: usize,
    /// Relation types whose links to disease genes count as `Other` evidence.
    #[serde(default)]
    pub extra_relations: Vec<Relation>,
}

fn default_known_bonus()          -> f64   { 100.0 }
fn default_max_ppi_hops()         -> usize { 2 }
fn default_max_ppi_items()        -> usize { 5 }
fn default_max_pathway_examples() -> usize { 3 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights:              EvidenceWeights::default(),
            known_bonus:          default_known_bonus(),
            max_ppi_hops:         default_max_ppi_hops(),
            max_ppi_items:        default_max_ppi_items(),
            max_pathway_examples: default_max_pathway_examples(),
            extra_relations:      Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Per-source mining cap is `max(min_mining_limit, 3 × limit)`.
    #[serde(default = "default_min_mining_limit")]
    pub min_mining_limit: usize,
    /// Ubiquitous hub genes never mined as candidates.
    #[serde(default = "default_hub_blacklist")]
    pub hub_blacklist: Vec<String>,
}

fn default_limit()            -> usize { 20 }
fn default_min_mining_limit() -> usize { 50 }

fn default_hub_blacklist() -> Vec<String> {
    ["UBC", "UBB", "RPS27A", "UBA52"].iter().map(|s| s.to_string()).collect()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_limit:    default_limit(),
            min_mining_limit: default_min_mining_limit(),
            hub_blacklist:    default_hub_blacklist(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Candidates whose evidence is collected concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Disease used by validation runs that name none.
    #[serde(default = "default_disease")]
    pub default_disease: String,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

fn default_concurrency() -> usize   { 8 }
fn default_disease()     -> String  { "Liver Cancer".to_string() }
fn default_results_dir() -> PathBuf { PathBuf::from("results") }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency:     default_concurrency(),
            default_disease: default_disease(),
            results_dir:     default_results_dir(),
        }
    }
}


impl Config {
    /// Load configuration. An explicit path (argument, then KGSCOUT_CONFIG)
    /// must exist; the default ./kgscout.toml is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    info!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KgScoutError::Config(format!("config file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| KgScoutError::Config(format!("invalid kgscout.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.concurrency == 0 {
            return Err(KgScoutError::Config("run.concurrency must be at least 1".into()));
        }
        if self.graph.max_connections == 0 {
            return Err(KgScoutError::Config("graph.max_connections must be at least 1".into()));
        }
        if self.discovery.default_limit == 0 {
            return Err(KgScoutError::Config("discovery.default_limit must be at least 1".into()));
        }
        if !self.scoring.known_bonus.is_finite() || self.scoring.known_bonus < 0.0 {
            return Err(KgScoutError::Config("scoring.known_bonus must be a non-negative number".into()));
        }
        for relation in &self.scoring.extra_relations {
            relation.validate()?;
        }
        self.scoring.weights.validate()
    }

    pub fn neo4j_settings(&self) -> Neo4jSettings {
        let g = &self.graph;
        Neo4jSettings {
            url:             g.url.clone(),
            database:        g.database.clone(),
            user:            g.user.clone(),
            password:        resolve_password(&g.password, std::env::var(PASSWORD_ENV).ok()),
            max_connections: g.max_connections,
            timeout:         Duration::from_secs(g.timeout_secs),
            retry: RetryPolicy {
                max_retries: g.max_retries,
                backoff:     Duration::from_millis(g.retry_backoff_ms),
            },
        }
    }

    pub fn pathfinder_settings(&self) -> PathfinderSettings {
        let s = &self.scoring;
        PathfinderSettings {
            weights: s.weights.clone(),
            collector: CollectorSettings {
                max_ppi_hops:         s.max_ppi_hops,
                max_ppi_items:        s.max_ppi_items,
                max_pathway_examples: s.max_pathway_examples,
                extra_relations:      s.extra_relations.clone(),
            },
            known_bonus:      s.known_bonus,
            concurrency:      self.run.concurrency,
            min_mining_limit: self.discovery.min_mining_limit,
            hub_blacklist:    self.hub_blacklist(),
        }
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            disease: self.run.default_disease.clone(),
            limit:   self.discovery.default_limit,
        }
    }

    fn hub_blacklist(&self) -> BTreeSet<GeneSymbol> {
        self.discovery
            .hub_blacklist
            .iter()
            .filter_map(|g| GeneSymbol::parse(g))
            .collect()
    }

    /// Build the configured graph backend.
    pub fn connect_graph(&self) -> Result<Arc<dyn GraphRepository>> {
        match self.graph.backend {
            GraphBackend::Neo4j => {
                info!("Graph backend: Neo4j at {}", self.graph.url);
                Ok(Arc::new(Neo4jGraph::connect(self.neo4j_settings())?))
            }
            GraphBackend::Fixture => {
                let Some(path) = self.graph.fixture_path.as_deref() else {
                    return Err(KgScoutError::Config(
                        "graph.backend = \"fixture\" requires graph.fixture_path".into(),
                    ));
                };
                let graph = InMemoryGraph::from_json_file(path)?;
                info!("Graph backend: fixture {} ({} nodes)", path.display(), graph.node_count());
                Ok(Arc::new(graph))
            }
        }
    }
}

/// Configured password, else the environment, else the Neo4j default.
fn resolve_password(configured: &str, from_env: Option<String>) -> SecretString {
    let password = if !configured.is_empty() {
        configured.to_string()
    } else {
        from_env.filter(|p| !p.is_empty()).unwrap_or_else(|| "neo4j".to_string())
    };
    SecretString::from(password)
}
