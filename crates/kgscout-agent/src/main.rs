//! kgscout — knowledge-graph target validation and discovery.
//! Prints the JSON report on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kgscout_agent::config::{Config, GraphBackend};
use kgscout_agent::request::parse_gene_list;
use kgscout_agent::{artifact, Outcome, Pathfinder, PathfinderRequest};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kgscout", version, about = "Knowledge-graph target validation and discovery")]
struct Cli {
    /// `validation` (score given genes) or `discovery` (mine a disease)
    #[arg(long)]
    mode: String,

    /// Genes to validate, as a JSON array or comma-separated
    #[arg(long)]
    genes: Option<String>,

    /// Disease name (required for discovery)
    #[arg(long)]
    disease: Option<String>,

    /// Maximum number of discovered targets
    #[arg(long)]
    limit: Option<usize>,

    /// Also save the report as {results_dir}/{session}/{prefix}_kg_{mode}.json
    #[arg(long)]
    prefix: Option<String>,

    /// Path to kgscout.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load the graph from a JSON fixture instead of Neo4j
    #[arg(long)]
    graph_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kgscout=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("kgscout {} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            let outcome = Outcome::failure(cli.mode.trim().to_ascii_lowercase(), e);
            println!("{}", outcome.to_pretty_json()?);
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(path) = cli.graph_file.clone() {
        config.graph.backend = GraphBackend::Fixture;
        config.graph.fixture_path = Some(path);
    }

    let outcome = run(&cli, &config).await;
    let json = outcome.to_pretty_json()?;
    println!("{json}");

    if let Some(prefix) = cli.prefix.as_deref() {
        let session = artifact::session_id();
        match artifact::artifact_path(&config.run.results_dir, &session, prefix, outcome.mode()) {
            Some(path) => artifact::write_artifact(&path, &json)?,
            None => warn!("Prefix '{prefix}' has no file-safe characters; report not saved"),
        }
    }

    Ok(if outcome.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Validate parameters, connect the graph and run. Every failure, including
/// bad parameters and an unreachable backend, becomes an error report.
async fn run(cli: &Cli, config: &Config) -> Outcome {
    let mode = cli.mode.trim().to_ascii_lowercase();
    let request = match PathfinderRequest::from_params(
        &cli.mode,
        cli.genes.as_deref().map(parse_gene_list),
        cli.disease.clone(),
        cli.limit,
        cli.prefix.clone(),
        &config.request_defaults(),
    ) {
        Ok(r) => r,
        Err(e) => return Outcome::failure(mode, e),
    };

    let graph = match config.connect_graph() {
        Ok(g) => g,
        Err(e) => return Outcome::failure(mode, e),
    };

    Pathfinder::new(graph, config.pathfinder_settings()).run(&request).await
}
