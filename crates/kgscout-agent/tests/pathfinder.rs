//! End-to-end runs against the liver cancer fixture graph.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use kgscout_agent::artifact;
use kgscout_agent::{Outcome, Pathfinder, PathfinderRequest, PathfinderSettings, Report};
use kgscout_common::GeneSymbol;
use kgscout_kg::InMemoryGraph;
use kgscout_ranker::Ranker;
use pretty_assertions::assert_eq;
use serde_json::json;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/liver_cancer.json")
}

fn liver_graph() -> InMemoryGraph {
    InMemoryGraph::from_json_file(fixture_path()).unwrap()
}

fn pathfinder() -> Pathfinder {
    Pathfinder::new(Arc::new(liver_graph()), PathfinderSettings::default())
}

fn genes(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn names(gs: &[GeneSymbol]) -> Vec<&str> {
    gs.iter().map(GeneSymbol::as_str).collect()
}

fn expect_report(outcome: &Outcome) -> &Report {
    match outcome {
        Outcome::Success(r) => r,
        Outcome::Failure { error, .. } => panic!("run failed: {error}"),
    }
}

/// Every gene is in exactly one of known/novel, and together they are
/// the ranked list.
fn assert_partition(report: &Report) {
    let known: BTreeSet<_> = report.known_genes().iter().collect();
    let novel: BTreeSet<_> = report.novel_genes().iter().collect();
    let ranked: BTreeSet<_> = report.ranked_genes().iter().collect();
    assert!(known.is_disjoint(&novel));
    assert_eq!(known.union(&novel).copied().collect::<BTreeSet<_>>(), ranked);
    for gene in report.ranked_genes() {
        let score = report.score(gene.as_str()).unwrap();
        assert!((0.0..=10.0).contains(&score), "{gene} scored {score}");
    }
}

#[tokio::test]
async fn validation_labels_known_and_novel_genes() {
    let req = PathfinderRequest::validation(genes(&["TP53", "EGFR", "STAMBP"]), "Liver cancer").unwrap();
    let outcome = pathfinder().run(&req).await;
    let report = expect_report(&outcome);

    assert_partition(report);
    assert_eq!(report.ranked_genes().len(), 3);
    assert_eq!(report.is_known("TP53"), Some(true));
    assert_eq!(report.is_known("EGFR"), Some(true));
    assert_eq!(report.is_known("STAMBP"), Some(false));
    assert_eq!(names(report.ranked_genes())[2], "STAMBP");

    let v = outcome.to_json().unwrap();
    assert_eq!(v["status"], "success");
    assert_eq!(v["known_status"], json!({ "TP53": true, "EGFR": true, "STAMBP": false }));
    assert_eq!(v["kg_scores"]["STAMBP"], json!(2.0));
    assert_eq!(v["kg_scores"]["EGFR"], json!(7.5));
    assert_eq!(
        v["evidence_details"]["STAMBP"],
        json!("[潜在新靶点] PPI: Reaches disease gene TP53 in 2 hops.")
    );
    assert_eq!(v["warnings"], json!([]));
}

#[tokio::test]
async fn validation_reports_unresolved_genes_as_warnings() {
    let req = PathfinderRequest::validation(genes(&["TP53", "NOTAREALGENE123"]), "Liver cancer").unwrap();
    let outcome = pathfinder().run(&req).await;
    let report = expect_report(&outcome);

    assert_eq!(names(report.ranked_genes()), vec!["TP53"]);
    assert!(report.score("TP53").unwrap() >= 7.5);
    assert_eq!(report.warnings().len(), 1);
    assert!(report.warnings()[0].contains("NOTAREALGENE123"));
    assert_eq!(report.score("NOTAREALGENE123"), None);
}

#[tokio::test]
async fn validation_resolves_aliases_and_defaults_disease() {
    let req = PathfinderRequest::from_params(
        "validation",
        Some(genes(&["p53"])),
        None,
        None,
        None,
        &Default::default(),
    )
    .unwrap();
    let outcome = pathfinder().run(&req).await;
    let report = expect_report(&outcome);
    // The default "Liver Cancer" is reported under the graph's own name.
    assert_eq!(report.disease(), "Liver cancer");
    assert_eq!(names(report.known_genes()), vec!["TP53"]);
}

#[tokio::test]
async fn validation_accepts_disease_alias() {
    let req = PathfinderRequest::validation(genes(&["EGFR"]), "hepatocellular CARCINOMA").unwrap();
    let outcome = pathfinder().run(&req).await;
    assert_eq!(expect_report(&outcome).is_known("EGFR"), Some(true));
}

#[tokio::test]
async fn validation_is_idempotent() {
    let pf = pathfinder();
    let req = PathfinderRequest::validation(genes(&["STAMBP", "TP53", "MDM2", "EGFR"]), "Liver cancer").unwrap();
    let first = pf.run(&req).await;
    let second = pf.run(&req).await;
    assert_eq!(expect_report(&first), expect_report(&second));
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[tokio::test]
async fn known_gene_without_mined_evidence_is_kept() {
    // TERT has only its curated edge; it must stay known and visible.
    let req = PathfinderRequest::validation(genes(&["TERT", "APC"]), "Liver cancer").unwrap();
    let outcome = pathfinder().run(&req).await;
    let report = expect_report(&outcome);
    assert_eq!(names(report.ranked_genes()), vec!["TERT", "APC"]);
    assert_eq!(report.is_known("TERT"), Some(true));
    assert_eq!(report.is_known("APC"), Some(false));
    assert!((report.score("TERT").unwrap() - 7.5).abs() < 1e-9);
    assert!(report.evidence_details()[&GeneSymbol::parse("TERT").unwrap()].starts_with("[已知靶点] Direct association"));
}

#[tokio::test]
async fn discovery_respects_limit_and_rank_order() {
    let req = PathfinderRequest::discovery("Liver cancer", 10).unwrap();
    let outcome = pathfinder().run(&req).await;
    let report = expect_report(&outcome);

    assert!(report.ranked_genes().len() <= 10);
    assert_partition(report);

    let ranker = Ranker::default();
    let keys: Vec<f64> = report
        .ranked_genes()
        .iter()
        .map(|g| {
            let bonus = if report.is_known(g.as_str()) == Some(true) { ranker.known_bonus() } else { 0.0 };
            report.score(g.as_str()).unwrap() + bonus
        })
        .collect();
    assert!(keys.windows(2).all(|w| w[0] >= w[1]), "keys not descending: {keys:?}");

    // All six curated genes survive truncation ahead of every novel one.
    assert_eq!(report.known_genes().len(), 6);
    assert_eq!(&report.ranked_genes()[..6], report.known_genes());
    assert!(!report.ranked_genes().iter().any(|g| g.as_str() == "UBC"));

    let v = outcome.to_json().unwrap();
    assert_eq!(v["discovered_targets"].as_array().unwrap().len(), report.ranked_genes().len());
    assert!(v.get("validated_genes").is_none());
}

#[tokio::test]
async fn discovery_truncation_keeps_relative_order() {
    let pf = pathfinder();
    let full = pf.run(&PathfinderRequest::discovery("Liver cancer", 100).unwrap()).await;
    let full = expect_report(&full).ranked_genes().to_vec();
    assert!(full.len() > 8);
    for limit in [1, 3, 8] {
        let cut = pf.run(&PathfinderRequest::discovery("Liver cancer", limit).unwrap()).await;
        assert_eq!(expect_report(&cut).ranked_genes(), &full[..limit]);
    }
}

#[tokio::test]
async fn discovery_order_is_independent_of_concurrency() {
    let serial = Pathfinder::new(
        Arc::new(liver_graph()),
        PathfinderSettings { concurrency: 1, ..PathfinderSettings::default() },
    );
    let req = PathfinderRequest::discovery("Liver cancer", 20).unwrap();
    let a = serial.run(&req).await;
    let b = pathfinder().run(&req).await;
    assert_eq!(expect_report(&a), expect_report(&b));
}

#[tokio::test]
async fn discovery_of_disease_without_associations_fails() {
    let outcome = pathfinder().run(&PathfinderRequest::discovery("NonexistentSyndromeX", 10).unwrap()).await;
    assert!(!outcome.is_success());
    let v = outcome.to_json().unwrap();
    assert_eq!(v["status"], "error");
    assert_eq!(v["error"]["kind"], "EmptyCandidateSetError");
    assert!(v.get("discovered_targets").is_none());
}

#[tokio::test]
async fn discovery_of_unknown_disease_is_unresolved() {
    let outcome = pathfinder().run(&PathfinderRequest::discovery("Atlantis fever", 10).unwrap()).await;
    let v = outcome.to_json().unwrap();
    assert_eq!(v["status"], "error");
    assert_eq!(v["error"]["kind"], "UnresolvedEntityError");
    assert_eq!(v["error"]["entity"], "Atlantis fever");
    assert!(v.get("discovered_targets").is_none());
}

#[tokio::test]
async fn report_uses_canonical_disease_name() {
    let req = PathfinderRequest::validation(genes(&["EGFR"]), "hepatocellular CARCINOMA").unwrap();
    let outcome = pathfinder().run(&req).await;
    assert_eq!(expect_report(&outcome).disease(), "Liver cancer");
    assert_eq!(outcome.to_json().unwrap()["disease"], "Liver cancer");
}

#[tokio::test]
async fn unavailable_graph_fails_without_partial_report() {
    let graph = liver_graph();
    graph.set_unavailable(true);
    let pf = Pathfinder::new(Arc::new(graph), PathfinderSettings::default());

    let outcome = pf.run(&PathfinderRequest::discovery("Liver cancer", 10).unwrap()).await;
    assert!(outcome.report().is_none());
    assert_eq!(outcome.error().unwrap().kind(), "GraphUnavailableError");

    let outcome = pf
        .run(&PathfinderRequest::validation(genes(&["TP53"]), "Liver cancer").unwrap())
        .await;
    let v = outcome.to_json().unwrap();
    assert_eq!(v["error"]["kind"], "GraphUnavailableError");
    assert_eq!(v["mode"], "validation");
}

#[tokio::test]
async fn invalid_parameters_fail_before_querying() {
    let err = PathfinderRequest::from_params("validation", None, Some("Liver cancer".into()), None, None, &Default::default())
        .unwrap_err();
    let v = Outcome::failure("validation", err).to_json().unwrap();
    assert_eq!(v["error"]["kind"], "InvalidModeError");
}

#[tokio::test]
async fn report_artifact_round_trips() {
    let outcome = pathfinder()
        .run(&PathfinderRequest::validation(genes(&["TP53", "STAMBP"]), "Liver cancer").unwrap())
        .await;
    let json = outcome.to_pretty_json().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = artifact::artifact_path(dir.path(), "session1", "liver-demo", outcome.mode()).unwrap();
    artifact::write_artifact(&path, &json).unwrap();

    assert!(path.ends_with("session1/liver-demo_kg_validation.json"));
    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved, outcome.to_json().unwrap());
}
