//! Neo4j backend over the HTTP transactional Cypher endpoint.
//!
//! Queries go to `POST {url}/db/{database}/tx/commit`. A semaphore with
//! `max_connections` permits bounds in-flight queries; a permit is held
//! for exactly one attempt and released on drop, so failures release too.
//! Transient failures are retried by [`RetryPolicy`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kgscout_common::{GeneSymbol, KgScoutError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::model::{kind_from_label, label, NodeKind, NodeRef, Relation};
use crate::repository::GraphRepository;
use crate::retry::RetryPolicy;

/// Connection settings for a Neo4j server.
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: SecretString,
    pub max_connections: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

pub struct Neo4jGraph {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: SecretString,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl Neo4jGraph {
    pub fn connect(settings: Neo4jSettings) -> Result<Self> {
        if settings.max_connections == 0 {
            return Err(KgScoutError::Config("graph.max_connections must be at least 1".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .pool_max_idle_per_host(settings.max_connections)
            .build()
            .map_err(|e| KgScoutError::GraphUnavailable(format!("HTTP client init failed: {e}")))?;
        let endpoint = format!(
            "{}/db/{}/tx/commit",
            settings.url.trim_end_matches('/'),
            settings.database
        );
        debug!("Neo4j endpoint {endpoint}, {} connections", settings.max_connections);
        Ok(Self {
            client,
            endpoint,
            user: settings.user,
            password: settings.password,
            permits: Arc::new(Semaphore::new(settings.max_connections)),
            retry: settings.retry,
        })
    }

    /// Run one Cypher statement with retry, returning its rows.
    async fn query(&self, cypher: &str, params: Value) -> Result<Vec<Vec<Value>>> {
        self.retry
            .run("neo4j query", || self.query_once(cypher, params.clone()))
            .await
    }

    async fn query_once(&self, cypher: &str, params: Value) -> Result<Vec<Vec<Value>>> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| KgScoutError::GraphUnavailable("connection pool closed".into()))?;

        let body = json!({ "statements": [{ "statement": cypher, "parameters": params }] });
        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(self.password.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| KgScoutError::GraphUnavailable(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KgScoutError::GraphUnavailable(format!("HTTP {status} from {}", self.endpoint)));
        }

        let payload: TxResponse = resp
            .json()
            .await
            .map_err(|e| KgScoutError::GraphUnavailable(format!("malformed response: {e}")))?;
        payload.into_rows()
    }

    async fn gene_names(&self, cypher: &str, params: Value) -> Result<BTreeSet<GeneSymbol>> {
        let rows = self.query(cypher, params).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.first()?.as_str().and_then(GeneSymbol::parse))
            .collect())
    }
}

/// `MATCH` clause binding `var` to the node named by `$param`. Gene names
/// compare upper-cased, the canonical [`GeneSymbol`] form.
fn match_node(kind: NodeKind, var: &str, param: &str) -> String {
    match kind {
        NodeKind::Gene => format!("MATCH ({var}:Gene) WHERE toUpper({var}.name) = ${param}"),
        _ => format!("MATCH ({var}:{} {{name: ${param}}})", label(kind)),
    }
}

/// Pipeline reference for a node the graph calls `name`.
fn node_ref(kind: NodeKind, name: &str) -> Option<NodeRef> {
    match kind {
        NodeKind::Gene => GeneSymbol::parse(name).map(|g| NodeRef::gene(&g)),
        _ => Some(NodeRef::new(kind, name)),
    }
}

#[async_trait]
impl GraphRepository for Neo4jGraph {
    async fn resolve(&self, kind: NodeKind, name: &str) -> Result<NodeRef> {
        let Some(key) = NodeRef::lookup_key(kind, name) else {
            return Err(KgScoutError::unresolved(kind, name.trim()));
        };
        let fold = if kind == NodeKind::Gene { "toUpper" } else { "toLower" };
        let cypher = format!(
            "MATCH (n:{label}) \
             WHERE {fold}(n.name) = $key OR any(a IN coalesce(n.aliases, []) WHERE {fold}(a) = $key) \
             WITH n ORDER BY CASE WHEN {fold}(n.name) = $key THEN 0 ELSE 1 END, n.name LIMIT 1 \
             RETURN n.name",
            label = label(kind),
        );
        let rows = self.query(&cypher, json!({ "key": key })).await?;
        rows.first()
            .and_then(|row| row.first())
            .and_then(Value::as_str)
            .and_then(|n| node_ref(kind, n))
            .ok_or_else(|| KgScoutError::unresolved(kind, name.trim()))
    }

    async fn neighbors(&self, node: &NodeRef, relations: &[Relation]) -> Result<BTreeSet<NodeRef>> {
        if relations.is_empty() {
            return Ok(BTreeSet::new());
        }
        for r in relations {
            r.validate()?;
        }
        let types: Vec<&str> = relations.iter().map(Relation::as_str).collect();
        let cypher = format!(
            "{} MATCH (n)-[:{}]-(m) RETURN DISTINCT labels(m)[0], m.name",
            match_node(node.kind, "n", "name"),
            types.join("|")
        );
        let rows = self.query(&cypher, json!({ "name": node.name })).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let kind = kind_from_label(row.first()?.as_str()?)?;
                node_ref(kind, row.get(1)?.as_str()?)
            })
            .collect())
    }

    async fn known_associations(&self, disease: &NodeRef) -> Result<BTreeSet<GeneSymbol>> {
        let cypher = format!(
            "{} MATCH (d)-[:ASSOCIATES_DaG]-(g:Gene) RETURN DISTINCT g.name",
            match_node(disease.kind, "d", "disease")
        );
        self.gene_names(&cypher, json!({ "disease": disease.name })).await
    }

    async fn shortest_path_lengths(
        &self,
        from: &NodeRef,
        targets: &BTreeSet<NodeRef>,
        relation: &Relation,
        max_hops: usize,
    ) -> Result<BTreeMap<NodeRef, usize>> {
        if max_hops == 0 || targets.is_empty() {
            return Ok(BTreeMap::new());
        }
        relation.validate()?;
        let names: Vec<String> = targets
            .iter()
            .filter(|t| t.is_gene() && *t != from)
            .map(|t| t.name.to_ascii_uppercase())
            .collect();
        if names.is_empty() {
            return Ok(BTreeMap::new());
        }
        let cypher = format!(
            "{from_match} \
             MATCH (b:Gene) WHERE toUpper(b.name) IN $targets AND b <> a \
             MATCH p = shortestPath((a)-[:{rel}*..{max_hops}]-(b)) \
             RETURN b.name, length(p)",
            from_match = match_node(from.kind, "a", "from"),
            rel = relation.as_str(),
        );
        let rows = self.query(&cypher, json!({ "from": from.name, "targets": names })).await?;
        let mut lengths: BTreeMap<NodeRef, usize> = BTreeMap::new();
        for row in &rows {
            let Some(target) = row.first().and_then(Value::as_str).and_then(|n| node_ref(NodeKind::Gene, n)) else {
                continue;
            };
            let Some(hops) = row.get(1).and_then(Value::as_u64).and_then(|h| usize::try_from(h).ok()) else {
                continue;
            };
            lengths
                .entry(target)
                .and_modify(|best| *best = (*best).min(hops))
                .or_insert(hops);
        }
        Ok(lengths)
    }
}

// ── Wire format ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl TxResponse {
    fn into_rows(self) -> Result<Vec<Vec<Value>>> {
        if let Some(err) = self.errors.first() {
            return Err(KgScoutError::GraphUnavailable(format!("{}: {}", err.code, err.message)));
        }
        Ok(self
            .results
            .into_iter()
            .flat_map(|r| r.data)
            .map(|d| d.row)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Request bodies received by a [`serve`] task, in arrival order.
    type Received = Arc<Mutex<Vec<Value>>>;

    /// Answer one request per connection with the next of `responses`.
    async fn serve(responses: Vec<Value>) -> (String, Received) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let received: Received = Arc::default();
        let log = Arc::clone(&received);
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let body = read_body(&mut socket).await;
                log.lock().unwrap().push(body);
                let payload = response.to_string();
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        (url, received)
    }

    async fn read_body(socket: &mut TcpStream) -> Value {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request was complete");
            buf.extend_from_slice(&chunk[..n]);
            let Some(split) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..split]).to_ascii_lowercase();
            let len: usize = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);
            let start = split + 4;
            while buf.len() < start + len {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed mid-body");
                buf.extend_from_slice(&chunk[..n]);
            }
            return serde_json::from_slice(&buf[start..start + len]).unwrap();
        }
    }

    fn rows(rows: Vec<Value>) -> Value {
        let data: Vec<Value> = rows.into_iter().map(|r| json!({ "row": r })).collect();
        json!({ "results": [{ "columns": [], "data": data }], "errors": [] })
    }

    fn statement(body: &Value) -> &str {
        body["statements"][0]["statement"].as_str().unwrap()
    }

    fn parameters(body: &Value) -> &Value {
        &body["statements"][0]["parameters"]
    }

    async fn graph_at(url: String) -> Neo4jGraph {
        let mut s = settings(2);
        s.url = url;
        Neo4jGraph::connect(s).unwrap()
    }

    fn settings(max_connections: usize) -> Neo4jSettings {
        Neo4jSettings {
            url: "http://localhost:7474/".into(),
            database: "neo4j".into(),
            user: "neo4j".into(),
            password: SecretString::from("neo4j".to_string()),
            max_connections,
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::none(),
        }
    }

    #[test]
    fn test_endpoint_is_built_from_settings() {
        let g = Neo4jGraph::connect(settings(4)).unwrap();
        assert_eq!(g.endpoint, "http://localhost:7474/db/neo4j/tx/commit");
        assert_eq!(g.permits.available_permits(), 4);
    }

    #[test]
    fn test_zero_connections_rejected() {
        assert!(Neo4jGraph::connect(settings(0)).is_err());
    }

    #[test]
    fn test_tx_response_rows() {
        let payload: TxResponse = serde_json::from_value(json!({
            "results": [{ "columns": ["g.name"], "data": [{ "row": ["TP53"] }, { "row": ["EGFR"] }] }],
            "errors": []
        }))
        .unwrap();
        let rows = payload.into_rows().unwrap();
        assert_eq!(rows, vec![vec![json!("TP53")], vec![json!("EGFR")]]);
    }

    #[test]
    fn test_tx_response_error_is_graph_unavailable() {
        let payload: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{ "code": "Neo.ClientError.Security.Unauthorized", "message": "bad creds" }]
        }))
        .unwrap();
        let err = payload.into_rows().unwrap_err();
        assert_eq!(err.kind(), "GraphUnavailableError");
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_unreachable_server_releases_permit() {
        let mut s = settings(1);
        s.url = "http://127.0.0.1:9".into();
        s.timeout = Duration::from_millis(200);
        let g = Neo4jGraph::connect(s).unwrap();
        let err = g.resolve(NodeKind::Gene, "TP53").await.unwrap_err();
        assert_eq!(err.kind(), "GraphUnavailableError");
        assert_eq!(g.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_mixed_case_gene_is_queried_case_insensitively() {
        let (url, received) = serve(vec![
            rows(vec![json!(["C9orf72"])]),
            rows(vec![json!(["Pathway", "Autophagy"]), json!(["Gene", "Tardbp"])]),
        ])
        .await;
        let g = graph_at(url).await;

        let gene = g.resolve(NodeKind::Gene, "c9orf72").await.unwrap();
        assert_eq!(gene, NodeRef::new(NodeKind::Gene, "C9ORF72"));
        let found = g
            .neighbors(&gene, &[Relation::ParticipatesGpPW, Relation::InteractsGiG])
            .await
            .unwrap();
        assert_eq!(
            found,
            BTreeSet::from([
                NodeRef::new(NodeKind::Pathway, "Autophagy"),
                NodeRef::new(NodeKind::Gene, "TARDBP"),
            ])
        );

        let bodies = received.lock().unwrap();
        assert!(statement(&bodies[0]).contains("toUpper(n.name) = $key"));
        assert_eq!(parameters(&bodies[0])["key"], "C9ORF72");
        assert!(statement(&bodies[1]).contains("WHERE toUpper(n.name) = $name"));
        assert!(statement(&bodies[1]).contains("[:PARTICIPATES_GpPW|INTERACTS_GiG]"));
        assert_eq!(parameters(&bodies[1])["name"], "C9ORF72");
    }

    #[tokio::test]
    async fn test_resolve_disease_by_name_or_alias() {
        let (url, received) = serve(vec![rows(vec![json!(["Liver cancer"])]), rows(vec![])]).await;
        let g = graph_at(url).await;

        let d = g.resolve(NodeKind::Disease, "Hepatocellular  CARCINOMA").await.unwrap();
        assert_eq!(d, NodeRef::new(NodeKind::Disease, "Liver cancer"));
        let err = g.resolve(NodeKind::Disease, "Atlantis fever").await.unwrap_err();
        assert_eq!(err.kind(), "UnresolvedEntityError");

        let bodies = received.lock().unwrap();
        let cypher = statement(&bodies[0]);
        assert!(cypher.starts_with("MATCH (n:Disease)"));
        assert!(cypher.contains("coalesce(n.aliases, [])"));
        assert_eq!(parameters(&bodies[0])["key"], "hepatocellular carcinoma");
        assert_eq!(parameters(&bodies[1])["key"], "atlantis fever");
    }

    #[tokio::test]
    async fn test_known_associations_returns_canonical_symbols() {
        let (url, received) = serve(vec![rows(vec![json!(["TP53"]), json!(["C9orf72"])])]).await;
        let g = graph_at(url).await;

        let disease = NodeRef::new(NodeKind::Disease, "Liver cancer");
        let known = g.known_associations(&disease).await.unwrap();
        let names: Vec<&str> = known.iter().map(GeneSymbol::as_str).collect();
        assert_eq!(names, vec!["C9ORF72", "TP53"]);

        let bodies = received.lock().unwrap();
        assert!(statement(&bodies[0]).contains("MATCH (d:Disease {name: $disease})"));
        assert!(statement(&bodies[0]).contains("[:ASSOCIATES_DaG]"));
        assert_eq!(parameters(&bodies[0])["disease"], "Liver cancer");
    }

    #[tokio::test]
    async fn test_native_shortest_paths_keep_nearest_hit() {
        let (url, received) = serve(vec![rows(vec![
            json!(["TP53", 2]),
            json!(["Mdm2", 1]),
            json!(["MDM2", 2]),
        ])])
        .await;
        let g = graph_at(url).await;

        let from = NodeRef::new(NodeKind::Gene, "STAMBP");
        let targets = BTreeSet::from([
            NodeRef::new(NodeKind::Gene, "TP53"),
            NodeRef::new(NodeKind::Gene, "MDM2"),
            from.clone(),
        ]);
        let found = g.shortest_path_lengths(&from, &targets, &Relation::InteractsGiG, 2).await.unwrap();
        assert_eq!(
            found,
            BTreeMap::from([
                (NodeRef::new(NodeKind::Gene, "MDM2"), 1),
                (NodeRef::new(NodeKind::Gene, "TP53"), 2),
            ])
        );

        let bodies = received.lock().unwrap();
        let cypher = statement(&bodies[0]);
        assert!(cypher.contains("toUpper(b.name) IN $targets"));
        assert!(cypher.contains("shortestPath((a)-[:INTERACTS_GiG*..2]-(b))"));
        assert_eq!(parameters(&bodies[0])["from"], "STAMBP");
        assert_eq!(parameters(&bodies[0])["targets"], json!(["MDM2", "TP53"]));
    }

    #[tokio::test]
    async fn test_shortest_paths_without_other_targets_skip_the_server() {
        let g = Neo4jGraph::connect(settings(1)).unwrap();
        let from = NodeRef::new(NodeKind::Gene, "TP53");
        let only_self = BTreeSet::from([from.clone()]);
        let found = g.shortest_path_lengths(&from, &only_self, &Relation::InteractsGiG, 2).await.unwrap();
        assert!(found.is_empty());
    }
}
