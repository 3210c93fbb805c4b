//! Integration tests for the complete deputados pipeline
//!
//! These tests exercise the crates together, without the network:
//! - API-shaped JSON → tabular store → CSV on disk
//! - CSV → validated records → RDF graph → N-Triples on disk
//! - N-Triples → graph store → queries
//!
//! Run with: cargo test --test integration_tests

use deputados_graph::ntriples;
use deputados_graph::ontology::{sparql_prefixes, EntityKind, Predicate};
use deputados_graph::{filter_subgraph, GraphBuilder, IdentityScheme, RdfLiteral, RdfObject};
use deputados_ingest::{fetch_all, FetchCompletion, RecordSource, RecordTable, SourceError};
use deputados_store::{CannedQuery, GraphStore, OxigraphStore, StoreConfig};
use serde_json::{json, Value};
use tempfile::tempdir;

fn api_row(id: u64, nome: &str, partido: &str, uf: &str, email: Value) -> Value {
    json!({
        "id": id,
        "uri": format!("https://dadosabertos.camara.leg.br/api/v2/deputados/{id}"),
        "nome": nome,
        "siglaPartido": partido,
        "uriPartido": format!("https://dadosabertos.camara.leg.br/api/v2/partidos/{partido}"),
        "siglaUf": uf,
        "idLegislatura": 57,
        "urlFoto": format!("https://www.camara.leg.br/internet/deputado/bandep/{id}.jpg"),
        "email": email,
    })
}

/// Two pages of rows, then the empty page that ends the listing.
struct TwoPages;

impl RecordSource for TwoPages {
    fn fetch_page(&self, page: u32) -> Result<Vec<Value>, SourceError> {
        Ok(match page {
            1 => vec![
                api_row(204445, "Fernando Mineiro", "PT", "RN", Value::Null),
                api_row(1, "Ana", "PT", "GO", json!("ana@camara.leg.br")),
            ],
            2 => vec![
                api_row(2, "Bruno", "PL", "GO", Value::Null),
                api_row(3, "Sem UF", "PL", "", Value::Null),
            ],
            _ => Vec::new(),
        })
    }
}

// ============================================================================
// Extract → CSV
// ============================================================================

#[test]
fn test_paginated_fetch_to_csv() {
    let dir = tempdir().expect("tempdir");
    let csv = dir.path().join("raw/deputados_legisl_57.csv");

    let outcome = fetch_all(&TwoPages, 10);
    assert_eq!(outcome.completion, FetchCompletion::Complete);
    assert_eq!(outcome.pages, 2);

    let table = RecordTable::from_json_rows(&outcome.rows).expect("table");
    table.write_csv(&csv).expect("write csv");

    let back = RecordTable::read_csv(&csv).expect("read csv");
    assert_eq!(back.len(), 4);
    assert_eq!(back.cell(0, "nome"), Some("Fernando Mineiro"));
    assert!(back.is_missing(3, "siglaUf"));
}

// ============================================================================
// CSV → graph → N-Triples
// ============================================================================

#[test]
fn test_csv_to_ntriples_round_trip() {
    let dir = tempdir().expect("tempdir");
    let csv = dir.path().join("raw/deputados_legisl_57.csv");
    let nt = dir.path().join("processed/deputados_legisl_57.nt");

    let table = RecordTable::from_json_rows(&fetch_all(&TwoPages, 10).rows).expect("table");
    table.write_csv(&csv).expect("write csv");

    let table = RecordTable::read_csv(&csv).expect("read csv");
    let built = GraphBuilder::default().build_rows(table.records());
    assert_eq!(built.report.records_seen, 4);
    assert_eq!(built.report.records_applied, 3);
    assert_eq!(built.report.skipped.len(), 1);
    assert_eq!(built.report.skipped[0].row, 4);
    assert_eq!(built.report.places, 2);
    assert_eq!(built.report.organizations, 2);

    ntriples::write_ntriples_file(&built.graph, &nt).expect("write nt");
    let back = ntriples::read_ntriples_file(&nt).expect("read nt");
    assert_eq!(back, built.graph);
}

#[test]
fn test_mineiro_subgraph_scenario() {
    let table = RecordTable::from_json_rows(&fetch_all(&TwoPages, 10).rows).expect("table");
    let built = GraphBuilder::default().build_rows(table.records());
    let scheme = IdentityScheme::default();
    let person = scheme.person(204445);

    let sub = filter_subgraph(&built.graph, &person);
    assert_eq!(sub.len(), 8);
    assert!(sub.objects(&person, Predicate::Email.iri()).next().is_none());

    let names: Vec<&RdfObject> = sub.objects(&person, Predicate::Name.iri()).collect();
    assert_eq!(names, vec![&RdfObject::Literal(RdfLiteral::string("Fernando Mineiro"))]);

    let regions: Vec<&RdfObject> = sub.objects(&person, Predicate::AddressRegion.iri()).collect();
    assert_eq!(regions, vec![&RdfObject::Node(scheme.place("RN"))]);

    assert!(filter_subgraph(&built.graph, &scheme.person(999)).is_empty());
}

// ============================================================================
// N-Triples → store → queries
// ============================================================================

#[test]
fn test_load_and_query_persistent_store() {
    let dir = tempdir().expect("tempdir");
    let nt = dir.path().join("processed/deputados_legisl_57.nt");
    let store_cfg = StoreConfig::at(dir.path().join("store"));

    let table = RecordTable::from_json_rows(&fetch_all(&TwoPages, 10).rows).expect("table");
    let graph = GraphBuilder::default().build_rows(table.records()).graph;
    ntriples::write_ntriples_file(&graph, &nt).expect("write nt");

    let loaded = ntriples::read_ntriples_file(&nt).expect("read nt");
    {
        let store = store_cfg.open().expect("open");
        let report = store.bulk_load(&loaded).expect("load");
        assert_eq!(report.inserted, graph.len());
    }

    let store = store_cfg.open().expect("reopen");
    let again = store.bulk_load(&loaded).expect("reload");
    assert_eq!(again.inserted, 0);
    assert_eq!(again.already_present, graph.len());
    assert_eq!(store.triple_count().expect("count"), graph.len());

    let go = store
        .query(&CannedQuery::PersonsByRegion("GO".into()).to_sparql(&IdentityScheme::default()))
        .expect("by region");
    assert_eq!(go.values("nome"), vec!["Ana", "Bruno"]);

    let places = store
        .query(&format!(
            "{}SELECT (COUNT(?uf) AS ?n) WHERE {{ ?uf a <{}> }}",
            sparql_prefixes(),
            EntityKind::Place.class_iri()
        ))
        .expect("count places");
    assert_eq!(places.values("n"), vec!["2"]);
}

#[test]
fn test_store_and_file_subgraphs_agree() {
    let table = RecordTable::from_json_rows(&fetch_all(&TwoPages, 10).rows).expect("table");
    let graph = GraphBuilder::default().build_rows(table.records()).graph;
    let store = OxigraphStore::in_memory().expect("store");
    store.bulk_load(&graph).expect("load");

    let ana = IdentityScheme::default().person(1);
    let from_store = store.subject_triples(&ana).expect("subject triples");
    assert_eq!(from_store, filter_subgraph(&graph, &ana));
    assert_eq!(from_store.len(), 9);
}
