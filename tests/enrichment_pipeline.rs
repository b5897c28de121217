//! Integration tests for the enrichment pipeline
//!
//! These tests drive the full orchestrator against a scripted transport:
//! no network, but the real query builders, resolver, caches, snapshot
//! store, and classifier.
//!
//! Run with: cargo test --test enrichment_pipeline

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use geo_enrich::error::{WdqsError, WdqsResult};
use geo_enrich::geo::builder::{REASON_NO_COORDINATES, REASON_NO_PLACES, REASON_PARENT_ONLY};
use geo_enrich::geo::types::{ActiveRange, CoordSource, Entity, GeoStatus, SourceRelation};
use geo_enrich::snapshot::FsSnapshotStore;
use geo_enrich::wdqs::client::{SparqlTransport, WdqsClient};
use geo_enrich::wdqs::retry::RetryPolicy;
use geo_enrich::wdqs::types::{Binding, BindingSet, BoundValue, SparqlResults};
use geo_enrich::{EnrichConfig, GeoEnrichmentService};

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct StatementSpec {
    prop: &'static str,
    place: &'static str,
    label: &'static str,
    qual_start: Option<&'static str>,
    qual_end: Option<&'static str>,
}

impl StatementSpec {
    fn plain(prop: &'static str, place: &'static str, label: &'static str) -> Self {
        Self {
            prop,
            place,
            label,
            qual_start: None,
            qual_end: None,
        }
    }
}

/// Answers the three query shapes from an in-memory world. Which shape a
/// query is gets decided from the SELECT clause, the same way the real
/// endpoint would see it.
struct MockWdqs {
    statements: HashMap<&'static str, Vec<StatementSpec>>,
    coords: HashMap<&'static str, &'static str>,
    parents: HashMap<&'static str, Vec<&'static str>>,
    query_log: Mutex<Vec<&'static str>>,
}

fn uri(qid: &str) -> String {
    format!("http://www.wikidata.org/entity/{qid}")
}

fn bound_uri(qid: &str) -> BoundValue {
    BoundValue::literal(uri(qid))
}

impl MockWdqs {
    fn requested_qids(sparql: &str) -> Vec<String> {
        let re = Regex::new(r"wd:(Q[0-9]+)").expect("pattern");
        re.captures_iter(sparql)
            .map(|c| c[1].to_string())
            .collect()
    }

    fn people_bindings(&self, requested: &[String]) -> Vec<Binding> {
        let mut bindings = Vec::new();
        for qid in requested {
            let Some(specs) = self.statements.get(qid.as_str()) else {
                continue;
            };
            for spec in specs {
                let mut row = Binding::new();
                row.insert("person".to_string(), bound_uri(qid));
                row.insert("prop".to_string(), BoundValue::literal(spec.prop));
                row.insert("place".to_string(), bound_uri(spec.place));
                row.insert("placeLabel".to_string(), BoundValue::literal(spec.label));
                if let Some(start) = spec.qual_start {
                    row.insert("startTime".to_string(), BoundValue::literal(start));
                }
                if let Some(end) = spec.qual_end {
                    row.insert("endTime".to_string(), BoundValue::literal(end));
                }
                if let Some(wkt) = self.coords.get(spec.place) {
                    row.insert("coord".to_string(), BoundValue::literal(*wkt));
                }
                bindings.push(row);
            }
        }
        bindings
    }

    fn coord_bindings(&self, requested: &[String]) -> Vec<Binding> {
        requested
            .iter()
            .map(|qid| {
                let mut row = Binding::new();
                row.insert("place".to_string(), bound_uri(qid));
                if let Some(wkt) = self.coords.get(qid.as_str()) {
                    row.insert("coord".to_string(), BoundValue::literal(*wkt));
                }
                row
            })
            .collect()
    }

    fn parent_bindings(&self, requested: &[String]) -> Vec<Binding> {
        let mut bindings = Vec::new();
        for qid in requested {
            match self.parents.get(qid.as_str()) {
                Some(parents) => {
                    for parent in parents {
                        let mut row = Binding::new();
                        row.insert("place".to_string(), bound_uri(qid));
                        row.insert("parent".to_string(), bound_uri(parent));
                        bindings.push(row);
                    }
                }
                None => {
                    // OPTIONAL clause: a place without parents still
                    // produces a row with only ?place bound.
                    let mut row = Binding::new();
                    row.insert("place".to_string(), bound_uri(qid));
                    bindings.push(row);
                }
            }
        }
        bindings
    }
}

#[async_trait]
impl SparqlTransport for MockWdqs {
    async fn execute(&self, sparql: &str) -> WdqsResult<SparqlResults> {
        let requested = Self::requested_qids(sparql);
        let (kind, bindings) = if sparql.contains("?prop") {
            ("people", self.people_bindings(&requested))
        } else if sparql.contains("?parent") {
            ("parents", self.parent_bindings(&requested))
        } else {
            ("coords", self.coord_bindings(&requested))
        };
        self.query_log.lock().unwrap().push(kind);
        Ok(SparqlResults {
            results: BindingSet { bindings },
        })
    }
}

/// Shareable handle over a [`MockWdqs`]: one clone goes into the service as
/// the transport while the caller keeps another to inspect `query_log`.
/// A local newtype is required because the orphan rule forbids implementing
/// the library's `SparqlTransport` trait directly for `std::sync::Arc`.
#[derive(Clone)]
struct SharedMock(std::sync::Arc<MockWdqs>);

#[async_trait]
impl SparqlTransport for SharedMock {
    async fn execute(&self, sparql: &str) -> WdqsResult<SparqlResults> {
        self.0.as_ref().execute(sparql).await
    }
}

/// Transport that refuses every call; used to prove snapshot resumption
/// needs no network.
struct OfflineTransport;

#[async_trait]
impl SparqlTransport for OfflineTransport {
    async fn execute(&self, _sparql: &str) -> WdqsResult<SparqlResults> {
        Err(WdqsError::Status {
            status: 500,
            body_prefix: "offline".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// World and harness
// ---------------------------------------------------------------------------

const HALICARNASSUS_WKT: &str = "Point(27.4241 37.038)";
const KNIDOS_PARENT_WKT: &str = "Point(28.0 36.7)";
const FIRST_PARENT_WKT: &str = "Point(1.0 10.0)";
const SECOND_PARENT_WKT: &str = "Point(2.0 20.0)";

/// The standard test world:
/// - Q1000 has a birthplace with a direct coordinate
/// - Q1001 has a work location whose sole parent (1 hop) has a coordinate
/// - Q1002 has no statements at all
/// - Q1003 has a residence whose parent chain carries no coordinate within
///   reach (coordinate sits four links up)
/// - Q1004 repeats the same birthplace row twice
/// - Q1006 mixes an exact birthplace with a parent-resolved work location
/// - Q1007 has a residence inside a parent cycle with no coordinates
/// - Q1008 has a work location with two coordinate-bearing parents
fn world() -> MockWdqs {
    let mut statements: HashMap<&'static str, Vec<StatementSpec>> = HashMap::new();
    statements.insert(
        "Q1000",
        vec![StatementSpec::plain("P19", "Q5000", "Halicarnassus")],
    );
    statements.insert(
        "Q1001",
        vec![StatementSpec {
            prop: "P937",
            place: "Q5001",
            label: "Cnidus",
            qual_start: Some("-0380-01-01T00:00:00Z"),
            qual_end: None,
        }],
    );
    statements.insert(
        "Q1003",
        vec![StatementSpec::plain("P551", "Q5003", "Lost Village")],
    );
    statements.insert(
        "Q1004",
        vec![
            StatementSpec::plain("P19", "Q5000", "Halicarnassus"),
            StatementSpec::plain("P19", "Q5000", "Halicarnassus"),
        ],
    );
    statements.insert(
        "Q1006",
        vec![
            StatementSpec::plain("P937", "Q5001", "Cnidus"),
            StatementSpec::plain("P19", "Q5000", "Halicarnassus"),
        ],
    );
    statements.insert(
        "Q1007",
        vec![StatementSpec::plain("P551", "Q6000", "Loopville")],
    );
    statements.insert(
        "Q1008",
        vec![StatementSpec::plain("P937", "Q7000", "Twin Forks")],
    );

    let mut coords: HashMap<&'static str, &'static str> = HashMap::new();
    coords.insert("Q5000", HALICARNASSUS_WKT);
    coords.insert("Q5002", KNIDOS_PARENT_WKT);
    coords.insert("Q5007", "Point(3.0 30.0)");
    coords.insert("Q7001", FIRST_PARENT_WKT);
    coords.insert("Q7002", SECOND_PARENT_WKT);

    let mut parents: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    parents.insert("Q5001", vec!["Q5002"]);
    parents.insert("Q5003", vec!["Q5004"]);
    parents.insert("Q5004", vec!["Q5005"]);
    parents.insert("Q5005", vec!["Q5006"]);
    parents.insert("Q5006", vec!["Q5007"]);
    parents.insert("Q6000", vec!["Q6001"]);
    parents.insert("Q6001", vec!["Q6000"]);
    parents.insert("Q7000", vec!["Q7001", "Q7002"]);

    MockWdqs {
        statements,
        coords,
        parents,
        query_log: Mutex::new(Vec::new()),
    }
}

fn entity(id: &str, name: &str) -> Entity {
    Entity {
        id: id.to_string(),
        name: name.to_string(),
        external_reference_url: None,
        active_range: ActiveRange::default(),
    }
}

fn test_config(cache_dir: &Path) -> EnrichConfig {
    EnrichConfig {
        call_delay: Duration::from_millis(1),
        cache_dir: cache_dir.to_path_buf(),
        ..EnrichConfig::default()
    }
}

fn service(transport: Box<dyn SparqlTransport>, config: EnrichConfig) -> GeoEnrichmentService {
    let client = WdqsClient::new(
        transport,
        RetryPolicy::new(config.max_retries, config.call_delay),
        config.call_delay,
    );
    let snapshots = FsSnapshotStore::new(&config.cache_dir).expect("snapshot store");
    GeoEnrichmentService::new(client, Box::new(snapshots), config)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_direct_birthplace_coordinate_is_ok() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1000", "Herodotus")])
        .await
        .expect("run");

    let record = &records["Q1000"];
    assert_eq!(record.geo_status, GeoStatus::Ok);
    assert!(!record.needs_manual_lookup);
    assert_eq!(record.unknown_reason, None);
    assert_eq!(record.locations.len(), 1);

    let loc = &record.locations[0];
    assert_eq!(loc.source_relation, SourceRelation::BirthPlace);
    assert_eq!(loc.coord_source, CoordSource::Exact);
    assert_eq!(loc.parent_hops, 0);
    // WKT is lon-first; the record must come out lat-first.
    let coord = loc.coord.expect("coordinate");
    assert_eq!(coord.lat, 37.038);
    assert_eq!(coord.lon, 27.4241);
}

#[tokio::test]
async fn test_parent_fallback_resolves_one_hop_and_needs_review() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1001", "Eudoxus")])
        .await
        .expect("run");

    let record = &records["Q1001"];
    assert_eq!(record.geo_status, GeoStatus::NeedsReview);
    assert!(!record.needs_manual_lookup);
    assert_eq!(record.unknown_reason.as_deref(), Some(REASON_PARENT_ONLY));

    let loc = &record.locations[0];
    assert_eq!(loc.source_relation, SourceRelation::WorkLocation);
    assert_eq!(loc.coord_source, CoordSource::ViaParent);
    assert_eq!(loc.parent_hops, 1);
    assert!(loc.time.has_qualifiers);
    let coord = loc.coord.expect("coordinate");
    assert_eq!(coord.lat, 36.7);
    assert_eq!(coord.lon, 28.0);
}

#[tokio::test]
async fn test_entity_without_statements_is_missing_wikidata_location() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1002", "Anonymus")])
        .await
        .expect("run");

    let record = &records["Q1002"];
    assert_eq!(record.geo_status, GeoStatus::MissingWikidataLocation);
    assert!(record.needs_manual_lookup);
    assert!(record.locations.is_empty());
    assert_eq!(record.unknown_reason.as_deref(), Some(REASON_NO_PLACES));
}

#[tokio::test]
async fn test_coordinate_beyond_hop_budget_stays_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1003", "Pseudo-Nobody")])
        .await
        .expect("run");

    let record = &records["Q1003"];
    assert_eq!(record.geo_status, GeoStatus::MissingCoordinates);
    assert!(record.needs_manual_lookup);
    assert_eq!(record.unknown_reason.as_deref(), Some(REASON_NO_COORDINATES));

    let loc = &record.locations[0];
    assert_eq!(loc.coord_source, CoordSource::Missing);
    assert_eq!(loc.coord, None);
    // Hop-bound termination: nothing may claim more hops than configured.
    assert!(loc.parent_hops <= 3);
}

#[tokio::test]
async fn test_identical_rows_collapse_to_one_statement() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1004", "Doubled")])
        .await
        .expect("run");

    let record = &records["Q1004"];
    assert_eq!(record.locations.len(), 1);
    assert_eq!(record.geo_status, GeoStatus::Ok);
}

#[tokio::test]
async fn test_one_exact_coordinate_outranks_parent_fallbacks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1006", "Mixed Sources")])
        .await
        .expect("run");

    let record = &records["Q1006"];
    assert_eq!(record.geo_status, GeoStatus::Ok);
    let sources: Vec<CoordSource> = record.locations.iter().map(|l| l.coord_source).collect();
    assert!(sources.contains(&CoordSource::ViaParent));
    assert!(sources.contains(&CoordSource::Exact));
}

#[tokio::test]
async fn test_parent_cycle_terminates_with_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1007", "Looped")])
        .await
        .expect("run");

    let record = &records["Q1007"];
    assert_eq!(record.geo_status, GeoStatus::MissingCoordinates);
    assert_eq!(record.locations[0].coord_source, CoordSource::Missing);
}

#[tokio::test]
async fn test_first_returned_parent_wins_tiebreak() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let records = service
        .run(&[entity("Q1008", "Contested")])
        .await
        .expect("run");

    let coord = records["Q1008"].locations[0].coord.expect("coordinate");
    // Both parents carry coordinates; the first returned row decides.
    assert_eq!(coord.lat, 10.0);
    assert_eq!(coord.lon, 1.0);
}

#[tokio::test]
async fn test_hop_budget_zero_issues_no_parent_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mock = std::sync::Arc::new(world());
    let config = EnrichConfig {
        max_parent_hops: 0,
        ..test_config(dir.path())
    };
    let service = service(Box::new(SharedMock(mock.clone())), config);

    let records = service
        .run(&[entity("Q1001", "Eudoxus")])
        .await
        .expect("run");

    assert_eq!(records["Q1001"].geo_status, GeoStatus::MissingCoordinates);
    assert_eq!(records["Q1001"].locations[0].coord_source, CoordSource::Missing);
    let log = mock.query_log.lock().unwrap();
    assert!(!log.contains(&"parents"), "no parent queries with a zero hop budget");
}

// ---------------------------------------------------------------------------
// Pipeline-wide properties
// ---------------------------------------------------------------------------

fn all_entities() -> Vec<Entity> {
    vec![
        entity("Q1000", "Herodotus"),
        entity("Q1001", "Eudoxus"),
        entity("Q1002", "Anonymus"),
        entity("Q1003", "Pseudo-Nobody"),
        entity("Q1004", "Doubled"),
        entity("not-a-qid", "Badly Keyed"),
        entity("Q1006", "Mixed Sources"),
        entity("Q1007", "Looped"),
        entity("Q1008", "Contested"),
    ]
}

#[tokio::test]
async fn test_every_input_entity_yields_exactly_one_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(world()), test_config(dir.path()));

    let entities = all_entities();
    let records = service.run(&entities).await.expect("run");

    assert_eq!(records.len(), entities.len());
    for entity in &entities {
        assert!(records.contains_key(&entity.id), "missing {}", entity.id);
    }

    // An unqueryable id still gets a record, classified as unlocated.
    assert_eq!(
        records["not-a-qid"].geo_status,
        GeoStatus::MissingWikidataLocation
    );

    // Dedup invariant holds for every record.
    for record in records.values() {
        let mut keys = HashSet::new();
        for loc in &record.locations {
            assert!(
                keys.insert((
                    loc.source_relation,
                    loc.place_qid.clone(),
                    loc.time.start.clone(),
                    loc.time.end.clone()
                )),
                "duplicate statement in {}",
                record.id
            );
        }
    }
}

#[tokio::test]
async fn test_warm_cache_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entities = all_entities();

    let first = service(Box::new(world()), test_config(dir.path()))
        .run(&entities)
        .await
        .expect("cold run");
    let second = service(Box::new(world()), test_config(dir.path()))
        .run(&entities)
        .await
        .expect("warm run");

    let first_json = serde_json::to_string_pretty(&first).expect("serialize");
    let second_json = serde_json::to_string_pretty(&second).expect("serialize");
    assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn test_resume_from_snapshots_needs_no_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Entities whose places all carry direct coordinates: the resumed run
    // needs only the snapshotted people query, no resolver traffic.
    let entities = vec![entity("Q1000", "Herodotus"), entity("Q1004", "Doubled")];

    let first = service(Box::new(world()), test_config(dir.path()))
        .run(&entities)
        .await
        .expect("cold run");

    let second = service(Box::new(OfflineTransport), test_config(dir.path()))
        .run(&entities)
        .await
        .expect("resumed run must not touch the network");

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fatal_query_error_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(Box::new(OfflineTransport), test_config(dir.path()));

    let err = service
        .run(&[entity("Q1000", "Herodotus")])
        .await
        .expect_err("offline run must fail");
    // The failing batch index is part of the error chain.
    assert!(format!("{err:#}").contains("batch 0"));
}
