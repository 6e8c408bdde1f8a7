use async_trait::async_trait;
use peticiao_facets::{
    AvailableOptions, CLASS_TABLE, COMPETENCY_TABLE, Completed, Dimension, DimensionValue,
    FacetEngine, FacetSession, LOCALITY_FIELD, OptionsStatus, RELATION_TABLE, Recompute,
    RelationTuple, Resolution, SUBJECT_TABLE, Selection, Transition,
};
use peticiao_store::{
    FetchLimits, Fetcher, Filter, MemoryStore, Query, QueryResponse, Row, StoreError,
    TabularStore,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const LOCALITY: &str = "L1";

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn detail(dimension: Dimension, locality: &str, code: &str, name: Value, usage: u64) -> Row {
    let table = dimension.table();
    let mut out = Row::new();
    out.insert(LOCALITY_FIELD.to_string(), json!(locality));
    out.insert(table.code_field.to_string(), json!(code));
    out.insert(table.name_field.to_string(), name);
    out.insert(table.usage_field.to_string(), json!(usage));
    out
}

fn tuples() -> Vec<RelationTuple> {
    vec![
        RelationTuple::new("CIV01", "CL1", "AS1"),
        RelationTuple::new("CIV01", "CL2", "AS1"),
        RelationTuple::new("CRIM02", "CL1", "AS2"),
    ]
}

fn fixture() -> MemoryStore {
    let mut relations: Vec<Row> = tuples()
        .iter()
        .map(|t| {
            row(json!({
                "codigo_localidade": LOCALITY,
                "codigo_competencia": t.competency_code,
                "codigo_classe": t.class_code,
                "codigo_assunto": t.subject_code,
            }))
        })
        .collect();
    // other locality must never leak into L1 results
    relations.push(row(json!({
        "codigo_localidade": "L2",
        "codigo_competencia": "CIV01",
        "codigo_classe": "CL9",
        "codigo_assunto": "AS9",
    })));

    let competencies = vec![
        detail(Dimension::Competency, LOCALITY, "CIV01", json!("Cível"), 2),
        detail(Dimension::Competency, LOCALITY, "CRIM02", json!("Criminal"), 1),
        detail(Dimension::Competency, "L2", "CIV01", json!("Cível"), 1),
    ];
    let classes = vec![
        detail(Dimension::Class, LOCALITY, "CL1", json!("Procedimento Comum"), 2),
        detail(Dimension::Class, LOCALITY, "CL2", Value::Null, 1),
        detail(Dimension::Class, "L2", "CL9", json!("Outra"), 1),
    ];
    let subjects = vec![
        detail(Dimension::Subject, LOCALITY, "AS1", json!("Alimentos"), 5),
        detail(Dimension::Subject, LOCALITY, "AS2", json!("Furto"), 3),
        detail(Dimension::Subject, "L2", "AS9", json!("Outro"), 1),
    ];

    MemoryStore::new()
        .with_table(RELATION_TABLE, relations)
        .with_table(COMPETENCY_TABLE.table, competencies)
        .with_table(CLASS_TABLE.table, classes)
        .with_table(SUBJECT_TABLE.table, subjects)
}

fn engine(store: Arc<dyn TabularStore>) -> FacetEngine {
    FacetEngine::new(Fetcher::new(store), Some(LOCALITY.to_string()))
}

fn value(dimension: Dimension, code: &str) -> DimensionValue {
    DimensionValue::new(dimension, code, None, 0)
}

fn codes(options: &AvailableOptions, dimension: Dimension) -> Vec<String> {
    options
        .get(dimension)
        .iter()
        .map(|v| v.code.clone())
        .collect()
}

async fn settled_options(
    session: &mut FacetSession,
    engine: &FacetEngine,
    transition: Transition,
) -> Arc<AvailableOptions> {
    assert_eq!(session.settle(engine, transition).await, Resolution::Applied);
    session.state().options.clone()
}

#[tokio::test]
async fn catalog_is_scoped_and_sorted() {
    let engine = engine(Arc::new(fixture()));
    let catalog = engine.load_catalog().await.expect("catalog should load");

    assert_eq!(codes(&catalog, Dimension::Competency), vec!["CIV01", "CRIM02"]);
    // "Classe CL2" sorts before "Procedimento Comum"
    assert_eq!(codes(&catalog, Dimension::Class), vec!["CL2", "CL1"]);
    assert_eq!(catalog.classes[0].display_name, "Classe CL2");
    assert_eq!(codes(&catalog, Dimension::Subject), vec!["AS1", "AS2"]);
    assert_eq!(catalog.subjects[0].usage_count, 5);
}

#[tokio::test]
async fn single_competency_narrows_the_other_dimensions() {
    let engine = engine(Arc::new(fixture()));
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");
    let catalog = session.catalog().clone();

    let transition = session.select(Dimension::Competency, value(Dimension::Competency, "CIV01"));
    let options = settled_options(&mut session, &engine, transition).await;

    let classes: BTreeSet<String> = codes(&options, Dimension::Class).into_iter().collect();
    assert_eq!(classes, BTreeSet::from(["CL1".to_string(), "CL2".to_string()]));
    assert_eq!(codes(&options, Dimension::Subject), vec!["AS1"]);
    assert_eq!(options.competencies, catalog.competencies);
    assert_eq!(session.state().status(), OptionsStatus::Ready);
}

#[tokio::test]
async fn impossible_combination_empties_every_dimension() {
    let engine = engine(Arc::new(fixture()));
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");

    let t = session.select(Dimension::Competency, value(Dimension::Competency, "CRIM02"));
    settled_options(&mut session, &engine, t).await;
    let t = session.select(Dimension::Class, value(Dimension::Class, "CL2"));
    let options = settled_options(&mut session, &engine, t).await;

    assert!(options.is_empty());
    assert_eq!(session.state().status(), OptionsStatus::NoValidCombination);
    assert!(session.state().error.is_none());
}

#[tokio::test]
async fn single_selection_without_tuples_is_no_valid_combination() {
    // FAM03 is in the catalog but has no relation tuple
    let competencies = vec![
        detail(Dimension::Competency, LOCALITY, "CIV01", json!("Cível"), 2),
        detail(Dimension::Competency, LOCALITY, "CRIM02", json!("Criminal"), 1),
        detail(Dimension::Competency, LOCALITY, "FAM03", json!("Família"), 0),
    ];
    let engine = engine(Arc::new(
        fixture().with_table(COMPETENCY_TABLE.table, competencies),
    ));
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");
    assert_eq!(session.catalog().competencies.len(), 3);

    let t = session.select(Dimension::Competency, value(Dimension::Competency, "FAM03"));
    let options = settled_options(&mut session, &engine, t).await;

    assert!(options.is_empty());
    assert_eq!(session.state().status(), OptionsStatus::NoValidCombination);
    assert!(session.state().error.is_none());
}

#[tokio::test]
async fn valid_pair_echoes_selected_values() {
    let engine = engine(Arc::new(fixture()));
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");

    let t = session.select(Dimension::Class, value(Dimension::Class, "CL1"));
    settled_options(&mut session, &engine, t).await;
    let t = session.select(Dimension::Subject, value(Dimension::Subject, "AS2"));
    let options = settled_options(&mut session, &engine, t).await;

    assert_eq!(codes(&options, Dimension::Competency), vec!["CRIM02"]);
    assert_eq!(codes(&options, Dimension::Class), vec!["CL1"]);
    assert_eq!(codes(&options, Dimension::Subject), vec!["AS2"]);
}

#[tokio::test]
async fn every_offered_value_co_occurs_with_the_selection() {
    let engine = engine(Arc::new(fixture()));
    let catalog = engine.load_catalog().await.expect("catalog should load");
    let fixture_tuples = tuples();

    let choices = |dimension: Dimension| -> Vec<Option<DimensionValue>> {
        let mut out = vec![None];
        out.extend(catalog.get(dimension).iter().cloned().map(Some));
        out
    };

    for competency in choices(Dimension::Competency) {
        for class in choices(Dimension::Class) {
            for subject in choices(Dimension::Subject) {
                let selection = Selection {
                    competency: competency.clone(),
                    class: class.clone(),
                    subject: subject.clone(),
                };
                if selection.is_empty() {
                    continue;
                }
                let options = engine
                    .available_options(&selection, &catalog)
                    .await
                    .expect("options should resolve");

                for dimension in Dimension::ALL {
                    if selection.get(dimension).is_some() {
                        continue;
                    }
                    for offered in options.get(dimension) {
                        let witnessed = fixture_tuples.iter().any(|t| {
                            t.matches(&selection) && t.code(dimension) == offered.code
                        });
                        assert!(
                            witnessed,
                            "{dimension} {} offered without a tuple for {selection:?}",
                            offered.code
                        );
                    }
                }
            }
        }
    }
}

#[tokio::test]
async fn clear_all_restores_the_loaded_catalog() {
    let store = Arc::new(fixture());
    let engine = engine(store.clone());
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");
    let catalog = session.catalog().clone();

    let t = session.select(Dimension::Subject, value(Dimension::Subject, "AS1"));
    settled_options(&mut session, &engine, t).await;
    let t = session.select(Dimension::Class, value(Dimension::Class, "CL2"));
    settled_options(&mut session, &engine, t).await;

    store.clear_requests();
    assert!(matches!(session.clear_all(), Transition::Settled));
    assert_eq!(*session.state().options, catalog);
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn repeated_select_issues_no_new_requests() {
    let store = Arc::new(fixture());
    let engine = engine(store.clone());
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");

    let t = session.select(Dimension::Class, value(Dimension::Class, "CL1"));
    settled_options(&mut session, &engine, t).await;
    let once = session.snapshot();
    let requests = store.requests().len();

    let t = session.select(Dimension::Class, value(Dimension::Class, "CL1"));
    assert!(matches!(t, Transition::Unchanged));
    settled_options(&mut session, &engine, t).await;

    assert_eq!(session.snapshot(), once);
    assert_eq!(store.requests().len(), requests);
}

#[tokio::test]
async fn failed_detail_lookup_fails_the_whole_recomputation() {
    let store = Arc::new(fixture().fail_table_after(SUBJECT_TABLE.table, 1));
    let engine = engine(store);
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("catalog load uses the one allowed subject request");
    let catalog = session.catalog().clone();

    let t = session.select(Dimension::Competency, value(Dimension::Competency, "CIV01"));
    let options = settled_options(&mut session, &engine, t).await;

    let state = session.state();
    assert_eq!(state.status(), OptionsStatus::Failed);
    let error = state.error.as_ref().expect("error should be recorded");
    assert_eq!(error.table, SUBJECT_TABLE.table);
    assert!(matches!(error.source, StoreError::Unavailable { .. }));
    assert_eq!(*options, catalog);
}

#[tokio::test]
async fn relation_table_is_read_past_the_page_cap() {
    let relations: Vec<Row> = (0..2500)
        .map(|i| {
            row(json!({
                "codigo_localidade": LOCALITY,
                "codigo_competencia": "CIV01",
                "codigo_classe": format!("CL{i}"),
                "codigo_assunto": "AS1",
            }))
        })
        .collect();
    let classes: Vec<Row> = (0..2500)
        .map(|i| {
            let mut out = Row::new();
            out.insert(LOCALITY_FIELD.to_string(), json!(LOCALITY));
            out.insert(CLASS_TABLE.code_field.to_string(), json!(format!("CL{i}")));
            out
        })
        .collect();
    let store = Arc::new(
        MemoryStore::new()
            .with_table(RELATION_TABLE, relations)
            .with_table(CLASS_TABLE.table, classes),
    );
    let engine = FacetEngine::new(
        Fetcher::with_limits(store.clone(), FetchLimits::default()),
        Some(LOCALITY.to_string()),
    );

    let selection = Selection::default()
        .with(Dimension::Competency, Some(value(Dimension::Competency, "CIV01")));
    let keys = engine
        .resolve_related_keys(&selection)
        .await
        .expect("keys should resolve");
    assert_eq!(keys.class_codes.len(), 2500);
    assert_eq!(store.request_count(RELATION_TABLE), 3);
    for request in store.requests() {
        let order: Vec<&str> = request.order.iter().map(|o| o.field.as_str()).collect();
        assert_eq!(order, ["codigo_competencia", "codigo_classe", "codigo_assunto"]);
    }

    let options = engine
        .resolve_options(&keys)
        .await
        .expect("options should resolve");
    assert_eq!(options.classes.len(), 2500);
    assert_eq!(store.request_count(CLASS_TABLE.table), 25);
}

/// Delays relation queries filtered on one class code.
struct SlowClassStore {
    inner: MemoryStore,
    slow_class: &'static str,
}

#[async_trait]
impl TabularStore for SlowClassStore {
    async fn execute(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        let slow = query.table == RELATION_TABLE
            && query.filters.iter().any(|f| {
                matches!(f, Filter::Eq { field, value }
                    if field == "codigo_classe" && value == self.slow_class)
            });
        if slow {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.execute(query).await
    }
}

#[tokio::test]
async fn last_issued_selection_wins_over_a_slower_earlier_one() {
    let store = Arc::new(SlowClassStore {
        inner: fixture(),
        slow_class: "CL1",
    });
    let engine = engine(store);
    let mut session = FacetSession::initialize(&engine)
        .await
        .expect("session should initialize");

    let first = match session.select(Dimension::Class, value(Dimension::Class, "CL1")) {
        Transition::Pending(ticket) => ticket,
        other => panic!("expected pending, got {other:?}"),
    };
    assert_eq!(first.selection().code(Dimension::Class), Some("CL1"));
    let second = match session.select(Dimension::Class, value(Dimension::Class, "CL2")) {
        Transition::Pending(ticket) => ticket,
        other => panic!("expected pending, got {other:?}"),
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Completed>();
    let run = |ticket: Recompute| {
        let tx = tx.clone();
        let engine = engine.clone();
        async move {
            let _ = tx.send(ticket.run(&engine).await);
        }
    };
    tokio::join!(run(first), run(second));
    drop(tx);

    let mut resolutions = Vec::new();
    while let Some(done) = rx.recv().await {
        resolutions.push((done.generation, session.complete(done)));
    }
    // CL2 arrives first and applies; the slow CL1 answer is dropped
    assert_eq!(resolutions, vec![(2, Resolution::Applied), (1, Resolution::Stale)]);

    let state = session.state();
    assert_eq!(state.selection.code(Dimension::Class), Some("CL2"));
    assert_eq!(codes(&state.options, Dimension::Competency), vec!["CIV01"]);
    assert_eq!(codes(&state.options, Dimension::Subject), vec!["AS1"]);
    assert!(!state.loading);
}
