use async_trait::async_trait;
use catalog::{Column, SchemaCatalog};
use controller::database::{Cursor, Database, ExecutionError};
use controller::request::Request;
use controller::worker::Worker;
use gateway::gateway::{
    start_test, FetchQuery, FetchRelation, GatewayError, GatewayRequest, SubmitQuery,
};
use model::principal::Principal;
use model::query::query_status::QueryStatus;
use model::row::RowData;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use store::QueryStore;
use validator::syntax::SyntaxValidator;
use validator::testing::{spawn_mock_translator, MockTranslationService};
use validator::translator::TranslatingValidator;
use validator::{ValidationError, Validator};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .without_time()
        .try_init();
}

/// Backing engine double answering every statement with a fixed cursor.
struct FixedDatabase {
    cursor: Cursor,
}

#[async_trait]
impl Database for FixedDatabase {
    async fn execute(&self, _sql: &str) -> Result<Cursor, ExecutionError> {
        Ok(self.cursor.clone())
    }
}

/// Backing engine double failing every statement.
struct FailingDatabase {
    message: String,
}

#[async_trait]
impl Database for FailingDatabase {
    async fn execute(&self, _sql: &str) -> Result<Cursor, ExecutionError> {
        Err(ExecutionError::new(self.message.clone()))
    }
}

struct TestGateway {
    sender: flume::Sender<GatewayRequest>,
    store: QueryStore,
}

impl TestGateway {
    async fn new(validator: Arc<dyn Validator>) -> Self {
        init_tracing();
        let (sender, store) = start_test(validator).await;
        Self { sender, store }
    }

    async fn send<P, R>(&self, payload: P) -> R
    where
        P: std::fmt::Debug,
        Request<P, R>: Into<GatewayRequest>,
    {
        let (rx, request) = Request::new(payload);
        self.sender
            .send_async(request.into())
            .await
            .expect("Gateway should be running");
        rx.await.expect("Gateway dropped the request")
    }

    /// Execute everything currently queued, the way the deployed worker
    /// would, against the given engine.
    async fn perform_all(&self, database: Arc<dyn Database>) {
        Worker::new(self.store.clone(), database)
            .drain()
            .await
            .expect("Draining the queue should succeed");
    }
}

fn user() -> Principal {
    Principal::new("user")
}

fn hr_user() -> Principal {
    Principal::new("user_hr").with_schema("HR")
}

fn result_cursor() -> Cursor {
    Cursor {
        columns: vec![
            ("x".to_string(), "VARCHAR".to_string()),
            ("y".to_string(), "INTEGER".to_string()),
            ("z".to_string(), "FLOAT".to_string()),
        ],
        rows: vec![RowData::new(vec![json!("a"), json!(10), json!(2.4)])],
    }
}

fn hr_catalog() -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog.insert_table(
        "hr",
        "emps",
        vec![
            Column::new("empid", "INTEGER"),
            Column::new("name", "VARCHAR"),
        ],
    );
    catalog.insert_table(
        "market",
        "bookings_ond",
        vec![Column::new("origin", "VARCHAR")],
    );
    catalog
}

#[tokio::test]
async fn enqueues_performs_and_serves_windowed_results() {
    let gw = TestGateway::new(Arc::new(SyntaxValidator::new())).await;

    assert_eq!(gw.store.queue().len(), 0);
    let summary = gw
        .send(SubmitQuery::new("select 1").by(user()))
        .await
        .unwrap();
    assert_eq!(gw.store.queue().len(), 1);
    assert_eq!(summary.href, format!("/queries/{}", summary.id));
    assert_eq!(summary.sql, "select 1");

    // Polling between enqueue and dequeue always sees `created`
    let view = gw
        .send(FetchQuery::new(summary.id).by(user()))
        .await
        .unwrap();
    assert_eq!(view.status, QueryStatus::Created);
    assert!(view.schema.is_none());
    assert!(view.rows.is_none());

    gw.perform_all(Arc::new(FixedDatabase {
        cursor: result_cursor(),
    }))
    .await;

    let view = gw
        .send(FetchQuery::new(summary.id).window(0, 100).by(user()))
        .await
        .unwrap();
    assert_eq!(view.status, QueryStatus::Finished);
    assert_eq!(view.quota, 100_000);
    assert_eq!(view.count, Some(1));

    let rendered = serde_json::to_value(&view).unwrap();
    assert_eq!(rendered["rows"], json!([["a", 10, 2.4]]));
    assert_eq!(
        rendered["schema"],
        json!([["x", "string"], ["y", "int"], ["z", "float"]])
    );
    assert!(rendered.get("message").is_none());
}

#[tokio::test]
async fn execution_errors_surface_through_fetch() {
    let gw = TestGateway::new(Arc::new(SyntaxValidator::new())).await;

    let summary = gw
        .send(SubmitQuery::new("select 1").by(user()))
        .await
        .unwrap();

    let view = gw
        .send(FetchQuery::new(summary.id).by(user()))
        .await
        .unwrap();
    assert_eq!(view.status, QueryStatus::Created);

    gw.perform_all(Arc::new(FailingDatabase {
        message: "It's not gonna work.".to_string(),
    }))
    .await;

    let view = gw
        .send(FetchQuery::new(summary.id).by(user()))
        .await
        .unwrap();
    assert_eq!(view.status, QueryStatus::Error);
    assert_eq!(view.message.as_deref(), Some("It's not gonna work."));
    assert!(view.schema.is_none());
    assert!(view.rows.is_none());
}

#[tokio::test]
async fn unauthenticated_submissions_are_rejected_up_front() {
    let gw = TestGateway::new(Arc::new(SyntaxValidator::new())).await;

    let result: Result<_, GatewayError> = gw
        .send(SubmitQuery::new(
            "select a from t1, (select b,c from d.t) t2",
        ))
        .await;
    assert!(matches!(result, Err(GatewayError::Unauthenticated)));
    assert_eq!(gw.store.queue().len(), 0);
}

#[tokio::test]
async fn relation_view_decomposes_finished_results() {
    let gw = TestGateway::new(Arc::new(SyntaxValidator::new())).await;

    let summary = gw
        .send(SubmitQuery::new("select 1").by(user()))
        .await
        .unwrap();
    gw.perform_all(Arc::new(FixedDatabase {
        cursor: result_cursor(),
    }))
    .await;

    let relation = gw
        .send(FetchRelation::new(summary.id).by(user()))
        .await
        .unwrap();

    assert_eq!(relation.id, summary.id);
    assert_eq!(relation.href, format!("/v2/queries/{}/relation", summary.id));
    assert_eq!(relation.sql, "select 1");
    assert_eq!(relation.heading, vec!["x", "y", "z"]);
    assert_eq!(
        relation.links.heading[0],
        format!("/v2/queries/{}/relation/heading/x", summary.id)
    );
    assert_eq!(
        relation.links.body,
        format!("/v2/queries/{}/relation/body", summary.id)
    );
}

#[tokio::test]
async fn translating_validator_stores_the_rewritten_statement() {
    let (addr, server) = spawn_mock_translator(MockTranslationService::default()).await;
    let validator = TranslatingValidator::new(addr.to_string(), hr_catalog());
    let gw = TestGateway::new(Arc::new(validator)).await;

    let summary = gw
        .send(SubmitQuery::new("select * from hr.emps").by(hr_user()))
        .await
        .unwrap();

    assert_eq!(summary.sql, "SELECT *\nFROM `HR`.`EMPS`");
    assert_eq!(gw.store.queue().len(), 1);

    // The stored statement is the translated one
    let stored = gw.store.find_query(summary.id).await.unwrap().unwrap();
    assert_eq!(stored.statement, "SELECT *\nFROM `HR`.`EMPS`");

    server.abort();
}

#[tokio::test]
async fn translation_rejections_report_their_details() {
    let (addr, server) = spawn_mock_translator(MockTranslationService::default()).await;
    let validator = TranslatingValidator::new(addr.to_string(), hr_catalog());
    let gw = TestGateway::new(Arc::new(validator)).await;

    let result = gw
        .send(SubmitQuery::new("select * from not_a_db.emps").by(hr_user()))
        .await;

    let Err(GatewayError::Invalid(error)) = result else {
        panic!("Expected a validation error");
    };
    assert_eq!(error.details(), vec!["Table 'NOT_A_DB.EMPS' not found"]);
    assert_eq!(gw.store.queue().len(), 0);

    server.abort();
}

#[tokio::test]
async fn hidden_and_nonexistent_tables_are_indistinguishable() {
    let (addr, server) = spawn_mock_translator(MockTranslationService::default()).await;
    let validator = TranslatingValidator::new(addr.to_string(), hr_catalog());
    let gw = TestGateway::new(Arc::new(validator)).await;

    // MARKET.BOOKINGS_OND exists but is not readable by this principal;
    // the detail must match the nonexistent-table template exactly.
    let result = gw
        .send(SubmitQuery::new("select * from MARKET.BOOKINGS_OND").by(hr_user()))
        .await;

    let Err(GatewayError::Invalid(error)) = result else {
        panic!("Expected a validation error");
    };
    assert_eq!(error.details(), vec!["Table 'MARKET.BOOKINGS_OND' not found"]);
    assert_eq!(gw.store.queue().len(), 0);

    server.abort();
}

#[tokio::test]
async fn slow_translation_never_accepts_the_query() {
    let (addr, server) =
        spawn_mock_translator(MockTranslationService::delayed(Duration::from_secs(30))).await;
    let validator = TranslatingValidator::new(addr.to_string(), hr_catalog())
        .with_timeout(Duration::from_millis(200));
    let gw = TestGateway::new(Arc::new(validator)).await;

    let result = gw
        .send(SubmitQuery::new("select * from hr.emps").by(hr_user()))
        .await;

    assert!(matches!(
        result,
        Err(GatewayError::Invalid(ValidationError::Timeout { .. }))
    ));
    assert_eq!(gw.store.queue().len(), 0);

    server.abort();
}
