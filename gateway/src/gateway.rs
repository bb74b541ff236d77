use crate::request_handler::RequestHandler;
use crate::views::{QueryView, RelationView};
use controller::database::Database;
use controller::into_request;
use controller::request::Request;
use controller::worker::Worker;
use model::principal::Principal;
use model::query::QueryId;
use serde::Serialize;
use std::sync::Arc;
use store::{QueryStore, QueryStoreError, State, StateBackend};
use thiserror::Error;
use tracing::{info, info_span, Instrument};
use validator::{ValidationError, Validator};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Query '{0}' not found")]
    NotFound(QueryId),

    #[error(transparent)]
    Store(#[from] QueryStoreError),
}

/// A freshly accepted submission: the id, the resource location and the
/// statement that will actually run (the validator may have rewritten it).
#[derive(Debug, Clone, Serialize)]
pub struct QuerySummary {
    pub id: QueryId,
    pub href: String,
    pub sql: String,
}

#[derive(Clone, Debug)]
pub struct SubmitQuery {
    pub sql: String,
    pub principal: Option<Principal>,
}

impl SubmitQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            principal: None,
        }
    }

    pub fn by(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }
}

#[derive(Clone, Debug)]
pub struct FetchQuery {
    pub id: QueryId,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub principal: Option<Principal>,
}

impl FetchQuery {
    pub fn new(id: QueryId) -> Self {
        Self {
            id,
            offset: None,
            limit: None,
            principal: None,
        }
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn by(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }
}

#[derive(Clone, Debug)]
pub struct FetchRelation {
    pub id: QueryId,
    pub principal: Option<Principal>,
}

impl FetchRelation {
    pub fn new(id: QueryId) -> Self {
        Self {
            id,
            principal: None,
        }
    }

    pub fn by(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }
}

pub type SubmitQueryRequest = Request<SubmitQuery, Result<QuerySummary, GatewayError>>;
pub type FetchQueryRequest = Request<FetchQuery, Result<QueryView, GatewayError>>;
pub type FetchRelationRequest = Request<FetchRelation, Result<RelationView, GatewayError>>;

#[derive(Debug)]
pub enum GatewayRequest {
    SubmitQuery(SubmitQueryRequest),
    FetchQuery(FetchQueryRequest),
    FetchRelation(FetchRelationRequest),
}

into_request!(SubmitQuery, SubmitQueryRequest, GatewayRequest);
into_request!(FetchQuery, FetchQueryRequest, GatewayRequest);
into_request!(FetchRelation, FetchRelationRequest, GatewayRequest);

const DEFAULT_CAPACITY: usize = 16;

/// Start the gateway on its own runtime thread: one request handler for the
/// submission/fetch paths and one worker draining the queue. The returned
/// sender is the process-wide entry point; validator and database are
/// injected here once instead of living in ambient config.
pub fn start(
    backend: StateBackend,
    validator: Arc<dyn Validator>,
    database: Arc<dyn Database>,
    capacity: Option<usize>,
) -> flume::Sender<GatewayRequest> {
    info!("Starting");
    let (handle, receiver) = flume::bounded(capacity.unwrap_or(DEFAULT_CAPACITY));

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .enable_io()
            .build()
            .expect("Failed to create Tokio Runtime");

        rt.block_on(async move {
            let state = State::with(backend)
                .await
                .expect("Failed to open query store state");
            state.migrate().await.expect("Failed to run migrations");
            let store = QueryStore::new(state);

            let worker = Worker::new(store.clone(), database);
            tokio::spawn(async move { worker.run().instrument(info_span!("worker")).await });

            RequestHandler::new(receiver, store, validator)
                .run()
                .instrument(info_span!("request_handler"))
                .await
        });

        rt.shutdown_background();
    });

    handle
}

/// In-memory gateway without a background worker: tests drive execution
/// explicitly through [`Worker::drain`] against the returned store.
pub async fn start_test(
    validator: Arc<dyn Validator>,
) -> (flume::Sender<GatewayRequest>, QueryStore) {
    info!("Starting");
    let (handle, receiver) = flume::bounded(DEFAULT_CAPACITY);

    let state = State::in_memory()
        .await
        .expect("Failed to open in-memory state");
    let store = QueryStore::new(state);

    let handler_store = store.clone();
    tokio::spawn(async move {
        RequestHandler::new(receiver, handler_store, validator)
            .run()
            .instrument(info_span!("request_handler"))
            .await
    });

    (handle, store)
}
