use crate::gateway::{
    FetchQuery, FetchRelation, GatewayError, GatewayRequest, QuerySummary, SubmitQuery,
};
use crate::views::{query_href, QueryView, RelationView};
use controller::request::Request;
use model::principal::Principal;
use model::query::query_status::QueryStatus;
use model::query::CreateQuery;
use std::sync::Arc;
use store::QueryStore;
use tracing::{debug, info, instrument};
use validator::Validator;

macro_rules! dispatch {
    ($req:expr, $self:ident . $method:ident) => {{
        debug!("Received: {:?}", $req);
        let Request { payload, reply_to } = $req;
        let _ = reply_to.send($self.$method(payload).await);
    }};
}

pub(crate) struct RequestHandler {
    receiver: flume::Receiver<GatewayRequest>,
    store: QueryStore,
    validator: Arc<dyn Validator>,
}

impl RequestHandler {
    pub(crate) fn new(
        receiver: flume::Receiver<GatewayRequest>,
        store: QueryStore,
        validator: Arc<dyn Validator>,
    ) -> RequestHandler {
        Self {
            receiver,
            store,
            validator,
        }
    }

    pub(crate) async fn run(self) {
        loop {
            match self.receiver.recv_async().await {
                Ok(req) => self.handle_recv(req).await,
                Err(_) => {
                    info!("All clients have been dropped");
                    return;
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn handle_recv(&self, req: GatewayRequest) {
        match req {
            GatewayRequest::SubmitQuery(r) => dispatch!(r, self.submit),
            GatewayRequest::FetchQuery(r) => dispatch!(r, self.fetch),
            GatewayRequest::FetchRelation(r) => dispatch!(r, self.fetch_relation),
        }
    }

    /// Validation resolves before anything is persisted: a rejected
    /// statement leaves no query and no queue entry behind.
    async fn submit(&self, req: SubmitQuery) -> Result<QuerySummary, GatewayError> {
        let principal = authenticated(&req.principal)?;
        let statement = self.validator.validate(&req.sql, principal).await?;

        let model = self
            .store
            .create_query(CreateQuery::new(statement, principal.name.as_str()))
            .await?;
        info!("Accepted query {} from {}", model.id, principal.name);

        Ok(QuerySummary {
            id: model.id,
            href: query_href(model.id),
            sql: model.statement,
        })
    }

    /// Fetching never fails on status: a non-finished query simply comes
    /// back with whatever fields its status populates.
    async fn fetch(&self, req: FetchQuery) -> Result<QueryView, GatewayError> {
        authenticated(&req.principal)?;

        let query = self
            .store
            .find_query(req.id)
            .await?
            .ok_or(GatewayError::NotFound(req.id))?;

        let rows = match query.status {
            QueryStatus::Finished => Some(
                self.store
                    .fetch_rows(req.id, req.offset.unwrap_or(0), req.limit)
                    .await?,
            ),
            _ => None,
        };

        Ok(QueryView::new(query, rows))
    }

    async fn fetch_relation(&self, req: FetchRelation) -> Result<RelationView, GatewayError> {
        authenticated(&req.principal)?;

        let query = self
            .store
            .find_query(req.id)
            .await?
            .ok_or(GatewayError::NotFound(req.id))?;

        Ok(RelationView::new(query))
    }
}

fn authenticated(principal: &Option<Principal>) -> Result<&Principal, GatewayError> {
    principal.as_ref().ok_or(GatewayError::Unauthenticated)
}
