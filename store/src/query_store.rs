use crate::database::State;
use crate::work_queue::WorkQueue;
use model::query::query_status::QueryStatus;
use model::query::{self, CreateQuery, GetQuery, QueryId};
use model::row::{self, RowData};
use model::schema::ResultSchema;
use model::IntoCondition;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use thiserror::Error;
use tracing::debug;

/// Upper bound on rows per INSERT statement, keeping the number of bind
/// variables below SQLite's limit.
const ROW_INSERT_CHUNK: usize = 512;

#[derive(Error, Debug)]
pub enum QueryStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Query '{0}' not found")]
    NotFound(QueryId),

    #[error("Query '{id}' is already {status}")]
    InvalidTransition { id: QueryId, status: QueryStatus },
}

/// Durable storage for query records and their row buffers, plus the work
/// queue of ids awaiting execution. The query record and the row buffer are
/// two independently addressable regions: windowed row reads never touch the
/// record and never load the full result set.
#[derive(Clone)]
pub struct QueryStore {
    db: State,
    queue: WorkQueue,
}

impl QueryStore {
    pub fn new(db: State) -> Self {
        Self {
            db,
            queue: WorkQueue::new(),
        }
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Persist a validated query and enqueue its id for execution.
    pub async fn create_query(&self, req: CreateQuery) -> Result<query::Model, QueryStoreError> {
        let model = query::ActiveModel::from(req).insert(&self.db.conn).await?;
        self.queue.enqueue(model.id);
        debug!("Created query {} and enqueued it", model.id);
        Ok(model)
    }

    pub async fn find_query(&self, id: QueryId) -> Result<Option<query::Model>, QueryStoreError> {
        query::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .map_err(Into::into)
    }

    pub async fn get_query(&self, req: GetQuery) -> Result<Vec<query::Model>, QueryStoreError> {
        query::Entity::find()
            .filter(req.into_condition())
            .all(&self.db.conn)
            .await
            .map_err(Into::into)
    }

    /// Record a successful execution. Only a `created` query can finish;
    /// anything else is a redelivery or a lost race and is rejected.
    pub async fn finish_query(
        &self,
        id: QueryId,
        schema: ResultSchema,
        row_count: i64,
    ) -> Result<query::Model, QueryStoreError> {
        let mut active: query::ActiveModel = self.require_created(id).await?.into();
        active.status = Set(QueryStatus::Finished);
        active.schema = Set(Some(schema));
        active.row_count = Set(Some(row_count));
        active.finished_at = Set(Some(chrono::Local::now()));
        active.update(&self.db.conn).await.map_err(Into::into)
    }

    /// Record a failed execution, keeping the failure text verbatim.
    pub async fn fail_query(
        &self,
        id: QueryId,
        message: impl Into<String>,
    ) -> Result<query::Model, QueryStoreError> {
        let mut active: query::ActiveModel = self.require_created(id).await?.into();
        active.status = Set(QueryStatus::Error);
        active.message = Set(Some(message.into()));
        active.finished_at = Set(Some(chrono::Local::now()));
        active.update(&self.db.conn).await.map_err(Into::into)
    }

    /// Append rows to the buffer of a query, continuing its sequence.
    pub async fn append_rows(
        &self,
        id: QueryId,
        rows: Vec<RowData>,
    ) -> Result<(), QueryStoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let base = self.buffered_row_count(id).await? as i64;
        for (chunk_index, chunk) in rows.chunks(ROW_INSERT_CHUNK).enumerate() {
            let chunk_base = base + (chunk_index * ROW_INSERT_CHUNK) as i64;
            let models = chunk.iter().enumerate().map(|(i, data)| row::ActiveModel {
                id: NotSet,
                query_id: Set(id),
                seq: Set(chunk_base + i as i64),
                data: Set(data.clone()),
            });
            row::Entity::insert_many(models).exec(&self.db.conn).await?;
        }
        Ok(())
    }

    /// Read a window of buffered rows. Out-of-range offsets yield an empty
    /// vector; a missing limit reads to the end of the buffer.
    pub async fn fetch_rows(
        &self,
        id: QueryId,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<RowData>, QueryStoreError> {
        let models = row::Entity::find()
            .filter(row::Column::QueryId.eq(id))
            .order_by_asc(row::Column::Seq)
            .offset(offset)
            .limit(limit)
            .all(&self.db.conn)
            .await?;
        Ok(models.into_iter().map(|m| m.data).collect())
    }

    pub async fn buffered_row_count(&self, id: QueryId) -> Result<u64, QueryStoreError> {
        row::Entity::find()
            .filter(row::Column::QueryId.eq(id))
            .count(&self.db.conn)
            .await
            .map_err(Into::into)
    }

    async fn require_created(&self, id: QueryId) -> Result<query::Model, QueryStoreError> {
        let query = self
            .find_query(id)
            .await?
            .ok_or(QueryStoreError::NotFound(id))?;
        if query.status != QueryStatus::Created {
            return Err(QueryStoreError::InvalidTransition {
                id,
                status: query.status,
            });
        }
        Ok(query)
    }
}
