use crate::database::{Cursor, Database};
use model::query::{QueryId, ROW_QUOTA};
use model::schema::ResultSchema;
use std::sync::Arc;
use store::{QueryStore, QueryStoreError};
use tracing::{debug, info, instrument, warn};

/// Executes queued queries against the backing database and records the
/// outcome. Multiple workers may share one store; the queue is the only
/// coordination point between them.
pub struct Worker {
    store: QueryStore,
    database: Arc<dyn Database>,
}

impl Worker {
    pub fn new(store: QueryStore, database: Arc<dyn Database>) -> Self {
        Self { store, database }
    }

    /// Dequeue and perform until every queue sender is gone.
    pub async fn run(self) {
        info!("Starting");
        while let Some(id) = self.store.queue().recv().await {
            if let Err(e) = self.perform(id).await {
                warn!("Failed to record outcome for query {id}: {e}");
            }
        }
        info!("Work queue closed");
    }

    /// Perform everything currently queued, then return.
    pub async fn drain(&self) -> Result<(), QueryStoreError> {
        while let Some(id) = self.store.queue().try_dequeue() {
            self.perform(id).await?;
        }
        Ok(())
    }

    /// Execute one query and persist the outcome. A failure of the backing
    /// engine is captured into the record, not propagated.
    #[instrument(skip(self))]
    pub async fn perform(&self, id: QueryId) -> Result<(), QueryStoreError> {
        let Some(query) = self.store.find_query(id).await? else {
            warn!("Dequeued unknown query");
            return Ok(());
        };

        // Redelivered id: the record is immutable once terminal
        if query.status.is_terminal() {
            debug!("Query is already {}, skipping", query.status);
            return Ok(());
        }

        match self.database.execute(&query.statement).await {
            Ok(cursor) => self.complete(id, cursor).await,
            Err(e) => {
                debug!("Execution failed: {e}");
                self.store.fail_query(id, e.to_string()).await?;
                Ok(())
            }
        }
    }

    async fn complete(&self, id: QueryId, cursor: Cursor) -> Result<(), QueryStoreError> {
        let Cursor { columns, mut rows } = cursor;
        if rows.len() > ROW_QUOTA {
            debug!("Truncating result to {ROW_QUOTA} rows");
            rows.truncate(ROW_QUOTA);
        }
        let row_count = rows.len() as i64;

        self.store.append_rows(id, rows).await?;
        let schema = ResultSchema::from_source_columns(columns);
        self.store.finish_query(id, schema, row_count).await?;
        Ok(())
    }
}
