use crate::{ValidationError, Validator};
use async_trait::async_trait;
use catalog::SchemaCatalog;
use model::principal::Principal;
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialFactorBackoff};
use tokio_retry2::{Retry, RetryError};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, instrument};

pub mod translation {
    tonic::include_proto!("translation");
}

use translation::sql_translation_client::SqlTranslationClient;
use translation::{translate_reply, CatalogColumn, CatalogTable, TranslateRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on one full validate round trip, reply included.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Validator that defers to an external dialect translation service. Each
/// validation is one bounded request/reply round trip: connect, send, await
/// the reply, drop the channel. Timeouts and transport failures surface as
/// validation errors; a statement is never accepted without a reply.
///
/// The catalog shipped with each request is restricted to what the
/// principal may read, so the service resolves hidden and nonexistent
/// tables identically.
pub struct TranslatingValidator {
    endpoint: String,
    catalog: SchemaCatalog,
    timeout: Duration,
}

impl TranslatingValidator {
    pub fn new(endpoint: impl Into<String>, catalog: SchemaCatalog) -> Self {
        Self {
            endpoint: endpoint.into(),
            catalog,
            timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connect(&self) -> Result<SqlTranslationClient<Channel>, ValidationError> {
        const INITIAL_BACKOFF_MS: u64 = 100;
        const BACKOFF_FACTOR: f64 = 2.0;
        const MAX_RETRIES: usize = 3;

        let connect_retry =
            ExponentialFactorBackoff::from_millis(INITIAL_BACKOFF_MS, BACKOFF_FACTOR)
                .map(jitter)
                .take(MAX_RETRIES);

        let channel = Retry::spawn(connect_retry, || async {
            let endpoint = Endpoint::from_shared(format!("http://{}", self.endpoint))
                .map_err(|e| RetryError::permanent(self.connection_error(e)))?;

            endpoint
                .connect_timeout(CONNECT_TIMEOUT)
                .connect()
                .await
                .map_err(|e| {
                    debug!("Retrying connection establishment");
                    RetryError::transient(self.connection_error(e))
                })
        })
        .await?;

        Ok(SqlTranslationClient::new(channel))
    }

    fn connection_error(&self, reason: impl std::fmt::Display) -> ValidationError {
        ValidationError::Connection {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        }
    }

    fn request_for(&self, sql: &str, principal: &Principal) -> TranslateRequest {
        let visible = self.catalog.visible_for(principal);
        TranslateRequest {
            sql: sql.to_owned(),
            default_schemas: principal.schemas.iter().cloned().collect(),
            catalog: visible
                .tables()
                .map(|(database, table, columns)| CatalogTable {
                    database: database.to_owned(),
                    table: table.to_owned(),
                    columns: columns
                        .iter()
                        .map(|c| CatalogColumn {
                            name: c.name.clone(),
                            r#type: c.source_type.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Validator for TranslatingValidator {
    #[instrument(skip(self, sql), fields(endpoint = %self.endpoint, principal = %principal.name))]
    async fn validate(
        &self,
        sql: &str,
        principal: &Principal,
    ) -> Result<String, ValidationError> {
        let mut client = self.connect().await?;
        let request = self.request_for(sql, principal);

        let timeout_ms = self.timeout.as_millis() as u64;
        let reply = tokio::time::timeout(self.timeout, client.translate(request))
            .await
            .map_err(|_| ValidationError::Timeout { timeout_ms })?
            .map_err(|status| self.connection_error(status))?
            .into_inner();

        match reply.outcome {
            Some(translate_reply::Outcome::TranslatedSql(translated)) => {
                debug!("Statement accepted by the translation service");
                Ok(translated)
            }
            Some(translate_reply::Outcome::Rejection(rejection)) => {
                Err(ValidationError::Rejected {
                    details: rejection.details,
                })
            }
            None => Err(ValidationError::Protocol {
                reason: "reply carries no outcome".to_owned(),
            }),
        }
    }
}
