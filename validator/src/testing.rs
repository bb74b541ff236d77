//! In-process mock of the translation service for tests.
//!
//! Available to downstream crates through the `testing` feature.

use crate::translator::translation::sql_translation_server::{
    SqlTranslation, SqlTranslationServer,
};
use crate::translator::translation::{
    translate_reply, Rejection, TranslateReply, TranslateRequest,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// Mock translation service. Resolves the first qualified table reference of
/// the statement against the catalog shipped with the request and answers
/// the way the production dialect server does: a backtick-quoted, uppercased
/// rewrite for resolvable references, a "not found" rejection otherwise.
/// An optional artificial delay lets tests exercise the round-trip timeout.
#[derive(Debug, Default)]
pub struct MockTranslationService {
    delay: Option<Duration>,
}

impl MockTranslationService {
    pub fn delayed(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

#[tonic::async_trait]
impl SqlTranslation for MockTranslationService {
    async fn translate(
        &self,
        request: Request<TranslateRequest>,
    ) -> Result<Response<TranslateReply>, Status> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let req = request.into_inner();
        let outcome = match table_reference(&req.sql) {
            // No qualified reference to resolve: accept as-is
            None => translate_reply::Outcome::TranslatedSql(req.sql.clone()),
            Some((database, table)) => {
                let database = database.to_uppercase();
                let table = table.to_uppercase();
                let known = req.catalog.iter().any(|t| {
                    t.database.eq_ignore_ascii_case(&database)
                        && t.table.eq_ignore_ascii_case(&table)
                });
                if known {
                    translate_reply::Outcome::TranslatedSql(format!(
                        "SELECT *\nFROM `{database}`.`{table}`"
                    ))
                } else {
                    translate_reply::Outcome::Rejection(Rejection {
                        details: vec![format!("Table '{database}.{table}' not found")],
                    })
                }
            }
        };

        Ok(Response::new(TranslateReply {
            outcome: Some(outcome),
        }))
    }
}

/// First `db.table` reference after a FROM keyword, if any.
fn table_reference(sql: &str) -> Option<(String, String)> {
    let lowered = sql.to_lowercase();
    let from = lowered.find(" from ")?;
    let rest = sql[from + " from ".len()..].trim_start();
    let token = rest.split_whitespace().next()?;
    let (database, table) = token.split_once('.')?;
    Some((database.to_owned(), table.to_owned()))
}

/// Serve the mock on an ephemeral local port; returns its address and the
/// server task.
pub async fn spawn_mock_translator(
    service: MockTranslationService,
) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock translator");
    let addr = listener.local_addr().expect("listener has no local addr");

    let handle = tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(SqlTranslationServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .expect("mock translator server failed");
    });

    (addr, handle)
}
