use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::time::Duration;
use thiserror::Error;

pub enum StateBackend {
    Memory,
    Sqlite {
        endpoint: String,
        opts: ConnectOptions,
    },
}

/// A live connection to the backing state database.
#[derive(Clone)]
pub struct State {
    pub conn: DatabaseConnection,
    pub endpoint: String,
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl State {
    pub async fn with(backend: StateBackend) -> Result<Self, StateError> {
        const MAX_DURATION: Duration = Duration::new(u64::MAX / 4, 0);

        match backend {
            StateBackend::Memory => {
                const IN_MEMORY_DB: &str = "sqlite::memory:";

                // A single shared connection keeps the in-memory database
                // alive for the lifetime of the pool.
                let conn = sea_orm::Database::connect(
                    ConnectOptions::new(IN_MEMORY_DB)
                        .min_connections(1)
                        .max_connections(1)
                        .acquire_timeout(MAX_DURATION)
                        .connect_timeout(MAX_DURATION)
                        .to_owned(),
                )
                .await?;
                Ok(Self {
                    conn,
                    endpoint: IN_MEMORY_DB.to_owned(),
                })
            }
            StateBackend::Sqlite { endpoint, opts } => {
                let conn = sea_orm::Database::connect(opts).await?;
                Ok(Self { conn, endpoint })
            }
        }
    }

    /// In-memory state with migrations applied. Used by tests and by
    /// deployments that do not need durability across restarts.
    pub async fn in_memory() -> Result<Self, StateError> {
        let this = Self::with(StateBackend::Memory).await?;
        this.migrate().await?;
        Ok(this)
    }

    pub async fn migrate(&self) -> Result<(), StateError> {
        Migrator::up(&self.conn, None).await?;
        Ok(())
    }
}
