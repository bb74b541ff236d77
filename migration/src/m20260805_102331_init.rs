use crate::{assert_not_has_tables, drop_tables};
use model::query::query_status::QueryStatus;
use sea_orm::DbBackend;
use sea_orm_migration::prelude::{Index as MigrationIndex, Table as MigrationTable, *};
use strum::IntoEnumIterator;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        assert_not_has_tables!(manager, Query, QueryRow);

        match manager.get_database_backend() {
            DbBackend::Sqlite => {
                manager
                    .get_connection()
                    .execute_unprepared("PRAGMA foreign_keys = ON")
                    .await
                    .expect("failed to set foreign key enforcement");

                manager
                    .get_connection()
                    .execute_unprepared("PRAGMA journal_mode = WAL")
                    .await
                    .expect("failed to set journal mode");
            }
            _ => {}
        }

        manager
            .create_table(
                MigrationTable::create()
                    .table(Query::Table)
                    .col(
                        ColumnDef::new(Query::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Query::Statement).string().not_null())
                    .col(
                        ColumnDef::new(Query::Status)
                            .string()
                            .not_null()
                            .default(QueryStatus::default().to_string())
                            .check(
                                Expr::col(Query::Status).is_in(
                                    QueryStatus::iter()
                                        .map(|s| s.to_string())
                                        .collect::<Vec<_>>(),
                                ),
                            ),
                    )
                    .col(ColumnDef::new(Query::SubmittedBy).string().not_null())
                    .col(ColumnDef::new(Query::Message).string().null())
                    .col(ColumnDef::new(Query::Schema).json().null())
                    .col(ColumnDef::new(Query::RowCount).big_integer().null())
                    .col(ColumnDef::new(Query::CreatedAt).date_time().null())
                    .col(ColumnDef::new(Query::FinishedAt).date_time().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                MigrationTable::create()
                    .table(QueryRow::Table)
                    .col(
                        ColumnDef::new(QueryRow::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QueryRow::QueryId).big_integer().not_null())
                    .col(
                        ColumnDef::new(QueryRow::Seq)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(QueryRow::Seq).gte(0)),
                    )
                    .col(ColumnDef::new(QueryRow::Data).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(QueryRow::Table, QueryRow::QueryId)
                            .to(Query::Table, Query::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                MigrationIndex::create()
                    .name("idx_query_row_window")
                    .table(QueryRow::Table)
                    .col(QueryRow::QueryId)
                    .col(QueryRow::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_tables!(manager, QueryRow, Query);
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Query {
    Table,
    Id,
    Statement,
    Status,
    SubmittedBy,
    Message,
    Schema,
    RowCount,
    CreatedAt,
    FinishedAt,
}

#[derive(DeriveIden)]
enum QueryRow {
    Table,
    Id,
    QueryId,
    Seq,
    Data,
}
