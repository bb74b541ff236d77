pub mod query_status;

use crate::schema::ResultSchema;
use crate::IntoCondition;
use query_status::QueryStatus;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::Condition;
use serde::{Deserialize, Serialize};

pub type QueryId = i64;

/// Hard cap on rows materialized per query, enforced at execution time.
pub const ROW_QUOTA: usize = 100_000;

#[derive(Debug, Clone, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "query")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: QueryId,
    pub statement: String,
    pub status: QueryStatus,
    pub submitted_by: String,
    pub message: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub schema: Option<ResultSchema>,
    pub row_count: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Local>>,
    pub finished_at: Option<chrono::DateTime<chrono::Local>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::row::Entity")]
    Row,
}

impl Related<crate::row::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Row.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug)]
pub struct CreateQuery {
    pub statement: String,
    pub submitted_by: String,
}

impl CreateQuery {
    pub fn new(statement: impl Into<String>, submitted_by: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            submitted_by: submitted_by.into(),
        }
    }
}

impl From<CreateQuery> for ActiveModel {
    fn from(req: CreateQuery) -> Self {
        Self {
            id: NotSet,
            statement: Set(req.statement),
            status: NotSet,
            submitted_by: Set(req.submitted_by),
            message: NotSet,
            schema: NotSet,
            row_count: NotSet,
            created_at: Set(Some(chrono::Local::now())),
            finished_at: NotSet,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GetQuery {
    pub id: Option<QueryId>,
    pub status: Option<QueryStatus>,
    pub submitted_by: Option<String>,
}

impl GetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: QueryId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_status(mut self, status: QueryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_submitted_by(mut self, submitted_by: impl Into<String>) -> Self {
        self.submitted_by = Some(submitted_by.into());
        self
    }
}

impl IntoCondition for GetQuery {
    fn into_condition(self) -> Condition {
        Condition::all()
            .add_option(self.id.map(|v| Column::Id.eq(v)))
            .add_option(self.status.map(|v| Column::Status.eq(v)))
            .add_option(self.submitted_by.map(|v| Column::SubmittedBy.eq(v)))
    }
}
