use crate::query::QueryId;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// One result row, as produced by the backing database. Values keep their
/// JSON shape so a row can mix strings, integers and floats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct RowData(pub Vec<serde_json::Value>);

impl RowData {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }
}

impl From<Vec<serde_json::Value>> for RowData {
    fn from(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, DeriveEntityModel)]
#[sea_orm(table_name = "query_row")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub query_id: QueryId,
    pub seq: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: RowData,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::query::Entity",
        from = "Column::QueryId",
        to = "crate::query::Column::Id"
    )]
    Query,
}

impl Related<crate::query::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Query.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
