use model::query::query_status::QueryStatus;
use model::query::{self, QueryId, ROW_QUOTA};
use model::row::RowData;
use model::schema::ResultSchema;
use serde::Serialize;

pub fn query_href(id: QueryId) -> String {
    format!("/queries/{id}")
}

pub fn relation_href(id: QueryId) -> String {
    format!("/v2/queries/{id}/relation")
}

pub fn heading_href(id: QueryId, column: &str) -> String {
    format!("/v2/queries/{id}/relation/heading/{column}")
}

pub fn body_href(id: QueryId) -> String {
    format!("/v2/queries/{id}/relation/body")
}

/// Windowed projection of a query, whatever its status. Fields that depend
/// on a terminal status stay absent until the query reaches it.
#[derive(Debug, Clone, Serialize)]
pub struct QueryView {
    pub id: QueryId,
    pub href: String,
    pub status: QueryStatus,
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ResultSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowData>>,
    pub quota: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryView {
    pub fn new(query: query::Model, rows: Option<Vec<RowData>>) -> Self {
        QueryView {
            id: query.id,
            href: query_href(query.id),
            status: query.status,
            sql: query.statement,
            schema: query.schema,
            count: query.row_count,
            rows,
            quota: ROW_QUOTA,
            message: query.message,
        }
    }
}

/// Heading/body decomposition of a query result (v2 resource API). The
/// heading is the ordered column names only; the body stays behind its own
/// link so large row sets are fetched separately, windowed.
#[derive(Debug, Clone, Serialize)]
pub struct RelationView {
    pub id: QueryId,
    pub href: String,
    pub sql: String,
    pub heading: Vec<String>,
    pub links: RelationLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationLinks {
    pub heading: Vec<String>,
    pub body: String,
}

impl RelationView {
    pub fn new(query: query::Model) -> Self {
        let heading = query
            .schema
            .as_ref()
            .map(ResultSchema::heading)
            .unwrap_or_default();
        RelationView {
            id: query.id,
            href: relation_href(query.id),
            sql: query.statement,
            links: RelationLinks {
                heading: heading
                    .iter()
                    .map(|column| heading_href(query.id, column))
                    .collect(),
                body: body_href(query.id),
            },
            heading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::schema::ResultSchema;
    use serde_json::json;

    fn finished_query() -> query::Model {
        query::Model {
            id: 7,
            statement: "select 1".to_string(),
            status: QueryStatus::Finished,
            submitted_by: "tester".to_string(),
            message: None,
            schema: Some(ResultSchema::from_source_columns(vec![("a", "VARCHAR")])),
            row_count: Some(1),
            created_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn query_view_omits_absent_fields() {
        let pending = query::Model {
            status: QueryStatus::Created,
            schema: None,
            row_count: None,
            ..finished_query()
        };
        let value = serde_json::to_value(QueryView::new(pending, None)).unwrap();

        assert_eq!(value["status"], json!("created"));
        assert_eq!(value["quota"], json!(100_000));
        assert!(value.get("schema").is_none());
        assert!(value.get("rows").is_none());
        assert!(value.get("message").is_none());
    }

    #[test]
    fn relation_view_links_heading_and_body() {
        let view = RelationView::new(finished_query());

        assert_eq!(view.href, "/v2/queries/7/relation");
        assert_eq!(view.heading, vec!["a".to_string()]);
        assert_eq!(
            view.links.heading,
            vec!["/v2/queries/7/relation/heading/a".to_string()]
        );
        assert_eq!(view.links.body, "/v2/queries/7/relation/body");
    }
}
