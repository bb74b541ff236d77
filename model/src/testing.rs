//! Test utilities and proptest strategies for model types.
//!
//! This module is only available when the `testing` feature is enabled.

use crate::query::query_status::QueryStatus;
use crate::query::CreateQuery;
use crate::row::RowData;
use proptest::prelude::*;
use serde_json::json;

prop_compose! {
    /// Strategy for generating CreateQuery requests.
    pub fn arb_create_query()(
        statement in proptest::string::string_regex("SELECT [a-z]+ FROM [a-z]+").unwrap(),
        submitted_by in proptest::string::string_regex("[a-z][a-z0-9_]{2,14}").unwrap(),
    ) -> CreateQuery {
        CreateQuery::new(statement, submitted_by)
    }
}

/// Strategy that generates one of the valid status paths from `created` to a
/// terminal status.
pub fn arb_valid_status_path() -> impl Strategy<Value = Vec<QueryStatus>> {
    use QueryStatus::*;
    prop_oneof![
        Just(vec![Created, Finished]),
        Just(vec![Created, Error]),
    ]
}

/// Strategy for a single result value: string, int, float, bool or null.
fn arb_value() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        proptest::string::string_regex("[a-z]{0,8}")
            .unwrap()
            .prop_map(|s| json!(s)),
        any::<i32>().prop_map(|i| json!(i)),
        (-1.0e6..1.0e6f64).prop_map(|f| json!(f)),
        any::<bool>().prop_map(|b| json!(b)),
        Just(serde_json::Value::Null),
    ]
}

/// Strategy for a result row of the given width.
pub fn arb_row(width: usize) -> impl Strategy<Value = RowData> {
    prop::collection::vec(arb_value(), width).prop_map(RowData::new)
}

/// Strategy for a block of result rows, all of the same width.
pub fn arb_rows(max_rows: usize) -> impl Strategy<Value = Vec<RowData>> {
    (1..6usize).prop_flat_map(move |width| {
        prop::collection::vec(arb_row(width), 0..=max_rows)
    })
}

/// Strategy for a declared source column type, including ones outside the
/// fixed mapping table.
pub fn arb_source_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("CHAR".to_string()),
        Just("VARCHAR".to_string()),
        Just("VARCHAR(255)".to_string()),
        Just("TEXT".to_string()),
        Just("TINYINT".to_string()),
        Just("SMALLINT".to_string()),
        Just("INTEGER".to_string()),
        Just("BIGINT".to_string()),
        Just("FLOAT".to_string()),
        Just("DOUBLE".to_string()),
        Just("DECIMAL(10,2)".to_string()),
        Just("BOOLEAN".to_string()),
        Just("DATE".to_string()),
        Just("TIME".to_string()),
        Just("TIMESTAMP".to_string()),
        proptest::string::string_regex("[A-Z]{3,12}").unwrap(),
    ]
}

prop_compose! {
    /// Strategy for `(name, source type)` column metadata.
    pub fn arb_source_column()(
        name in proptest::string::string_regex("[a-z][a-z0-9_]{0,11}").unwrap(),
        source_type in arb_source_type(),
    ) -> (String, String) {
        (name, source_type)
    }
}
