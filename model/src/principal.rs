use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An authenticated identity, carrying the set of schema (database) names it
/// is allowed to read. Authentication itself happens outside this crate; a
/// `Principal` only exists once a caller has been identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub schemas: BTreeSet<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: BTreeSet::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schemas.insert(schema.into());
        self
    }

    /// Whether the principal may read tables of the given database.
    pub fn can_read(&self, database: &str) -> bool {
        self.schemas
            .iter()
            .any(|s| s.eq_ignore_ascii_case(database))
    }
}
