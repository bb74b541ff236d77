use model::principal::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A column as declared by the backing engine: name plus source type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
        }
    }
}

/// Read-only lookup of known databases, tables and columns. Names are
/// normalized to upper case on insert, matching how the translation service
/// resolves references. The backing data is loaded outside the query path
/// and never mutated while queries are processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    databases: BTreeMap<String, BTreeMap<String, Vec<Column>>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON document form:
    /// `{"HR": {"EMPS": [{"name": "id", "type": "INTEGER"}, ...]}}`.
    pub fn from_json(doc: &str) -> Result<Self, CatalogError> {
        let parsed: BTreeMap<String, BTreeMap<String, Vec<Column>>> =
            serde_json::from_str(doc)?;
        let mut catalog = Self::new();
        for (database, tables) in parsed {
            for (table, columns) in tables {
                catalog.insert_table(database.clone(), table, columns);
            }
        }
        Ok(catalog)
    }

    pub fn insert_table(
        &mut self,
        database: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<Column>,
    ) {
        self.databases
            .entry(database.into().to_uppercase())
            .or_default()
            .insert(table.into().to_uppercase(), columns);
    }

    /// Columns of `database.table`, if the table is known.
    pub fn lookup(&self, database: &str, table: &str) -> Option<&[Column]> {
        self.databases
            .get(&database.to_uppercase())
            .and_then(|tables| tables.get(&table.to_uppercase()))
            .map(Vec::as_slice)
    }

    pub fn database_names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    /// All known `(database, table, columns)` triples, in name order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &str, &[Column])> {
        self.databases.iter().flat_map(|(database, tables)| {
            tables
                .iter()
                .map(move |(table, columns)| (database.as_str(), table.as_str(), columns.as_slice()))
        })
    }

    /// The part of the catalog the principal may see. Tables in schemas the
    /// principal cannot read are absent, not marked: downstream consumers
    /// cannot distinguish hidden from nonexistent.
    pub fn visible_for(&self, principal: &Principal) -> SchemaCatalog {
        SchemaCatalog {
            databases: self
                .databases
                .iter()
                .filter(|(database, _)| principal.can_read(database))
                .map(|(database, tables)| (database.clone(), tables.clone()))
                .collect(),
        }
    }

    /// `(database, table)` pairs readable by the principal.
    pub fn list_readable(&self, principal: &Principal) -> Vec<(String, String)> {
        self.visible_for(principal)
            .tables()
            .map(|(database, table, _)| (database.to_owned(), table.to_owned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> SchemaCatalog {
        let mut catalog = SchemaCatalog::new();
        catalog.insert_table(
            "hr",
            "emps",
            vec![
                Column::new("empid", "INTEGER"),
                Column::new("name", "VARCHAR"),
            ],
        );
        catalog.insert_table(
            "market",
            "bookings_ond",
            vec![Column::new("origin", "VARCHAR")],
        );
        catalog
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = test_catalog();
        assert!(catalog.lookup("HR", "EMPS").is_some());
        assert!(catalog.lookup("hr", "emps").is_some());
        assert!(catalog.lookup("hr", "missing").is_none());
        assert!(catalog.lookup("nope", "emps").is_none());
    }

    #[test]
    fn visibility_filters_unreadable_schemas() {
        let catalog = test_catalog();
        let principal = Principal::new("analyst").with_schema("HR");

        let visible = catalog.visible_for(&principal);
        assert!(visible.lookup("HR", "EMPS").is_some());
        assert!(visible.lookup("MARKET", "BOOKINGS_OND").is_none());

        assert_eq!(
            catalog.list_readable(&principal),
            vec![("HR".to_string(), "EMPS".to_string())]
        );
    }

    #[test]
    fn loads_from_json_documents() {
        let catalog = SchemaCatalog::from_json(
            r#"{"hr": {"emps": [{"name": "empid", "type": "INTEGER"}]}}"#,
        )
        .unwrap();
        let columns = catalog.lookup("HR", "EMPS").unwrap();
        assert_eq!(columns, &[Column::new("empid", "INTEGER")]);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            SchemaCatalog::from_json("not json"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
