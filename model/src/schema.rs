use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Normalized column type exposed to clients. Whatever the backing engine
/// declares is folded into this fixed set; unrecognized declarations map to
/// [`SemanticType::Unknown`] instead of failing the query.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Int,
    Float,
    Boolean,
    Date,
    Time,
    Datetime,
    Unknown,
}

impl SemanticType {
    /// Map a source column type to its semantic type. Length or precision
    /// suffixes like `VARCHAR(255)` are ignored.
    pub fn from_source(source: &str) -> Self {
        let base = source.split('(').next().unwrap_or_default().trim();
        match base.to_ascii_uppercase().as_str() {
            "CHAR" | "VARCHAR" | "TEXT" => SemanticType::String,
            "TINYINT" | "SMALLINT" | "INT" | "INTEGER" | "BIGINT" => SemanticType::Int,
            "FLOAT" | "REAL" | "DOUBLE" | "DECIMAL" | "NUMERIC" => SemanticType::Float,
            "BOOLEAN" => SemanticType::Boolean,
            "DATE" => SemanticType::Date,
            "TIME" => SemanticType::Time,
            "TIMESTAMP" | "DATETIME" => SemanticType::Datetime,
            _ => SemanticType::Unknown,
        }
    }
}

/// A result column: name plus semantic type. Serializes as a two-element
/// array, e.g. `["x", "string"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn(pub String, pub SemanticType);

impl ResultColumn {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.1
    }
}

/// Ordered result schema of a finished query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ResultSchema(pub Vec<ResultColumn>);

impl ResultSchema {
    /// Build a schema from `(name, source type)` column metadata, applying
    /// the semantic type mapping.
    pub fn from_source_columns<I, N, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: AsRef<str>,
    {
        Self(
            columns
                .into_iter()
                .map(|(name, source)| {
                    ResultColumn(name.into(), SemanticType::from_source(source.as_ref()))
                })
                .collect(),
        )
    }

    /// Ordered column names, without types.
    pub fn heading(&self) -> Vec<String> {
        self.0.iter().map(|c| c.0.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
