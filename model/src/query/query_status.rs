#[cfg(feature = "testing")]
use proptest_derive::Arbitrary;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[cfg_attr(feature = "testing", derive(Arbitrary))]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "query_status")]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    #[default]
    #[sea_orm(string_value = "created")]
    Created, // Query passed validation and waits in the work queue
    #[sea_orm(string_value = "finished")]
    Finished, // Query executed, schema and rows are available
    #[sea_orm(string_value = "error")]
    Error, // Query execution failed, message holds the reason
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStatus::Finished | QueryStatus::Error)
    }

    pub fn transitions(&self) -> Vec<QueryStatus> {
        match self {
            QueryStatus::Created => vec![QueryStatus::Finished, QueryStatus::Error],
            // Terminal states have no valid next states
            QueryStatus::Finished | QueryStatus::Error => vec![],
        }
    }

    pub fn invalid_transitions(&self) -> Vec<QueryStatus> {
        use strum::IntoEnumIterator;

        let valid = self.transitions();
        QueryStatus::iter()
            .filter(|s| *s != *self && !valid.contains(s))
            .collect()
    }
}
