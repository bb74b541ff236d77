use crate::{ValidationError, Validator};
use async_trait::async_trait;
use model::principal::Principal;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

/// Syntax-only validation with no external dependency: the statement is
/// parsed locally and returned unchanged. Table references are not resolved
/// beyond what the grammar requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Validator for SyntaxValidator {
    async fn validate(
        &self,
        sql: &str,
        _principal: &Principal,
    ) -> Result<String, ValidationError> {
        let dialect = GenericDialect {};
        let statements = Parser::parse_sql(&dialect, sql).map_err(|e| {
            debug!("Rejected statement: {e}");
            ValidationError::rejected(e.to_string())
        })?;

        if statements.is_empty() {
            return Err(ValidationError::rejected("Empty statement"));
        }

        Ok(sql.to_owned())
    }
}
