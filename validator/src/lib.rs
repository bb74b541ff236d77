pub mod syntax;
pub mod translator;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use async_trait::async_trait;
use model::principal::Principal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid statement")]
    Rejected { details: Vec<String> },

    #[error("Translation service did not answer within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to reach translation service at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Malformed reply from translation service: {reason}")]
    Protocol { reason: String },
}

impl ValidationError {
    pub fn rejected(detail: impl Into<String>) -> Self {
        ValidationError::Rejected {
            details: vec![detail.into()],
        }
    }

    /// Human-readable details, one per fault. Infrastructure failures
    /// surface their description as the single detail.
    pub fn details(&self) -> Vec<String> {
        match self {
            ValidationError::Rejected { details } => details.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Checks and possibly rewrites a statement before it is accepted. The
/// returned SQL is what the query will store and execute; a pass-through
/// implementation returns its input.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, sql: &str, principal: &Principal)
        -> Result<String, ValidationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_all_details() {
        let error = ValidationError::Rejected {
            details: vec!["first".into(), "second".into()],
        };
        assert_eq!(error.details(), vec!["first", "second"]);
    }

    #[test]
    fn infrastructure_failures_surface_one_detail() {
        let error = ValidationError::Timeout { timeout_ms: 5000 };
        let details = error.details();
        assert_eq!(details.len(), 1);
        assert!(details[0].contains("5000 ms"));
    }
}
