use crate::types::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("SQL parsing error: {0}")]
    SqlParser(#[from] sqlparser::parser::ParserError),
    #[error("Invalid query descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Invalid query structure: {0}")]
    InvalidQuery(String),
}

impl From<PlannerError> for DatabaseError {
    fn from(err: PlannerError) -> Self {
        DatabaseError::InvalidQuery {
            details: err.to_string(),
        }
    }
}
