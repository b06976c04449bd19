use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stream at offset {offset}: {reason}")]
    MalformedStream { offset: u64, reason: String },

    #[error("Unsupported layout: {reason}")]
    UnsupportedLayout { reason: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Invalid query: {details}")]
    InvalidQuery { details: String },
}

impl DatabaseError {
    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        DatabaseError::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        DatabaseError::UnsupportedLayout {
            reason: reason.into(),
        }
    }

    /// Decode-layer failures leave the cursor somewhere unknown; nothing after
    /// them can be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DatabaseError::Io(_)
                | DatabaseError::MalformedStream { .. }
                | DatabaseError::UnsupportedLayout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
