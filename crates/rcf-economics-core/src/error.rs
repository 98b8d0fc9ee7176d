use thiserror::Error;

#[derive(Debug, Error)]
pub enum RcfError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RcfError {
    fn from(e: serde_json::Error) -> Self {
        RcfError::SerializationError(e.to_string())
    }
}
