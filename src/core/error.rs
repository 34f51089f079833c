use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("invalid question identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("invalid column ranges: {0}")]
    InvalidColumns(String),
}

pub type Result<T> = std::result::Result<T, StructureError>;
