use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid object name: {0} (expected: name|namespace/name)")]
    InvalidName(String),
}
