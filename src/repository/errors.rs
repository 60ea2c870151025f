use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Could not check a connection out of the pool.
    #[error("connection error: {0}")]
    ConnectionError(String),
    /// The database rejected or failed to run a statement.
    #[error("database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),
    /// A stored row could not be mapped onto domain types.
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(value: diesel::r2d2::PoolError) -> Self {
        RepositoryError::ConnectionError(value.to_string())
    }
}

/// Convenient alias for results returned from repository functions.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
