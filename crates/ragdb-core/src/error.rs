use thiserror::Error;

/// Fatal error taxonomy. Upstream-model failures and empty results are not
/// errors anywhere in this workspace; only unreachable storage/indexes and
/// bad configuration abort a request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
