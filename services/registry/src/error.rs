//! Error types for the registry

use http::StatusCode;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Invalid digest format
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Digest mismatch
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Expected digest
        expected: String,
        /// Actual digest
        actual: String,
    },

    /// Content addressed with an algorithm this store cannot verify
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    /// The operation is not available on this store
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A ranged upload chunk did not start at the current end of the upload
    #[error("range not satisfiable: upload is at {expected}, chunk starts at {actual}")]
    RangeNotSatisfiable {
        /// Current size of the upload
        expected: u64,
        /// Start offset sent by the client
        actual: u64,
    },

    /// The upstream registry could not be reached or answered with an error
    #[error("upstream error: {0}")]
    Upstream(#[from] api_client::Error),

    /// The upstream registry answered with something we could not use
    #[error("invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::InvalidDigest(_)
            | RegistryError::DigestMismatch { .. }
            | RegistryError::UnsupportedDigest(_) => StatusCode::BAD_REQUEST,
            RegistryError::Unsupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            RegistryError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            RegistryError::Upstream(_) | RegistryError::InvalidUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            RegistryError::Storage(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            RegistryError::Config(_) | RegistryError::Storage(_) | RegistryError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for OCI error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::InvalidDigest(_)
            | RegistryError::DigestMismatch { .. }
            | RegistryError::UnsupportedDigest(_) => "DIGEST_INVALID",
            RegistryError::Unsupported(_) => "UNSUPPORTED",
            RegistryError::RangeNotSatisfiable { .. } => "BLOB_UPLOAD_INVALID",
            RegistryError::Storage(err) if err.is_not_found() => "BLOB_UPLOAD_UNKNOWN",
            RegistryError::Upstream(_)
            | RegistryError::InvalidUpstreamResponse(_)
            | RegistryError::Config(_)
            | RegistryError::Storage(_)
            | RegistryError::Io(_) => "UNKNOWN",
        }
    }
}
