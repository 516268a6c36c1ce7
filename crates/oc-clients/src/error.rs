//! Error types for client details resolution

use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Failure of the external authority lookup itself (not an absent record).
#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authority returned status {status}")]
    Status { status: u16 },

    #[error("Authority rejected lookup with code {code}: {message}")]
    Rejected { code: i64, message: String },

    #[error("Invalid authority response: {0}")]
    Decode(String),

    #[error("Invalid authority configuration: {0}")]
    Configuration(String),

    #[error("Authority unavailable: {0}")]
    Unavailable(String),
}

impl AuthorityError {
    /// Whether a transport-level retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status } => *status >= 500,
            Self::Unavailable(_) => true,
            Self::Rejected { .. } | Self::Decode(_) | Self::Configuration(_) => false,
        }
    }
}

/// Secret hashing backend failure
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to hash secret: {0}")]
    Hash(String),

    #[error("Invalid secret hash format: {0}")]
    InvalidHash(String),

    #[error("Invalid hasher configuration: {0}")]
    Configuration(String),
}

/// Typed failure of [`crate::ClientDetailsResolver::resolve`].
///
/// Every variant carries the requested client id for diagnostics. None of
/// them ever carry the client secret.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Client id must not be empty")]
    InvalidClientId,

    #[error("Client not found: {client_id}")]
    ClientNotFound { client_id: String },

    #[error("Invalid client record for {client_id}: missing {field}")]
    InvalidRecord { client_id: String, field: &'static str },

    #[error("Client authority unavailable while resolving {client_id}: {source}")]
    AuthorityUnavailable {
        client_id: String,
        #[source]
        source: AuthorityError,
    },

    #[error("Failed to hash secret for {client_id}: {source}")]
    Hashing {
        client_id: String,
        #[source]
        source: HashError,
    },
}

impl ResolveError {
    pub fn client_not_found(client_id: impl Into<String>) -> Self {
        Self::ClientNotFound { client_id: client_id.into() }
    }

    pub fn invalid_record(client_id: impl Into<String>, field: &'static str) -> Self {
        Self::InvalidRecord { client_id: client_id.into(), field }
    }

    pub fn authority_unavailable(client_id: impl Into<String>, source: AuthorityError) -> Self {
        Self::AuthorityUnavailable { client_id: client_id.into(), source }
    }

    /// The client id the failed lookup was for, if one was supplied
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::InvalidClientId => None,
            Self::ClientNotFound { client_id }
            | Self::InvalidRecord { client_id, .. }
            | Self::AuthorityUnavailable { client_id, .. }
            | Self::Hashing { client_id, .. } => Some(client_id),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ClientNotFound { .. })
    }

    /// Only infrastructure failures are worth retrying; a bad client stays bad.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AuthorityUnavailable { .. })
    }
}
