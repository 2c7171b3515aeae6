use thiserror::Error;

/// Failure classes for RJN Clarity operations.
///
/// `InvalidArgument` marks a bug at the call site and is never worth retrying.
/// Every other variant is operational: the upstream API or the network
/// misbehaved, and the caller decides whether the next scheduled cycle should
/// try again.
#[derive(Debug, Error)]
pub enum RjnError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("authentication failed: incorrect credentials for RJN Clarity")]
    AuthFailed,
    #[error("RJN Clarity returned HTTP {status}")]
    Http { status: u16 },
    #[error("empty response from RJN auth endpoint")]
    EmptyResponse,
    #[error("expected JSON but got: {body_prefix}")]
    MalformedResponse { body_prefix: String },
    #[error("login succeeded but no token found in response")]
    MissingToken,
    #[error("network error talking to RJN Clarity")]
    Network(#[source] reqwest::Error),
    #[error("request to RJN Clarity failed")]
    Request(#[source] reqwest::Error),
}

impl RjnError {
    /// True for failures expected to clear on their own (connect, timeout,
    /// TLS handshake). Auth and HTTP errors usually mean misconfiguration.
    pub fn is_transient(&self) -> bool {
        matches!(self, RjnError::Network(_))
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            RjnError::Network(err)
        } else {
            RjnError::Request(err)
        }
    }
}
