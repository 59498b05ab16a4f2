
/// Errors from the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The stored token cannot be sent as a header value.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Reading an upload or touching the token file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes used to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// `401`: the session was invalidated and the user must log in again.
    Authentication,
    /// Any other `4xx`: the request was refused as sent.
    Rejected,
    /// `5xx`: the backend failed; the user may re-trigger the action.
    Server,
    /// The request never produced a response.
    Transport,
    /// A local problem before anything was sent.
    Local,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Api { status, .. } => match *status {
                401 => ErrorKind::Authentication,
                400..=499 => ErrorKind::Rejected,
                _ => ErrorKind::Server,
            },
            ClientError::Request(_) => ErrorKind::Transport,
            ClientError::InvalidHeader(_) | ClientError::Io(_) => ErrorKind::Local,
        }
    }
}
