use crate::ResponseCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Failed to bind DNS listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Malformed DNS message: {0}")]
    Decode(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(u16),

    #[error("Unsupported query class: {0}")]
    UnsupportedClass(u16),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport error talking to {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("Undecodable reply from upstream: {0}")]
    UpstreamFormat(String),

    #[error("Upstream answered {code}")]
    UpstreamRefused { code: ResponseCode },
}

impl DomainError {
    pub fn transport(server: impl ToString, reason: impl ToString) -> Self {
        DomainError::Transport {
            server: server.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Response code a client sees when its query fails with this error.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            DomainError::Decode(_) | DomainError::InvalidDomainName(_) => ResponseCode::FormErr,
            DomainError::UnsupportedRecordType(_) | DomainError::UnsupportedClass(_) => {
                ResponseCode::NotImp
            }
            DomainError::UpstreamRefused { code } => *code,
            DomainError::Bind { .. }
            | DomainError::QueryTimeout
            | DomainError::Transport { .. }
            | DomainError::UpstreamFormat(_) => ResponseCode::ServFail,
        }
    }

    /// Short status label used in query logs.
    pub fn status(&self) -> &'static str {
        match self {
            DomainError::QueryTimeout => "TIMEOUT",
            DomainError::Transport { .. } => "TRANSPORT",
            DomainError::UpstreamFormat(_) => "UPSTREAM_FORMERR",
            other => other.response_code().as_str(),
        }
    }
}
