use super::DnsRecord;
use std::fmt;

/// Outcome classification carried in the RCODE header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    /// Any other code an upstream may return, kept verbatim.
    Other(u16),
}

impl ResponseCode {
    pub fn to_u16(&self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseCode::NoError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::Other(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Other(code) => write!(f, "RCODE{}", code),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Answer to a single client request.
///
/// `id` always carries the transaction id of the request that produced it.
/// A `NoError` response with no answers (NODATA) is distinct from `NXDomain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResponse {
    pub id: u16,
    pub code: ResponseCode,
    pub answers: Vec<DnsRecord>,
    pub truncated: bool,
}

impl DnsResponse {
    pub fn success(id: u16, answers: Vec<DnsRecord>) -> Self {
        Self {
            id,
            code: ResponseCode::NoError,
            answers,
            truncated: false,
        }
    }

    /// Failure responses never carry answers.
    pub fn failure(id: u16, code: ResponseCode) -> Self {
        Self {
            id,
            code,
            answers: Vec::new(),
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn is_nodata(&self) -> bool {
        self.code.is_success() && self.answers.is_empty()
    }

    pub fn is_nxdomain(&self) -> bool {
        self.code == ResponseCode::NXDomain
    }

    /// Merges per-question responses of one message, in question order.
    ///
    /// All successful: answers are concatenated. Otherwise the first failing
    /// code wins and no answers are returned.
    pub fn combine(id: u16, parts: Vec<DnsResponse>) -> Self {
        if let Some(failed) = parts.iter().find(|p| !p.code.is_success()) {
            return Self::failure(id, failed.code);
        }

        let truncated = parts.iter().any(|p| p.truncated);
        let answers = parts.into_iter().flat_map(|p| p.answers).collect();
        Self::success(id, answers).with_truncated(truncated)
    }
}
