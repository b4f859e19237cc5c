use std::fmt;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Errors reported by the PLM core.
///
/// `CommandFailure` doubles as a protocol signal: the all-link enumeration
/// ends on it and callers may match on it without inspecting strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    CommandFailure,
    Decode(String),
    TransportFailed(String),
    Cancelled,
    DeadlineExceeded,
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CommandFailure => write!(f, "the modem signalled command failure"),
            Error::Decode(msg) => write!(f, "decode error: {}", msg),
            Error::TransportFailed(msg) => write!(f, "transport failed: {}", msg),
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::DeadlineExceeded => write!(f, "deadline exceeded"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::TransportFailed(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Error {
        Error::DeadlineExceeded
    }
}
