use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("malformed note-store URL : {0}")]
    BadEndpoint(String),
}

/// Failures of the three-legged authorization flow itself, as opposed to
/// failures of the signed exchanges it performs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("temporary credentials may only be exchanged for token credentials once")]
    AlreadyExchanged,
    #[error("content owner did not authorize the temporary credentials")]
    Declined,
    #[error("session has no token credentials")]
    NotAuthenticated,
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}

/// Broad classification of a remote-call failure.
///
/// The note-store service reports system-level, user-level and not-found
/// conditions through distinct wire shapes; anything else (including local
/// validation failures) lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    System,
    User,
    NotFound,
    Other,
}

/// A remote-call failure in normalized form: an optional structured error
/// code, the offending parameter if the service named one, and a free-form
/// message.
#[derive(Error, Debug, Clone)]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub code: Option<i32>,
    pub parameter: Option<String>,
    pub message: Option<String>,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, code: i32, parameter: impl Into<String>) -> Self {
        ServiceError {
            kind,
            code: Some(code),
            parameter: Some(parameter.into()),
            message: None,
        }
    }

    /// A failure with no structured code, e.g. a transport error or a local
    /// validation failure.
    pub fn other(message: impl Into<String>) -> Self {
        ServiceError {
            kind: ServiceErrorKind::Other,
            code: None,
            parameter: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.and_then(error_code_name), self.code) {
            (Some(name), _) => {
                write!(f, "{}: {}", name, self.parameter.as_deref().unwrap_or_default())
            }
            (None, Some(code)) => {
                write!(f, "{}: {}", code, self.message.as_deref().unwrap_or_default())
            }
            (None, None) => f.write_str(self.message.as_deref().unwrap_or_default()),
        }
    }
}

/// The note-store service's structured error codes, by wire value.
pub fn error_code_name(code: i32) -> Option<&'static str> {
    Some(match code {
        1 => "UNKNOWN",
        2 => "BAD_DATA_FORMAT",
        3 => "PERMISSION_DENIED",
        4 => "INTERNAL_ERROR",
        5 => "DATA_REQUIRED",
        6 => "LIMIT_REACHED",
        7 => "QUOTA_REACHED",
        8 => "INVALID_AUTH",
        9 => "AUTH_EXPIRED",
        10 => "DATA_CONFLICT",
        11 => "ENML_VALIDATION",
        12 => "SHARD_UNAVAILABLE",
        13 => "LEN_TOO_SHORT",
        14 => "LEN_TOO_LONG",
        15 => "TOO_FEW",
        16 => "TOO_MANY",
        17 => "UNSUPPORTED_OPERATION",
        18 => "TAKEN_DOWN",
        19 => "RATE_LIMIT_REACHED",
        _ => return None,
    })
}

/// Collapse any remote-call failure into the single last-error string the
/// presentation layer consumes.
///
/// Known structured codes render by name with the offending parameter,
/// unknown codes render numerically with the message, and every other
/// failure shape falls back to its display form.
pub fn normalize(operation: &str, err: &Error) -> String {
    match err {
        Error::Service(service) => format!("{} error: {}", operation, service),
        other => format!("{} error: {}", operation, other),
    }
}
