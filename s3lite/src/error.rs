use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Result type of every object operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type of object operations.
///
/// Built once where a response comes back from the network; callers only
/// need to match on [`Error::kind`].
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    code: Option<String>,
    message: String,
    request_id: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The object (or bucket) does not exist.
    ObjectNotFound,
    /// The service rejected our credentials or signature (401 / 403).
    AuthorizationFailure,
    /// No response was received.
    TransportFailure,
    /// The service answered with something we can't accept.
    ProtocolFailure,
    /// The request could not be built or signed.
    RequestInvalid,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            code: None,
            message: message.into(),
            request_id: None,
            source: None,
        }
    }

    /// Set the HTTP status of the response.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the vendor error code, like `NoSuchKey`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the request id reported by the service.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Vendor error code, if the service sent one.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Request id reported by the service.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Check if this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::ObjectNotFound
    }
}

// Convenience constructors
impl Error {
    /// Create an object not found error
    pub fn object_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ObjectNotFound, message)
    }

    /// Create an authorization failure error
    pub fn authorization_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthorizationFailure, message)
    }

    /// Create a transport failure error
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailure, message)
    }

    /// Create a protocol failure error
    pub fn protocol_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolFailure, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ObjectNotFound => write!(f, "object not found"),
            ErrorKind::AuthorizationFailure => write!(f, "authorization failure"),
            ErrorKind::TransportFailure => write!(f, "transport failure"),
            ErrorKind::ProtocolFailure => write!(f, "protocol failure"),
            ErrorKind::RequestInvalid => write!(f, "request invalid"),
        }
    }
}

/// Errors raised while building or signing a request.
impl From<s3lite_core::Error> for Error {
    fn from(err: s3lite_core::Error) -> Self {
        Self::request_invalid(err.message().to_string()).with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid("failed to build http request").with_source(err)
    }
}
