//! Error taxonomy for the HTTP surface.

use http::StatusCode;
use thiserror::Error;

/// Failures raised while turning a request into a response, all of
/// them before the response head is committed. Each maps onto a
/// conventional status code. Failures after the head is on the wire
/// are a different animal and fold into the chunked trailer instead
/// (see [`chunked`](crate::chunked)).
///
/// Display text doubles as the response body for the conventional
/// error path, so variants render their bare message.
#[derive(Debug, Error)]
pub enum HttpError {
    /// No command matched the request target.
    #[error("404 page not found")]
    NotFound,

    /// The request could not be parsed into an invocation.
    #[error("{0}")]
    Parse(String),

    /// Server-side misconfiguration, e.g. no encoding option set or no
    /// marshaller for the requested encoding.
    #[error("{0}")]
    Config(String),

    /// The connection cannot be taken over for manual framing.
    #[error("connection does not support raw takeover")]
    HijackUnsupported,

    /// Transport-level I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// Status this error maps to on the conventional response path.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::Parse(_) => StatusCode::BAD_REQUEST,
            HttpError::Config(_) | HttpError::HijackUnsupported | HttpError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<spout_core::MarshalError> for HttpError {
    fn from(err: spout_core::MarshalError) -> Self {
        HttpError::Config(err.to_string())
    }
}
