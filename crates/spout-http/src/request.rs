//! Inbound request head and the request-parsing contract.

use http::Method;

use spout_core::Invocation;

use crate::error::HttpError;
use crate::headers::HeaderMap;

/// A parsed request head.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Raw request target: path plus optional query.
    pub target: String,
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Path portion of the target.
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }

    /// Query portion of the target, when present.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// First value of `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Parse raw head bytes (through the blank line) into a request.
pub fn parse_head(head: &[u8]) -> Result<HttpRequest, HttpError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| HttpError::Parse("request head is not valid utf-8".to_string()))?;

    let mut lines = text.split("\r\n");
    let request_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| HttpError::Parse("empty request".to_string()))?;

    let mut parts = request_line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Parse(format!("malformed request line {request_line:?}")));
    };
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(HttpError::Parse(format!("unsupported protocol version {version:?}")));
    }
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| HttpError::Parse(format!("invalid method {method:?}")))?;

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            return Err(HttpError::Parse("header folding not supported".to_string()));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(HttpError::Parse(format!("malformed header line {line:?}")));
        };
        if name.is_empty() || name.ends_with(' ') {
            return Err(HttpError::Parse(format!("malformed header name {name:?}")));
        }
        headers.insert(name, value.trim());
    }

    Ok(HttpRequest { method, target: target.to_string(), headers })
}

/// Turns an inbound request into a structured invocation.
///
/// `NotFound` and `Parse` results come back to the client through the
/// conventional 404/400 path; everything downstream of a successful
/// parse sees only the invocation.
pub trait RequestParser: Send + Sync {
    fn parse(&self, request: &HttpRequest) -> Result<Invocation, HttpError>;
}
