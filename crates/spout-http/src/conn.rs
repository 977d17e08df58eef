//! Per-connection transport: request-head intake, the conventional
//! response path, and the raw-takeover capability the chunked writer
//! needs.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::HttpError;
use crate::headers::{HeaderMap, CONTENT_LENGTH_HEADER, CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8};

/// Raw duplex I/O for one client connection.
pub trait RawIo: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> RawIo for T {}

// Upper bound on the request head (request line plus headers).
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Read from `io` until the blank line that ends a request head and
/// return the head bytes, terminator included.
pub async fn read_head(io: &mut (impl AsyncRead + Unpin)) -> Result<Vec<u8>, HttpError> {
    let mut head = Vec::with_capacity(1024);
    let mut buf = [0u8; 1024];
    loop {
        let n = io.read(&mut buf).await?;
        if n == 0 {
            return Err(HttpError::Parse("connection closed before request head".to_string()));
        }
        head.extend_from_slice(&buf[..n]);
        if let Some(end) = find_head_end(&head) {
            head.truncate(end);
            return Ok(head);
        }
        if head.len() > MAX_HEAD_BYTES {
            return Err(HttpError::Parse("request head too large".to_string()));
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Write side of one in-flight exchange.
///
/// Headers accumulate in an ordered collection shared by every layer
/// that touches the response; all writes to it are additive. The head
/// goes out exactly once — either through the conventional path here,
/// or manually after [`hijack`](Self::hijack) hands the connection
/// over.
pub struct ResponseChannel {
    io: Option<BufWriter<Box<dyn RawIo>>>,
    headers: HeaderMap,
    head_sent: bool,
}

impl ResponseChannel {
    pub fn new(io: Box<dyn RawIo>) -> Self {
        Self {
            io: Some(BufWriter::new(io)),
            headers: HeaderMap::new(),
            head_sent: false,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Conventional path: status line, accumulated headers, and a
    /// fixed body with a matching `Content-Length`.
    pub async fn respond(&mut self, status: StatusCode, body: &[u8]) -> Result<(), HttpError> {
        self.headers.set(CONTENT_LENGTH_HEADER, body.len().to_string());
        self.write_head(status).await?;
        let io = self.io_mut()?;
        io.write_all(body).await?;
        io.flush().await?;
        Ok(())
    }

    /// Conventional path, headers only. What HEAD requests get.
    pub async fn respond_head(&mut self, status: StatusCode) -> Result<(), HttpError> {
        self.write_head(status).await?;
        self.io_mut()?.flush().await?;
        Ok(())
    }

    /// Plain-text error response on the conventional path.
    pub async fn respond_error(
        &mut self,
        status: StatusCode,
        message: &str,
    ) -> Result<(), HttpError> {
        self.headers.set(CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8);
        self.respond(status, format!("{message}\n").as_bytes()).await
    }

    /// Take exclusive raw control of the connection for manual
    /// framing.
    ///
    /// Refused once the head is committed — past that point the
    /// conventional framing already owns the wire, and the caller can
    /// still fall back to a plain error response.
    pub fn hijack(&mut self) -> Result<RawConn, HttpError> {
        if self.head_sent {
            return Err(HttpError::HijackUnsupported);
        }
        let io = self.io.take().ok_or(HttpError::HijackUnsupported)?;
        Ok(RawConn { io })
    }

    async fn write_head(&mut self, status: StatusCode) -> Result<(), HttpError> {
        let reason = status.canonical_reason().unwrap_or("");
        let mut head = format!("HTTP/1.1 {} {reason}\r\n", status.as_u16()).into_bytes();
        head.extend_from_slice(&self.headers.to_wire());
        head.extend_from_slice(b"\r\n");

        let Some(io) = self.io.as_mut() else {
            return Err(hijacked_error());
        };
        io.write_all(&head).await?;
        self.head_sent = true;
        Ok(())
    }

    fn io_mut(&mut self) -> Result<&mut BufWriter<Box<dyn RawIo>>, HttpError> {
        self.io.as_mut().ok_or_else(hijacked_error)
    }
}

fn hijacked_error() -> HttpError {
    HttpError::Io(io::Error::new(io::ErrorKind::NotConnected, "connection was hijacked"))
}

/// Exclusive raw control of one connection.
///
/// Consuming value: dropping it closes the connection, which is what
/// guarantees the close on every exit path of the manual writer.
pub struct RawConn {
    io: BufWriter<Box<dyn RawIo>>,
}

impl AsyncWrite for RawConn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}
