//! Manual chunked-transfer response writing.
//!
//! Once streaming starts the status code is history: a source that
//! fails mid-body can only report through the `X-Stream-Error` trailer
//! appended after the terminal chunk. The writer therefore owns the
//! raw connection for the rest of the exchange and emits every frame
//! itself — status line, header block, one hex-framed chunk per body
//! buffer with a flush after each, terminal chunk, trailer, closing
//! blank line.

use std::future::poll_fn;

use http::StatusCode;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::body::{ByteStream, SourceError};
use crate::headers::{HeaderMap, STREAM_ERROR_HEADER};

/// How a chunked write ended, when not cleanly.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The body source failed. The failure went out as the trailer, so
    /// the response on the wire is still syntactically complete.
    #[error("body source failed: {0}")]
    Source(SourceError),

    /// The connection failed mid-write. The response is truncated and
    /// no trailer was possible.
    #[error("connection failed mid-write: {0}")]
    Transport(#[from] std::io::Error),
}

/// Write one complete chunked HTTP/1.1 response onto `conn`.
///
/// Consumes the connection; every exit path drops it, which closes the
/// socket and with it the response. A [`WriteError::Source`] return
/// means the client nevertheless received a well-formed response
/// ending in the error trailer.
pub async fn write_chunked<W>(
    mut conn: W,
    status: StatusCode,
    headers: &HeaderMap,
    body: &mut ByteStream,
) -> Result<(), WriteError>
where
    W: AsyncWrite + Unpin,
{
    let reason = status.canonical_reason().unwrap_or("");
    conn.write_all(format!("HTTP/1.1 {} {reason}\r\n", status.as_u16()).as_bytes()).await?;
    conn.write_all(&headers.to_wire()).await?;
    conn.write_all(b"\r\n").await?;

    let source_err = copy_chunks(&mut conn, body).await?;

    conn.write_all(b"0\r\n").await?;
    if let Some(err) = &source_err {
        let line = format!("{STREAM_ERROR_HEADER}: {}\r\n", sanitized_message(err));
        conn.write_all(line.as_bytes()).await?;
    }
    conn.write_all(b"\r\n").await?;
    conn.flush().await?;

    match source_err {
        Some(err) => Err(WriteError::Source(err)),
        None => Ok(()),
    }
}

/// Copy body chunks onto the wire until the source ends or fails.
///
/// A source failure is remembered and handed back for the trailer. A
/// write failure aborts immediately — the connection is gone, so no
/// trailer can reach the client anyway.
async fn copy_chunks<W>(
    conn: &mut W,
    body: &mut ByteStream,
) -> Result<Option<SourceError>, std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    loop {
        match poll_fn(|cx| body.as_mut().poll_next(cx)).await {
            Some(Ok(chunk)) => {
                // Empty means "nothing yet", not end-of-source.
                if chunk.is_empty() {
                    continue;
                }
                trace!(len = chunk.len(), "writing body chunk");
                conn.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await?;
                conn.write_all(&chunk).await?;
                conn.write_all(b"\r\n").await?;
                // Flush per chunk so live output is observable as it
                // is produced.
                conn.flush().await?;
            }
            Some(Err(err)) => return Ok(Some(err)),
            None => return Ok(None),
        }
    }
}

/// One-line form of a source error message, safe for a header line.
///
/// Everything from the first CR or LF onward is dropped; raw control
/// bytes must never reach the header stream.
fn sanitized_message(err: &SourceError) -> String {
    let message = err.message();
    let cut = message.find(['\r', '\n']).unwrap_or(message.len());
    message[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use tokio::io::{duplex, AsyncReadExt};

    fn body_of(items: Vec<Result<Bytes, SourceError>>) -> ByteStream {
        Box::pin(stream::iter(items))
    }

    fn headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("Content-Type", "application/json");
        h.insert("Transfer-Encoding", "chunked");
        h
    }

    /// Runs a write against an in-memory duplex and returns everything
    /// that reached the other side.
    async fn run_write(
        status: StatusCode,
        headers: HeaderMap,
        mut body: ByteStream,
    ) -> (Result<(), WriteError>, Vec<u8>) {
        let (client, server) = duplex(64 * 1024);
        let reader = tokio::spawn(async move {
            let mut client = client;
            let mut buf = Vec::new();
            client.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let result = write_chunked(server, status, &headers, &mut body).await;
        let wire = reader.await.unwrap();
        (result, wire)
    }

    #[tokio::test]
    async fn clean_body_frames_every_chunk() {
        let body = body_of(vec![
            Ok(Bytes::from_static(b"hello worl")),
            Ok(Bytes::from_static(b"d!")),
        ]);
        let (result, wire) = run_write(StatusCode::OK, headers(), body).await;

        assert!(result.is_ok());
        assert_eq!(
            wire,
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: application/json\r\n\
              Transfer-Encoding: chunked\r\n\
              \r\n\
              a\r\nhello worl\r\n\
              2\r\nd!\r\n\
              0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn empty_items_are_skipped_not_terminal() {
        let body = body_of(vec![
            Ok(Bytes::from_static(b"0123456789")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"abcde")),
        ]);
        let (result, wire) = run_write(StatusCode::OK, HeaderMap::new(), body).await;

        assert!(result.is_ok());
        assert_eq!(
            wire,
            b"HTTP/1.1 200 OK\r\n\r\na\r\n0123456789\r\n5\r\nabcde\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn empty_body_still_gets_terminal_chunk() {
        let body = body_of(vec![]);
        let (result, wire) = run_write(StatusCode::OK, HeaderMap::new(), body).await;

        assert!(result.is_ok());
        assert_eq!(wire, b"HTTP/1.1 200 OK\r\n\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn source_failure_becomes_sanitized_trailer() {
        let body = body_of(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(SourceError::new("boom\r\ndata: leaked")),
        ]);
        let (result, wire) = run_write(StatusCode::OK, HeaderMap::new(), body).await;

        assert!(matches!(result, Err(WriteError::Source(_))));
        assert_eq!(
            wire,
            b"HTTP/1.1 200 OK\r\n\r\n7\r\npartial\r\n0\r\nX-Stream-Error: boom\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn immediate_failure_sends_trailer_only_body() {
        let body = body_of(vec![Err(SourceError::new("no link named x"))]);
        let (result, wire) = run_write(StatusCode::OK, HeaderMap::new(), body).await;

        assert!(matches!(result, Err(WriteError::Source(_))));
        assert_eq!(
            wire,
            b"HTTP/1.1 200 OK\r\n\r\n0\r\nX-Stream-Error: no link named x\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn dead_connection_is_a_transport_error() {
        let (client, server) = duplex(16);
        drop(client);

        let mut body = body_of(vec![Ok(Bytes::from_static(b"data"))]);
        let result = write_chunked(server, StatusCode::OK, &HeaderMap::new(), &mut body).await;

        assert!(matches!(result, Err(WriteError::Transport(_))));
    }

    #[test]
    fn sanitize_cuts_at_first_control_byte() {
        let cut = |s: &str| sanitized_message(&SourceError::new(s));
        assert_eq!(cut("plain message"), "plain message");
        assert_eq!(cut("first\nsecond"), "first");
        assert_eq!(cut("first\r\nsecond"), "first");
        assert_eq!(cut("first\rsecond"), "first");
        assert_eq!(cut("\r\nall gone"), "");
    }
}
