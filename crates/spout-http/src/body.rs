//! Response body sources.
//!
//! The chunked writer pulls every body through one stream contract
//! that keeps three conditions distinct: `Some(Ok(bytes))` is data for
//! the wire (an empty buffer means "nothing yet" and is skipped, never
//! terminal), `None` is the explicit end of the source, and
//! `Some(Err(_))` is a source failure remembered for the trailer.
//! [`response_body`] adapts the three output shapes onto that
//! contract.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::io::{AsyncRead, ReadBuf};

use spout_core::{marshal, BoxReader, Outcome, Output, ValueReceiver};

use crate::error::HttpError;

/// Fixed buffer size for the raw-stream read loop (32 KB).
pub const READ_BUF_SIZE: usize = 32 * 1024;

/// A type-erased, fallible async stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, SourceError>> + Send>>;

/// Failure reported by a body source after streaming began.
///
/// Only the message survives to the client, as the error trailer; the
/// status code is already on the wire by the time one of these shows
/// up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Build the response body stream for an outcome.
///
/// A terminal command error replaces the output entirely — its
/// marshalled form is the body the client reads alongside the 4xx/5xx
/// status. Value outputs marshal up front, so their failures surface
/// here, while the response can still be a conventional 500.
pub fn response_body(outcome: Outcome, encoding: &str) -> Result<ByteStream, HttpError> {
    let (error, output, _) = outcome.into_parts();

    if let Some(err) = error {
        let body = marshal::marshal_error(&err, encoding);
        return Ok(Box::pin(OnceStream(Some(body))));
    }

    match output {
        Output::Stream(reader) => Ok(Box::pin(ReaderStream::new(reader))),
        Output::Channel(receiver) => Ok(Box::pin(ChannelStream::new(receiver))),
        Output::Value(value) => {
            let body = marshal::marshal_value(&value, encoding)?;
            Ok(Box::pin(OnceStream(Some(body))))
        }
    }
}

/// Pulls a raw byte reader through the fixed-size buffer, one read per
/// stream item.
pub(crate) struct ReaderStream {
    reader: BoxReader,
    buf: Box<[u8]>,
    done: bool,
}

impl ReaderStream {
    pub fn new(reader: BoxReader) -> Self {
        Self {
            reader,
            buf: vec![0u8; READ_BUF_SIZE].into_boxed_slice(),
            done: false,
        }
    }
}

impl Stream for ReaderStream {
    type Item = Result<Bytes, SourceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let mut read_buf = ReadBuf::new(&mut this.buf);
        match Pin::new(&mut this.reader).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    this.done = true;
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
                }
            }
            Poll::Ready(Err(err)) => {
                this.done = true;
                Poll::Ready(Some(Err(SourceError::from(err))))
            }
        }
    }
}

/// Serializes each channel value as its own chunk-sized JSON object.
pub(crate) struct ChannelStream {
    receiver: ValueReceiver,
    done: bool,
}

impl ChannelStream {
    pub fn new(receiver: ValueReceiver) -> Self {
        Self { receiver, done: false }
    }
}

impl Stream for ChannelStream {
    type Item = Result<Bytes, SourceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.receiver.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(value))) => match serde_json::to_vec(&value) {
                Ok(buf) => Poll::Ready(Some(Ok(Bytes::from(buf)))),
                Err(err) => {
                    this.done = true;
                    Poll::Ready(Some(Err(SourceError::new(format!(
                        "value encoding failed: {err}"
                    )))))
                }
            },
            Poll::Ready(Some(Err(err))) => {
                this.done = true;
                Poll::Ready(Some(Err(SourceError::new(err.message))))
            }
        }
    }
}

/// Yields a single buffered payload then ends.
pub(crate) struct OnceStream(pub Option<Bytes>);

impl Stream for OnceStream {
    type Item = Result<Bytes, SourceError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().0.take().map(Ok))
    }
}
