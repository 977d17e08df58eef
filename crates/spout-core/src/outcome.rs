//! What an invocation produced.
//!
//! An [`Outcome`] is the engine's whole answer: a terminal error (or
//! not), exactly one output shape, and an optional known length. The
//! output is not replayable — streams and channels are consumed once
//! by whoever writes the response.

use std::fmt;

use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::error::CommandError;

/// Type-erased raw byte source for stream outputs.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Receiver half of a live value channel. Each item is either the next
/// value or the failure that ended the command mid-emission.
pub type ValueReceiver = mpsc::Receiver<Result<Value, CommandError>>;

/// Sender half handed to running commands.
pub type ValueSender = mpsc::Sender<Result<Value, CommandError>>;

/// The single output shape of an outcome.
pub enum Output {
    /// Finite raw byte stream, e.g. file contents.
    Stream(BoxReader),
    /// Open channel of discrete values, emitted while the command runs.
    Channel(ValueReceiver),
    /// One already-materialized value.
    Value(Value),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stream(_) => f.write_str("Stream(..)"),
            Output::Channel(_) => f.write_str("Channel(..)"),
            Output::Value(v) => write!(f, "Value({v})"),
        }
    }
}

/// Result object of a completed (or failed) invocation.
#[derive(Debug)]
pub struct Outcome {
    error: Option<CommandError>,
    output: Output,
    length: u64,
}

impl Outcome {
    /// Outcome carrying one materialized value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self { error: None, output: Output::Value(value.into()), length: 0 }
    }

    /// Outcome streaming raw bytes from `reader`.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self { error: None, output: Output::Stream(Box::new(reader)), length: 0 }
    }

    /// Outcome emitting values over a live channel.
    pub fn channel(receiver: ValueReceiver) -> Self {
        Self { error: None, output: Output::Channel(receiver), length: 0 }
    }

    /// Outcome that failed before producing output. The error becomes
    /// the response body.
    pub fn failed(error: CommandError) -> Self {
        Self { error: Some(error), output: Output::Value(Value::Null), length: 0 }
    }

    /// Attach a known byte length (0 means unknown).
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    pub fn error(&self) -> Option<&CommandError> {
        self.error.as_ref()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Take the outcome apart for response writing.
    pub fn into_parts(self) -> (Option<CommandError>, Output, u64) {
        (self.error, self.output, self.length)
    }
}
