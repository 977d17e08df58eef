//! spout-core — the command domain behind the spout HTTP API.
//!
//! Commands arrive as parsed [`Invocation`]s, run through an
//! [`Invoker`], and come back as [`Outcome`]s carrying exactly one
//! output shape: a materialized value, a raw byte stream, or a live
//! channel of values. The [`marshal`] module turns values and errors
//! into wire bytes for whichever encoding the caller asked for.
//!
//! Transport concerns live elsewhere; nothing in this crate knows
//! about HTTP.

pub mod error;
pub mod invocation;
pub mod invoker;
pub mod marshal;
pub mod options;
pub mod outcome;

pub use error::{CommandError, ErrorClass};
pub use invocation::Invocation;
pub use invoker::Invoker;
pub use marshal::MarshalError;
pub use options::{OptionValue, Options};
pub use outcome::{BoxReader, Outcome, Output, ValueReceiver, ValueSender};
