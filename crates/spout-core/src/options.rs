//! Typed invocation options.
//!
//! Options arrive with a parsed invocation and are read back by the
//! response pipeline when it decides how to encode and frame the
//! output. Lookups are by option name; values keep the type they were
//! parsed with.

use std::collections::HashMap;

/// Option naming the response encoding (`json`, `xml`, `text`).
pub const ENCODING: &str = "encoding";

/// Option asking for channel output to be streamed as it is produced.
pub const STREAM_CHANNELS: &str = "stream-channels";

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Name → value map attached to an invocation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    values: HashMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Text value of `name`, if present and textual.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The requested response encoding, when one was set.
    pub fn encoding(&self) -> Option<&str> {
        self.get_str(ENCODING)
    }

    /// Whether channel output should stream; absent means no.
    pub fn stream_channels(&self) -> bool {
        self.get_bool(STREAM_CHANNELS).unwrap_or(false)
    }
}
