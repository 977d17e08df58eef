//! Output classification: the resolve-once step between an outcome
//! and the header assembler.

use http::StatusCode;

use spout_core::{ErrorClass, Options, Outcome, Output};

use crate::headers::{Header, APPLICATION_JSON, CHANNEL_OUTPUT_HEADER, STREAM_OUTPUT_HEADER};

/// Header-relevant facts about one outcome, derived exactly once so
/// header assembly and body writing cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusCode,
    /// Content type to send; empty means "send none".
    pub mime: String,
    /// Marker headers exposing the output shape to clients.
    pub markers: Vec<Header>,
}

/// Classify an outcome against the invocation options.
///
/// Raw streams drop the content type entirely so clients sniff the
/// bytes themselves. Channels get marked, and when the caller asked
/// for streamed channels the body is by construction a sequence of
/// JSON objects, so the content type is forced to agree no matter what
/// encoding was requested.
pub fn classify(outcome: &Outcome, options: &Options, mut mime: String) -> Classification {
    let mut markers = Vec::new();

    match outcome.output() {
        Output::Stream(_) => {
            mime = String::new();
            markers.push(Header::new(STREAM_OUTPUT_HEADER, "1"));
        }
        Output::Channel(_) => {
            markers.push(Header::new(CHANNEL_OUTPUT_HEADER, "1"));
            if options.stream_channels() {
                mime = APPLICATION_JSON.to_string();
            }
        }
        Output::Value(_) => {}
    }

    let status = match outcome.error() {
        Some(err) if err.class == ErrorClass::Client => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
        None => StatusCode::OK,
    };

    Classification { status, mime, markers }
}
