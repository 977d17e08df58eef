//! Content-type resolution from the encoding option.

use spout_core::{marshal, Options};

use crate::error::HttpError;

/// Resolve the response content type from the invocation's encoding
/// option.
///
/// A missing option is a server-side configuration failure — parsers
/// are expected to default it. An unknown encoding is not: it resolves
/// to an empty string, and the caller must then send no `Content-Type`
/// at all rather than an empty one.
pub fn guess_mime_type(options: &Options) -> Result<String, HttpError> {
    let Some(encoding) = options.encoding() else {
        return Err(HttpError::Config("no encoding option set".to_string()));
    };
    Ok(mime_for(encoding).to_string())
}

fn mime_for(encoding: &str) -> &'static str {
    match encoding {
        marshal::JSON => "application/json",
        marshal::XML => "application/xml",
        marshal::TEXT => "text/plain",
        _ => "",
    }
}
