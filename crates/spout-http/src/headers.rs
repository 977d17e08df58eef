//! Response headers: the ordered header collection, the wire names
//! this API speaks, and the assembler that merges per-response headers
//! into it.

/// Trailer header carrying a mid-stream failure message.
pub const STREAM_ERROR_HEADER: &str = "X-Stream-Error";
/// Marker: the body is raw stream output, not marshalled values.
pub const STREAM_OUTPUT_HEADER: &str = "X-Stream-Output";
/// Marker: the body is a sequence of independently framed values.
pub const CHANNEL_OUTPUT_HEADER: &str = "X-Chunked-Output";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length";
pub const TRANSFER_ENCODING_HEADER: &str = "Transfer-Encoding";

pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS_HEADER: &str = "Access-Control-Allow-Methods";
pub const ALLOW_CREDENTIALS_HEADER: &str = "Access-Control-Allow-Credentials";

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

// Names the cross-origin policy owns; operator-configured extras under
// these names are dropped so the policy's own decisions always stand.
const RESERVED_CORS_HEADERS: [&str; 3] =
    [ALLOW_ORIGIN_HEADER, ALLOW_METHODS_HEADER, ALLOW_CREDENTIALS_HEADER];

/// Whether `name` is reserved for the cross-origin policy.
pub fn is_reserved_cors_header(name: &str) -> bool {
    RESERVED_CORS_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// An HTTP header as a name-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered collection of HTTP headers.
///
/// Preserves insertion order and supports duplicate header names. All
/// name lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a header, keeping any existing entries under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Header::new(name, value));
    }

    /// Replace every entry under `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|h| !h.name.eq_ignore_ascii_case(&name));
        self.entries.push(Header::new(name, value));
    }

    /// Replace every entry under `name` with one entry per value.
    pub fn set_all(&mut self, name: &str, values: &[String]) {
        self.entries.retain(|h| !h.name.eq_ignore_ascii_case(name));
        for value in values {
            self.entries.push(Header::new(name, value.clone()));
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|h| !h.name.eq_ignore_ascii_case(name));
    }

    /// Get the first header value matching `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Get all header values matching `name`.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Append every entry of `other`, keeping what is already here.
    pub fn merge(&mut self, other: &HeaderMap) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as wire lines, one `Name: value\r\n` per entry.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for h in &self.entries {
            buf.extend_from_slice(h.name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(h.value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        buf
    }
}

impl FromIterator<Header> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Merge the response headers for one classified outcome into
/// `headers`.
///
/// Precedence is fixed: operator extras first (minus reserved
/// cross-origin names), then `Content-Length` when the byte length is
/// known, the output markers, `Content-Type` when one resolved, and
/// finally `Transfer-Encoding: chunked` — always, because every
/// non-HEAD response body goes out chunked.
pub fn assemble(
    headers: &mut HeaderMap,
    extra: &[(String, Vec<String>)],
    markers: &[Header],
    mime: &str,
    length: u64,
) {
    for (name, values) in extra {
        if is_reserved_cors_header(name) {
            continue;
        }
        headers.set_all(name, values);
    }

    if length > 0 {
        headers.set(CONTENT_LENGTH_HEADER, length.to_string());
    }

    for marker in markers {
        headers.set(marker.name.clone(), marker.value.clone());
    }

    // An empty mime means "send none" — the client sniffs raw streams
    // itself.
    if !mime.is_empty() {
        headers.set(CONTENT_TYPE_HEADER, mime);
    }

    headers.set(TRANSFER_ENCODING_HEADER, "chunked");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_are_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert("Content-Type", "text/html");
        assert_eq!(map.get("content-type"), Some("text/html"));
        assert_eq!(map.get("Content-Type"), Some("text/html"));
        assert_eq!(map.get("X-Missing"), None);
    }

    #[test]
    fn duplicate_names_keep_insertion_order() {
        let mut map = HeaderMap::new();
        map.insert("Set-Cookie", "a=1");
        map.insert("Set-Cookie", "b=2");

        assert_eq!(map.get("Set-Cookie"), Some("a=1"));
        assert_eq!(map.get_all("Set-Cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn set_replaces_all_entries() {
        let mut map = HeaderMap::new();
        map.insert("X-Test", "1");
        map.insert("x-test", "2");
        map.set("X-Test", "3");

        assert_eq!(map.get_all("X-Test"), vec!["3"]);
    }

    #[test]
    fn set_all_expands_values() {
        let mut map = HeaderMap::new();
        map.set_all("Access-Control-Allow-Headers", &["X-A".to_string(), "X-B".to_string()]);
        assert_eq!(map.get_all("Access-Control-Allow-Headers"), vec!["X-A", "X-B"]);
    }

    #[test]
    fn to_wire_writes_crlf_lines() {
        let mut map = HeaderMap::new();
        map.insert("Content-Type", "application/json");
        map.insert("Transfer-Encoding", "chunked");

        let wire = map.to_wire();
        assert_eq!(
            wire,
            b"Content-Type: application/json\r\nTransfer-Encoding: chunked\r\n"
        );
    }

    #[test]
    fn reserved_cors_names_match_any_case() {
        assert!(is_reserved_cors_header("Access-Control-Allow-Origin"));
        assert!(is_reserved_cors_header("access-control-allow-methods"));
        assert!(is_reserved_cors_header("ACCESS-CONTROL-ALLOW-CREDENTIALS"));
        assert!(!is_reserved_cors_header("Access-Control-Allow-Headers"));
    }

    // ── assembler ──

    fn extra(pairs: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        pairs
            .iter()
            .map(|(n, vs)| (n.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn assemble_skips_reserved_extras() {
        let mut headers = HeaderMap::new();
        let extras = extra(&[
            ("Access-Control-Allow-Origin", &["http://evil.example"]),
            ("Server", &["spout"]),
        ]);
        assemble(&mut headers, &extras, &[], "", 0);

        assert_eq!(headers.get("Access-Control-Allow-Origin"), None);
        assert_eq!(headers.get("Server"), Some("spout"));
        assert_eq!(headers.get("Transfer-Encoding"), Some("chunked"));
    }

    #[test]
    fn assemble_sets_length_only_when_known() {
        let mut headers = HeaderMap::new();
        assemble(&mut headers, &[], &[], "application/json", 0);
        assert_eq!(headers.get("Content-Length"), None);

        let mut headers = HeaderMap::new();
        assemble(&mut headers, &[], &[], "application/json", 2391);
        assert_eq!(headers.get("Content-Length"), Some("2391"));
    }

    #[test]
    fn assemble_omits_empty_content_type() {
        let mut headers = HeaderMap::new();
        let markers = vec![Header::new(STREAM_OUTPUT_HEADER, "1")];
        assemble(&mut headers, &[], &markers, "", 0);

        assert_eq!(headers.get("Content-Type"), None);
        assert_eq!(headers.get(STREAM_OUTPUT_HEADER), Some("1"));
        assert_eq!(headers.get("Transfer-Encoding"), Some("chunked"));
    }

    #[test]
    fn assemble_always_ends_chunked() {
        let mut headers = HeaderMap::new();
        assemble(&mut headers, &[], &[], "text/plain", 12);

        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Content-Length", "Content-Type", "Transfer-Encoding"]);
    }
}
