//! spout-http — HTTP/1.1 surface for streamed command output.
//!
//! Adapts command outcomes — a materialized value, a raw byte stream,
//! or a live channel of values — onto manually framed chunked HTTP/1.1
//! responses. Status codes only exist before the first body byte;
//! after that, a failing source can reach the client solely through
//! the sanitized `X-Stream-Error` trailer appended behind the terminal
//! chunk.
//!
//! # Architecture
//!
//! ```text
//! client
//!   │
//!   ▼
//! ApiServer ─ task per connection
//!   ├── read + parse request head
//!   ├── Handler ─ cross-origin policy first; preflights answered here
//!   ├── RequestParser → Invoker → Outcome
//!   ├── mime resolution → classification → header assembly
//!   ▼
//! write_chunked ─ connection taken over: status line, headers,
//! hex-framed chunks (flush each), terminal chunk, error trailer,
//! close
//! ```
//!
//! The conventional response path (404, 400, 500, preflights, HEAD)
//! never takes the connection over and keeps ordinary framing.

pub mod body;
pub mod chunked;
pub mod classify;
pub mod config;
pub mod conn;
pub mod cors;
pub mod error;
pub mod handler;
pub mod headers;
pub mod mime;
pub mod request;
pub mod server;

pub use body::{response_body, ByteStream, SourceError, READ_BUF_SIZE};
pub use chunked::{write_chunked, WriteError};
pub use classify::{classify, Classification};
pub use config::ServerConfig;
pub use conn::{RawConn, RawIo, ResponseChannel};
pub use cors::{CorsDecision, CorsOptions, CorsPolicy};
pub use error::HttpError;
pub use handler::{ApiHandler, Handler};
pub use headers::{Header, HeaderMap};
pub use mime::guess_mime_type;
pub use request::{parse_head, HttpRequest, RequestParser};
pub use server::ApiServer;
