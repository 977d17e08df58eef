//! The request pipeline and its CORS-aware front door.
//!
//! [`Handler`] is explicit composition, not middleware: the
//! cross-origin policy runs first on every request and may answer a
//! preflight without the pipeline ever seeing it. Otherwise its
//! headers land in the shared outgoing collection and [`ApiHandler`]
//! takes over — parse, invoke, classify, assemble, write.

use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{debug, error};

use spout_core::{marshal, Invoker, Options, Outcome};

use crate::body::response_body;
use crate::chunked::{write_chunked, WriteError};
use crate::classify::classify;
use crate::config::ServerConfig;
use crate::conn::ResponseChannel;
use crate::cors::{CorsDecision, CorsPolicy};
use crate::error::HttpError;
use crate::headers::{assemble, CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8};
use crate::mime::guess_mime_type;
use crate::request::{HttpRequest, RequestParser};

/// The inner pipeline: parse, invoke, respond.
pub struct ApiHandler {
    parser: Arc<dyn RequestParser>,
    invoker: Arc<dyn Invoker>,
    config: Arc<ServerConfig>,
}

impl ApiHandler {
    pub fn new(
        parser: Arc<dyn RequestParser>,
        invoker: Arc<dyn Invoker>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self { parser, invoker, config }
    }

    async fn handle(&self, request: HttpRequest, channel: &mut ResponseChannel) {
        let invocation = match self.parser.parse(&request) {
            Ok(invocation) => invocation,
            Err(err) => {
                // Parse failures carry the bare message as the body, no
                // trailing newline.
                let status = err.status();
                channel.headers_mut().set(CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8);
                if let Err(write_err) = channel.respond(status, err.to_string().as_bytes()).await
                {
                    error!(error = %write_err, "failed to write parse error");
                }
                return;
            }
        };

        debug!(command = ?invocation.command, "invoking command");
        let options = invocation.options.clone();
        let outcome = self.invoker.invoke(invocation).await;
        send_response(&request, outcome, &options, channel, &self.config).await;
    }
}

/// Front door: cross-origin policy wrapped around the pipeline.
pub struct Handler {
    inner: ApiHandler,
    cors: CorsPolicy,
}

impl Handler {
    pub fn new(
        parser: Arc<dyn RequestParser>,
        invoker: Arc<dyn Invoker>,
        config: ServerConfig,
    ) -> Self {
        let cors = CorsPolicy::new(&config.cors);
        Self { inner: ApiHandler::new(parser, invoker, Arc::new(config)), cors }
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: HttpRequest, channel: &mut ResponseChannel) {
        debug!(method = %request.method, target = %request.target, "incoming API request");

        match self.cors.evaluate(&request) {
            CorsDecision::Preflight(headers) => {
                channel.headers_mut().merge(&headers);
                if let Err(err) = channel.respond(StatusCode::OK, b"").await {
                    error!(error = %err, "failed to answer preflight");
                }
            }
            CorsDecision::Forward(headers) => {
                channel.headers_mut().merge(&headers);
                self.inner.handle(request, channel).await;
            }
        }
    }
}

/// Adapt one outcome onto the wire.
async fn send_response(
    request: &HttpRequest,
    outcome: Outcome,
    options: &Options,
    channel: &mut ResponseChannel,
    config: &ServerConfig,
) {
    let mime = match guess_mime_type(options) {
        Ok(mime) => mime,
        Err(err) => {
            respond_error(channel, err).await;
            return;
        }
    };
    // The encoding option is necessarily set once the mime lookup
    // succeeded.
    let encoding = options.encoding().unwrap_or(marshal::JSON);

    let classification = classify(&outcome, options, mime);
    let length = outcome.length();

    let mut body = match response_body(outcome, encoding) {
        Ok(body) => body,
        Err(err) => {
            respond_error(channel, err).await;
            return;
        }
    };

    assemble(
        channel.headers_mut(),
        &config.extra_headers,
        &classification.markers,
        &classification.mime,
        length,
    );

    // HEAD gets the full header picture and nothing else; the
    // connection is never taken over.
    if request.method == Method::HEAD {
        if let Err(err) = channel.respond_head(classification.status).await {
            error!(error = %err, "failed to write response head");
        }
        return;
    }

    let conn = match channel.hijack() {
        Ok(conn) => conn,
        Err(err) => {
            error!(error = %err, "cannot take over connection for streaming");
            respond_error(channel, err).await;
            return;
        }
    };

    match write_chunked(conn, classification.status, channel.headers(), &mut body).await {
        Ok(()) => {}
        Err(WriteError::Source(err)) => error!(error = %err, "error while writing stream"),
        Err(WriteError::Transport(err)) => error!(error = %err, "connection failed mid-stream"),
    }
}

async fn respond_error(channel: &mut ResponseChannel, err: HttpError) {
    if let Err(write_err) = channel.respond_error(err.status(), &err.to_string()).await {
        error!(error = %write_err, "failed to write error response");
    }
}
