//! The accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::conn::{read_head, ResponseChannel};
use crate::handler::Handler;
use crate::headers::{CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8};
use crate::request::parse_head;

/// HTTP API server: accepts connections and hands each one to the
/// front door on its own task.
pub struct ApiServer {
    listener: TcpListener,
    handler: Arc<Handler>,
}

impl ApiServer {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr, handler: Handler) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind API server on {addr}"))?;
        Ok(Self { listener, handler: Arc::new(handler) })
    }

    /// The bound address, useful after binding port 0.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the shutdown signal flips.
    ///
    /// One task per connection; each task owns its connection
    /// exclusively from accept to close. Responses close the
    /// connection, so there is no keep-alive bookkeeping.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(addr = %self.listener.local_addr()?, "API server listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = accepted.context("accept failed")?;
                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, handler).await;
                    });
                }
                _ = shutdown.changed() => {
                    info!("API server shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Read one request, respond, close.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, handler: Arc<Handler>) {
    // Chunk boundaries should hit the wire as they are written.
    let _ = stream.set_nodelay(true);

    let mut stream = stream;
    let head = match read_head(&mut stream).await {
        Ok(head) => head,
        Err(err) => {
            debug!(%peer_addr, error = %err, "failed to read request head");
            return;
        }
    };

    let mut channel = ResponseChannel::new(Box::new(stream));
    match parse_head(&head) {
        Ok(request) => handler.handle(request, &mut channel).await,
        Err(err) => {
            let status = err.status();
            channel.headers_mut().set(CONTENT_TYPE_HEADER, TEXT_PLAIN_UTF8);
            if let Err(write_err) = channel.respond(status, err.to_string().as_bytes()).await {
                debug!(%peer_addr, error = %write_err, "failed to write parse failure");
            }
        }
    }
}
