//! Operator configuration for the API server.

use crate::cors::CorsOptions;

/// Server-level configuration, assembled by the embedding daemon.
///
/// `extra_headers` lands on every response in configuration order.
/// Names colliding with the cross-origin policy's own headers are
/// dropped at assembly time, not here, so the config itself stays as
/// the operator wrote it.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Extra response headers: name → values, applied in order.
    pub extra_headers: Vec<(String, Vec<String>)>,
    /// Cross-origin policy options.
    pub cors: CorsOptions,
}
