//! spoutd.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use spout_http::{CorsOptions, ServerConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

/// The `[api]` section: extra response headers and cross-origin
/// policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Extra response headers, applied to every response in order.
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub cors: CorsOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub values: Vec<String>,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Lower into the server's runtime configuration.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            extra_headers: self
                .api
                .headers
                .iter()
                .map(|h| (h.name.clone(), h.values.clone()))
                .collect(),
            cors: self.api.cors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let text = r#"
            [api]
            [[api.headers]]
            name = "Access-Control-Allow-Headers"
            values = ["X-Requested-With"]

            [[api.headers]]
            name = "Server"
            values = ["spoutd"]

            [api.cors]
            allowed_origins = ["http://localhost:3000"]
            allowed_methods = ["GET", "POST"]
            allow_credentials = true
        "#;

        let config: DaemonConfig = toml::from_str(text).unwrap();
        let server = config.server_config();

        assert_eq!(server.extra_headers.len(), 2);
        assert_eq!(server.extra_headers[0].0, "Access-Control-Allow-Headers");
        assert_eq!(server.extra_headers[1].1, vec!["spoutd".to_string()]);
        assert_eq!(
            server.cors.allowed_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
        assert!(server.cors.allow_credentials);
    }

    #[test]
    fn empty_config_is_valid() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        let server = config.server_config();

        assert!(server.extra_headers.is_empty());
        assert_eq!(server.cors.allowed_origins, None);
        assert_eq!(server.cors.allowed_methods, None);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\n[[api.headers]]\nname = \"Server\"\nvalues = [\"spoutd\"]")
            .unwrap();

        let config = DaemonConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.headers.len(), 1);
    }
}
