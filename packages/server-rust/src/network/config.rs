//! Network configuration types for the Apples server.

use std::time::Duration;

/// Top-level network configuration for the server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Port clients reach the server on when it sits behind a proxy or port
    /// mapping. Only used for the startup log line; defaults to the bound port.
    pub external_port: Option<u16>,
    /// Prefix every API route is mounted under (e.g. `/v1`). Empty for none.
    pub path_prefix: String,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            external_port: None,
            path_prefix: String::new(),
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// Returns the path prefix with a single leading slash and no trailing
    /// slash, or an empty string when routes are mounted at the root.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.path_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// URL of the Swagger UI as seen by clients.
    #[must_use]
    pub fn docs_url(&self, bound_port: u16) -> String {
        let port = self.external_port.unwrap_or(bound_port);
        format!("http://localhost:{port}{}/docs", self.normalized_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert!(config.external_port.is_none());
        assert!(config.path_prefix.is_empty());
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn prefix_normalization() {
        let with = |prefix: &str| NetworkConfig {
            path_prefix: prefix.to_string(),
            ..NetworkConfig::default()
        };
        assert_eq!(with("").normalized_prefix(), "");
        assert_eq!(with("/").normalized_prefix(), "");
        assert_eq!(with("api").normalized_prefix(), "/api");
        assert_eq!(with("/api/").normalized_prefix(), "/api");
        assert_eq!(with("/api/v1").normalized_prefix(), "/api/v1");
    }

    #[test]
    fn docs_url_prefers_external_port() {
        let config = NetworkConfig {
            external_port: Some(8080),
            path_prefix: "/fruit".to_string(),
            ..NetworkConfig::default()
        };
        assert_eq!(config.docs_url(3000), "http://localhost:8080/fruit/docs");

        let config = NetworkConfig::default();
        assert_eq!(config.docs_url(3000), "http://localhost:3000/docs");
    }
}
