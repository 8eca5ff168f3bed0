use serde::{Deserialize, Serialize};

/// Transport selector for the client.
///
/// Only the REST transport is implemented today; the selector exists so a
/// settings file written for a future transport still deserializes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiImpl {
    #[default]
    Rest,
}

/// Connection settings for a remote OortDb deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_impl: ApiImpl,

    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Omitted means the scheme default (443/80)
    #[serde(default)]
    pub server_port: Option<u16>,

    #[serde(default = "default_server_ssl")]
    pub server_ssl: bool,
}

fn default_server_host() -> String {
    "api.oortdb.io".to_string()
}

fn default_server_ssl() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_impl: ApiImpl::Rest,
            server_host: default_server_host(),
            server_port: None,
            server_ssl: default_server_ssl(),
        }
    }
}

impl Settings {
    pub fn new(api_impl: ApiImpl, server_host: impl Into<String>) -> Self {
        Self {
            api_impl,
            server_host: server_host.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Base URL for the configured deployment.
    ///
    /// A host that already carries a scheme is taken as given (minus any
    /// trailing slash); otherwise the scheme follows `server_ssl`.
    pub fn base_url(&self) -> String {
        let host = self.server_host.trim_end_matches('/');

        let with_scheme = if host.contains("://") {
            host.to_string()
        } else {
            let scheme = if self.server_ssl { "https" } else { "http" };
            format!("{}://{}", scheme, host)
        };

        match self.server_port {
            Some(port) => format!("{}:{}", with_scheme, port),
            None => with_scheme,
        }
    }
}
