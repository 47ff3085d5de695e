//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GadgetConfig {
    /// Proxy templates (the `core.io` feature section).
    pub core_io: IoConfig,

    /// The page the gadget is rendered in.
    pub page: PageContext,

    pub preload: PreloadConfig,

    pub observability: ObservabilityConfig,
}

/// Proxy URL templates.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct IoConfig {
    /// Endpoint for `make_request`; `%host%` is replaced with the page host.
    pub json_proxy_url: Option<String>,

    /// Template for `get_proxy_url`.
    pub proxy_url: Option<String>,
}

impl IoConfig {
    pub fn new(json_proxy_url: impl Into<String>, proxy_url: impl Into<String>) -> Self {
        Self {
            json_proxy_url: Some(json_proxy_url.into()),
            proxy_url: Some(proxy_url.into()),
        }
    }
}

/// Location and URL parameters of the page hosting the gadget.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageContext {
    /// Host (and port) of the page, e.g. "shindig.example.com:8080".
    pub host: String,

    /// Scheme of the page without the colon ("http" or "https").
    pub protocol: String,

    /// `url` page parameter: the gadget definition URL.
    pub gadget: Option<String>,

    /// `container` page parameter.
    pub container: Option<String>,

    /// `synd` page parameter (legacy container name).
    pub synd: Option<String>,

    /// `nocache` page parameter.
    pub nocache: Option<String>,
}

impl Default for PageContext {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            protocol: "http".to_string(),
            gadget: None,
            container: None,
            synd: None,
            nocache: None,
        }
    }
}

impl PageContext {
    /// Container name: `container`, then `synd`, then "default".
    pub fn container_name(&self) -> &str {
        self.container
            .as_deref()
            .or(self.synd.as_deref())
            .unwrap_or("default")
    }

    pub fn gadget_url(&self) -> &str {
        self.gadget.as_deref().unwrap_or_default()
    }

    /// Prefix protocol-relative URLs (`//host/path`) with the page scheme.
    pub fn complete_protocol(&self, url: String) -> String {
        if url.starts_with("//") {
            format!("{}:{}", self.protocol, url)
        } else {
            url
        }
    }

    /// Resolve a URL the way the page would: protocol-relative and
    /// host-relative forms are completed, anything else is left alone.
    pub fn resolve(&self, url: String) -> String {
        if url.starts_with("//") {
            self.complete_protocol(url)
        } else if url.starts_with('/') {
            format!("{}://{}{}", self.protocol, self.host, url)
        } else {
            url
        }
    }
}

/// Server-supplied preloads.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PreloadConfig {
    /// JSON file holding the preload array embedded in the page.
    pub file: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
