//! Request-side types and error definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP methods a gadget may ask the proxy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MethodType {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl MethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodType::Get => "GET",
            MethodType::Post => "POST",
            MethodType::Put => "PUT",
            MethodType::Delete => "DELETE",
            MethodType::Head => "HEAD",
        }
    }
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    #[default]
    Text,
    Dom,
    Json,
    Feed,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "TEXT",
            ContentType::Dom => "DOM",
            ContentType::Json => "JSON",
            ContentType::Feed => "FEED",
        }
    }
}

/// Authorization applied by the proxy when it fetches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorizationType {
    #[default]
    None,
    Signed,
    Oauth,
}

impl AuthorizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationType::None => "NONE",
            AuthorizationType::Signed => "SIGNED",
            AuthorizationType::Oauth => "OAUTH",
        }
    }

    /// Value of the `authz` proxy parameter.
    pub fn proxy_value(&self) -> &'static str {
        match self {
            AuthorizationType::None => "",
            AuthorizationType::Signed => "signed",
            AuthorizationType::Oauth => "oauth",
        }
    }

    /// Signed and OAuth requests carry the security token and OAuth state.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthorizationType::None)
    }
}

macro_rules! enum_text {
    ($ty:ident, $kind:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(UnknownVariant { kind: $kind, value: s.to_string() })
            }
        }
    };
}

enum_text!(MethodType, "method", [Get, Post, Put, Delete, Head]);
enum_text!(ContentType, "content type", [Text, Dom, Json, Feed]);
enum_text!(AuthorizationType, "authorization", [None, Signed, Oauth]);

/// Returned when parsing an unknown method, content type or authorization.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Options a caller passes along with a request.
///
/// Every field is optional; [`crate::io::builder::build_request`] applies the
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestParameters {
    pub method: Option<MethodType>,
    pub content_type: Option<ContentType>,
    pub post_data: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub authorization: Option<AuthorizationType>,
    pub num_entries: Option<u32>,
    pub get_summaries: bool,
    pub get_full_headers: bool,
    /// Seconds the proxy may cache the response.
    pub refresh_interval: Option<u64>,
    pub owner_signed: Option<bool>,
    pub viewer_signed: Option<bool>,
    /// Only consulted by `get_proxy_url`.
    pub rewrite_mime: Option<String>,
    /// `OAUTH_*` options forwarded verbatim on signed and OAuth requests.
    pub oauth: BTreeMap<String, String>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: MethodType) -> Self {
        self.method = Some(method);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn post_data(mut self, data: impl Into<String>) -> Self {
        self.post_data = Some(data.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn authorization(mut self, authorization: AuthorizationType) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn num_entries(mut self, entries: u32) -> Self {
        self.num_entries = Some(entries);
        self
    }

    pub fn get_summaries(mut self, enabled: bool) -> Self {
        self.get_summaries = enabled;
        self
    }

    pub fn get_full_headers(mut self, enabled: bool) -> Self {
        self.get_full_headers = enabled;
        self
    }

    pub fn refresh_interval(mut self, seconds: u64) -> Self {
        self.refresh_interval = Some(seconds);
        self
    }

    pub fn owner_signed(mut self, signed: bool) -> Self {
        self.owner_signed = Some(signed);
        self
    }

    pub fn viewer_signed(mut self, signed: bool) -> Self {
        self.viewer_signed = Some(signed);
        self
    }

    pub fn rewrite_mime(mut self, mime: impl Into<String>) -> Self {
        self.rewrite_mime = Some(mime.into());
        self
    }

    /// Add an OAuth option such as `OAUTH_SERVICE_NAME`.
    pub fn oauth_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.oauth.insert(name.into(), value.into());
        self
    }
}

/// Errors returned synchronously by the facade.
///
/// Failures of the request itself are never reported here; they reach the
/// caller through the response's `errors`.
#[derive(Debug, Error)]
pub enum IoError {
    /// No transport could be acquired in this environment.
    #[error("no transport available: {0}")]
    TransportUnavailable(String),

    /// The transport raised while performing the request.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A required proxy template is not configured.
    #[error("`{0}` is not configured")]
    ConfigurationMissing(&'static str),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type IoResult<T> = Result<T, IoError>;
