//! Response-side types: the raw record the proxy sends and the normalized
//! response handed to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::io::xml::XmlDocument;

/// Response headers, one entry per name with every received value.
pub type Headers = BTreeMap<String, Vec<String>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<Headers, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, HeaderValues>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, values)| match values {
            HeaderValues::One(value) => (name, vec![value]),
            HeaderValues::Many(values) => (name, values),
        })
        .collect())
}

/// One per-URL record of the proxy envelope, also the shape of a preload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc: Option<u16>,
    #[serde(
        default,
        deserialize_with = "deserialize_headers",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_approval_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_error_text: Option<String>,
    /// Refreshed security token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<String>,
}

impl ResponseRecord {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// `oauthState` when present and non-empty.
    pub fn fresh_oauth_state(&self) -> Option<&str> {
        self.oauth_state.as_deref().filter(|s| !s.is_empty())
    }

    /// `st` when present and non-empty.
    pub fn fresh_security_token(&self) -> Option<&str> {
        self.st.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parsed response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Structured parsing was attempted and failed.
    Null,
    Text(String),
    Json(serde_json::Value),
    Dom(XmlDocument),
}

/// What every callback receives.
///
/// `errors` is non-empty exactly when `rc` lies outside `[200, 400)` or the
/// body could not be parsed as requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    pub text: Option<String>,
    pub rc: u16,
    pub headers: Headers,
    /// Unset when there was no body to parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_approval_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_error_text: Option<String>,
}

impl NormalizedResponse {
    /// A failed response carrying only a status, the errors and raw text.
    pub fn failure(rc: u16, errors: Vec<String>, text: Option<String>) -> Self {
        Self {
            text,
            rc,
            errors,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.data {
            Some(ResponseData::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn text_data(&self) -> Option<&str> {
        match &self.data {
            Some(ResponseData::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn dom(&self) -> Option<&XmlDocument> {
        match &self.data {
            Some(ResponseData::Dom(doc)) => Some(doc),
            _ => None,
        }
    }
}
