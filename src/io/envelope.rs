//! Response envelope parsing.
//!
//! The proxy answers with `throw 1; < don't be evil' >` followed by a JSON
//! object keyed by the requested URL. The prefix keeps the response from
//! being executable if someone includes it with a script tag.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::{OAuthSession, SecurityTokenSource};
use crate::io::response::{NormalizedResponse, ResponseRecord};
use crate::io::transport::TransportResponse;
use crate::io::types::IoError;

pub const UNPARSEABLE_CRUFT: &str = "throw 1; < don't be evil' >";

/// Reasons a proxied response is dropped without a callback.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("response is missing the anti-inclusion prefix")]
    MissingPrefix,

    #[error("malformed response envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response envelope has no entry for {0}")]
    MissingRecord(String),
}

/// Let only completed `200` responses through.
///
/// Anything else becomes the error response handed to the caller: a non-200
/// status keeps its status and body, a transport exception reports its
/// description with status 0.
pub fn status_gate(
    result: Result<TransportResponse, IoError>,
) -> Result<String, NormalizedResponse> {
    match result {
        Ok(response) if response.status == 200 => Ok(response.text),
        Ok(response) => {
            let mut error = response.status.to_string();
            if !response.text.is_empty() {
                error.push(' ');
                error.push_str(&response.text);
            }
            Err(NormalizedResponse::failure(
                response.status,
                vec![error],
                Some(response.text),
            ))
        }
        Err(e) => {
            let description = e.to_string();
            Err(NormalizedResponse::failure(
                0,
                vec![description.clone()],
                Some(description),
            ))
        }
    }
}

/// Strip the prefix and extract the record for `url`.
pub fn parse_envelope(text: &str, url: &str) -> Result<ResponseRecord, EnvelopeError> {
    let offset = text
        .find(UNPARSEABLE_CRUFT)
        .ok_or(EnvelopeError::MissingPrefix)?;
    let payload = &text[offset + UNPARSEABLE_CRUFT.len()..];

    // Records for other URLs are left undecoded.
    let mut records: Map<String, Value> = serde_json::from_str(payload)?;
    let record = records
        .remove(url)
        .ok_or_else(|| EnvelopeError::MissingRecord(url.to_string()))?;
    Ok(serde_json::from_value(record)?)
}

/// Propagate session state carried by a record.
pub fn apply_session_updates(
    record: &ResponseRecord,
    session: &OAuthSession,
    tokens: &dyn SecurityTokenSource,
) {
    if let Some(state) = record.fresh_oauth_state() {
        session.set_state(state);
    }
    if let Some(token) = record.fresh_security_token() {
        tokens.update_security_token(token);
    }
}
