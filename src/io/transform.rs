//! Response transformation.
//!
//! # Responsibilities
//! - Default a missing status code to 200
//! - Turn error statuses into a synthesized error entry
//! - Parse the body according to the requested content type
//!
//! # Design Decisions
//! - Redirect bodies are always treated as text; they are usually HTML and
//!   would otherwise surface as a parse failure
//! - A parse failure is local and total: status becomes 500, no partial data

use crate::io::response::{NormalizedResponse, ResponseData, ResponseRecord};
use crate::io::types::ContentType;
use crate::io::xml;

pub const JSON_PARSE_ERROR: &str = "500 Failed to parse JSON";
pub const XML_PARSE_ERROR: &str = "500 Failed to parse XML";

/// Map a raw record into the response callers see.
pub fn transform_response(content_type: ContentType, record: ResponseRecord) -> NormalizedResponse {
    let ResponseRecord {
        body,
        rc,
        headers,
        oauth_approval_url,
        oauth_error,
        oauth_error_text,
        ..
    } = record;

    // Some callers never set rc.
    let rc = match rc {
        Some(rc) if rc != 0 => rc,
        _ => 200,
    };

    let mut response = NormalizedResponse {
        text: None,
        rc,
        headers,
        data: None,
        errors: Vec::new(),
        oauth_approval_url,
        oauth_error,
        oauth_error_text,
    };

    if !(200..400).contains(&rc) {
        response.errors.push(format!("{rc} Error"));
        response.text = body;
        return response;
    }

    if let Some(text) = body.as_deref().filter(|text| !text.is_empty()) {
        let content_type = if (300..400).contains(&rc) {
            ContentType::Text
        } else {
            content_type
        };

        match content_type {
            ContentType::Json | ContentType::Feed => {
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(value) => response.data = Some(ResponseData::Json(value)),
                    Err(e) => {
                        tracing::debug!(error = %e, "Response body is not valid JSON");
                        response.errors.push(JSON_PARSE_ERROR.to_string());
                        response.rc = 500;
                        response.data = Some(ResponseData::Null);
                    }
                }
            }
            ContentType::Dom => match xml::parse_document(text) {
                Ok(document) => response.data = Some(ResponseData::Dom(document)),
                Err(e) => {
                    tracing::debug!(error = %e, "Response body is not valid XML");
                    response.errors.push(XML_PARSE_ERROR.to_string());
                    response.rc = 500;
                }
            },
            ContentType::Text => response.data = Some(ResponseData::Text(text.to_string())),
        }
    }

    response.text = body;
    response
}
