//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Proxy templates are usable URLs once the host is substituted
//! - Page location is complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GadgetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{GadgetConfig, PageContext};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{0}` is present but blank")]
    BlankTemplate(&'static str),

    #[error("`json_proxy_url` does not resolve to an http(s) URL: {0}")]
    InvalidProxyUrl(String),

    #[error("page protocol must be http or https, got `{0}`")]
    InvalidProtocol(String),

    #[error("page host is empty")]
    EmptyHost,
}

pub fn validate_config(config: &GadgetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let page = &config.page;

    if page.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if page.protocol != "http" && page.protocol != "https" {
        errors.push(ValidationError::InvalidProtocol(page.protocol.clone()));
    }

    if let Some(template) = &config.core_io.json_proxy_url {
        if template.trim().is_empty() {
            errors.push(ValidationError::BlankTemplate("json_proxy_url"));
        } else if let Err(e) = check_proxy_template(template, page) {
            errors.push(e);
        }
    }
    if let Some(template) = &config.core_io.proxy_url {
        if template.trim().is_empty() {
            errors.push(ValidationError::BlankTemplate("proxy_url"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_proxy_template(template: &str, page: &PageContext) -> Result<(), ValidationError> {
    let resolved = page.resolve(template.replacen("%host%", &page.host, 1));
    match url::Url::parse(&resolved) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidProxyUrl(template.to_string())),
    }
}
