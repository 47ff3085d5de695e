//! Proxy URL templates.
//!
//! Placeholders are replaced once each, in a fixed order, against the page
//! context at call time.

use crate::config::schema::PageContext;
use crate::io::builder::DEFAULT_REFRESH_INTERVAL;
use crate::io::encoding::encode_uri_component;
use crate::io::types::RequestParameters;

/// Endpoint used by `make_request`.
pub fn json_proxy_url(template: &str, page: &PageContext) -> String {
    page.complete_protocol(template.replacen("%host%", &page.host, 1))
}

/// Proxied form of `url` built from the `proxy_url` template.
///
/// Supported placeholders: `%url%`, `%host%`, `%rawurl%`, `%refresh%`,
/// `%gadget%`, `%container%` and `%rewriteMime%`.
pub fn proxy_url(
    template: &str,
    url: &str,
    options: &RequestParameters,
    page: &PageContext,
) -> String {
    let refresh = options
        .refresh_interval
        .unwrap_or(DEFAULT_REFRESH_INTERVAL)
        .to_string();
    let rewrite_mime = options
        .rewrite_mime
        .as_deref()
        .filter(|mime| !mime.is_empty())
        .map(|mime| format!("&rewriteMime={}", encode_uri_component(mime)))
        .unwrap_or_default();

    let proxied = template
        .replacen("%url%", &encode_uri_component(url), 1)
        .replacen("%host%", &page.host, 1)
        .replacen("%rawurl%", url, 1)
        .replacen("%refresh%", &encode_uri_component(&refresh), 1)
        .replacen("%gadget%", &encode_uri_component(page.gadget_url()), 1)
        .replacen("%container%", &encode_uri_component(page.container_name()), 1)
        .replacen("%rewriteMime%", &rewrite_mime, 1);

    page.complete_protocol(proxied)
}
