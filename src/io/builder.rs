//! Request building.
//!
//! # Responsibilities
//! - Apply defaults to caller options
//! - Attach the security token and OAuth session on signed/OAuth requests
//! - Produce the ordered parameter set sent to the proxy
//!
//! # Design Decisions
//! - No I/O; the only side effect is consuming the pending OAuth callback URL
//! - Unauthenticated GETs are cacheable for an hour unless told otherwise

use std::collections::BTreeMap;

use crate::auth::{OAuthSession, SecurityTokenSource};
use crate::config::schema::PageContext;
use crate::io::encoding::encode_values;
use crate::io::types::{AuthorizationType, ContentType, MethodType, RequestParameters};

/// Refresh interval applied to unauthenticated GETs.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 3600;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const DEFAULT_NUM_ENTRIES: u32 = 3;
const OAUTH_PREFIX: &str = "OAUTH_";
const OAUTH_RECEIVED_CALLBACK: &str = "OAUTH_RECEIVED_CALLBACK";

/// A fully defaulted request, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub target_url: String,
    pub http_method: MethodType,
    pub content_type: ContentType,
    pub headers: BTreeMap<String, String>,
    pub post_data: String,
    pub authorization: AuthorizationType,
    pub sign_owner: bool,
    pub sign_viewer: bool,
    pub refresh_interval: Option<u64>,
    pub num_entries: u32,
    pub get_summaries: bool,
    pub get_full_headers: bool,
    /// Present on signed and OAuth requests.
    pub security_token: Option<String>,
    /// Present on signed and OAuth requests; empty when the session has none.
    pub oauth_state: Option<String>,
    pub oauth_received_callback: Option<String>,
    pub oauth_parameters: BTreeMap<String, String>,
}

/// Build the descriptor for `url` from caller options.
pub fn build_request(
    url: &str,
    options: &RequestParameters,
    tokens: &dyn SecurityTokenSource,
    session: &OAuthSession,
) -> RequestDescriptor {
    let http_method = options.method.unwrap_or_default();
    let authorization = options.authorization.unwrap_or_default();
    let mut refresh_interval = options.refresh_interval;

    let security_token = if authorization.is_authenticated() {
        Some(tokens.current_security_token())
    } else {
        if http_method == MethodType::Get && refresh_interval.is_none() {
            refresh_interval = Some(DEFAULT_REFRESH_INTERVAL);
        }
        None
    };

    let mut headers = options.headers.clone();
    if http_method == MethodType::Post && !headers.contains_key("Content-Type") {
        headers.insert("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string());
    }

    let authenticated = authorization.is_authenticated();
    let (oauth_received_callback, oauth_state, oauth_parameters) = if authenticated {
        let parameters = options
            .oauth
            .iter()
            .filter(|(name, _)| name.starts_with(OAUTH_PREFIX))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        (
            session.take_received_callback(),
            Some(session.state().unwrap_or_default()),
            parameters,
        )
    } else {
        (None, None, BTreeMap::new())
    };

    RequestDescriptor {
        target_url: url.to_string(),
        http_method,
        content_type: options.content_type.unwrap_or_default(),
        headers,
        post_data: options.post_data.clone().unwrap_or_default(),
        authorization,
        sign_owner: options.owner_signed.unwrap_or(true),
        sign_viewer: options.viewer_signed.unwrap_or(true),
        refresh_interval,
        num_entries: options.num_entries.unwrap_or(DEFAULT_NUM_ENTRIES),
        get_summaries: options.get_summaries,
        get_full_headers: options.get_full_headers,
        security_token,
        oauth_state,
        oauth_received_callback,
        oauth_parameters,
    }
}

impl RequestDescriptor {
    /// Refresh interval when the request should go out as a cacheable GET.
    pub fn cacheable_refresh(&self) -> Option<u64> {
        match (self.http_method, self.refresh_interval) {
            (MethodType::Get, Some(refresh)) if refresh > 0 => Some(refresh),
            _ => None,
        }
    }

    /// Parameters forwarded to the proxy, in wire order.
    pub fn proxy_params(&self, page: &PageContext) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("url".into(), self.target_url.clone()),
            ("httpMethod".into(), self.http_method.as_str().into()),
            ("headers".into(), encode_values(&self.headers, false)),
            ("postData".into(), self.post_data.clone()),
            ("authz".into(), self.authorization.proxy_value().into()),
            ("st".into(), self.security_token.clone().unwrap_or_default()),
            ("contentType".into(), self.content_type.as_str().into()),
            ("numEntries".into(), self.num_entries.to_string()),
            ("getSummaries".into(), self.get_summaries.to_string()),
            ("signOwner".into(), self.sign_owner.to_string()),
            ("signViewer".into(), self.sign_viewer.to_string()),
            ("gadget".into(), page.gadget_url().into()),
            ("container".into(), page.container_name().into()),
            ("bypassSpecCache".into(), page.nocache.clone().unwrap_or_default()),
            ("getFullHeaders".into(), self.get_full_headers.to_string()),
        ];

        if let Some(callback) = &self.oauth_received_callback {
            params.push((OAUTH_RECEIVED_CALLBACK.into(), callback.clone()));
        }
        if let Some(state) = &self.oauth_state {
            params.push(("oauthState".into(), state.clone()));
        }
        for (name, value) in &self.oauth_parameters {
            // An explicit option overrides the pending callback URL.
            if let Some(existing) = params.iter_mut().find(|(key, _)| key == name) {
                existing.1 = value.clone();
            } else {
                params.push((name.clone(), value.clone()));
            }
        }
        params
    }

    /// Parameter set encoded for a query string or form body.
    pub fn encoded_params(&self, page: &PageContext) -> String {
        encode_values(self.proxy_params(page), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SharedSecurityToken;

    fn build(options: &RequestParameters) -> RequestDescriptor {
        let tokens = SharedSecurityToken::new("token-1");
        build_request("http://x.com/data", options, &tokens, &OAuthSession::new())
    }

    fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
        params.iter().find(|(key, _)| key == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_unauthenticated_get_defaults() {
        let descriptor = build(&RequestParameters::new());

        assert_eq!(descriptor.http_method, MethodType::Get);
        assert_eq!(descriptor.content_type, ContentType::Text);
        assert_eq!(descriptor.refresh_interval, Some(DEFAULT_REFRESH_INTERVAL));
        assert_eq!(descriptor.cacheable_refresh(), Some(3600));
        assert!(descriptor.sign_owner);
        assert!(descriptor.sign_viewer);
        assert!(descriptor.security_token.is_none());
        assert!(descriptor.oauth_state.is_none());
    }

    #[test]
    fn test_explicit_refresh_kept() {
        let descriptor = build(&RequestParameters::new().refresh_interval(0));
        assert_eq!(descriptor.refresh_interval, Some(0));
        assert_eq!(descriptor.cacheable_refresh(), None);

        let descriptor = build(&RequestParameters::new().refresh_interval(60));
        assert_eq!(descriptor.cacheable_refresh(), Some(60));
    }

    #[test]
    fn test_authenticated_has_no_cache_default() {
        let descriptor = build(&RequestParameters::new().authorization(AuthorizationType::Signed));

        assert_eq!(descriptor.refresh_interval, None);
        assert_eq!(descriptor.security_token.as_deref(), Some("token-1"));
        assert_eq!(descriptor.oauth_state.as_deref(), Some(""));
    }

    #[test]
    fn test_post_content_type_default() {
        let descriptor = build(&RequestParameters::new().method(MethodType::Post));
        assert_eq!(descriptor.headers["Content-Type"], FORM_CONTENT_TYPE);
        assert_eq!(descriptor.refresh_interval, None);

        let descriptor = build(
            &RequestParameters::new()
                .method(MethodType::Post)
                .header("Content-Type", "application/json"),
        );
        assert_eq!(descriptor.headers["Content-Type"], "application/json");

        let descriptor = build(&RequestParameters::new().method(MethodType::Put));
        assert!(descriptor.headers.is_empty());
    }

    #[test]
    fn test_signing_flags() {
        let descriptor = build(&RequestParameters::new().owner_signed(false));
        assert!(!descriptor.sign_owner);
        assert!(descriptor.sign_viewer);
    }

    #[test]
    fn test_oauth_attachments() {
        let tokens = SharedSecurityToken::new("st");
        let session = OAuthSession::new();
        session.set_state("state-1");
        session.set_received_callback("http://gadget/cb");
        let options = RequestParameters::new()
            .authorization(AuthorizationType::Oauth)
            .oauth_param("OAUTH_SERVICE_NAME", "google")
            .oauth_param("unrelated", "dropped");

        let first = build_request("http://x.com", &options, &tokens, &session);
        assert_eq!(first.oauth_state.as_deref(), Some("state-1"));
        assert_eq!(first.oauth_received_callback.as_deref(), Some("http://gadget/cb"));
        assert_eq!(first.oauth_parameters.len(), 1);
        assert_eq!(first.oauth_parameters["OAUTH_SERVICE_NAME"], "google");

        let second = build_request("http://x.com", &options, &tokens, &session);
        assert!(second.oauth_received_callback.is_none());
    }

    #[test]
    fn test_oauth_not_attached_without_auth() {
        let tokens = SharedSecurityToken::new("st");
        let session = OAuthSession::new();
        session.set_received_callback("http://gadget/cb");
        let options = RequestParameters::new().oauth_param("OAUTH_SERVICE_NAME", "google");

        let descriptor = build_request("http://x.com", &options, &tokens, &session);
        assert!(descriptor.oauth_parameters.is_empty());
        assert!(descriptor.oauth_received_callback.is_none());
        assert_eq!(session.take_received_callback().as_deref(), Some("http://gadget/cb"));
    }

    #[test]
    fn test_proxy_params() {
        let page = PageContext {
            gadget: Some("http://g/gadget.xml".to_string()),
            synd: Some("orkut".to_string()),
            nocache: Some("1".to_string()),
            ..PageContext::default()
        };
        let descriptor = build(
            &RequestParameters::new()
                .method(MethodType::Post)
                .post_data("a=b")
                .content_type(ContentType::Json)
                .authorization(AuthorizationType::Oauth)
                .oauth_param("OAUTH_USE_TOKEN", "always"),
        );

        let params = descriptor.proxy_params(&page);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "url", "httpMethod", "headers", "postData", "authz", "st", "contentType",
                "numEntries", "getSummaries", "signOwner", "signViewer", "gadget", "container",
                "bypassSpecCache", "getFullHeaders", "oauthState", "OAUTH_USE_TOKEN",
            ]
        );
        assert_eq!(
            param(&params, "headers"),
            Some("Content-Type=application%2Fx-www-form-urlencoded")
        );
        assert_eq!(param(&params, "authz"), Some("oauth"));
        assert_eq!(param(&params, "st"), Some("token-1"));
        assert_eq!(param(&params, "contentType"), Some("JSON"));
        assert_eq!(param(&params, "numEntries"), Some("3"));
        assert_eq!(param(&params, "getSummaries"), Some("false"));
        assert_eq!(param(&params, "gadget"), Some("http://g/gadget.xml"));
        assert_eq!(param(&params, "container"), Some("orkut"));
        assert_eq!(param(&params, "bypassSpecCache"), Some("1"));
    }
}
