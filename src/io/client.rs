//! Public facade.
//!
//! # Responsibilities
//! - Own the per-page context (configuration, session, preloads, transport)
//! - Route each request through preload, proxied GET, proxied POST or direct
//! - Invoke the caller's callback at most once per request
//!
//! # Design Decisions
//! - Configuration and transport problems are returned synchronously,
//!   before any state is touched
//! - Preloaded requests call back before `make_request` returns; network
//!   requests call back from a spawned task
//! - A proxied response without the anti-inclusion prefix produces no
//!   callback; it is logged, counted and reported to the diagnostic hook

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use uuid::Uuid;

use crate::auth::{OAuthSession, SecurityTokenSource, SharedSecurityToken};
use crate::config::schema::{IoConfig, PageContext};
use crate::io::builder::{build_request, FORM_CONTENT_TYPE};
use crate::io::encoding;
use crate::io::envelope::{self, EnvelopeError};
use crate::io::preload::PreloadStore;
use crate::io::proxy_url;
use crate::io::response::{NormalizedResponse, ResponseRecord};
use crate::io::transform::transform_response;
use crate::io::transport::{
    ReqwestProvider, StaticProvider, Transport, TransportProvider, TransportRequest,
};
use crate::io::types::{ContentType, IoError, IoResult, MethodType, RequestParameters};
use crate::observability::metrics;

/// Called with the requested URL when a proxied response is dropped.
pub type DroppedEnvelopeHook = Arc<dyn Fn(&str, &EnvelopeError) + Send + Sync>;

/// Request headers for `make_non_proxied_request`.
#[derive(Debug, Clone)]
pub enum DirectHeaders {
    /// Legacy form: just the Content-Type value.
    ContentType(String),
    Map(BTreeMap<String, String>),
}

struct IoContext {
    config: ArcSwap<IoConfig>,
    page: ArcSwap<PageContext>,
    session: OAuthSession,
    preloads: PreloadStore,
    tokens: Arc<dyn SecurityTokenSource>,
    transports: Arc<dyn TransportProvider>,
    on_dropped: Option<DroppedEnvelopeHook>,
}

/// Remote content retrieval for one page.
///
/// Cheap to clone; clones share the same context.
#[derive(Clone)]
pub struct GadgetIo {
    inner: Arc<IoContext>,
}

/// Builder for [`GadgetIo`].
pub struct GadgetIoBuilder {
    config: IoConfig,
    page: PageContext,
    preloads: PreloadStore,
    tokens: Option<Arc<dyn SecurityTokenSource>>,
    transports: Option<Arc<dyn TransportProvider>>,
    on_dropped: Option<DroppedEnvelopeHook>,
}

impl GadgetIoBuilder {
    pub fn new(config: IoConfig) -> Self {
        Self {
            config,
            page: PageContext::default(),
            preloads: PreloadStore::new(),
            tokens: None,
            transports: None,
            on_dropped: None,
        }
    }

    pub fn page(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    pub fn preloads(mut self, preloads: PreloadStore) -> Self {
        self.preloads = preloads;
        self
    }

    pub fn security_tokens(mut self, tokens: Arc<dyn SecurityTokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn transport_provider(mut self, provider: Arc<dyn TransportProvider>) -> Self {
        self.transports = Some(provider);
        self
    }

    /// Use `transport` for every request.
    pub fn transport(self, transport: Arc<dyn Transport>) -> Self {
        self.transport_provider(Arc::new(StaticProvider::new(transport)))
    }

    pub fn on_dropped_envelope(mut self, hook: DroppedEnvelopeHook) -> Self {
        self.on_dropped = Some(hook);
        self
    }

    pub fn build(self) -> GadgetIo {
        let transports = self
            .transports
            .unwrap_or_else(|| Arc::new(ReqwestProvider::detect()));
        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(SharedSecurityToken::default()));

        GadgetIo {
            inner: Arc::new(IoContext {
                config: ArcSwap::from_pointee(self.config),
                page: ArcSwap::from_pointee(self.page),
                session: OAuthSession::new(),
                preloads: self.preloads,
                tokens,
                transports,
                on_dropped: self.on_dropped,
            }),
        }
    }
}

/// Everything needed to finish a request once it is on the wire.
struct Dispatch {
    request_id: Uuid,
    target_url: String,
    content_type: ContentType,
    proxied: bool,
    transport: Arc<dyn Transport>,
    request: TransportRequest,
}

enum Prepared {
    Preloaded(NormalizedResponse),
    Network(Dispatch),
}

impl GadgetIo {
    pub fn builder(config: IoConfig) -> GadgetIoBuilder {
        GadgetIoBuilder::new(config)
    }

    /// Replace the proxy templates.
    pub fn configure(&self, config: IoConfig) {
        tracing::debug!(?config, "core.io configuration registered");
        self.inner.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<IoConfig> {
        self.inner.config.load_full()
    }

    /// Replace the page context, e.g. after navigation.
    pub fn set_page(&self, page: PageContext) {
        self.inner.page.store(Arc::new(page));
    }

    pub fn session(&self) -> &OAuthSession {
        &self.inner.session
    }

    pub fn preloads(&self) -> &PreloadStore {
        &self.inner.preloads
    }

    pub fn security_tokens(&self) -> &Arc<dyn SecurityTokenSource> {
        &self.inner.tokens
    }

    /// Record the callback URL received from an OAuth approval; it is sent
    /// with the next signed or OAuth request.
    pub fn set_oauth_received_callback(&self, url: impl Into<String>) {
        self.inner.session.set_received_callback(url);
    }

    /// Forget the OAuth session state. Meant for tests.
    pub fn clear_oauth_state(&self) {
        self.inner.session.clear_state();
    }

    /// See [`encoding::encode_values`].
    pub fn encode_values<I, K, V>(fields: I, skip_escaping: bool) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        encoding::encode_values(fields, skip_escaping)
    }

    /// Proxied form of `url`, or `None` when no `proxy_url` template is
    /// configured.
    pub fn get_proxy_url(&self, url: &str, options: &RequestParameters) -> Option<String> {
        let config = self.inner.config.load();
        let template = config.proxy_url.as_deref().filter(|t| !t.is_empty())?;
        Some(proxy_url::proxy_url(template, url, options, &self.inner.page.load()))
    }

    /// Fetch `url` through the proxy and hand the result to `callback`.
    pub fn make_request<F>(
        &self,
        url: &str,
        callback: F,
        options: RequestParameters,
    ) -> IoResult<()>
    where
        F: FnOnce(NormalizedResponse) + Send + 'static,
    {
        let prepared = self.prepare_proxied(url, &options)?;
        self.run(prepared, callback);
        Ok(())
    }

    /// Awaitable form of [`GadgetIo::make_request`].
    ///
    /// `Ok(None)` means the proxied response was dropped.
    pub async fn fetch(
        &self,
        url: &str,
        options: RequestParameters,
    ) -> IoResult<Option<NormalizedResponse>> {
        match self.prepare_proxied(url, &options)? {
            Prepared::Preloaded(response) => Ok(Some(response)),
            Prepared::Network(dispatch) => Ok(self.complete(dispatch).await),
        }
    }

    /// Fetch `url` directly, without the proxy or its envelope.
    pub fn make_non_proxied_request<F>(
        &self,
        url: &str,
        callback: F,
        options: RequestParameters,
        headers: Option<DirectHeaders>,
    ) -> IoResult<()>
    where
        F: FnOnce(NormalizedResponse) + Send + 'static,
    {
        let prepared = self.prepare_direct(url, &options, headers)?;
        self.run(prepared, callback);
        Ok(())
    }

    /// Awaitable form of [`GadgetIo::make_non_proxied_request`].
    pub async fn fetch_non_proxied(
        &self,
        url: &str,
        options: RequestParameters,
        headers: Option<DirectHeaders>,
    ) -> IoResult<NormalizedResponse> {
        match self.prepare_direct(url, &options, headers)? {
            Prepared::Preloaded(response) => Ok(response),
            Prepared::Network(dispatch) => {
                let response = self.complete(dispatch).await;
                // Direct responses have no envelope to drop.
                Ok(response.unwrap_or_default())
            }
        }
    }

    fn acquire_transport(&self) -> IoResult<Arc<dyn Transport>> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| IoError::TransportUnavailable(format!("no async runtime: {e}")))?;
        self.inner.transports.acquire()
    }

    fn prepare_proxied(&self, url: &str, options: &RequestParameters) -> IoResult<Prepared> {
        if url.is_empty() {
            return Err(IoError::InvalidRequest("target url is empty".to_string()));
        }
        let config = self.inner.config.load();
        let template = config
            .json_proxy_url
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(IoError::ConfigurationMissing("json_proxy_url"))?;

        // A request a preload can answer needs neither a transport nor a
        // runtime. Everything else acquires its transport before the OAuth
        // session is touched.
        let preload_pending = options.method.unwrap_or_default() == MethodType::Get
            && self.inner.preloads.contains(url);
        let transport = if preload_pending {
            None
        } else {
            Some(self.acquire_transport()?)
        };

        let descriptor = build_request(
            url,
            options,
            self.inner.tokens.as_ref(),
            &self.inner.session,
        );
        let request_id = Uuid::new_v4();

        if let Some(response) = self
            .inner
            .preloads
            .try_satisfy(&descriptor, &self.inner.session)
        {
            tracing::debug!(%request_id, url, rc = response.rc, "Request satisfied from preload");
            metrics::record_request("preload");
            return Ok(Prepared::Preloaded(response));
        }

        // The preload was consumed by a concurrent request.
        let transport = match transport {
            Some(transport) => transport,
            None => self.acquire_transport()?,
        };
        let page = self.inner.page.load();

        let proxy = page.resolve(proxy_url::json_proxy_url(template, &page));
        let params = descriptor.encoded_params(&page);
        let request = match descriptor.cacheable_refresh() {
            Some(refresh) => {
                metrics::record_request("proxied_get");
                TransportRequest {
                    method: MethodType::Get,
                    url: format!("{proxy}?refresh={refresh}&{params}"),
                    headers: Vec::new(),
                    body: None,
                }
            }
            None => {
                metrics::record_request("proxied_post");
                TransportRequest {
                    method: MethodType::Post,
                    url: proxy,
                    headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
                    body: Some(params),
                }
            }
        };

        tracing::debug!(
            %request_id,
            url,
            method = %descriptor.http_method,
            authz = %descriptor.authorization,
            proxy_method = %request.method,
            "Dispatching proxied request"
        );

        Ok(Prepared::Network(Dispatch {
            request_id,
            target_url: descriptor.target_url,
            content_type: descriptor.content_type,
            proxied: true,
            transport,
            request,
        }))
    }

    fn prepare_direct(
        &self,
        url: &str,
        options: &RequestParameters,
        headers: Option<DirectHeaders>,
    ) -> IoResult<Prepared> {
        if url.is_empty() {
            return Err(IoError::InvalidRequest("target url is empty".to_string()));
        }
        let transport = self.acquire_transport()?;
        let page = self.inner.page.load();
        let method = options.method.unwrap_or_default();

        let (content_type, mut headers) = match headers {
            Some(DirectHeaders::ContentType(value)) => (value, BTreeMap::new()),
            Some(DirectHeaders::Map(map)) => (FORM_CONTENT_TYPE.to_string(), map),
            None => (FORM_CONTENT_TYPE.to_string(), BTreeMap::new()),
        };
        if !headers.keys().any(|name| name.eq_ignore_ascii_case("Content-Type")) {
            headers.insert("Content-Type".to_string(), content_type);
        }

        let body = match method {
            MethodType::Get | MethodType::Head => None,
            _ => options.post_data.clone(),
        };
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, url, %method, "Dispatching direct request");
        metrics::record_request("direct");

        Ok(Prepared::Network(Dispatch {
            request_id,
            target_url: url.to_string(),
            content_type: options.content_type.unwrap_or_default(),
            proxied: false,
            transport,
            request: TransportRequest {
                method,
                url: page.resolve(url.to_string()),
                headers: headers.into_iter().collect(),
                body,
            },
        }))
    }

    fn run<F>(&self, prepared: Prepared, callback: F)
    where
        F: FnOnce(NormalizedResponse) + Send + 'static,
    {
        match prepared {
            Prepared::Preloaded(response) => callback(response),
            Prepared::Network(dispatch) => {
                let this = self.clone();
                tokio::spawn(async move {
                    if let Some(response) = this.complete(dispatch).await {
                        callback(response);
                    }
                });
            }
        }
    }

    /// Await the transport and turn its output into the caller's response.
    async fn complete(&self, dispatch: Dispatch) -> Option<NormalizedResponse> {
        let Dispatch {
            request_id,
            target_url,
            content_type,
            proxied,
            transport,
            request,
        } = dispatch;

        let result = transport.send(request).await;
        let text = match envelope::status_gate(result) {
            Ok(text) => text,
            Err(failure) => {
                tracing::warn!(
                    %request_id,
                    url = %target_url,
                    rc = failure.rc,
                    errors = ?failure.errors,
                    "Request failed"
                );
                metrics::record_response("error");
                return Some(failure);
            }
        };

        let record = if proxied {
            match envelope::parse_envelope(&text, &target_url) {
                Ok(record) => {
                    envelope::apply_session_updates(
                        &record,
                        &self.inner.session,
                        self.inner.tokens.as_ref(),
                    );
                    record
                }
                Err(e) => {
                    tracing::warn!(
                        %request_id,
                        url = %target_url,
                        error = %e,
                        "Dropping proxied response"
                    );
                    metrics::record_response("dropped");
                    if let Some(hook) = &self.inner.on_dropped {
                        (hook.as_ref())(&target_url, &e);
                    }
                    return None;
                }
            }
        } else {
            ResponseRecord::with_body(text)
        };

        let response = transform_response(content_type, record);
        tracing::debug!(%request_id, url = %target_url, rc = response.rc, "Request complete");
        metrics::record_response(if response.is_ok() { "ok" } else { "error" });
        Some(response)
    }
}

impl std::fmt::Debug for GadgetIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GadgetIo")
            .field("config", &self.inner.config.load_full())
            .field("page", &self.inner.page.load_full())
            .field("pending_preloads", &self.inner.preloads.len())
            .finish()
    }
}
