//! HTTP capability.
//!
//! The core never performs network I/O. It describes a request, the shell
//! executes it, and the outcome re-enters the update loop as an event. The
//! request is validated at construction so malformed URLs or headers fail at
//! the call site instead of inside a shell we do not control.

use std::time::Duration;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    #[must_use]
    pub const fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Patch)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl HttpError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        validate_url(&url)?;
        Ok(Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

fn validate_url(url: &str) -> Result<(), HttpError> {
    let invalid = |reason: String| HttpError::InvalidUrl {
        url: url.to_owned(),
        reason,
    };

    if url.trim().is_empty() {
        return Err(invalid("URL cannot be empty".to_owned()));
    }

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("URL must have a host".to_owned()));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials in URL are not allowed".to_owned()));
    }

    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), HttpError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(HttpError::InvalidHeader {
            name: name.to_owned(),
            reason: "header name must be non-empty ASCII".to_owned(),
        });
    }
    if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(HttpError::InvalidHeader {
            name: name.to_owned(),
            reason: "header value contains control characters".to_owned(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpOperation {
    Execute(HttpRequest),
}

impl Operation for HttpOperation {
    type Output = HttpResult;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json_body<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(
            status,
            vec![("content-type".to_owned(), "application/json".to_owned())],
            body,
        )
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::InvalidResponse {
            reason: format!("failed to parse JSON body: {e}"),
        })
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

pub struct Http<Ev> {
    context: CapabilityContext<HttpOperation, Ev>,
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpOperation;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Http::new(self.context.map_event(f))
    }
}

impl<Ev> Http<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<HttpOperation, Ev>) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_, Ev> {
        self.builder(HttpMethod::Get, url)
    }

    #[must_use]
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_, Ev> {
        self.builder(HttpMethod::Post, url)
    }

    #[must_use]
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_, Ev> {
        self.builder(HttpMethod::Patch, url)
    }

    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_, Ev> {
        self.builder(HttpMethod::Delete, url)
    }

    fn builder(&self, method: HttpMethod, url: impl Into<String>) -> RequestBuilder<'_, Ev> {
        RequestBuilder {
            http: self,
            request: HttpRequest::new(method, url),
        }
    }
}

pub struct RequestBuilder<'a, Ev> {
    http: &'a Http<Ev>,
    request: Result<HttpRequest, HttpError>,
}

impl<Ev> RequestBuilder<'_, Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Ok(request) = &mut self.request {
            match validate_header(&name, &value) {
                Ok(()) => request.headers.push((name, value)),
                Err(e) => self.request = Err(e),
            }
        }
        self
    }

    #[must_use]
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        if let Ok(request) = &mut self.request {
            if !request.method.allows_body() {
                let reason = format!("{} requests cannot carry a body", request.method.as_str());
                self.request = Err(HttpError::InvalidRequest { reason });
                return self;
            }
            match serde_json::to_vec(value) {
                Ok(body) if body.len() <= MAX_REQUEST_BODY_BYTES => {
                    request.body = Some(body);
                    request
                        .headers
                        .push(("Content-Type".to_owned(), "application/json".to_owned()));
                }
                Ok(body) => {
                    let reason = format!(
                        "request body of {} bytes exceeds the {MAX_REQUEST_BODY_BYTES} byte limit",
                        body.len()
                    );
                    self.request = Err(HttpError::InvalidRequest { reason });
                }
                Err(e) => {
                    let reason = format!("failed to serialize body: {e}");
                    self.request = Err(HttpError::InvalidRequest { reason });
                }
            }
        }
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if let Ok(request) = &mut self.request {
            request.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        }
        self
    }

    /// Hand the request to the shell. The outcome — transport failure or a
    /// response of any status — comes back as the event `make_event` builds.
    /// A request that failed validation short-circuits to that same event.
    pub fn send<F>(self, make_event: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let context = self.http.context.clone();
        match self.request {
            Ok(request) => {
                let inner = context.clone();
                context.spawn(async move {
                    let result = inner
                        .request_from_shell(HttpOperation::Execute(request))
                        .await;
                    inner.update_app(make_event(result));
                });
            }
            Err(error) => {
                let inner = context.clone();
                context.spawn(async move {
                    inner.update_app(make_event(Err(error)));
                });
            }
        }
    }
}
