//! Typed endpoint client for the Lumo API.
//!
//! # Design
//! `ApiClient` holds only a base URL and a fixed header set, and carries no
//! mutable state between calls. Each call is split into `build`, which turns
//! an `Endpoint` into an `HttpRequest`, and `parse`, which turns an
//! `HttpResponse` into a typed value. `send` glues the two around a single
//! `Transport::execute`; callers that need to move the I/O to another thread
//! use `build` and `parse` directly.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::endpoint::{Endpoint, Params};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::Envelope;

/// Stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    /// Add a header sent with every request, e.g. a client version tag.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build(&self, endpoint: &Endpoint) -> Result<HttpRequest, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint.path());
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(raw));
        }

        let mut headers = self.headers.clone();
        let body = match endpoint.params()? {
            Params::None => None,
            Params::Query(pairs) => {
                url.query_pairs_mut().extend_pairs(pairs);
                None
            }
            Params::Json(value) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(value.to_string())
            }
        };

        Ok(HttpRequest {
            method: endpoint.method(),
            url: url.into(),
            headers,
            body,
        })
    }

    /// Check the status range, then decode the body as `T`.
    ///
    /// An empty body decodes as JSON `null` so `()` and `Option<_>` work for
    /// no-content responses.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Server {
                status: response.status,
                body: response.body,
            });
        }
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::Decoding(e.to_string()))
    }

    /// Build, execute once, parse. No retries.
    pub fn send<T: DeserializeOwned>(
        &self,
        transport: &dyn Transport,
        endpoint: &Endpoint,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.build(endpoint)?;
        if let Some(token) = token {
            request = request.with_bearer(token);
        }
        debug!(endpoint = endpoint.name(), method = request.method.as_str(), url = %request.url, "sending request");

        let response = transport.execute(&request)?;
        debug!(endpoint = endpoint.name(), status = response.status, "response received");

        self.parse(response).inspect_err(|e| {
            warn!(endpoint = endpoint.name(), error = %e, "request failed");
        })
    }

    /// `send` for endpoints that answer with an `Envelope`.
    pub fn send_enveloped<T: DeserializeOwned>(
        &self,
        transport: &dyn Transport,
        endpoint: &Endpoint,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        self.send::<Envelope<T>>(transport, endpoint, token)?
            .into_result()
    }
}
