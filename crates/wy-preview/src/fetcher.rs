//! Submit-then-retrieve preview protocol
//!
//! 1. POST the edit form's current fields to the preview endpoint
//! 2. once the POST has settled, GET the same endpoint for the rendered page
//!
//! Both requests carry the CSRF header (when the cookie is present) and, for
//! same-origin endpoints, the page's cookies.

use crate::cookies::read_cookie;
use crate::resolver::PreviewResolver;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, REFERER};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use wy_core::{HostPage, PanelError, PreviewSource, ProtocolStep};

/// Preview fetcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    /// Element id of the edit form
    pub form_id: String,
    /// Cookie holding the CSRF token
    pub csrf_cookie: String,
    /// Header the CSRF token is sent in
    pub csrf_header: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            form_id: "page-edit-form".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP implementation of [`PreviewSource`]
#[derive(Debug, Clone)]
pub struct PreviewFetcher {
    client: reqwest::Client,
    resolver: PreviewResolver,
    settings: FetcherSettings,
}

impl PreviewFetcher {
    /// Create a fetcher with its own HTTP client
    ///
    /// # Errors
    /// `Config` if the CSRF header name is invalid or the client cannot be built
    pub fn new(settings: FetcherSettings) -> Result<Self, PanelError> {
        HeaderName::from_bytes(settings.csrf_header.as_bytes())
            .map_err(|e| PanelError::Config(format!("invalid CSRF header name: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PanelError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            resolver: PreviewResolver::new(settings.form_id.clone()),
            settings,
        })
    }

    /// Use a custom resolver
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: PreviewResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &PreviewResolver {
        &self.resolver
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &FetcherSettings {
        &self.settings
    }

    fn request_headers(&self, page: &dyn HostPage, endpoint: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookies = page.cookies();

        if let Some(token) = read_cookie(&cookies, &self.settings.csrf_cookie) {
            let name = HeaderName::from_bytes(self.settings.csrf_header.as_bytes());
            match (name, HeaderValue::from_str(&token)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("CSRF token is not a valid header value, not sent"),
            }
        }

        let location = page.location();
        if endpoint.origin() == location.origin() && !cookies.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&cookies) {
                headers.insert(COOKIE, value);
            }
        }
        if let Ok(value) = HeaderValue::from_str(location.as_str()) {
            headers.insert(REFERER, value);
        }

        headers
    }
}

#[async_trait]
impl PreviewSource for PreviewFetcher {
    async fn fetch(&self, page: &dyn HostPage) -> Result<String, PanelError> {
        let form = page
            .form(&self.settings.form_id)
            .ok_or_else(|| PanelError::HostFormMissing {
                form_id: self.settings.form_id.clone(),
            })?;
        let endpoint = self.resolver.resolve(page)?;
        let headers = self.request_headers(page, &endpoint);

        tracing::debug!(%endpoint, fields = form.fields.len(), "refreshing preview");

        let submitted = self
            .client
            .post(endpoint.clone())
            .headers(headers.clone())
            .form(&form.fields)
            .send()
            .await
            .map_err(|e| PanelError::network(ProtocolStep::Submit, e.to_string()))?;
        let submit_status = submitted.status();
        // Drain the body so the submission has fully settled before retrieval
        submitted
            .bytes()
            .await
            .map_err(|e| PanelError::network(ProtocolStep::Submit, e.to_string()))?;
        tracing::debug!(status = %submit_status, "preview state submitted");

        let response = self
            .client
            .get(endpoint)
            .headers(headers)
            .send()
            .await
            .map_err(|e| PanelError::network(ProtocolStep::Retrieve, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "preview returned a non-success status");
        }
        tracing::debug!(%status, "fetched preview");

        response
            .text()
            .await
            .map_err(|e| PanelError::network(ProtocolStep::Retrieve, e.to_string()))
    }
}
