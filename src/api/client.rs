//! HTTP implementation of the backend collaborator interface
//!
//! One [`reqwest::Client`] per backend, built once with the configured
//! timeout. Endpoints are joined onto the configured base URL; the session
//! cookie, when configured, is attached verbatim to every request.

use std::time::Duration;

use crate::api::{AnalysisResponse, BackendApi, HistoryResponse, UploadResponse};
use crate::error::{CarelinkError, Result};

/// Shape of an error body (`{"error": "..."}`) from any endpoint
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// reqwest-backed [`BackendApi`] implementation
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use url::Url;
/// use carelink::api::HttpBackend;
///
/// let backend = HttpBackend::new(
///     Url::parse("http://localhost:5000").unwrap(),
///     None,
///     Duration::from_secs(30),
/// );
/// ```
#[derive(Debug)]
pub struct HttpBackend {
    /// Underlying reqwest HTTP client.
    http_client: reqwest::Client,
    /// Base URL all endpoint paths are joined onto.
    base_url: url::Url,
    /// Session cookie sent verbatim when present.
    auth_cookie: Option<String>,
}

impl HttpBackend {
    /// Construct a new [`HttpBackend`] targeting `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend origin (e.g. `http://localhost:5000`).
    /// * `auth_cookie` - Session cookie header value, if already held.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: url::Url, auth_cookie: Option<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            // SAFETY: Default reqwest client construction cannot fail
            // unless TLS initialisation fails, which is a fatal startup
            // condition on any supported platform.
            .expect("failed to build reqwest client");

        Self {
            http_client,
            base_url,
            auth_cookie,
        }
    }

    /// Joins an endpoint path onto the base URL
    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path)
            .map_err(|e| CarelinkError::Backend(format!("Invalid endpoint {}: {}", path, e)).into())
    }

    /// Attaches the session cookie to a request when configured
    fn authenticated(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_cookie {
            Some(cookie) => req.header(reqwest::header::COOKIE, cookie),
            None => req,
        }
    }

    /// Converts a non-success response into a backend error
    ///
    /// Prefers the server's `error` field; falls back to the HTTP status.
    async fn error_from(response: reqwest::Response) -> CarelinkError {
        let status = response.status();
        let detail = match response.json::<ErrorBody>().await {
            Ok(ErrorBody { error: Some(msg) }) => msg,
            _ => format!("HTTP {}", status),
        };
        CarelinkError::Backend(detail)
    }
}

#[async_trait::async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_history(&self) -> Result<HistoryResponse> {
        let url = self.endpoint("/api/chat-history")?;
        tracing::debug!(%url, "fetching chat history");

        let response = self.authenticated(self.http_client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await.into());
        }

        Ok(response.json::<HistoryResponse>().await?)
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        description: &str,
    ) -> Result<UploadResponse> {
        let url = self.endpoint("/api/upload-document")?;
        tracing::debug!(%url, file_name, size = bytes.len(), "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("description", description.to_string());

        let response = self
            .authenticated(self.http_client.post(url))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await.into());
        }

        Ok(response.json::<UploadResponse>().await?)
    }

    async fn analyze_document(&self, file_path: &str) -> Result<AnalysisResponse> {
        let url = self.endpoint("/api/analyze-lab-report")?;
        tracing::debug!(%url, file_path, "requesting lab report analysis");

        let response = self
            .authenticated(self.http_client.post(url))
            .json(&serde_json::json!({ "file_path": file_path }))
            .send()
            .await?;

        // The body is decoded on any status: a rejection carries `error`
        // instead of `analysis` and the engine substitutes its fallback.
        Ok(response.json::<AnalysisResponse>().await?)
    }
}
