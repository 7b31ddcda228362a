//! HTTP client for the donation platform's REST API
//!
//! Every call goes through the interceptor [`Pipeline`]; there is no timeout,
//! retry or backoff policy here. One attempt per call.

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::pipeline::{Interceptor, Pipeline, StageGuard};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    pipeline: Arc<Pipeline>,
}

/// Body of error responses, when the API sends one
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            pipeline: Arc::new(Pipeline::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Mount an interceptor stage for as long as the guard lives
    pub fn install(&self, interceptor: Arc<dyn Interceptor>) -> StageGuard {
        self.pipeline.install(interceptor)
    }

    /// Number of installed pipeline stages
    pub fn interceptor_count(&self) -> usize {
        self.pipeline.len()
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request through the pipeline.
    ///
    /// Request stages run against the stages installed at send time; response
    /// stages run against those still installed when the response arrives.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut request = builder.build()?;

        for interceptor in self.pipeline.snapshot() {
            interceptor.on_request(&mut request).await?;
        }

        let method = request.method().clone();
        let url = request.url().clone();
        let response = self.http.execute(request).await?;
        debug!("{} {} -> {}", method, url.path(), response.status());

        for interceptor in self.pipeline.snapshot() {
            interceptor.on_response(&response).await?;
        }

        check_status(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(response.json().await?)
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(self.request(Method::PATCH, path).json(body)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

/// Join path segments, percent-encoding each one.
///
/// Emails and ids are user data; a `#`, `?` or `/` in them must stay inside
/// its segment.
pub fn resource_path(segments: &[&str]) -> String {
    let mut url = Url::parse("http://localhost/").expect("Invalid base URL - this is a bug in the codebase");
    if let Ok(mut parts) = url.path_segments_mut() {
        parts.clear().extend(segments);
    }
    url.path().trim_start_matches('/').to_string()
}

/// Map non-success statuses onto [`Error`]
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Unauthorized(status));
    }

    let path = response.url().path().to_string();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(path));
    }

    Err(Error::Api { status, message })
}
