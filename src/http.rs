use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;

use crate::types::Failure;

/// A completed request/response pair with the body already read.
#[derive(Debug)]
pub struct HttpExchange {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    pub duration: Duration,
}

impl HttpExchange {
    /// Parse the captured body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, Failure> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Header value as text, `None` when absent or not valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body cut to at most `limit` characters, marked with `...` when cut.
    pub fn snippet(&self, limit: Option<usize>) -> String {
        let Some(limit) = limit else {
            return self.body.clone();
        };
        match self.body.char_indices().nth(limit) {
            Some((idx, _)) => format!("{}...", &self.body[..idx]),
            None => self.body.clone(),
        }
    }
}

/// Thin wrapper over a shared reqwest client rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        reqwest::Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<HttpExchange, Failure> {
        send(self.client.get(self.url(path))).await
    }

    pub async fn get_with_timeout(&self, path: &str, timeout: Duration) -> Result<HttpExchange, Failure> {
        send(self.client.get(self.url(path)).timeout(timeout)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<HttpExchange, Failure> {
        send(self.client.post(self.url(path)).json(body)).await
    }

    /// CORS preflight: `OPTIONS` with `Origin` and `Access-Control-Request-Method`.
    pub async fn preflight(&self, path: &str, origin: &str, method: &str) -> Result<HttpExchange, Failure> {
        let request = self
            .client
            .request(Method::OPTIONS, self.url(path))
            .header("Origin", origin)
            .header("Access-Control-Request-Method", method);
        send(request).await
    }
}

async fn send(request: RequestBuilder) -> Result<HttpExchange, Failure> {
    let start = Instant::now();
    let response = request.send().await?;
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response.text().await?;

    Ok(HttpExchange {
        status,
        headers,
        body,
        duration: start.elapsed(),
    })
}
