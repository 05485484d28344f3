//! Outbound request descriptor and buffered reply

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Everything needed to (re-)send one request.
///
/// Immutable once built: a retry is a fresh descriptor from
/// `retry_with_token`, carrying `attempt + 1`. `attempt > 0` is the retry
/// marker the interceptor checks, and nothing ever lowers it.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    id: String,
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    attempt: u32,
}

impl OutboundRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: format!("req_{}", uuid::Uuid::new_v4().simple()),
            method,
            url,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            attempt: 0,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Set a per-request header. Overrides session defaults of the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Copy of this request for the post-refresh retry.
    pub fn retry_with_token(&self, access: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {access}"))
            .map_err(|e| Error::Header(format!("bearer token: {e}")))?;
        value.set_sensitive(true);

        let mut retry = self.clone();
        retry.headers.insert(AUTHORIZATION, value);
        retry.attempt = self.attempt + 1;
        Ok(retry)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether this request is already a post-refresh retry.
    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx reply into `Error::Status`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status.as_u16(),
                body: self.text().into_owned(),
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
