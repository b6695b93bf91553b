use crate::domain::value_objects::IdempotencyToken;
use crate::shared::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-agnostic request description produced by an action adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_idempotency_key(mut self, token: &IdempotencyToken) -> Self {
        self.headers
            .insert(IDEMPOTENCY_KEY_HEADER.to_string(), token.as_str().to_string());
        self
    }

    pub fn with_bearer(mut self, bearer: &str) -> Self {
        self.headers
            .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {bearer}"));
        self
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.headers.get(IDEMPOTENCY_KEY_HEADER).map(String::as_str)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the parsed success payload.
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}
