use crate::application::ports::{ApiRequest, HttpMethod, Transport};
use crate::shared::config::HttpConfig;
use crate::shared::error::{AppError, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// `Transport` backed by a shared `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Empty bodies (204, bare 200) decode to `Value::Null`. The status already
/// confirmed the request, so an unparsable body decodes to `Value::Null` too.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        warn!("Invalid response body, ignoring payload: {}", e);
        Value::Null
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self.client.request(to_reqwest_method(request.method), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(parse_body(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_base_url_and_path_with_one_slash() {
        assert_eq!(
            join_url("http://localhost:8080/api/", "/users/u1/follow"),
            "http://localhost:8080/api/users/u1/follow"
        );
        assert_eq!(
            join_url("http://localhost:8080/api", "feed/home?page=2"),
            "http://localhost:8080/api/feed/home?page=2"
        );
    }

    #[test]
    fn empty_bodies_decode_to_null() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(
            parse_body(r#"{"likeCount":3}"#),
            json!({ "likeCount": 3 })
        );
    }

    #[test]
    fn malformed_success_body_still_confirms() {
        assert_eq!(parse_body("<html>ok</html>"), Value::Null);
        assert_eq!(parse_body(r#"{"likeCount":"#), Value::Null);
    }

    #[test]
    fn transport_trims_configured_base_url() {
        let transport = HttpTransport::new(&HttpConfig {
            base_url: "https://example.test/api/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            transport.url_for("/posts/p1/like"),
            "https://example.test/api/posts/p1/like"
        );
    }
}
