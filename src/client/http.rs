//! HTTP transport for the crawl API
//!
//! Thin wrapper over reqwest that joins paths onto the API base URL and maps
//! non-2xx answers to `Error::Api`. No retries and no rate limiting: a failed
//! request is reported once and left to the caller.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::error::{Error, Result};

/// HTTP client bound to one API base URL
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
}

#[cfg(test)]
impl HttpClient {
    /// Set the base URL (for testing only)
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` with query pairs and decode the JSON body
    #[instrument(skip(self, query), level = "debug")]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(self.url(path)).query(query);
        self.execute_request(request).await
    }

    /// POST a JSON body to `path` and decode the JSON answer; any non-2xx is an error
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        self.execute_request(request).await
    }

    /// POST a JSON body to `path`
    ///
    /// Unlike `get` and `post`, a non-2xx answer whose body is a JSON object with
    /// `status: "error"` is returned as a value: the crawl endpoints report
    /// application failures that way and callers want the message.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_value<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| Error::Decode(format!("response is not JSON: {}", e)));
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.get("status").and_then(Value::as_str) == Some("error") => {
                debug!("API reported failure with status {}", status);
                Ok(value)
            }
            _ => {
                error!("API error: {} - {}", status, text);
                Err(api_error(status.as_u16(), &text))
            }
        }
    }

    async fn execute_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error: {} - {}", status, text);
            return Err(api_error(status.as_u16(), &text));
        }

        debug!("API response: {} bytes", text.len());
        serde_json::from_str(&text).map_err(|e| Error::Decode(format!("unexpected response: {}", e)))
    }
}

// Prefer the `error` field of a JSON body over the raw text.
fn api_error(status_code: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    Error::Api {
        status_code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pong {
        message: String,
    }

    fn client(url: String) -> HttpClient {
        let mut client = HttpClient::new("http://unused", Duration::from_secs(5)).unwrap();
        client.set_base_url(url);
        client
    }

    #[tokio::test]
    async fn test_get_request_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "pong"}"#)
            .create_async()
            .await;

        let pong: Pong = client(server.url())
            .get("ping", &[("page", "2".to_string())])
            .await
            .unwrap();
        assert_eq!(pong.message, "pong");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_message_extracted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/results/x")
            .with_status(404)
            .with_body(r#"{"status": "error", "error": "Result not found"}"#)
            .create_async()
            .await;

        let result: Result<Value> = client(server.url()).get("/results/x", &[]).await;
        match result {
            Err(Error::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "Result not found");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_keeps_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/crawl")
            .match_body(mockito::Matcher::PartialJson(json!({"url": "https://a.com"})))
            .with_status(500)
            .with_body(r#"{"status": "error", "error": "timeout"}"#)
            .create_async()
            .await;

        let value = client(server.url())
            .post_value("crawl", &json!({"url": "https://a.com"}))
            .await
            .unwrap();
        assert_eq!(value["error"], "timeout");
    }

    #[tokio::test]
    async fn test_post_plain_failure_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/crawl")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = client(server.url())
            .post_value("crawl", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_url_join() {
        let client = HttpClient::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/health"), "http://localhost:5000/api/health");
        assert_eq!(client.url("results"), "http://localhost:5000/api/results");
    }
}
