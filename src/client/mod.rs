//! Wrapper around the Eagle application's local HTTP API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "status": "success", "data": ... }
//! ```
//!
//! [`EagleClient`] issues one request per method, checks `status` and hands
//! back the decoded `data`. Anything other than `"success"` becomes an error
//! naming the endpoint.

mod application;
mod folder;
mod item;
mod library;

pub use application::ApplicationInfo;
pub use folder::{Folder, FolderColor, FolderUpdate, find_folder_by_name};
pub use item::{AddBookmark, AddFromPath, AddFromUrl, Item, ItemListQuery, ItemUpdate};
pub use library::{LibraryInfo, LibraryLocation};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::{Config, DEFAULT_DOMAIN, DEFAULT_PORT};

const STATUS_SUCCESS: &str = "success";

/// Client for one running Eagle instance.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use eagle_client::client::{AddFromUrl, EagleClient};
///
/// # async fn example() -> anyhow::Result<()> {
/// let eagle = EagleClient::default(); // http://localhost:41595
///
/// let info = eagle.application_info().await?;
/// println!("Eagle {} on {}", info.version, info.platform);
///
/// eagle
///     .add_from_url(
///         &AddFromUrl::new("https://example.com/cat.jpg", "cat")
///             .tags(["animal", "cat"])
///             .website("https://example.com"),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EagleClient {
    host: String,
    client: Client,
}

impl Default for EagleClient {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN, DEFAULT_PORT)
    }
}

impl EagleClient {
    /// Target `{domain}:{port}`, e.g. `EagleClient::new("http://localhost", 41595)`.
    pub fn new(domain: &str, port: u16) -> Self {
        Self::with_host(format!("{}:{port}", domain.trim_end_matches('/')))
    }

    /// Target a full base URL such as `http://127.0.0.1:41595`.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Build a client from configuration, applying the request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if config.server.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.server.timeout_secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            host: config.host(),
            client,
        })
    }

    /// Base URL requests are sent to.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.host)
    }

    /// GET `endpoint` and decode the envelope's `data`.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.client.get(self.url(endpoint)).query(query);
        let data = self.send(endpoint, request).await?;
        decode_data(endpoint, data)
    }

    /// POST a JSON body to `endpoint` and return the envelope's `data`, if any.
    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Option<Value>> {
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, request).await
    }

    /// POST and require a decodable `data` field in the answer.
    async fn post_for<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let data = self.post(endpoint, body).await?;
        decode_data(endpoint, data)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Option<Value>> {
        log::debug!("Eagle request: {endpoint}");

        let resp = request
            .send()
            .await
            .with_context(|| format!("Eagle request to {endpoint} failed"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("Failed to read Eagle response from {endpoint}"))?;

        let parsed = serde_json::from_str::<Value>(&text);
        if parsed.is_err() && !status.is_success() {
            anyhow::bail!("Eagle API error ({status}) on {endpoint}: {text}");
        }
        let json =
            parsed.with_context(|| format!("Failed to parse Eagle response from {endpoint}"))?;

        unwrap_envelope(endpoint, json)
    }
}

/// Check the envelope's `status` and take its `data`.
fn unwrap_envelope(endpoint: &str, mut json: Value) -> Result<Option<Value>> {
    let status = json
        .get("status")
        .and_then(Value::as_str)
        .with_context(|| format!("No status in Eagle response from {endpoint}"))?;

    if status != STATUS_SUCCESS {
        let detail = json
            .get("message")
            .or_else(|| json.get("data"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        anyhow::bail!("Eagle API error on {endpoint}: status {status:?} {detail}");
    }

    Ok(match json.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(data) => Some(data),
    })
}

fn decode_data<T: DeserializeOwned>(endpoint: &str, data: Option<Value>) -> Result<T> {
    let data = data.with_context(|| format!("No data in Eagle response from {endpoint}"))?;
    serde_json::from_value(data)
        .with_context(|| format!("Unexpected data in Eagle response from {endpoint}"))
}

/// Start a wiremock server with `mocks` registered and a client pointed at it.
///
/// Keep the returned server alive until the test ends, otherwise `Mock::expect`
/// is never checked.
#[cfg(test)]
pub(crate) async fn start_eagle_mock(
    mocks: Vec<wiremock::Mock>,
) -> (wiremock::MockServer, EagleClient) {
    let server = wiremock::MockServer::start().await;

    for mock in mocks {
        server.register(mock).await;
    }

    let client = EagleClient::with_host(server.uri());
    (server, client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, ResponseTemplate, matchers};

    // ── construction ─────────────────────────────────────────────────

    #[test]
    fn default_client_targets_localhost() {
        assert_eq!(EagleClient::default().host(), "http://localhost:41595");
    }

    #[test]
    fn new_joins_domain_and_port() {
        assert_eq!(EagleClient::new("http://10.0.0.2/", 5000).host(), "http://10.0.0.2:5000");
        assert_eq!(EagleClient::with_host("http://eagle:1/").host(), "http://eagle:1");
    }

    #[test]
    fn from_config_uses_server_settings() {
        let mut config = Config::default();
        config.server.domain = "http://127.0.0.1".to_string();
        config.server.port = 40000;
        let client = EagleClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://127.0.0.1:40000");
    }

    // ── envelope ─────────────────────────────────────────────────────

    #[test]
    fn envelope_success_with_data() {
        let data = unwrap_envelope("/x", json!({ "status": "success", "data": [1, 2] })).unwrap();
        assert_eq!(data, Some(json!([1, 2])));
    }

    #[test]
    fn envelope_success_without_data() {
        assert_eq!(unwrap_envelope("/x", json!({ "status": "success" })).unwrap(), None);
        assert_eq!(
            unwrap_envelope("/x", json!({ "status": "success", "data": null })).unwrap(),
            None
        );
    }

    #[test]
    fn envelope_error_status() {
        let err = unwrap_envelope("/api/x", json!({ "status": "error", "data": "Item not found" }))
            .unwrap_err()
            .to_string();
        assert!(err.contains("/api/x"));
        assert!(err.contains("Item not found"));
    }

    #[test]
    fn envelope_without_status() {
        assert!(unwrap_envelope("/x", json!({ "data": 1 })).is_err());
    }

    #[test]
    fn missing_data_is_an_error_when_required() {
        assert!(decode_data::<Vec<String>>("/x", None).is_err());
        assert_eq!(
            decode_data::<Vec<String>>("/x", Some(json!(["a"]))).unwrap(),
            vec!["a".to_string()]
        );
    }

    // ── transport ────────────────────────────────────────────────────

    #[tokio::test]
    async fn http_error_with_plain_body() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::path("/api/library/history"))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
                .expect(1),
        ])
        .await;

        let err = client.library_history().await.unwrap_err().to_string();
        assert!(err.contains("500"));
        assert!(err.contains("boom"));
    }

    #[tokio::test]
    async fn non_json_success_body() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::path("/api/library/history"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
                .expect(1),
        ])
        .await;

        assert!(client.library_history().await.is_err());
    }

    #[tokio::test]
    async fn error_status_in_envelope() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::method("POST"))
                .and(matchers::path("/api/library/switch"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
                .expect(1),
        ])
        .await;

        let err = client.switch_library("/nope".as_ref()).await.unwrap_err();
        assert!(err.to_string().contains("/api/library/switch"));
    }

    #[tokio::test]
    async fn unmatched_endpoint_is_an_error() {
        // wiremock answers 404 with an empty body for anything not mounted.
        let (_server, client) = start_eagle_mock(vec![]).await;
        let err = client.application_info().await.unwrap_err().to_string();
        assert!(err.contains("404"));
    }

    #[tokio::test]
    async fn unreachable_server() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = EagleClient::new("http://127.0.0.1", port);
        assert!(client.application_info().await.is_err());
    }
}
