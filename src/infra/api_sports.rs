//! HTTP adapter for the API-Football v3 REST API.
//!
//! One GET per call, no retries. Only the top-level `response` array of the provider's envelope
//! is relied upon; everything inside it is returned verbatim.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url, header};
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::upstream::{SportsApi, UpstreamError, UpstreamRequest};
use crate::config::{ApiProvider, UpstreamSettings};

use super::error::InfraError;

const APISPORTS_KEY_HEADER: &str = "x-apisports-key";
const RAPIDAPI_KEY_HEADER: &str = "x-rapidapi-key";
const RAPIDAPI_HOST_HEADER: &str = "x-rapidapi-host";

#[derive(Clone, Debug)]
pub struct ApiSportsClient {
    client: Client,
    base: Url,
    api_key: String,
    provider: ApiProvider,
}

impl ApiSportsClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        // A trailing slash keeps `join` from replacing the last path segment.
        let mut base = settings.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
            provider: settings.provider,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("touchline/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, request: &UpstreamRequest) -> Result<Url, UpstreamError> {
        let mut url = self
            .base
            .join(request.path())
            .map_err(|err| UpstreamError::unavailable(format!("invalid request path: {err}")))?;
        if !request.params().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in request.params() {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn authenticate(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.provider {
            ApiProvider::ApiSports => builder.header(APISPORTS_KEY_HEADER, &self.api_key),
            ApiProvider::RapidApi => {
                let host = self.base.host_str().unwrap_or_default().to_string();
                builder
                    .header(RAPIDAPI_KEY_HEADER, &self.api_key)
                    .header(RAPIDAPI_HOST_HEADER, host)
            }
        }
    }
}

#[async_trait]
impl SportsApi for ApiSportsClient {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let url = self.url(request)?;
        debug!(%url, provider = self.provider.as_str(), "Calling upstream");

        let builder = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, "no-store");
        let response = self
            .authenticate(builder)
            .send()
            .await
            .map_err(|err| UpstreamError::unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::unavailable(format!(
                "{request} answered with status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| UpstreamError::unavailable(err.to_string()))?;
        unwrap_envelope(request, &body)
    }
}

/// Extracts the `response` array from the provider envelope.
///
/// Quota exhaustion and bad parameters come back as HTTP 200 with a non-empty `errors` field.
fn unwrap_envelope(request: &UpstreamRequest, body: &[u8]) -> Result<Value, UpstreamError> {
    let mut envelope: Value = serde_json::from_slice(body)
        .map_err(|err| UpstreamError::malformed(format!("{request}: {err}")))?;

    if let Some(errors) = envelope.get("errors")
        && has_entries(errors)
    {
        return Err(UpstreamError::unavailable(format!(
            "{request} reported errors: {errors}"
        )));
    }

    match envelope.get_mut("response").map(Value::take) {
        Some(response @ Value::Array(_)) => Ok(response),
        other => {
            warn!(
                request = %request,
                found = other.as_ref().map(json_kind).unwrap_or("nothing"),
                "Upstream envelope has no `response` array; using an empty list"
            );
            Ok(Value::Array(Vec::new()))
        }
    }
}

fn has_entries(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(text) => !text.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono_tz::Tz;
    use serde_json::json;

    use super::*;

    fn request() -> UpstreamRequest {
        UpstreamRequest::new("transfers", [("team", "50".to_string())])
    }

    fn settings(base_url: &str) -> UpstreamSettings {
        UpstreamSettings {
            base_url: Url::parse(base_url).unwrap(),
            api_key: "secret".to_string(),
            provider: ApiProvider::ApiSports,
            timeout: Duration::from_secs(10),
            timezone: Tz::UTC,
        }
    }

    #[test]
    fn response_array_is_returned_verbatim() {
        let body = json!({
            "get": "transfers",
            "errors": [],
            "results": 1,
            "response": [{ "player": { "id": 1 } }]
        });
        let data = unwrap_envelope(&request(), body.to_string().as_bytes()).unwrap();
        assert_eq!(data, json!([{ "player": { "id": 1 } }]));
    }

    #[test]
    fn missing_response_defaults_to_empty_list() {
        let body = json!({ "errors": {}, "response": null });
        let data = unwrap_envelope(&request(), body.to_string().as_bytes()).unwrap();
        assert_eq!(data, json!([]));

        let data = unwrap_envelope(&request(), b"{}").unwrap();
        assert_eq!(data, json!([]));
    }

    #[test]
    fn provider_errors_are_unavailable() {
        let body = json!({
            "errors": { "requests": "You have reached the request limit for the day" },
            "response": []
        });
        let err = unwrap_envelope(&request(), body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable { .. }));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = unwrap_envelope(&request(), b"<html>Bad gateway</html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed { .. }));
    }

    #[test]
    fn urls_keep_base_path_and_sorted_params() {
        let client = ApiSportsClient::new(&settings("https://example.test/v3")).unwrap();
        let request = UpstreamRequest::new(
            "fixtures/events",
            [("fixture", "1035037".to_string()), ("type", String::new())],
        );
        assert_eq!(
            client.url(&request).unwrap().as_str(),
            "https://example.test/v3/fixtures/events?fixture=1035037"
        );
    }

    mod fetch {
        use httpmock::prelude::*;

        use super::*;

        fn client(server: &MockServer, provider: ApiProvider) -> ApiSportsClient {
            let mut settings = settings(&server.base_url());
            settings.provider = provider;
            ApiSportsClient::new(&settings).unwrap()
        }

        fn fixture_request() -> UpstreamRequest {
            UpstreamRequest::new("fixtures", [("id", "1035037".to_string())])
        }

        #[tokio::test]
        async fn apisports_key_and_no_store_are_sent() {
            let server = MockServer::start_async().await;
            let mock = server
                .mock_async(|when, then| {
                    when.method(GET)
                        .path("/fixtures")
                        .query_param("id", "1035037")
                        .header("x-apisports-key", "secret")
                        .header("cache-control", "no-store");
                    then.status(200).json_body(json!({
                        "errors": [],
                        "response": [{ "fixture": { "id": 1035037 } }]
                    }));
                })
                .await;

            let data = client(&server, ApiProvider::ApiSports)
                .fetch(&fixture_request())
                .await
                .unwrap();

            mock.assert_async().await;
            assert_eq!(data, json!([{ "fixture": { "id": 1035037 } }]));
        }

        #[tokio::test]
        async fn rapidapi_sends_key_and_host() {
            let server = MockServer::start_async().await;
            let mock = server
                .mock_async(|when, then| {
                    when.method(GET)
                        .path("/fixtures")
                        .header("x-rapidapi-key", "secret")
                        .header("x-rapidapi-host", "127.0.0.1")
                        .header("cache-control", "no-store");
                    then.status(200).json_body(json!({ "response": [] }));
                })
                .await;

            let data = client(&server, ApiProvider::RapidApi)
                .fetch(&fixture_request())
                .await
                .unwrap();

            mock.assert_async().await;
            assert_eq!(data, json!([]));
        }

        #[tokio::test]
        async fn server_error_is_unavailable() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/fixtures");
                    then.status(503).body("upstream overloaded");
                })
                .await;

            let err = client(&server, ApiProvider::ApiSports)
                .fetch(&fixture_request())
                .await
                .unwrap_err();
            assert!(matches!(err, UpstreamError::Unavailable { .. }));
        }

        #[tokio::test]
        async fn errors_in_a_successful_response_are_unavailable() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/fixtures");
                    then.status(200).json_body(json!({
                        "errors": { "token": "Error/Missing application key." },
                        "response": []
                    }));
                })
                .await;

            let err = client(&server, ApiProvider::ApiSports)
                .fetch(&fixture_request())
                .await
                .unwrap_err();
            assert!(matches!(err, UpstreamError::Unavailable { .. }));
        }

        #[tokio::test]
        async fn html_body_is_malformed() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/fixtures");
                    then.status(200).body("<html>Bad gateway</html>");
                })
                .await;

            let err = client(&server, ApiProvider::ApiSports)
                .fetch(&fixture_request())
                .await
                .unwrap_err();
            assert!(matches!(err, UpstreamError::Malformed { .. }));
        }
    }
}
