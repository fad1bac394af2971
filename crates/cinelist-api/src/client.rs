use crate::error::ApiError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_headers: BTreeMap<String, String>,
    /// v3 key, sent as `api_key` query parameter when no access token is configured
    pub api_key: Option<String>,
    /// v4 read access token, sent as `Authorization: Bearer <token>`
    pub access_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());
        default_headers.insert("accept".to_string(), "application/json".to_string());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers,
            api_key: None,
            access_token: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub params: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Response body decoded according to its declared content type
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    fn decode(content_type: &str, bytes: &[u8]) -> Result<Self, ApiError> {
        if content_type.contains("application/json") {
            if bytes.is_empty() {
                return Ok(ResponseBody::Json(serde_json::Value::Null));
            }
            serde_json::from_slice(bytes)
                .map(ResponseBody::Json)
                .map_err(|e| ApiError::DecodeFailure(e.to_string()))
        } else if content_type.contains("text/") {
            Ok(ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()))
        } else {
            Ok(ResponseBody::Binary(bytes.to_vec()))
        }
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let result = match self {
            ResponseBody::Json(value) => serde_json::from_value(value),
            ResponseBody::Text(text) => serde_json::from_str(&text),
            ResponseBody::Binary(bytes) => serde_json::from_slice(&bytes),
        };
        result.map_err(|e| ApiError::DecodeFailure(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse<ResponseBody> {
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, ApiError> {
        Ok(ApiResponse {
            data: self.data.into_typed()?,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
        })
    }
}

/// Thin wrapper over `reqwest` that owns URL building, header merging and timeouts.
///
/// The underlying `reqwest::Client` has no timeout of its own: the deadline is enforced
/// around the whole call so an expired request is dropped and reported as
/// [`ApiError::Timeout`]. Nothing here retries.
pub struct HttpClient {
    client: Client,
    config: RwLock<ClientConfig>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("cinelist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: RwLock::new(config),
        })
    }

    pub fn config(&self) -> ClientConfig {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn update_config(&self, config: ClientConfig) {
        *self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    pub fn build_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<Url, ApiError> {
        Self::build_url_with(&self.config(), endpoint, params)
    }

    fn build_url_with(config: &ClientConfig, endpoint: &str, params: &[(String, String)]) -> Result<Url, ApiError> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        let raw = format!("{}/{}", base, endpoint);

        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", raw, e)))?;

        let api_key = match (&config.access_token, &config.api_key) {
            (None, Some(key)) => Some(key.as_str()),
            _ => None,
        };

        // query_pairs_mut leaves a dangling '?' behind when nothing is appended
        if !params.is_empty() || api_key.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            if let Some(key) = api_key {
                pairs.append_pair("api_key", key);
            }
        }

        Ok(url)
    }

    fn merge_headers(config: &ClientConfig, overrides: &BTreeMap<String, String>) -> Result<HeaderMap, ApiError> {
        let mut merged: BTreeMap<String, String> = config
            .default_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();

        if let Some(token) = &config.access_token {
            merged.insert("authorization".to_string(), format!("Bearer {}", token));
        }

        for (name, value) in overrides {
            merged.insert(name.to_ascii_lowercase(), value.clone());
        }

        let mut headers = HeaderMap::new();
        for (name, value) in merged {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("header name {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|e| ApiError::InvalidRequest(format!("header value for {}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse<ResponseBody>, ApiError> {
        let config = self.config();
        let url = Self::build_url_with(&config, endpoint, &options.params)?;
        let headers = Self::merge_headers(&config, &options.headers)?;
        let timeout = options.timeout.unwrap_or(config.timeout);
        let path = url.path().to_string();

        let mut builder = self.client.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
                builder = builder.body(body.to_string());
            }
        }

        debug!("{} {}", method, path);

        match tokio::time::timeout(timeout, Self::execute(builder)).await {
            Ok(Ok(response)) => {
                debug!("{} {} - {}", method, path, response.status);
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!("{} {} failed: {}", method, path, e);
                Err(e)
            }
            Err(_) => {
                warn!("{} {} timed out after {:?}", method, path, timeout);
                Err(ApiError::Timeout(timeout))
            }
        }
    }

    async fn execute(builder: RequestBuilder) -> Result<ApiResponse<ResponseBody>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let content_type = headers.get("content-type").cloned().unwrap_or_default();
        let bytes = response.bytes().await?;
        let status_text = status.canonical_reason().unwrap_or_default().to_string();

        if !status.is_success() {
            // Keep whatever the upstream sent so callers can inspect it
            let body = ResponseBody::decode(&content_type, &bytes)
                .unwrap_or_else(|_| ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()));
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                status_text,
                body,
            });
        }

        Ok(ApiResponse {
            data: ResponseBody::decode(&content_type, &bytes)?,
            status: status.as_u16(),
            status_text,
            headers,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::GET, endpoint, None, options).await?.into_typed()
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(Method::POST, endpoint, Some(&body), options).await?.into_typed()
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(Method::PUT, endpoint, Some(&body), options).await?.into_typed()
    }

    pub async fn patch<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = to_json(body)?;
        self.request(Method::PATCH, endpoint, Some(&body), options).await?.into_typed()
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::DELETE, endpoint, None, options).await?.into_typed()
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        message: String,
    }

    fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::new(ClientConfig::new(server.base_url()).with_access_token("test-token")).unwrap()
    }

    #[test]
    fn test_build_url_trims_slashes_and_flattens_params() {
        let client = HttpClient::new(ClientConfig::new("https://api.example.com/3/")).unwrap();

        let url = client.build_url("movie/popular", &[("page".to_string(), "2".to_string())]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/3/movie/popular?page=2");

        let url = client.build_url("/movie/popular", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/3/movie/popular");
    }

    #[test]
    fn test_api_key_only_without_access_token() {
        let client = HttpClient::new(ClientConfig::new("https://api.example.com/3").with_api_key("k3y")).unwrap();
        let url = client.build_url("/movie/550", &[]).unwrap();
        assert_eq!(url.query(), Some("api_key=k3y"));

        client.update_config(client.config().with_access_token("token"));
        let url = client.build_url("/movie/550", &[]).unwrap();
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn test_get_sends_default_headers_and_params() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/greeting")
                    .query_param("lang", "en-US")
                    .header("authorization", "Bearer test-token")
                    .header("accept", "application/json");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "hello"}));
            })
            .await;

        let client = client_for(&server);
        let response: ApiResponse<Greeting> = client
            .get("/greeting", &RequestOptions::new().param("lang", "en-US"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data, Greeting { message: "hello".to_string() });
    }

    #[tokio::test]
    async fn test_per_call_headers_override_defaults() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/notes").header("accept", "text/plain");
                then.status(200).header("content-type", "text/plain").body("plain notes");
            })
            .await;

        let client = client_for(&server);
        let response = client
            .request(Method::GET, "/notes", None, &RequestOptions::new().header("Accept", "text/plain"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.data, ResponseBody::Text("plain notes".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_content_type_is_binary() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/poster.jpg");
                then.status(200).header("content-type", "image/jpeg").body(vec![0xFF_u8, 0xD8, 0xFF]);
            })
            .await;

        let client = client_for(&server);
        let response = client.request(Method::GET, "/poster.jpg", None, &RequestOptions::new()).await.unwrap();
        assert_eq!(response.data, ResponseBody::Binary(vec![0xFF, 0xD8, 0xFF]));
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie/0");
                then.status(404)
                    .header("content-type", "application/json")
                    .json_body(json!({"status_code": 34, "status_message": "The resource you requested could not be found."}));
            })
            .await;

        let client = client_for(&server);
        let error = client.get::<Greeting>("/movie/0", &RequestOptions::new()).await.unwrap_err();

        match &error {
            ApiError::RequestFailed { status, status_text, body } => {
                assert_eq!(*status, 404);
                assert_eq!(status_text, "Not Found");
                assert_eq!(body, &ResponseBody::Json(json!({"status_code": 34, "status_message": "The resource you requested could not be found."})));
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        assert_eq!(error.upstream_message(), Some("The resource you requested could not be found."));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "too late"}))
                    .delay(Duration::from_secs(2));
            })
            .await;

        let client = client_for(&server);
        let options = RequestOptions::new().timeout(Duration::from_millis(100));
        let error = client.get::<Greeting>("/slow", &options).await.unwrap_err();

        assert!(matches!(error, ApiError::Timeout(d) if d == Duration::from_millis(100)));
        assert_eq!(error.status(), Some(408));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let client = HttpClient::new(ClientConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(5))).unwrap();
        let error = client.get::<Greeting>("/anything", &RequestOptions::new()).await.unwrap_err();
        assert!(matches!(error, ApiError::NetworkFailure(_)), "got {:?}", error);
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(200).header("content-type", "application/json").body("{\"message\": ");
            })
            .await;

        let client = client_for(&server);
        let error = client.get::<Greeting>("/broken", &RequestOptions::new()).await.unwrap_err();
        assert!(matches!(error, ApiError::DecodeFailure(_)));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/movie/550/rating")
                    .header("content-type", "application/json")
                    .json_body(json!({"value": 8.5}));
                then.status(201)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "created"}));
            })
            .await;

        let client = client_for(&server);
        let response: ApiResponse<Greeting> = client
            .post("/movie/550/rating", &json!({"value": 8.5}), &RequestOptions::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.data.message, "created");
    }
}
