//! HTTP client implementation

use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::{ApiError, SchedError};

/// Header carrying a secret credential on every request
struct AuthHeader {
    name: &'static str,
    value: SecretString,
}

/// REST client bound to one backend base URL
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: Option<AuthHeader>,
}

impl HttpClient {
    /// Create a new HTTP client, rejecting addresses that are not absolute http(s) URLs
    pub fn new(base_url: &str) -> Result<Self, SchedError> {
        let parsed = Url::parse(base_url).map_err(|e| SchedError::InvalidAddress {
            address: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SchedError::InvalidAddress {
                address: base_url.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SchedError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// Send `value` in header `name` on every request
    pub fn with_auth_header(mut self, name: &'static str, value: SecretString) -> Self {
        self.auth = Some(AuthHeader { name, value });
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(auth) = &self.auth {
            request = request.header(auth.name, auth.value.expose_secret());
        }
        request
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status != reqwest::StatusCode::NOT_FOUND {
                error!("HTTP request failed: {} - {}", status, body);
            }
            return Err(ApiError::Status { status, body });
        }

        Ok(response)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::GET, path).query(query)).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::POST, path).json(body)).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request and decode the response body
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::DELETE, path).query(query)).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request with a JSON body, ignoring the response body
    pub async fn delete_with_body<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        Self::send(self.request(Method::DELETE, path).json(body)).await?;
        Ok(())
    }

    /// Make a DELETE request, ignoring the response body
    pub async fn delete_empty(&self, path: &str) -> Result<(), ApiError> {
        Self::send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}
