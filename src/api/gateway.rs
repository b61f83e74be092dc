//! Shared HTTP gateway for the journal backend.
//!
//! One `reqwest` client configured with a base address. The current bearer
//! credential is held here and applied to every outbound request; setting it
//! to `None` removes the header. The gateway performs no retries and no
//! silent credential refresh; callers decide what a failure means.

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::GatewayError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the journal backend.
pub struct ApiGateway {
    client: Client,
    base_url: String,
    credential: RwLock<Option<String>>,
}

impl ApiGateway {
    /// Create a gateway for the given base address.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            credential: RwLock::new(None),
        })
    }

    /// Replace the bearer credential applied to subsequent requests.
    /// `None` removes the authorization header entirely.
    pub async fn set_credential(&self, credential: Option<String>) {
        *self.credential.write().await = credential;
    }

    /// Current credential, if any.
    pub async fn credential(&self) -> Option<String> {
        self.credential.read().await.clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.execute(self.client.get(self.url(path))).await
    }

    /// GET a JSON resource with query parameters.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(self.client.get(self.url(path)).query(query)).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    /// POST a multipart form (file uploads) and decode the JSON response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, GatewayError> {
        self.execute(self.client.post(self.url(path)).multipart(form)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        if let Some(token) = self.credential.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "request rejected");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}
