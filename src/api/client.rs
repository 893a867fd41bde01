use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::endpoint::Endpoint;
use super::models::{
    FavoriteRequest, LoginRequest, LoginResponse, ResendOtpRequest, ResendOtpResponse,
    VerifyOtpRequest, VerifyOtpResponse,
};
use super::ConnectApi;
use crate::config::ConnectConfig;
use crate::error::{ConnectError, NetworkError};
use crate::menu::{MenuCategory, MenuItem, MenuItemDetail};

/// Error payload some endpoints return alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// JSON gateway over a single `reqwest::Client`. One attempt per request,
/// no retries; every failure maps into the `NetworkError` taxonomy. The
/// client holds the session bearer token once authentication completes.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ConnectConfig) -> Result<Self, ConnectError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConnectError::Config(format!("Invalid base URL '{}': {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to build reqwest client");

        Ok(Self {
            http,
            base_url,
            auth_token: Mutex::new(None),
        })
    }

    /// Issue a request described by `endpoint` and decode the 2xx body as `T`.
    pub async fn send<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, NetworkError> {
        let url = build_url(&self.base_url, &endpoint)?;
        debug!("{:?} {}", endpoint.method, url);

        let mut request = self.http.request(endpoint.method.as_reqwest(), url.clone());

        let token = endpoint
            .auth_token
            .clone()
            .or_else(|| self.auth_token.lock().unwrap().clone());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &endpoint.body {
            // reqwest sets Content-Type: application/json here
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() || e.is_request() {
                NetworkError::Transport(e.to_string())
            } else {
                NetworkError::Unknown(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message);
            warn!("Request to {} failed with status {}", url, status);
            return Err(NetworkError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Failed to decode response from {}: {}", url, e);
            NetworkError::Decoding(e.to_string())
        })
    }
}

fn build_url(base_url: &Url, endpoint: &Endpoint) -> Result<Url, NetworkError> {
    let joined = format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        endpoint.path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|e| NetworkError::InvalidRequest(format!("Invalid URL '{joined}': {e}")))?;
    if !endpoint.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &endpoint.query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

#[async_trait]
impl ConnectApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, NetworkError> {
        self.send(Endpoint::post("/auth/login").json_body(request)?)
            .await
    }

    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, NetworkError> {
        self.send(Endpoint::post("/auth/verify-otp").json_body(request)?)
            .await
    }

    async fn resend_otp(
        &self,
        request: &ResendOtpRequest,
    ) -> Result<ResendOtpResponse, NetworkError> {
        self.send(Endpoint::post("/auth/resend-otp").json_body(request)?)
            .await
    }

    async fn fetch_categories(&self) -> Result<Vec<MenuCategory>, NetworkError> {
        self.send(Endpoint::get("/menu/categories")).await
    }

    async fn fetch_items(&self, category_id: &str) -> Result<Vec<MenuItem>, NetworkError> {
        self.send(Endpoint::get("/menu/items").query("categoryId", category_id))
            .await
    }

    async fn fetch_item_detail(&self, item_id: &str) -> Result<MenuItemDetail, NetworkError> {
        self.send(Endpoint::get(format!("/menu/items/{item_id}")))
            .await
    }

    async fn set_favorite(&self, item_id: &str, is_favorite: bool) -> Result<bool, NetworkError> {
        self.send(
            Endpoint::post(format!("/menu/favorites/{item_id}"))
                .json_body(&FavoriteRequest { is_favorite })?,
        )
        .await
    }

    fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.lock().unwrap() = token;
    }
}
