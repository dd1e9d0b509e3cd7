//! HTTP client for the API with transparent session refresh.
//!
//! Every call goes through [`ApiClient::execute`]. When a response comes back
//! `401 Unauthorized` and the request has not been retried yet, the client marks it
//! as retried, calls `POST /auth/refresh-token` once, and replays it. A second `401`
//! is returned to the caller as-is. If the refresh itself fails the caller gets
//! [`ClientError::LoginRequired`].
//!
//! Requests built with [`ApiRequest::without_refresh`] skip this cycle. `login`,
//! `signup` and `refresh` use it, unlike a blanket "refresh on any 401" policy, so a
//! wrong password comes back as a plain `401` instead of a refresh attempt.
//!
//! Concurrent requests are not coordinated: each one that hits a `401` performs its
//! own refresh, and only the first of those can win the server-side rotation.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthResponse;
use crate::models::{PublicUser, Role};
use crate::response::{ApiErrorBody, ApiResponse};
use crate::routes::API_PREFIX;

#[derive(Debug)]
pub enum ClientError {
    /// The server answered with a non-success status.
    Api { status: StatusCode, message: String },
    /// The session could not be refreshed; the user has to sign in again.
    LoginRequired { login_path: String },
    /// Connection, TLS or body transfer failure.
    Transport(reqwest::Error),
    /// The response body did not match the expected envelope.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Api { status, message } => write!(f, "API error {}: {}", status, message),
            ClientError::LoginRequired { login_path } => {
                write!(f, "Session expired, sign in again at {}", login_path)
            }
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
            ClientError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Transport(error)
    }
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A replayable request. `retried` is the per-request marker that limits the
/// refresh-and-replay cycle to one attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    retried: bool,
    refreshable: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
            refreshable: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Credential endpoints report bad credentials with `401`; those must reach the
    /// caller instead of triggering a refresh.
    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }

    pub fn retried(&self) -> bool {
        self.retried
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    api_base: String,
    login_path: String,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            http,
            jar,
            api_base: format!("{}{}", base_url.trim_end_matches('/'), API_PREFIX),
            login_path: "/login".to_string(),
        })
    }

    /// Where callers should send the user when [`ClientError::LoginRequired`] is returned.
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// The cookie jar holding `accessToken` / `refreshToken`.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn api_url(&self, path: &str) -> Result<Url, ClientError> {
        Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| ClientError::Decode(format!("Invalid URL {}: {}", path, e)))
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.api_url(&request.path)?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Sends `request`, refreshing the session and replaying it at most once.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<reqwest::Response, ClientError> {
        loop {
            let response = self.dispatch(&request).await?;

            if response.status() != StatusCode::UNAUTHORIZED
                || request.retried
                || !request.refreshable
            {
                return ensure_success(response).await;
            }

            request.retried = true;
            if let Err(err) = self.refresh().await {
                log::warn!("Session refresh failed: {}", err);
                return Err(ClientError::LoginRequired {
                    login_path: self.login_path.clone(),
                });
            }
            log::debug!("Session refreshed, replaying {} {}", request.method, request.path);
        }
    }

    /// Sends `request` and decodes the envelope's `data`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    /// Rotates the session. Goes straight to the server, never through the retry path.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let request = ApiRequest::post("/auth/refresh-token").without_refresh();
        let response = self.dispatch(&request).await?;
        ensure_success(response).await.map(|_| ())
    }

    /// `GET /health`, which lives outside the API prefix.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let origin = self.api_base.trim_end_matches(API_PREFIX);
        let response = self.http.get(format!("{}/health", origin)).send().await?;
        let envelope: ApiResponse<Value> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    pub async fn signup(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        self.send(ApiRequest::post("/auth/signup").json(body).without_refresh())
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        self.send(
            ApiRequest::post("/auth/login")
                .json(json!({ "email": email, "password": password }))
                .without_refresh(),
        )
        .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute(ApiRequest::post("/auth/logout")).await.map(|_| ())
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        self.send(ApiRequest::get("/admin/users")).await
    }

    pub async fn update_user_role(&self, id: Uuid, role: Role) -> Result<PublicUser, ClientError> {
        self.send(ApiRequest::patch(format!("/admin/users/{}/role", id)).json(json!({ "role": role })))
            .await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ClientError> {
        self.execute(ApiRequest::delete(format!("/admin/users/{}", id)))
            .await
            .map(|_| ())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    Err(ClientError::Api { status, message })
}
