use std::time::Duration;

use async_trait::async_trait;
use grantdesk_application::PermissionTransport;
use grantdesk_core::{AppError, AppResult};
use grantdesk_domain::{FormAction, PermissionRequest, UserKey, UserPermissionRecord};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const SUCCESS_CODE: i32 = 200;

/// Form login performed once before the first call.
#[derive(Debug, Clone)]
pub struct SessionLogin {
    /// Login form endpoint.
    pub url: Url,
    /// Operator account.
    pub username: String,
    /// Operator password.
    pub password: String,
}

/// `{ code, message, data }` wrapper around every service response.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope<T> {
    code: i32,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

/// reqwest-based adapter for the permission service REST API.
pub struct HttpPermissionTransport {
    http_client: reqwest::Client,
    base_url: String,
    login: Option<SessionLogin>,
    logged_in: Mutex<bool>,
}

impl HttpPermissionTransport {
    /// Creates a transport rooted at the service's API base URL.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let parsed = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid permission service URL '{base_url}': {error}"))
        })?;

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            http_client,
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
            login: None,
            logged_in: Mutex::new(false),
        })
    }

    /// Logs in with a form post before the first call and keeps the session
    /// cookie afterwards.
    #[must_use]
    pub fn with_login(mut self, login: SessionLogin) -> Self {
        self.login = Some(login);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Detail path with each segment encoded exactly once.
    fn user_detail_url(&self, key: &UserKey) -> String {
        self.endpoint(&format!(
            "permission/users/{}/{}",
            key.encoded_username(),
            key.encoded_host()
        ))
    }

    async fn ensure_session(&self) -> AppResult<()> {
        let Some(login) = &self.login else {
            return Ok(());
        };

        let mut logged_in = self.logged_in.lock().await;
        if *logged_in {
            return Ok(());
        }

        let response = self
            .http_client
            .post(login.url.clone())
            .form(&[
                ("username", login.username.as_str()),
                ("password", login.password.as_str()),
            ])
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("login request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Transport(format!(
                "login failed with status {status}: {body}"
            )));
        }
        if response
            .url()
            .query_pairs()
            .any(|(key, _)| key == "error")
        {
            return Err(AppError::Transport(
                "login rejected: check operator credentials".to_owned(),
            ));
        }

        info!(username = login.username.as_str(), "permission service session opened");
        *logged_in = true;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> AppResult<(String, Option<T>)> {
        self.ensure_session().await?;

        let request_id = Uuid::new_v4().to_string();
        let response = builder
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .send()
            .await
            .map_err(|error| {
                warn!(request_id = request_id.as_str(), error = %error, "permission service unreachable");
                AppError::Transport(format!("permission service request failed: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            AppError::Transport(format!("failed to read permission service response: {error}"))
        })?;

        if !status.is_success() {
            warn!(
                request_id = request_id.as_str(),
                status = status.as_u16(),
                "permission service returned an error status"
            );
            return Err(AppError::Transport(format!(
                "permission service returned status {status}: {body}"
            )));
        }

        let envelope: ResponseEnvelope<T> = serde_json::from_str(&body).map_err(|error| {
            AppError::Transport(format!(
                "permission service returned a malformed response: {error}"
            ))
        })?;
        let message = envelope.message.unwrap_or_default();

        if envelope.code != SUCCESS_CODE {
            info!(
                request_id = request_id.as_str(),
                code = envelope.code,
                "permission service rejected request"
            );
            return Err(AppError::Application {
                code: envelope.code,
                message,
            });
        }

        Ok((message, envelope.data))
    }

    async fn mutate(&self, path: &str, body: &impl serde::Serialize) -> AppResult<String> {
        let builder = self.http_client.post(self.endpoint(path)).json(body);
        let (message, _) = self.call::<serde_json::Value>(builder).await?;
        Ok(message)
    }
}

#[async_trait]
impl PermissionTransport for HttpPermissionTransport {
    async fn grant(&self, request: &PermissionRequest) -> AppResult<String> {
        self.mutate("permission/grant", request).await
    }

    async fn revoke(&self, request: &PermissionRequest) -> AppResult<String> {
        self.mutate("permission/revoke", request).await
    }

    async fn batch(
        &self,
        action: FormAction,
        requests: &[PermissionRequest],
    ) -> AppResult<String> {
        self.mutate(&format!("permission/batch/{}", action.as_str()), &requests)
            .await
    }

    async fn list_users(&self) -> AppResult<Vec<UserPermissionRecord>> {
        let builder = self.http_client.get(self.endpoint("permission/users"));
        let (_, data) = self.call::<Vec<UserPermissionRecord>>(builder).await?;
        Ok(data.unwrap_or_default())
    }

    async fn user_detail(&self, key: &UserKey) -> AppResult<UserPermissionRecord> {
        let builder = self.http_client.get(self.user_detail_url(key));
        let (message, data) = self.call::<UserPermissionRecord>(builder).await?;

        data.ok_or_else(|| {
            if message.is_empty() {
                AppError::NotFound(format!("account {key} not found"))
            } else {
                AppError::NotFound(message)
            }
        })
    }

    async fn user_exists(&self, key: &UserKey) -> AppResult<bool> {
        let builder = self
            .http_client
            .get(self.endpoint("permission/users/exists"))
            .query(&[("username", key.username()), ("host", key.host())]);
        let (_, data) = self.call::<bool>(builder).await?;

        data.ok_or_else(|| {
            AppError::Transport("permission service omitted the existence flag".to_owned())
        })
    }
}

#[cfg(test)]
mod tests;
