//! HTTP implementation of [`AuthService`]. All calls are JSON `POST`s under
//! the flow kind's path prefix, share one timeout policy, and turn non-2xx
//! answers into sanitized [`ServiceError::Rejected`] messages.

use super::{
    config::ApiConfig,
    types::{
        CompletePasswordResetRequest, CompleteRegistrationRequest, ResendRequest, StartRequest,
        StartResponse, VerifyRequest,
    },
    AuthService, FinalFields, Initiated, ServiceError,
};
use crate::{flow::FlowKind, APP_USER_AGENT};
use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, instrument, warn};
use ulid::Ulid;

/// Maximum number of error body characters surfaced to the customer.
const MAX_ERROR_CHARS: usize = 200;
/// Correlates every request of one flow in the service logs.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug)]
pub struct HttpAuthService {
    client: Client,
    config: ApiConfig,
    request_id: RwLock<Ulid>,
}

impl HttpAuthService {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        debug!(base_url = config.base_url(), "auth client ready");

        Ok(Self {
            client,
            config,
            request_id: RwLock::new(Ulid::new()),
        })
    }

    /// Identifier sent with every request of the current flow. Replaced by
    /// [`AuthService::restart`].
    #[must_use]
    pub fn request_id(&self) -> String {
        self.request_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        kind: FlowKind,
        endpoint: &str,
        body: &B,
    ) -> Result<Response, ServiceError> {
        let url = self.config.endpoint_url(kind, endpoint);
        debug!(url = %url, "auth service request");

        self.client
            .post(&url)
            .header(REQUEST_ID_HEADER, self.request_id())
            .json(body)
            .send()
            .await
            .map_err(map_request_error)
    }
}

impl AuthService for HttpAuthService {
    fn restart(&self) {
        let mut request_id = self
            .request_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *request_id = Ulid::new();
        debug!(request_id = %request_id, "new flow request id");
    }

    #[instrument(skip(self), fields(request_id = %self.request_id()))]
    async fn initiate(&self, kind: FlowKind, email: &str) -> Result<Initiated, ServiceError> {
        let request = StartRequest {
            email: email.to_string(),
        };
        let response = self.post(kind, "start", &request).await?;
        let body = handle_text_response(response).await?;

        let parsed = if body.trim().is_empty() {
            StartResponse::default()
        } else {
            serde_json::from_str::<StartResponse>(&body)
                .map_err(|err| ServiceError::Decode(format!("Failed to decode response: {err}")))?
        };

        Ok(Initiated {
            email: parsed
                .email
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| email.to_string()),
        })
    }

    #[instrument(skip(self, code), fields(request_id = %self.request_id()))]
    async fn verify(&self, kind: FlowKind, email: &str, code: &str) -> Result<(), ServiceError> {
        let request = VerifyRequest {
            email: email.to_string(),
            code: code.to_string(),
        };
        let response = self.post(kind, "verify", &request).await?;
        handle_text_response(response).await.map(drop)
    }

    #[instrument(skip(self), fields(request_id = %self.request_id()))]
    async fn resend(&self, kind: FlowKind, email: &str) -> Result<(), ServiceError> {
        let request = ResendRequest {
            email: email.to_string(),
        };
        let response = self.post(kind, "resend", &request).await?;
        handle_text_response(response).await.map(drop)
    }

    #[instrument(skip(self, input), fields(request_id = %self.request_id()))]
    async fn finalize(
        &self,
        kind: FlowKind,
        email: &str,
        input: &FinalFields,
    ) -> Result<(), ServiceError> {
        let response = match input {
            FinalFields::Registration {
                full_name,
                phone,
                password,
            } => {
                let request = CompleteRegistrationRequest {
                    email: email.to_string(),
                    full_name: full_name.clone(),
                    phone: phone.clone(),
                    password: password.expose_secret().to_string(),
                };
                self.post(kind, "complete", &request).await?
            }
            FinalFields::PasswordReset { password } => {
                let request = CompletePasswordResetRequest {
                    email: email.to_string(),
                    password: password.expose_secret().to_string(),
                };
                self.post(kind, "complete", &request).await?
            }
        };
        handle_text_response(response).await.map(drop)
    }
}

/// Maps client errors into transport or timeout failures.
fn map_request_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else if err.is_decode() {
        ServiceError::Decode(err.to_string())
    } else {
        ServiceError::Transport(format!("Unable to reach the server: {err}"))
    }
}

/// Returns the body of a 2xx response, or a sanitized rejection.
async fn handle_text_response(response: Response) -> Result<String, ServiceError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(String::new());
    }

    let body = response.text().await.map_err(map_request_error)?;
    if status.is_success() {
        Ok(body)
    } else {
        let message = error_message(&body);
        warn!(status = status.as_u16(), "auth service rejected request");
        Err(ServiceError::rejected(status.as_u16(), message))
    }
}

/// Pulls a message out of a JSON error payload, falling back to the raw body.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error", "detail"].iter().find_map(|key| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_string)
        })
    });

    sanitize_body(&from_json.unwrap_or_else(|| body.to_string()))
}

/// Trims and truncates service messages before they reach the customer.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
