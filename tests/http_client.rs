//! `HttpAuthService` against an in-process axum mock of the auth service.
//!
//! The mock binds an ephemeral port on localhost, so these tests need no
//! external infrastructure.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bonsai_account::auth::{
    types::{
        CompletePasswordResetRequest, CompleteRegistrationRequest, ResendRequest, StartRequest,
        StartResponse, VerifyRequest,
    },
    ApiConfig, AuthService, FinalFields, HttpAuthService, ServiceError,
};
use bonsai_account::flow::{
    FlowController, FlowError, FlowHandle, FlowKind, PasswordResetInput, RegistrationInput, Step,
};
use secrecy::SecretString;
use serde_json::json;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

const VALID_CODE: &str = "123456";

async fn register_start(headers: HeaderMap, Json(request): Json<StartRequest>) -> Response {
    if !headers.contains_key("x-request-id") {
        return (StatusCode::BAD_REQUEST, "missing request id").into_response();
    }
    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !user_agent.starts_with("bonsai-account/") {
        return (StatusCode::BAD_REQUEST, "unexpected user agent").into_response();
    }
    if request.email.starts_with("garbled@") {
        return Json(json!({ "email": 5 })).into_response();
    }
    if request.email.ends_with("@taken.shop") {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Email already registered" })),
        )
            .into_response();
    }
    Json(StartResponse {
        email: Some(request.email.to_lowercase()),
    })
    .into_response()
}

async fn verify(Json(request): Json<VerifyRequest>) -> Response {
    if request.code == VALID_CODE {
        StatusCode::NO_CONTENT.into_response()
    } else if request.code == "999999" {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "OTP expired" })),
        )
            .into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Invalid code").into_response()
    }
}

async fn resend_limited(Json(_request): Json<ResendRequest>) -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "Rate limited").into_response()
}

async fn register_complete(Json(request): Json<CompleteRegistrationRequest>) -> Response {
    if request.phone != "0912345678" || request.password.len() < 6 || request.full_name.is_empty()
    {
        return (StatusCode::UNPROCESSABLE_ENTITY, "bad registration").into_response();
    }
    StatusCode::CREATED.into_response()
}

async fn reset_start(Json(request): Json<StartRequest>) -> Response {
    if request.email.starts_with("ghost@") {
        return (StatusCode::NOT_FOUND, "user not found").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn reset_verify_slow(Json(_request): Json<VerifyRequest>) -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn reset_complete(Json(request): Json<CompletePasswordResetRequest>) -> Response {
    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "").into_response();
    }
    StatusCode::OK.into_response()
}

fn mock_router() -> Router {
    Router::new()
        .route("/v1/auth/register/start", post(register_start))
        .route("/v1/auth/register/verify", post(verify))
        .route("/v1/auth/register/resend", post(resend_limited))
        .route("/v1/auth/register/complete", post(register_complete))
        .route("/v1/auth/password-reset/start", post(reset_start))
        .route("/v1/auth/password-reset/verify", post(reset_verify_slow))
        .route("/v1/auth/password-reset/resend", post(resend_limited))
        .route("/v1/auth/password-reset/complete", post(reset_complete))
}

async fn spawn_mock() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, mock_router()).await {
            eprintln!("mock auth service stopped: {err}");
        }
    });
    Ok(format!("http://{addr}"))
}

async fn service(timeout_seconds: u64) -> Result<HttpAuthService> {
    let base_url = spawn_mock().await?;
    HttpAuthService::new(ApiConfig::new(&base_url, timeout_seconds)?)
}

#[tokio::test]
async fn registration_over_http() -> Result<()> {
    let controller = FlowController::new(FlowKind::Register, service(5).await?, FlowHandle::new());

    controller.submit_email("Lan@Bonsai.Shop").await?;
    // The pinned email is the one typed, not the service's echo.
    assert_eq!(
        controller.state().pinned_email.as_deref(),
        Some("Lan@Bonsai.Shop")
    );

    assert!(controller.submit_code("000000").await.is_err());
    assert_eq!(
        controller.state().error.as_deref(),
        Some("The code is incorrect.")
    );

    assert!(controller.submit_code("999999").await.is_err());
    assert_eq!(
        controller.state().error.as_deref(),
        Some("This code has expired. Request a new one.")
    );

    assert!(controller.resend_code().await.is_err());
    assert_eq!(
        controller.state().error.as_deref(),
        Some("Too many attempts. Please wait and try again.")
    );
    assert_eq!(controller.state().step, Step::Otp);

    controller.submit_code(VALID_CODE).await?;
    controller
        .submit_registration(RegistrationInput {
            full_name: "Lan Nguyen".to_string(),
            phone: "091-234-5678".to_string(),
            password: SecretString::from("abcdef".to_string()),
        })
        .await?;

    let state = controller.state();
    assert_eq!(state.step, Step::Done);
    assert_eq!(state.error, None);
    assert!(!state.loading);
    Ok(())
}

#[tokio::test]
async fn taken_email_maps_to_conflict_message() -> Result<()> {
    let controller = FlowController::new(FlowKind::Register, service(5).await?, FlowHandle::new());

    assert!(controller.submit_email("lan@taken.shop").await.is_err());
    let state = controller.state();
    assert_eq!(state.step, Step::Email);
    assert_eq!(state.pinned_email, None);
    assert_eq!(
        state.error.as_deref(),
        Some("An account with this email already exists.")
    );
    Ok(())
}

#[tokio::test]
async fn initiate_without_body_keeps_submitted_email() -> Result<()> {
    let service = service(5).await?;
    let initiated = service
        .initiate(FlowKind::Reset, "user@example.com")
        .await
        .expect("initiate failed");
    assert_eq!(initiated.email, "user@example.com");
    Ok(())
}

#[tokio::test]
async fn unknown_account_during_reset() -> Result<()> {
    let controller = FlowController::new(FlowKind::Reset, service(5).await?, FlowHandle::new());

    assert!(controller.submit_email("ghost@example.com").await.is_err());
    assert_eq!(
        controller.state().error.as_deref(),
        Some("No account is registered with this email.")
    );
    Ok(())
}

#[tokio::test]
async fn rejected_body_is_sanitized() -> Result<()> {
    let service = service(5).await?;
    let result = service
        .verify(FlowKind::Register, "user@example.com", "000000")
        .await;
    assert_eq!(
        result,
        Err(ServiceError::Rejected {
            status: Some(400),
            message: "Invalid code".to_string(),
        })
    );

    let result = service
        .finalize(
            FlowKind::Reset,
            "user@example.com",
            &FinalFields::PasswordReset {
                password: SecretString::from(String::new()),
            },
        )
        .await;
    assert_eq!(
        result,
        Err(ServiceError::Rejected {
            status: Some(400),
            message: "Request failed.".to_string(),
        })
    );
    Ok(())
}

#[tokio::test]
async fn slow_service_times_out() -> Result<()> {
    let controller = FlowController::new(FlowKind::Reset, service(1).await?, FlowHandle::new());
    controller.submit_email("user@example.com").await?;

    let result = controller.submit_code(VALID_CODE).await;
    assert!(result.is_err());
    let state = controller.state();
    assert_eq!(state.step, Step::Otp);
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Unable to reach the server. Please try again.")
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let service = HttpAuthService::new(ApiConfig::new(&format!("http://{addr}"), 2)?)?;
    let result = service.initiate(FlowKind::Register, "user@example.com").await;
    assert!(matches!(result, Err(ServiceError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn password_reset_over_http() -> Result<()> {
    let base_url = spawn_mock().await?;
    let service = HttpAuthService::new(ApiConfig::new(&base_url, 5)?)?;
    let controller = FlowController::new(FlowKind::Reset, service, FlowHandle::new());

    controller.submit_email("user@example.com").await?;
    // Skip the slow verify endpoint; the final step itself is under test.
    controller.handle().update(|state| state.step = Step::Final);

    controller
        .submit_password_reset(PasswordResetInput {
            password: SecretString::from("new-secret".to_string()),
            confirmation: SecretString::from("new-secret".to_string()),
        })
        .await?;
    assert_eq!(controller.state().step, Step::Done);
    Ok(())
}

#[tokio::test]
async fn unreadable_start_response_keeps_email_step() -> Result<()> {
    let controller = FlowController::new(FlowKind::Register, service(5).await?, FlowHandle::new());

    let result = controller.submit_email("garbled@bonsai.shop").await;
    assert!(matches!(
        result,
        Err(FlowError::Service {
            source: ServiceError::Decode(_),
            ..
        })
    ));
    let state = controller.state();
    assert_eq!(state.step, Step::Email);
    assert_eq!(state.pinned_email, None);
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Unexpected response from the server. Please try again.")
    );
    Ok(())
}

type SeenIds = Arc<Mutex<Vec<String>>>;

async fn record_request_id(State(seen): State<SeenIds>, headers: HeaderMap) -> StatusCode {
    let id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.lock().unwrap().push(id);
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn restarted_flow_gets_a_new_request_id() -> Result<()> {
    let seen = SeenIds::default();
    let router = Router::new()
        .route("/v1/auth/register/start", post(record_request_id))
        .route("/v1/auth/register/resend", post(record_request_id))
        .with_state(Arc::clone(&seen));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            eprintln!("request id recorder stopped: {err}");
        }
    });

    let service = HttpAuthService::new(ApiConfig::new(&format!("http://{addr}"), 5)?)?;
    let controller = FlowController::new(FlowKind::Register, service, FlowHandle::new());

    controller.submit_email("first@bonsai.shop").await?;
    controller.resend_code().await?;
    controller.reset();
    controller.submit_email("second@bonsai.shop").await?;

    let ids = seen.lock().unwrap().clone();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| !id.is_empty()));
    // Same flow, same id; a restart starts a new one.
    assert_eq!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_eq!(ids[2], controller.service().request_id());
    Ok(())
}
