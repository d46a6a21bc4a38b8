use super::error::*;
use crate::application_port::*;
use crate::domain_model::AccountSummary;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

pub async fn healthz() -> Result<impl warp::Reply, warp::Rejection> {
    Ok("OK")
}

#[derive(Deserialize)]
pub struct AccountRequest {
    pub email: String,
    pub password: String,
}

pub async fn create_account(
    body: AccountRequest,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = CreateAccountInput {
        email: body.email,
        password: body.password,
    };
    let account = credential_service
        .create_account(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&account),
        StatusCode::CREATED,
    ))
}

pub async fn update_account(
    session_token: String,
    body: AccountRequest,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = UpdateAccountInput {
        email: body.email,
        password: body.password,
    };
    let account = credential_service
        .update_account(&session_token, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&account))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub token: SessionToken,
    pub refresh_token: RefreshToken,
}

pub async fn login(
    body: LoginRequest,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
        expires_in: body.expires_in_seconds.and_then(Duration::try_seconds),
    };
    let login_result = credential_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = LoginResponse {
        account: login_result.account,
        token: login_result.session_token,
        refresh_token: login_result.refresh_token,
    };
    Ok(warp::reply::json(&response))
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: SessionToken,
}

pub async fn refresh(
    refresh_token: String,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let token = credential_service
        .renew(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenResponse { token }))
}

pub async fn revoke(
    refresh_token: String,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    credential_service
        .revoke(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(StatusCode::NO_CONTENT)
}
