use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::RouteNotFound
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::BadRequest
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiError {
        code: code.clone(),
        message: code.to_string(),
    });
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum ApiErrorCode {
    #[error("Not found")]
    NotFound,
    #[error("Route not found")]
    RouteNotFound,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Malformed request")]
    BadRequest,
    #[error("Email already taken")]
    Conflict,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound | ApiErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotFound(resource) => {
                debug!(%resource, "request rejected: not found");
                ApiErrorCode::NotFound
            }
            AuthError::Unauthorized(reason) => {
                debug!(%reason, "request rejected: unauthorized");
                ApiErrorCode::Unauthorized
            }
            AuthError::PasswordMismatch => ApiErrorCode::Unauthorized,
            AuthError::Validation(_) | AuthError::InvalidInput(_) => ApiErrorCode::BadRequest,
            AuthError::AccountExists => ApiErrorCode::Conflict,
            e @ (AuthError::TokenCollision
            | AuthError::Randomness(_)
            | AuthError::Hashing(_)
            | AuthError::Signing(_)
            | AuthError::Store(_)) => ApiErrorCode::internal(e),
        }
    }
}
