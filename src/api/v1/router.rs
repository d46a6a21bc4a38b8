use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Path before method, so an unknown path is a 404 rather than a 405.
    let healthz = warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::healthz);

    let create_account = warp::path("users")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.credential_service.clone()))
        .and_then(handler::create_account);

    let update_account = warp::path("users")
        .and(warp::path::end())
        .and(warp::put())
        .and(with_bearer())
        .and(warp::body::json())
        .and(with(server.credential_service.clone()))
        .and_then(handler::update_account);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.credential_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_bearer())
        .and(with(server.credential_service.clone()))
        .and_then(handler::refresh);

    let revoke = warp::path("revoke")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_bearer())
        .and(with(server.credential_service.clone()))
        .and_then(handler::revoke);

    healthz
        .or(create_account)
        .or(update_account)
        .or(login)
        .or(refresh)
        .or(revoke)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|value| value.trim().strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthorized(UnauthorizedReason::MissingBearer))
}

fn with_bearer() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    // Raw header map, so a value that is not visible ASCII is a missing bearer, not a bad request.
    warp::header::headers_cloned().and_then(|headers: http::HeaderMap| async move {
        let header = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        bearer_token(header)
            .map(str::to_owned)
            .map_err(ApiErrorCode::from)
            .map_err(reject::custom)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(bearer_token(Some("Bearer 3289euihjsknlv")).unwrap(), "3289euihjsknlv");
        assert_eq!(bearer_token(Some("  Bearer  abc  ")).unwrap(), "abc");
    }

    #[test]
    fn missing_or_foreign_header_is_unauthorized() {
        for header in [None, Some(""), Some("Bearer "), Some("Basic dXNlcjpwdw=="), Some("abc")] {
            let err = bearer_token(header).unwrap_err();
            assert!(matches!(
                err,
                AuthError::Unauthorized(UnauthorizedReason::MissingBearer)
            ));
        }
    }
}
