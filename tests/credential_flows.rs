use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::Value;
use std::sync::Arc;
use warbler::application_impl::{JwtHs256Codec, SigningSecret};
use warbler::application_port::*;
use warbler::domain_port::RefreshTokenRepo;
use warbler::infra_memory::{MemoryAccountRepo, MemoryRefreshTokenRepo};
use warbler::server::Server;

const SECRET: &str = "donthackmebro";

fn service() -> Arc<dyn CredentialService> {
    Server::in_memory(&SigningSecret::new(SECRET))
        .credential_service
        .clone()
}

async fn create_account(service: &Arc<dyn CredentialService>) {
    service
        .create_account(CreateAccountInput {
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();
}

fn login_input(password: &str, expires_in: Option<Duration>) -> LoginInput {
    LoginInput {
        email: "a@x.com".to_string(),
        password: password.to_string(),
        expires_in,
    }
}

fn token_lifetime_secs(token: &str) -> i64 {
    let claims = decode::<Value>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap()
    .claims;
    claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap()
}

#[tokio::test]
async fn login_with_correct_and_wrong_password() {
    let service = service();
    create_account(&service).await;

    let result = service.login(login_input("secret123", None)).await.unwrap();
    assert_eq!(result.account.email, "a@x.com");
    assert!(!result.session_token.0.is_empty());
    assert_eq!(result.refresh_token.0.len(), 64);
    assert_eq!(
        service.authenticate(&result.session_token.0).await.unwrap(),
        result.account.id
    );

    let err = service.login(login_input("secret124", None)).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Unauthorized(UnauthorizedReason::InvalidCredentials)
    ));
}

#[tokio::test]
async fn login_with_unknown_email_is_not_found() {
    let service = service();
    let err = service.login(login_input("secret123", None)).await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound(Resource::Account)));
}

#[tokio::test]
async fn renewal_yields_session_for_same_account() {
    let service = service();
    create_account(&service).await;
    let login = service.login(login_input("secret123", None)).await.unwrap();

    let renewed = service.renew(&login.refresh_token.0).await.unwrap();

    let codec = JwtHs256Codec::new(&SigningSecret::new(SECRET));
    assert_eq!(codec.verify(&renewed.0).unwrap(), login.account.id);
    assert_eq!(token_lifetime_secs(&renewed.0), 3600);
}

#[tokio::test]
async fn renewal_does_not_rotate_refresh_token() {
    let refresh_repo = Arc::new(MemoryRefreshTokenRepo::new());
    let service = Server::from_stores(
        Arc::new(MemoryAccountRepo::new()),
        refresh_repo.clone(),
        &SigningSecret::new(SECRET),
    )
    .credential_service;
    create_account(&service).await;
    let login = service.login(login_input("secret123", None)).await.unwrap();
    let issued = refresh_repo
        .find_by_token(&login.refresh_token.0)
        .await
        .unwrap()
        .unwrap();

    for _ in 0..3 {
        service.renew(&login.refresh_token.0).await.unwrap();
    }

    let after = refresh_repo
        .find_by_token(&login.refresh_token.0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after, issued);
    assert_eq!(after.token, login.refresh_token.0);
    assert_eq!(after.expires_at, issued.expires_at);
}

#[tokio::test]
async fn revoked_refresh_token_cannot_renew() {
    let service = service();
    create_account(&service).await;
    let login = service.login(login_input("secret123", None)).await.unwrap();

    service.revoke(&login.refresh_token.0).await.unwrap();

    let err = service.renew(&login.refresh_token.0).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Unauthorized(UnauthorizedReason::Token(TokenRejection::Revoked))
    ));
}

#[tokio::test]
async fn revoking_twice_succeeds() {
    let service = service();
    create_account(&service).await;
    let login = service.login(login_input("secret123", None)).await.unwrap();

    service.revoke(&login.refresh_token.0).await.unwrap();
    service.revoke(&login.refresh_token.0).await.unwrap();
}

#[tokio::test]
async fn revoking_unknown_token_is_not_found() {
    let err = service().revoke("deadbeef").await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound(Resource::RefreshToken)));
}

#[tokio::test]
async fn garbage_refresh_token_is_unauthorized() {
    let service = service();
    for garbage in ["garbage", "", &"f".repeat(64)] {
        let err = service.renew(garbage).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthorized(UnauthorizedReason::UnknownToken)
        ));
    }
}

#[tokio::test]
async fn session_lifetime_is_clamped_to_one_hour() {
    let service = service();
    create_account(&service).await;

    let before = Utc::now();
    let login = service
        .login(login_input("secret123", Some(Duration::seconds(7200))))
        .await
        .unwrap();

    assert_eq!(token_lifetime_secs(&login.session_token.0), 3600);
    assert!(login.session_expires_at <= Utc::now() + Duration::seconds(3600));
    assert!(login.session_expires_at >= before + Duration::seconds(3600));
}

#[tokio::test]
async fn shorter_session_lifetime_is_honoured() {
    let service = service();
    create_account(&service).await;

    let login = service
        .login(login_input("secret123", Some(Duration::seconds(60))))
        .await
        .unwrap();
    assert_eq!(token_lifetime_secs(&login.session_token.0), 60);
}

#[tokio::test]
async fn each_login_gets_its_own_refresh_token() {
    let service = service();
    create_account(&service).await;

    let first = service.login(login_input("secret123", None)).await.unwrap();
    let second = service.login(login_input("secret123", None)).await.unwrap();
    assert_ne!(first.refresh_token.0, second.refresh_token.0);

    service.revoke(&first.refresh_token.0).await.unwrap();
    service.renew(&second.refresh_token.0).await.unwrap();
}

#[tokio::test]
async fn session_from_another_server_is_rejected() {
    let service = service();
    let other = Server::in_memory(&SigningSecret::new("some-other-secret"))
        .credential_service
        .clone();
    other
        .create_account(CreateAccountInput {
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();
    let foreign = other.login(login_input("secret123", None)).await.unwrap();

    let err = service
        .authenticate(&foreign.session_token.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Unauthorized(UnauthorizedReason::Token(TokenRejection::BadSignature))
    ));
}
