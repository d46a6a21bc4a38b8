use crate::application_port::{AuthError, SessionToken, SessionTokenCodec, TokenRejection};
use crate::domain_model::AccountId;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SESSION_ISSUER: &str = "warbler";

/// Server-wide HMAC key for session tokens.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        SigningSecret(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iss: String,
    sub: String, // account id as string
    iat: i64,
    exp: i64,
}

pub struct JwtHs256Codec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Codec {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn mint_at(
        &self,
        account_id: AccountId,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(SessionToken, DateTime<Utc>), AuthError> {
        let exp_dt = issued_at + ttl;
        let claims = SessionClaims {
            iss: SESSION_ISSUER.to_string(),
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: exp_dt.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok((SessionToken(token), exp_dt))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Validation(TokenRejection::Expired),
                _ => AuthError::Validation(TokenRejection::BadSignature),
            },
        )?;

        // The library accepts exp == now; a token is dead from its expiry second on.
        if data.claims.exp <= now.timestamp() {
            return Err(AuthError::Validation(TokenRejection::Expired));
        }

        data.claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| AuthError::Validation(TokenRejection::Malformed))
    }
}

impl SessionTokenCodec for JwtHs256Codec {
    fn mint(
        &self,
        account_id: AccountId,
        ttl: Duration,
    ) -> Result<(SessionToken, DateTime<Utc>), AuthError> {
        self.mint_at(account_id, Utc::now(), ttl)
    }

    fn verify(&self, token: &str) -> Result<AccountId, AuthError> {
        self.verify_at(token, Utc::now())
    }
}
