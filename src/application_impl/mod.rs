mod credential_service_impl;
mod password_hasher_argon2;
mod refresh_token_issuer;
mod session_token_codec_jwt;

pub use credential_service_impl::*;
pub use password_hasher_argon2::*;
pub use refresh_token_issuer::*;
pub use session_token_codec_jwt::*;
