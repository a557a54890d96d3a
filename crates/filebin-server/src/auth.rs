use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use tracing::debug;

use crate::config::Credentials;
use crate::error::AppError;
use crate::server::SharedState;

/// Caller that presented the shared credential
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Axum extractor that checks `Authorization: Basic` against the configured
/// credential.
///
/// Use this as a handler parameter to require authentication:
///
/// ```ignore
/// async fn my_handler(_user: AuthUser, ...) -> Result<..., AppError> { ... }
/// ```
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = &state.config.credentials;
        let unauthorized = || AppError::Unauthorized {
            realm: credentials.realm.clone(),
        };

        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|_| unauthorized())?;

        if !verify(credentials, basic.username(), basic.password()) {
            debug!(username = %basic.username(), "Rejected credentials");
            return Err(unauthorized());
        }

        Ok(AuthUser {
            username: basic.username().to_string(),
        })
    }
}

pub fn verify(credentials: &Credentials, username: &str, password: &str) -> bool {
    // No short-circuit: both halves are always compared.
    let user_ok = constant_time_eq(credentials.username.as_bytes(), username.as_bytes());
    let pass_ok = constant_time_eq(credentials.password.as_bytes(), password.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            realm: "filebin".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_verify_accepts_exact_match() {
        assert!(verify(&credentials(), "admin", "secret"));
    }

    #[test]
    fn test_verify_rejects_mismatch() {
        assert!(!verify(&credentials(), "admin", "secreT"));
        assert!(!verify(&credentials(), "admin", "secret "));
        assert!(!verify(&credentials(), "root", "secret"));
        assert!(!verify(&credentials(), "", ""));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
