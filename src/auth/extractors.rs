//! Request gatekeepers. Each extractor is one verification strategy: the
//! handler only runs once the strategy has attached a verified identity.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{JwtKeys, TokenError},
        password::verify_secret,
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

/// Name of the http-only cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Bearer access-token strategy. Stateless: verifies the Authorization
/// header against the access secret and yields the subject id without
/// touching the database.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid Authorization header"))?;

        let claims = keys.verify_access(token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("expired access token"),
                TokenError::Invalid => warn!("invalid access token"),
            }
            ApiError::Unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser(claims.sub))
    }
}

/// Refresh-token strategy. The token is read exclusively from the
/// `refresh_token` cookie (never a header or body, so page scripts cannot
/// reach it), its signature checked against the refresh secret, and the raw
/// value compared against the argon2 hash stored on the user row. Carries
/// the raw token so the refresh endpoint knows which token it rotates away
/// from.
#[derive(Debug)]
pub struct RefreshSession {
    pub user: User,
    pub refresh_token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for RefreshSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let refresh_token = jar
            .get(REFRESH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::Unauthorized(
                "Access Denied: No refresh token found in cookie.",
            ))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_refresh(&refresh_token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("expired refresh token"),
                TokenError::Invalid => warn!("invalid refresh token"),
            }
            ApiError::Unauthorized("Access Denied: Invalid refresh token.")
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized(
                "Access Denied: User not found or no refresh token stored.",
            ))?;

        // Null hash means logged out (or never logged in): the signature
        // being valid is not enough.
        let stored_hash = user.hashed_refresh_token.as_deref().ok_or(
            ApiError::Unauthorized("Access Denied: User not found or no refresh token stored."),
        )?;

        if !verify_secret(&refresh_token, stored_hash)? {
            warn!(user_id = %user.id, "refresh token does not match stored hash");
            return Err(ApiError::Unauthorized(
                "Access Denied: Refresh token mismatch.",
            ));
        }

        Ok(RefreshSession {
            user,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/auth/refresh");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn auth_user_rejects_missing_header() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(&[]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn auth_user_rejects_non_bearer_scheme() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(&[("authorization", "Basic abc")]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn auth_user_accepts_valid_access_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = uuid::Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");

        let mut parts =
            parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let AuthUser(extracted) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("valid bearer token");
        assert_eq!(extracted, user_id);
    }

    #[tokio::test]
    async fn auth_user_rejects_refresh_token_as_bearer() {
        // A refresh token is signed with the other secret and must not pass
        // the access-token strategy.
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(uuid::Uuid::new_v4()).expect("sign refresh");

        let mut parts =
            parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_session_rejects_missing_cookie() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(&[]);
        let err = RefreshSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_session_rejects_forged_cookie() {
        // Fails on signature verification, before any database access.
        let state = AppState::fake();
        let mut parts =
            parts_with_headers(&[("cookie", "refresh_token=forged.token.value")]);
        let err = RefreshSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_session_ignores_bearer_header() {
        // The refresh strategy reads only the cookie; a valid refresh token
        // in the Authorization header is not accepted.
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(uuid::Uuid::new_v4()).expect("sign refresh");

        let mut parts =
            parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);
        let err = RefreshSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
