//! Session lifecycle: signup, credential validation, token issuance with
//! refresh rotation, and logout.
//!
//! Every successful signup/login/refresh replaces the stored refresh-token
//! hash, so at most one refresh token per user is ever trusted; a stolen
//! token dies the moment any newer one is issued.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::PublicUser,
        jwt::{JwtKeys, TokenPair},
        password::{hash_secret, verify_secret},
        repo_types::User,
    },
    error::ApiError,
};

#[derive(Debug)]
pub struct SessionStart {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

/// Register a new user and open their first session.
pub async fn signup(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    username: &str,
    password: &str,
) -> Result<SessionStart, ApiError> {
    if User::find_by_email(db, email).await?.is_some() {
        warn!(email, "signup for taken email");
        return Err(ApiError::conflict("A user with this email already exists."));
    }

    let password_hash = hash_secret(password)?;
    let user = User::create(db, email, username, &password_hash).await?;
    let tokens = open_session(db, keys, user.id).await?;

    info!(user_id = %user.id, "user registered");
    Ok(SessionStart {
        tokens,
        user: PublicUser::from(&user),
    })
}

/// Issue a fresh token pair and persist the new refresh-token hash,
/// invalidating whatever refresh token was stored before. Shared by login
/// and refresh; the caller has already authenticated the user.
pub async fn open_session(
    db: &PgPool,
    keys: &JwtKeys,
    user_id: Uuid,
) -> Result<TokenPair, ApiError> {
    let tokens = keys.issue_pair(user_id)?;
    let refresh_hash = hash_secret(&tokens.refresh_token)?;
    if !User::set_refresh_hash(db, user_id, &refresh_hash).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(tokens)
}

/// Drop the stored refresh-token hash. Idempotent: logging out twice leaves
/// the same null state and succeeds both times.
pub async fn logout(db: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
    if !User::clear_refresh_hash(db, user_id).await? {
        return Err(ApiError::not_found("User not found!"));
    }
    info!(user_id = %user_id, "user logged out");
    Ok(())
}

/// Check email + password. Collapses "no such user" and "wrong password"
/// into one `None` so the outcome never reveals which check failed.
pub async fn validate_credentials(
    db: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let Some(user) = User::find_by_email(db, email).await? else {
        return Ok(None);
    };
    if verify_secret(password, &user.password_hash)? {
        // The hash is stripped before the row leaves the auth layer.
        Ok(Some(User {
            password_hash: String::new(),
            ..user
        }))
    } else {
        warn!(user_id = %user.id, "password mismatch");
        Ok(None)
    }
}
