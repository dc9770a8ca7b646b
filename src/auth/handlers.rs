use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        extractors::{AuthUser, RefreshSession, REFRESH_COOKIE},
        jwt::JwtKeys,
        repo_types::User,
        services,
    },
    error::ApiError,
    state::AppState,
};

/// The cookie is only ever sent back on the refresh route itself.
const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", get(profile))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_signup(payload: &SignupRequest) -> Result<(), ApiError> {
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Email must be a valid email address"));
    }
    if payload.username.chars().count() < 3 {
        return Err(ApiError::validation(
            "User name must be at least 3 characters long",
        ));
    }
    let password_len = payload.password.chars().count();
    if password_len < 6 {
        return Err(ApiError::validation(
            "password must be at least 6 characters long",
        ));
    }
    if password_len > 25 {
        return Err(ApiError::validation(
            "password must be shorter than 25 characters long",
        ));
    }
    Ok(())
}

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let keys = JwtKeys::from_ref(state);
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(keys.refresh_ttl())
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path(REFRESH_COOKIE_PATH)
        .build()
}

#[instrument(skip(state, jar, payload))]
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_string();
    validate_signup(&payload)?;

    let keys = JwtKeys::from_ref(&state);
    let session = services::signup(
        &state.db,
        &keys,
        &payload.email,
        &payload.username,
        &payload.password,
    )
    .await?;

    let jar = jar.add(refresh_cookie(&state, session.tokens.refresh_token));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            access_token: session.tokens.access_token,
            user: session.user,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_string();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Email must be a valid email address"));
    }

    let user = services::validate_credentials(&state.db, &payload.email, &payload.password)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let keys = JwtKeys::from_ref(&state);
    let tokens = services::open_session(&state.db, &keys, user.id).await?;

    info!(user_id = %user.id, "user logged in");
    let jar = jar.add(refresh_cookie(&state, tokens.refresh_token));
    Ok((
        jar,
        Json(AuthResponse {
            access_token: tokens.access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Clears the session server-side and removes the cookie. The cookie is
/// removed even when the user row turned out to be gone.
#[instrument(skip(state, jar))]
async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), (CookieJar, ApiError)> {
    let jar = jar.remove(removal_cookie());
    match services::logout(&state.db, user_id).await {
        Ok(()) => Ok((StatusCode::NO_CONTENT, jar)),
        Err(e) => Err((jar, e)),
    }
}

#[instrument(skip(state, session, jar))]
async fn refresh(
    State(state): State<AppState>,
    session: RefreshSession,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let tokens = services::open_session(&state.db, &keys, session.user.id).await?;

    info!(user_id = %session.user.id, "tokens rotated");
    let jar = jar.add(refresh_cookie(&state, tokens.refresh_token));
    Ok((
        jar,
        Json(AuthResponse {
            access_token: tokens.access_token,
            user: PublicUser::from(&session.user),
        }),
    ))
}

#[instrument(skip(state))]
async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn signup_validation_enforces_field_rules() {
        let base = || SignupRequest {
            email: "a@b.com".into(),
            username: "abc".into(),
            password: "secret1".into(),
        };

        assert!(validate_signup(&base()).is_ok());

        let mut bad = base();
        bad.email = "nope".into();
        assert!(validate_signup(&bad).is_err());

        let mut bad = base();
        bad.username = "ab".into();
        assert!(validate_signup(&bad).is_err());

        let mut bad = base();
        bad.password = "short".into();
        assert!(validate_signup(&bad).is_err());

        let mut bad = base();
        bad.password = "x".repeat(26);
        assert!(validate_signup(&bad).is_err());
    }

    #[tokio::test]
    async fn refresh_cookie_is_scoped_and_script_inaccessible() {
        let state = AppState::fake();
        let cookie = refresh_cookie(&state, "signed-token".into());
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.path(), Some(REFRESH_COOKIE_PATH));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        // development environment: secure flag off
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::days(7)),
        );
    }
}
