use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload: subject (user id), issued-at and expiry as unix timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Why verification failed. Expiry is kept distinct from signature or
/// structural problems for logging; both surface to clients as 401.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Holds the two independent signing keys. Access and refresh tokens use
/// distinct secrets so a token of one class never verifies as the other and
/// compromise of one secret leaves the other class intact.
pub struct JwtKeys {
    access: KeyPair,
    refresh: KeyPair,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            access: KeyPair::new(
                &config.access_secret,
                Duration::minutes(config.access_ttl_minutes),
            ),
            refresh: KeyPair::new(
                &config.refresh_secret,
                Duration::minutes(config.refresh_ttl_minutes),
            ),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    fn sign(pair: &KeyPair, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + pair.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &pair.encoding)?;
        Ok(token)
    }

    fn verify(pair: &KeyPair, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data =
            decode::<Claims>(token, &pair.decoding, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;
        Ok(data.claims)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = Self::sign(&self.access, user_id)?;
        debug!(user_id = %user_id, "access token signed");
        Ok(token)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = Self::sign(&self.refresh, user_id)?;
        debug!(user_id = %user_id, "refresh token signed");
        Ok(token)
    }

    /// Mints the access/refresh pair. The two signatures are independent of
    /// each other; the caller persists the refresh hash afterwards.
    pub fn issue_pair(&self, user_id: Uuid) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_access(user_id)?,
            refresh_token: self.sign_refresh(user_id)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.refresh, token)
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
