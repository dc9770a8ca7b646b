use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig {
            access_secret: require_secret("JWT_ACCESS_SECRET")?,
            refresh_secret: require_secret("JWT_REFRESH_SECRET")?,
            access_ttl_minutes: std::env::var("JWT_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        Ok(Self {
            database_url,
            environment,
            jwt,
        })
    }

    /// Secure cookies everywhere except local development.
    pub fn secure_cookies(&self) -> bool {
        self.environment != "development"
    }
}

/// Signing secrets must be present and non-empty before the server starts;
/// a missing secret is a startup failure, never a per-request one.
fn require_secret(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).map_err(|_| anyhow::anyhow!("{name} is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{name} is empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_secret_rejects_empty() {
        std::env::set_var("TEST_EMPTY_SECRET", "   ");
        let err = require_secret("TEST_EMPTY_SECRET").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn require_secret_rejects_missing() {
        std::env::remove_var("TEST_MISSING_SECRET");
        let err = require_secret("TEST_MISSING_SECRET").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn secure_cookies_off_in_development() {
        let config = AppConfig {
            database_url: "postgres://localhost/ideahub".into(),
            environment: "development".into(),
            jwt: JwtConfig {
                access_secret: "a".into(),
                refresh_secret: "r".into(),
                access_ttl_minutes: 15,
                refresh_ttl_minutes: 60 * 24 * 7,
            },
        };
        assert!(!config.secure_cookies());

        let prod = AppConfig {
            environment: "production".into(),
            ..config
        };
        assert!(prod.secure_cookies());
    }
}
