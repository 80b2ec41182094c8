use anyhow::Context;

use crate::rate_limit::Quota;

/// Per-operation quotas. The limiter itself takes these as parameters and
/// hardcodes nothing.
#[derive(Debug, Clone)]
pub struct RateQuotas {
    pub login: Quota,
    pub register: Quota,
    pub submit_alert: Quota,
}

impl Default for RateQuotas {
    fn default() -> Self {
        Self {
            login: Quota::new(10, 300),
            register: Quota::new(5, 300),
            submit_alert: Quota::new(20, 300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_minutes: i64,
    pub admin_bootstrap_key: String,
    pub quotas: RateQuotas,
}

impl AppConfig {
    /// Loads process-wide configuration once at startup. Secrets are
    /// required in every deployment mode: a missing or empty value is a
    /// startup error, never a built-in fallback.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let jwt_secret = required_env("JWT_SECRET")?;
        let admin_bootstrap_key = required_env("ADMIN_BOOTSTRAP_KEY")?;
        let jwt_expires_minutes = std::env::var("JWT_EXPIRES_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(10080); // 7 days

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expires_minutes,
            admin_bootstrap_key,
            quotas: RateQuotas::default(),
        })
    }
}

fn required_env(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).with_context(|| format!("{name} must be set"))?;
    anyhow::ensure!(!value.trim().is_empty(), "{name} must not be empty");
    Ok(value)
}
