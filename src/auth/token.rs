use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;
use crate::store::User;

/// Identity assertion carried by every authenticated request. Stateless:
/// verification needs no store lookup, and there is no revocation list — a
/// token stays valid until `exp` even if the user is blocked or deleted in
/// the meantime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

/// HS256 signing and verification keys plus the configured expiry.
#[derive(Clone)]
pub struct TokenKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub expiry: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let config = &state.config;
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry: Duration::from_secs(config.jwt_expires_minutes.max(0) as u64 * 60),
        }
    }
}

impl TokenKeys {
    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.expiry.as_secs() as i64);
        let name = if user.name.is_empty() {
            user.email.clone()
        } else {
            user.name.clone()
        };
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "token issued");
        Ok(token)
    }

    /// Checks signature and expiry. Structural, signature and expiry
    /// failures all surface as errors here; the HTTP boundary collapses
    /// them into one Unauthorized response.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::store::Role;

    fn keys() -> TokenKeys {
        TokenKeys::from_ref(&AppState::for_tests())
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            name: name.into(),
            password_hash: "h".into(),
            role: Role::User,
            verified: false,
            blocked: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn issue_and_verify_round_trips_claims() {
        let keys = keys();
        let user = user("Alice");
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.name, "Alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn name_falls_back_to_email() {
        let keys = keys();
        let token = keys.issue(&user("")).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.name, "alice@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".into(),
            name: "Alice".into(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = keys();
        let token = keys.issue(&user("Alice")).expect("issue");

        // Flip one character of the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).expect("ascii");
        let tampered = parts.join(".");

        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let keys = keys();
        let token = keys.issue(&user("Alice")).expect("issue");
        let other = TokenKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            expiry: Duration::from_secs(60),
        };
        assert!(other.verify(&token).is_err());
    }
}
