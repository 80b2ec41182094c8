use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Role, User};

/// Request body for user registration. Fields default to empty so missing
/// input fails validation with a field-level message instead of a
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Public part of the user record returned to the client.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub verified: bool,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            verified: user.verified,
            role: user.role,
        }
    }
}

/// `/auth/me` payload: the identity as asserted by the token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: IdentityProfile,
}

#[derive(Debug, Serialize)]
pub struct IdentityProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}
