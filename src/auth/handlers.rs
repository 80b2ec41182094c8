use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        AuthResponse, IdentityProfile, LoginRequest, MeResponse, MessageResponse, RegisterRequest,
        UserProfile,
    },
    extractors::AuthUser,
    password::{hash_password, verify_password},
    token::TokenKeys,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Role, User};
use crate::validate::{sanitize, validate_email, validate_password};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let email = sanitize(&payload.email.trim().to_lowercase(), 254);
    let name = sanitize(payload.name.trim(), 100);

    if !validate_email(&email) {
        warn!(email = %email, "register invalid email");
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if let Err(msg) = validate_password(&payload.password) {
        warn!("register weak password");
        return Err(ApiError::BadRequest(msg.into()));
    }

    // Pre-insert existence check, not a store constraint: two concurrent
    // registrations for the same email can both pass it.
    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User {
        id: Uuid::new_v4(),
        email: email.clone(),
        name: if name.is_empty() { email.clone() } else { name },
        password_hash,
        role: Role::User,
        verified: false,
        blocked: false,
        created_at: OffsetDateTime::now_utc(),
    };
    state.store.insert_user(&user).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = sanitize(&payload.email.trim().to_lowercase(), 254);

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".into(),
        ));
    }
    if !validate_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if user.blocked {
        warn!(user_id = %user.id, "login attempt on blocked account");
        return Err(ApiError::Forbidden("Account is blocked".into()));
    }

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = TokenKeys::from_ref(&state);
    let token = keys.issue(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

#[instrument(skip_all)]
pub async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: IdentityProfile {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        },
    })
}
