use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    BlockUserRequest, BlockUserResponse, BootstrapQuery, BootstrapResponse, CreateAdminRequest,
    DeleteAlertRequest, DeleteAlertResponse, DeleteUserRequest, DeleteUserResponse,
    ListUsersQuery, UserView, UsersPage, VerifyAlertRequest, VerifyAlertResponse,
    VerifyUserRequest, VerifyUserResponse,
};
use crate::auth::extractors::AdminUser;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Role, User};
use crate::validate::{sanitize, validate_email, validate_password};

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersPage>, ApiError> {
    let limit = query.limit.unwrap_or(100).max(0) as usize;
    let offset = query.offset.unwrap_or(0).max(0) as usize;

    let all = state.store.list_users().await?;
    let total = all.len();
    let users = all
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(UserView::from)
        .collect();

    Ok(Json(UsersPage {
        users,
        total,
        limit,
        offset,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn verify_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<VerifyUserRequest>,
) -> Result<Json<VerifyUserResponse>, ApiError> {
    let mut target = state
        .store
        .find_user_by_id(payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    target.verified = payload.verified;
    state.store.upsert_user(&target).await?;

    info!(admin_id = %admin.user.id, user_id = %target.id, verified = payload.verified, "user verification changed");
    Ok(Json(VerifyUserResponse {
        message: if payload.verified {
            "User verified".into()
        } else {
            "User unverified".into()
        },
        user_id: payload.user_id,
        verified: payload.verified,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn block_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<BlockUserRequest>,
) -> Result<Json<BlockUserResponse>, ApiError> {
    if payload.user_id == admin.user.id {
        return Err(ApiError::BadRequest(
            "Cannot block your own account".into(),
        ));
    }

    let mut target = state
        .store
        .find_user_by_id(payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    target.blocked = payload.blocked;
    state.store.upsert_user(&target).await?;

    warn!(
        admin_id = %admin.user.id,
        user_id = %target.id,
        blocked = payload.blocked,
        reason = %payload.reason,
        "user block changed"
    );
    Ok(Json(BlockUserResponse {
        message: if payload.blocked {
            "User blocked".into()
        } else {
            "User unblocked".into()
        },
        user_id: payload.user_id,
        blocked: payload.blocked,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    if payload.user_id == admin.user.id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".into(),
        ));
    }

    let target = state
        .store
        .find_user_by_id(payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    state.store.delete_user(target.id).await?;

    // The user's alerts go with them.
    let alerts = state.store.list_alerts_by_creator(target.id).await?;
    for alert in &alerts {
        state.store.delete_alert(alert.id).await?;
    }

    info!(admin_id = %admin.user.id, user_id = %target.id, alerts = alerts.len(), "user deleted");
    Ok(Json(DeleteUserResponse {
        message: format!("User deleted along with {} alerts", alerts.len()),
        user_id: payload.user_id,
        alerts_deleted: alerts.len(),
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn verify_alert(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<VerifyAlertRequest>,
) -> Result<Json<VerifyAlertResponse>, ApiError> {
    let mut alert = state
        .store
        .find_alert_by_id(payload.alert_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Alert not found".into()))?;

    alert.verified = payload.verified;
    state.store.upsert_alert(&alert).await?;

    info!(admin_id = %admin.user.id, alert_id = %alert.id, verified = payload.verified, "alert verification changed");
    Ok(Json(VerifyAlertResponse {
        message: if payload.verified {
            "Alert verified".into()
        } else {
            "Alert unverified".into()
        },
        alert_id: payload.alert_id,
        verified: payload.verified,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn delete_alert(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<DeleteAlertRequest>,
) -> Result<Json<DeleteAlertResponse>, ApiError> {
    let alert = state
        .store
        .find_alert_by_id(payload.alert_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Alert not found".into()))?;

    state.store.delete_alert(alert.id).await?;

    info!(admin_id = %admin.user.id, alert_id = %alert.id, reason = %payload.reason, "alert deleted");
    Ok(Json(DeleteAlertResponse {
        message: "Alert deleted".into(),
        alert_id: payload.alert_id,
        reason: payload.reason,
    }))
}

/// Out-of-band bootstrap, gated by the `ADMIN_BOOTSTRAP_KEY` rather than a
/// user token: creates the first admin account or backfills fields on user
/// documents written by older deployments.
#[instrument(skip(state, headers, payload))]
pub async fn bootstrap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BootstrapQuery>,
    payload: Option<Json<CreateAdminRequest>>,
) -> Result<(StatusCode, Json<BootstrapResponse>), ApiError> {
    let expected = format!("Bearer {}", state.config.admin_bootstrap_key);
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return Err(ApiError::Unauthorized("Unauthorized".into()));
    }

    match query.action.as_deref().unwrap_or("update_schema") {
        "update_schema" => update_user_schema(&state).await,
        "create_admin" => {
            let Json(payload) =
                payload.ok_or_else(|| ApiError::BadRequest("Missing request body".into()))?;
            create_admin(&state, payload).await
        }
        _ => Err(ApiError::BadRequest("Unknown action".into())),
    }
}

async fn update_user_schema(
    state: &AppState,
) -> Result<(StatusCode, Json<BootstrapResponse>), ApiError> {
    // Deserializing fills defaults for missing fields; writing back
    // persists them.
    let users = state.store.list_users().await?;
    for user in &users {
        state.store.upsert_user(user).await?;
    }

    info!(updated = users.len(), "user schema backfilled");
    Ok((
        StatusCode::OK,
        Json(BootstrapResponse {
            message: format!("Updated {} users", users.len()),
            email: None,
        }),
    ))
}

async fn create_admin(
    state: &AppState,
    payload: CreateAdminRequest,
) -> Result<(StatusCode, Json<BootstrapResponse>), ApiError> {
    let email = sanitize(&payload.email.trim().to_lowercase(), 254);
    let name = sanitize(payload.name.trim(), 100);

    if !validate_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if let Err(msg) = validate_password(&payload.password) {
        return Err(ApiError::BadRequest(msg.into()));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Ok((
            StatusCode::OK,
            Json(BootstrapResponse {
                message: "Admin user already exists".into(),
                email: Some(email),
            }),
        ));
    }

    let admin = User {
        id: Uuid::new_v4(),
        email: email.clone(),
        name: if name.is_empty() {
            "System Administrator".into()
        } else {
            name
        },
        password_hash: hash_password(&payload.password)?,
        role: Role::Admin,
        verified: true,
        blocked: false,
        created_at: OffsetDateTime::now_utc(),
    };
    state.store.insert_user(&admin).await?;

    info!(user_id = %admin.id, email = %admin.email, "admin user created");
    Ok((
        StatusCode::CREATED,
        Json(BootstrapResponse {
            message: "Admin user created".into(),
            email: Some(email),
        }),
    ))
}
