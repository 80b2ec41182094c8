use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{AlertsPage, ListQuery, SubmitAlertRequest, SubmitAlertResponse};
use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Alert, CreatorSnapshot};
use crate::validate::{
    sanitize, validate_disaster_type, validate_location, validate_message, validate_severity,
};

#[instrument(skip(state, payload))]
pub async fn submit(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<SubmitAlertRequest>,
) -> Result<(StatusCode, Json<SubmitAlertResponse>), ApiError> {
    let alert_type = sanitize(&payload.alert_type, 50);
    let location = sanitize(&payload.location, 200);
    let severity = sanitize(&payload.severity, 20);
    let message = sanitize(&payload.message, 1000);

    if alert_type.is_empty() || location.is_empty() || severity.is_empty() || message.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: location, type, severity, message".into(),
        ));
    }
    if !validate_disaster_type(&alert_type) {
        return Err(ApiError::BadRequest("Invalid disaster type".into()));
    }
    if !validate_severity(&severity) {
        return Err(ApiError::BadRequest(
            "Invalid severity. Must be one of: Low, Medium, High, Critical".into(),
        ));
    }
    if !validate_location(&location) {
        return Err(ApiError::BadRequest("Invalid location format".into()));
    }
    if let Err(msg) = validate_message(&message) {
        return Err(ApiError::BadRequest(msg.into()));
    }

    // Snapshot of the submitter as it exists right now; later user edits
    // do not propagate into the alert.
    let creator = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let alert = Alert {
        id: Uuid::new_v4(),
        alert_type,
        location,
        severity,
        message,
        timestamp: OffsetDateTime::now_utc(),
        verified: false,
        created_by: CreatorSnapshot::from(&creator),
    };
    state.store.insert_alert(&alert).await?;

    info!(alert_id = %alert.id, user_id = %creator.id, "alert submitted");
    Ok((
        StatusCode::CREATED,
        Json(SubmitAlertResponse {
            message: "Alert submitted successfully".into(),
            alert,
        }),
    ))
}

#[instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<AlertsPage>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100) as usize;
    let offset = query.offset.unwrap_or(0).max(0) as usize;

    let all = state.store.list_alerts().await?;
    let total = all.len();
    let alerts = all.into_iter().skip(offset).take(limit).collect();

    Ok(Json(AlertsPage {
        alerts,
        total,
        limit,
        offset,
    }))
}

#[instrument(skip(state, _user))]
pub async fn get_alert(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state
        .store
        .find_alert_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Alert not found".into()))?;
    Ok(Json(alert))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_util::{get, post, register_and_login, test_app};

    fn valid_alert() -> serde_json::Value {
        json!({
            "type": "Flood",
            "location": "Riverside District",
            "severity": "High",
            "message": "Water levels rising rapidly near the old bridge",
        })
    }

    #[tokio::test]
    async fn submit_requires_authentication() {
        let (app, _state) = test_app();
        let (status, _) = post(&app, "/api/alerts", None, valid_alert()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submit_and_fetch_roundtrip() {
        let (app, _state) = test_app();
        let token = register_and_login(&app, "alice@example.com").await;

        let (status, body) = post(&app, "/api/alerts", Some(&token), valid_alert()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["alert"]["type"], "Flood");
        assert_eq!(body["alert"]["verified"], false);
        assert_eq!(body["alert"]["createdBy"]["email"], "alice@example.com");
        let id = body["alert"]["id"].as_str().expect("id").to_string();

        let (status, body) = get(&app, &format!("/api/alerts/{id}"), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());

        let (status, _) = get(
            &app,
            &format!("/api/alerts/{}", uuid::Uuid::new_v4()),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn message_must_be_twenty_characters() {
        let (app, _state) = test_app();
        let token = register_and_login(&app, "alice@example.com").await;

        let mut short = valid_alert();
        short["message"] = json!("x".repeat(19));
        let (status, body) = post(&app, "/api/alerts", Some(&token), short).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("at least 20 characters"));

        let mut exact = valid_alert();
        exact["message"] = json!("x".repeat(20));
        let (status, _) = post(&app, "/api/alerts", Some(&token), exact).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn submit_validates_enumerations() {
        let (app, _state) = test_app();
        let token = register_and_login(&app, "alice@example.com").await;

        let mut bad_severity = valid_alert();
        bad_severity["severity"] = json!("Apocalyptic");
        let (status, body) = post(&app, "/api/alerts", Some(&token), bad_severity).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid severity"));

        let mut bad_type = valid_alert();
        bad_type["type"] = json!("Meteor");
        let (status, body) = post(&app, "/api/alerts", Some(&token), bad_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid disaster type");

        let mut missing = valid_alert();
        missing["location"] = json!("");
        let (status, body) = post(&app, "/api/alerts", Some(&token), missing).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Missing required"));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (app, _state) = test_app();
        let token = register_and_login(&app, "alice@example.com").await;

        for i in 0..3 {
            let mut alert = valid_alert();
            alert["message"] = json!(format!("Report number {i} with enough characters"));
            let (status, _) = post(&app, "/api/alerts", Some(&token), alert).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = get(&app, "/api/alerts?limit=2", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["alerts"].as_array().unwrap().len(), 2);

        let (_, body) = get(&app, "/api/alerts?limit=2&offset=2", Some(&token)).await;
        assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
    }
}
