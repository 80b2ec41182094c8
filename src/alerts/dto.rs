use serde::{Deserialize, Serialize};

use crate::store::Alert;

/// Alert submission body. Fields default to empty so missing input reports
/// a field-level message instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct SubmitAlertRequest {
    #[serde(rename = "type", default)]
    pub alert_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAlertResponse {
    pub message: String,
    pub alert: Alert,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AlertsPage {
    pub alerts: Vec<Alert>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
