use crate::coordinator::Report;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct InvestigateRequest {
    /// Natural-language request, e.g. the text of an alert.
    pub request: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvestigateResponse {
    #[serde(flatten)]
    pub report: Report,
    /// The report rendered with the fixed three-section template.
    pub text: String,
}

/// POST /investigate - Fan a request out to all collaborators and merge
/// their answers into the three-section report.
pub async fn investigate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvestigateRequest>,
) -> Result<Json<InvestigateResponse>> {
    if request.request.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Request cannot be empty".to_string(),
        ));
    }

    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let report = state
        .coordinator
        .investigate(&request.request, &session_id)
        .await;
    let text = report.to_string();

    Ok(Json(InvestigateResponse { report, text }))
}
