use crate::agents::CollaboratorCard;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct AgentsResponse {
    pub collaborators: Vec<CollaboratorCard>,
}

/// GET /agents - Collaborator catalogue with each declared function schema.
pub async fn agents_handler(State(state): State<Arc<AppState>>) -> Json<AgentsResponse> {
    Json(AgentsResponse {
        collaborators: state.coordinator.collaborators().cards(),
    })
}
