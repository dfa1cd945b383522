use crate::state::AppState;
use crate::tools::{self, Envelope, FunctionResponse};
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /invoke - Run one tool function.
///
/// Always answers 200 with a Function Response Wrapper; unknown action groups,
/// unknown functions and parameter problems are reported inside the body.
pub async fn invoke_handler(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<Envelope>,
) -> Json<FunctionResponse> {
    tracing::debug!(
        action_group = %envelope.action_group,
        function = %envelope.function,
        session_id = envelope.session_id.as_deref().unwrap_or("-"),
        "Invocation received"
    );

    Json(tools::dispatch(&state.tools, &envelope).await)
}
