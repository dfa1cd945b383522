//! Tool handler boundary.
//!
//! Every handler receives an [`Envelope`] naming an action group, a function
//! and a loosely-typed parameter list, and always answers with a well-formed
//! [`FunctionResponse`], whether the call succeeded or not.

pub mod envelope;
pub mod log_search;
pub mod params;
pub mod resource_metrics;

pub use envelope::{Envelope, FunctionResponse, Parameter, ToolResult};
pub use log_search::LogSearchTool;
pub use params::{ParameterError, TimeWindow};
pub use resource_metrics::ResourceMetricsTool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Declared schema of one callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
}

impl ParameterSpec {
    pub fn string(name: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: "string".to_string(),
            required,
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Routing tag this handler answers to.
    fn action_group(&self) -> &str;

    fn functions(&self) -> &[FunctionSpec];

    /// Run a recognized function. Parameter problems are reported as
    /// [`ToolResult::Error`], never as a panic or `Err`.
    async fn execute(&self, envelope: &Envelope) -> ToolResult;

    fn recognizes(&self, function: &str) -> bool {
        self.functions().iter().any(|f| f.name == function)
    }
}

/// Invoke a handler and wrap whatever it produced.
pub async fn invoke(handler: &dyn ToolHandler, envelope: &Envelope) -> FunctionResponse {
    let result = if handler.recognizes(&envelope.function) {
        handler.execute(envelope).await
    } else {
        ToolResult::unrecognized(&envelope.function)
    };

    let outcome = if result.is_error() { "error" } else { "ok" };
    tracing::info!(
        action_group = %envelope.action_group,
        function = %envelope.function,
        outcome,
        "Tool invocation handled"
    );
    metrics::counter!(
        "tool_invocations_total",
        "function" => envelope.function.clone(),
        "outcome" => outcome
    )
    .increment(1);

    FunctionResponse::wrap(envelope, &result)
}

/// Route an envelope to the handler owning its action group.
pub async fn dispatch(
    handlers: &[std::sync::Arc<dyn ToolHandler>],
    envelope: &Envelope,
) -> FunctionResponse {
    match handlers
        .iter()
        .find(|h| h.action_group() == envelope.action_group)
    {
        Some(handler) => invoke(handler.as_ref(), envelope).await,
        None => {
            tracing::warn!(action_group = %envelope.action_group, "Unknown action group");
            FunctionResponse::wrap(
                envelope,
                &ToolResult::Error(format!(
                    "Error: action group '{}' is not recognized",
                    envelope.action_group
                )),
            )
        }
    }
}
