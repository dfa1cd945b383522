use crate::agents::context::RequestContext;
use crate::tools::{self, Envelope, FunctionSpec, Parameter, ToolHandler, ToolResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The tool answered with an error description.
    #[error("{0}")]
    Tool(String),

    #[error("no response within {0:?}")]
    TimedOut(Duration),

    #[error("collaborator task failed: {0}")]
    Task(String),
}

/// Who a collaborator is, as presented to the coordinator and to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorProfile {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub instructions: String,
}

/// A specialized helper wrapping one tool function.
pub struct Collaborator {
    profile: CollaboratorProfile,
    tool: Arc<dyn ToolHandler>,
    function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorCard {
    #[serde(flatten)]
    pub profile: CollaboratorProfile,
    pub action_group: String,
    pub function: FunctionSpec,
}

impl Collaborator {
    /// Bind `profile` to `function` of `tool`. A function the tool does not
    /// declare is kept as-is; invoking it yields the tool's
    /// unrecognized-function error.
    pub fn new(profile: CollaboratorProfile, tool: Arc<dyn ToolHandler>, function: &str) -> Self {
        let function = tool
            .functions()
            .iter()
            .find(|f| f.name == function)
            .cloned()
            .unwrap_or_else(|| FunctionSpec {
                name: function.to_string(),
                description: String::new(),
                parameters: Vec::new(),
            });

        Self {
            profile,
            tool,
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn tool(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.tool)
    }

    pub fn card(&self) -> CollaboratorCard {
        CollaboratorCard {
            profile: self.profile.clone(),
            action_group: self.tool.action_group().to_string(),
            function: self.function.clone(),
        }
    }

    /// Build the envelope for this collaborator's function, copying the
    /// declared parameters that the request context provides.
    pub fn envelope_for(&self, context: &RequestContext, session_id: &str) -> Envelope {
        let parameters = self
            .function
            .parameters
            .iter()
            .filter_map(|spec| {
                context.get(&spec.name).map(|value| Parameter {
                    name: spec.name.clone(),
                    kind: Some(spec.kind.clone()),
                    value: Value::String(value.to_string()),
                })
            })
            .collect();

        Envelope {
            action_group: self.tool.action_group().to_string(),
            function: self.function.name.clone(),
            parameters: Some(parameters),
            session_id: Some(session_id.to_string()),
        }
    }

    pub async fn invoke(
        &self,
        context: &RequestContext,
        session_id: &str,
    ) -> Result<Value, CollaboratorError> {
        let envelope = self.envelope_for(context, session_id);
        let response = tools::invoke(self.tool.as_ref(), &envelope).await;

        match response.into_result() {
            ToolResult::Document(document) => Ok(document),
            ToolResult::Error(message) => Err(CollaboratorError::Tool(message)),
        }
    }
}
