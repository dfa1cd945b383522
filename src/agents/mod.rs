//! The three collaborators the coordinator fans out to.

pub mod collaborator;
pub mod context;

pub use collaborator::{Collaborator, CollaboratorCard, CollaboratorError, CollaboratorProfile};
pub use context::RequestContext;

use crate::config::Config;
use crate::knowledge::lookup::SEARCH_KNOWLEDGE_BASE;
use crate::knowledge::{KnowledgeIndex, KnowledgeLookupTool};
use crate::tools::log_search::SEARCH_LOGS_BY_TRACE;
use crate::tools::resource_metrics::GET_RESOURCE_METRICS;
use crate::tools::{LogSearchTool, ResourceMetricsTool, ToolHandler};
use std::sync::Arc;

pub const LOG_ANALYSIS_AGENT: &str = "log_analysis_agent";
pub const RESOURCE_ANALYSIS_AGENT: &str = "resource_analysis_agent";
pub const KB_SEARCH_AGENT: &str = "kb_search_agent";

/// The fixed collaborator set.
#[derive(Clone)]
pub struct Collaborators {
    pub log_analysis: Arc<Collaborator>,
    pub resource_analysis: Arc<Collaborator>,
    pub knowledge_search: Arc<Collaborator>,
}

impl Collaborators {
    /// Build the standard three collaborators over the given index.
    pub fn standard(config: &Config, index: Arc<KnowledgeIndex>) -> Self {
        let log_tool: Arc<dyn ToolHandler> = Arc::new(LogSearchTool::new());
        let resource_tool: Arc<dyn ToolHandler> = Arc::new(ResourceMetricsTool::new(
            config.metrics_mode,
            config.cpu_critical_percent,
            config.memory_critical_percent,
        ));
        let knowledge_tool: Arc<dyn ToolHandler> = Arc::new(KnowledgeLookupTool::new(
            index,
            config.min_similarity,
            config.max_past_issues,
        ));

        Self::from_tools(log_tool, resource_tool, knowledge_tool)
    }

    /// Bind the standard profiles to arbitrary tools; tests swap in slow or
    /// failing handlers here.
    pub fn from_tools(
        log_tool: Arc<dyn ToolHandler>,
        resource_tool: Arc<dyn ToolHandler>,
        knowledge_tool: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            log_analysis: Arc::new(Collaborator::new(
                log_analysis_profile(),
                log_tool,
                SEARCH_LOGS_BY_TRACE,
            )),
            resource_analysis: Arc::new(Collaborator::new(
                resource_analysis_profile(),
                resource_tool,
                GET_RESOURCE_METRICS,
            )),
            knowledge_search: Arc::new(Collaborator::new(
                knowledge_search_profile(),
                knowledge_tool,
                SEARCH_KNOWLEDGE_BASE,
            )),
        }
    }

    pub fn cards(&self) -> Vec<CollaboratorCard> {
        [
            &self.log_analysis,
            &self.resource_analysis,
            &self.knowledge_search,
        ]
        .iter()
        .map(|c| c.card())
        .collect()
    }
}

fn log_analysis_profile() -> CollaboratorProfile {
    CollaboratorProfile {
        name: LOG_ANALYSIS_AGENT.to_string(),
        role: "Log analysis specialist".to_string(),
        goal: "Analyze collected logs to explain the cause of an error and propose fixes."
            .to_string(),
        instructions: [
            "Search the logs of the given trace id within the given time range, then:",
            "1. Identify and summarize error messages and exceptions",
            "2. Determine the root cause",
            "3. Propose remediation",
            "4. Report affected clients, if any",
        ]
        .join("\n"),
    }
}

fn resource_analysis_profile() -> CollaboratorProfile {
    CollaboratorProfile {
        name: RESOURCE_ANALYSIS_AGENT.to_string(),
        role: "Resource status specialist".to_string(),
        goal: "Analyze CPU and memory usage of a service to identify resource-related problems."
            .to_string(),
        instructions: [
            "For the given service, environment and time range:",
            "1. Analyze CPU usage",
            "2. Analyze memory usage",
            "3. Decide whether resource exhaustion caused the problem",
            "4. Recommend actions when resources are short",
        ]
        .join("\n"),
    }
}

fn knowledge_search_profile() -> CollaboratorProfile {
    CollaboratorProfile {
        name: KB_SEARCH_AGENT.to_string(),
        role: "Ownership and incident history specialist".to_string(),
        goal: "Find the owners of a service and similar past incidents.".to_string(),
        instructions: [
            "Search by exact service name; only complete records count.",
            "Answer 'No owner information found' when owners are unclear.",
            "Only report past incidents with the same error, API or message,",
            "including when they happened and how they were resolved.",
        ]
        .join("\n"),
    }
}
