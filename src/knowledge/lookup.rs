use crate::knowledge::index::{KnowledgeIndex, ScoredIssue};
use crate::knowledge::records::ResponsibleParties;
use crate::tools::params::{self, ParameterError};
use crate::tools::{Envelope, FunctionSpec, ParameterSpec, ToolHandler, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ACTION_GROUP: &str = "knowledge_search_actions";
pub const SEARCH_KNOWLEDGE_BASE: &str = "search_knowledge_base";

/// Fixed answer when no owner information exists for a service.
pub const NO_OWNER_INFO: &str = "No owner information found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSearchParams {
    pub service: String,
    pub query: Option<String>,
}

impl KnowledgeSearchParams {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ParameterError> {
        Ok(Self {
            service: params::required(envelope, "service")?,
            query: params::optional(envelope, "query"),
        })
    }
}

/// Owner lookup outcome: the owners, or the fixed not-found text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerAnswer {
    Found(ResponsibleParties),
    NotFound(String),
}

impl OwnerAnswer {
    pub fn not_found() -> Self {
        Self::NotFound(NO_OWNER_INFO.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnswer {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub responsible_parties: OwnerAnswer,
    pub past_issues: Vec<ScoredIssue>,
}

pub struct KnowledgeLookupTool {
    index: Arc<KnowledgeIndex>,
    min_similarity: f32,
    /// Cap on ranked results when a query is given.
    max_issues: usize,
    functions: Vec<FunctionSpec>,
}

impl KnowledgeLookupTool {
    pub fn new(index: Arc<KnowledgeIndex>, min_similarity: f32, max_issues: usize) -> Self {
        Self {
            index,
            min_similarity,
            max_issues,
            functions: vec![FunctionSpec {
                name: SEARCH_KNOWLEDGE_BASE.to_string(),
                description: "Search service ownership and similar past issues for one service."
                    .to_string(),
                parameters: vec![
                    ParameterSpec::string("service", "Exact service name", true),
                    ParameterSpec::string("query", "Error message or symptom to match past issues against", false),
                ],
            }],
        }
    }

    pub fn lookup(&self, params: &KnowledgeSearchParams) -> KnowledgeAnswer {
        let record = self.index.service(&params.service);

        let responsible_parties = match record {
            Some(r) if !r.responsible_parties.is_empty() => {
                OwnerAnswer::Found(r.responsible_parties.clone())
            }
            _ => OwnerAnswer::not_found(),
        };

        // Without a query the whole history goes back; callers filter it
        // against what they observed before cutting it down.
        let limit = match params.query {
            Some(_) => self.max_issues,
            None => usize::MAX,
        };
        let past_issues = self.index.search_issues(
            &params.service,
            params.query.as_deref(),
            self.min_similarity,
            limit,
        );

        tracing::debug!(
            service = %params.service,
            owners_found = matches!(responsible_parties, OwnerAnswer::Found(_)),
            issues = past_issues.len(),
            "Knowledge lookup complete"
        );

        KnowledgeAnswer {
            service: params.service.clone(),
            description: record.map(|r| r.description.clone()),
            responsible_parties,
            past_issues,
        }
    }
}

#[async_trait]
impl ToolHandler for KnowledgeLookupTool {
    fn action_group(&self) -> &str {
        ACTION_GROUP
    }

    fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    async fn execute(&self, envelope: &Envelope) -> ToolResult {
        match envelope.function.as_str() {
            SEARCH_KNOWLEDGE_BASE => ToolResult::from(
                KnowledgeSearchParams::from_envelope(envelope).map(|p| self.lookup(&p)),
            ),
            other => ToolResult::unrecognized(other),
        }
    }
}
