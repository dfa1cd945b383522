//! Supervising coordinator.
//!
//! One investigation is one cycle: parse the request, spawn the three
//! collaborators, wait for all of them (each bounded by a timeout), and merge
//! whatever came back into the fixed report. No state outlives the cycle.

pub mod merge;
pub mod playbook;
pub mod report;

pub use report::{Report, Section};

use crate::agents::{Collaborator, CollaboratorError, Collaborators, RequestContext};
use merge::Outcome;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    AwaitingCollaborators,
    Merging,
    Done,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Phase::Idle => Phase::Dispatching,
            Phase::Dispatching => Phase::AwaitingCollaborators,
            Phase::AwaitingCollaborators => Phase::Merging,
            Phase::Merging | Phase::Done => Phase::Done,
        }
    }
}

/// Tracks one request's progress through the phases.
#[derive(Debug)]
struct Cycle {
    phase: Phase,
}

impl Cycle {
    fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    fn advance(&mut self) -> Phase {
        self.phase = self.phase.next();
        tracing::debug!(phase = ?self.phase, "Investigation phase");
        self.phase
    }
}

/// A spawned collaborator call. Dropping it aborts the task, so abandoning an
/// investigation never leaves work running.
struct CollaboratorTask {
    handle: JoinHandle<Outcome>,
}

impl Future for CollaboratorTask {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(CollaboratorError::Task(e.to_string()))))
    }
}

impl Drop for CollaboratorTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct Coordinator {
    collaborators: Collaborators,
    timeout: Duration,
    /// Past incidents kept in the report once matched against the logs.
    max_past_incidents: usize,
}

impl Coordinator {
    pub fn new(collaborators: Collaborators, timeout: Duration, max_past_incidents: usize) -> Self {
        Self {
            collaborators,
            timeout,
            max_past_incidents,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Run one investigation cycle. Never fails: collaborator problems only
    /// degrade their own section.
    pub async fn investigate(&self, request: &str, session_id: &str) -> Report {
        let span = tracing::info_span!("investigation", session_id = %session_id);
        self.run_cycle(request, session_id).instrument(span).await
    }

    async fn run_cycle(&self, request: &str, session_id: &str) -> Report {
        let started = Instant::now();
        let mut cycle = Cycle::new();
        let context = Arc::new(RequestContext::parse(request));

        cycle.advance();
        tracing::info!(
            fields = ?context.fields().keys().collect::<Vec<_>>(),
            "Dispatching collaborators"
        );
        let logs = self.spawn(&self.collaborators.log_analysis, &context, session_id);
        let resources = self.spawn(&self.collaborators.resource_analysis, &context, session_id);
        let knowledge = self.spawn(&self.collaborators.knowledge_search, &context, session_id);

        cycle.advance();
        let (logs, resources, knowledge) = futures::future::join3(logs, resources, knowledge).await;

        cycle.advance();
        for (collaborator, outcome) in [
            (&self.collaborators.log_analysis, &logs),
            (&self.collaborators.resource_analysis, &resources),
            (&self.collaborators.knowledge_search, &knowledge),
        ] {
            record_outcome(collaborator.name(), outcome);
        }
        let report = merge::merge(
            session_id,
            &context,
            logs,
            resources,
            knowledge,
            self.max_past_incidents,
        );

        cycle.advance();
        let elapsed = started.elapsed();
        let populated = report.populated_sections();
        let outcome = if populated == 3 { "complete" } else { "partial" };

        metrics::counter!("investigations_total", "outcome" => outcome).increment(1);
        metrics::histogram!("investigation_latency_ms").record(elapsed.as_millis() as f64);
        tracing::info!(
            populated_sections = populated,
            latency_ms = elapsed.as_millis() as u64,
            "Investigation complete"
        );

        report
    }

    fn spawn(
        &self,
        collaborator: &Arc<Collaborator>,
        context: &Arc<RequestContext>,
        session_id: &str,
    ) -> CollaboratorTask {
        let collaborator = Arc::clone(collaborator);
        let context = Arc::clone(context);
        let session_id = session_id.to_string();
        let limit = self.timeout;

        let handle = tokio::spawn(
            async move {
                match tokio::time::timeout(limit, collaborator.invoke(&context, &session_id)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(CollaboratorError::TimedOut(limit)),
                }
            }
            .in_current_span(),
        );

        CollaboratorTask { handle }
    }
}

fn record_outcome(collaborator: &str, outcome: &Outcome) {
    let label = match outcome {
        Ok(_) => "ok",
        Err(CollaboratorError::Tool(_)) => "tool_error",
        Err(CollaboratorError::TimedOut(_)) => "timed_out",
        Err(CollaboratorError::Task(_)) => "failed",
    };

    match outcome {
        Ok(_) => tracing::debug!(collaborator, "Collaborator answered"),
        Err(e) => tracing::warn!(collaborator, error = %e, "Collaborator failed"),
    }
    metrics::counter!(
        "collaborator_outcomes_total",
        "collaborator" => collaborator.to_string(),
        "outcome" => label
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MetricsMode};
    use crate::coordinator::report::UNAVAILABLE_TIMED_OUT;
    use crate::ingestion::DocumentChunk;
    use crate::knowledge::{HashedEmbedder, KnowledgeIndex, KnowledgeLookupTool, OwnerAnswer};
    use crate::tools::{
        Envelope, FunctionSpec, LogSearchTool, ResourceMetricsTool, ToolHandler, ToolResult,
    };
    use async_trait::async_trait;

    const REQUEST: &str = "service: fsp-pay-gateway
env: prd-bo
trace_id: 67db8cf2000000003f2339dd4b4e1398
from_ts: 1702441545000
to_ts: 1742441905000";

    /// Delays another handler's answer.
    struct Slow {
        inner: Arc<dyn ToolHandler>,
        delay: Duration,
    }

    #[async_trait]
    impl ToolHandler for Slow {
        fn action_group(&self) -> &str {
            self.inner.action_group()
        }

        fn functions(&self) -> &[FunctionSpec] {
            self.inner.functions()
        }

        async fn execute(&self, envelope: &Envelope) -> ToolResult {
            tokio::time::sleep(self.delay).await;
            self.inner.execute(envelope).await
        }
    }

    fn slow(inner: Arc<dyn ToolHandler>, millis: u64) -> Arc<dyn ToolHandler> {
        Arc::new(Slow {
            inner,
            delay: Duration::from_millis(millis),
        })
    }

    fn tools() -> (Arc<dyn ToolHandler>, Arc<dyn ToolHandler>, Arc<dyn ToolHandler>) {
        let index = Arc::new(KnowledgeIndex::empty(HashedEmbedder::new(32)));
        let log: Arc<dyn ToolHandler> = Arc::new(LogSearchTool::new());
        let resource: Arc<dyn ToolHandler> =
            Arc::new(ResourceMetricsTool::new(MetricsMode::Seeded(3), 85.0, 85.0));
        let knowledge: Arc<dyn ToolHandler> = Arc::new(KnowledgeLookupTool::new(index, 0.35, 3));
        (log, resource, knowledge)
    }

    #[test]
    fn test_phases_run_in_order() {
        let mut cycle = Cycle::new();
        assert_eq!(cycle.phase, Phase::Idle);
        let seen: Vec<Phase> = (0..5).map(|_| cycle.advance()).collect();
        assert_eq!(
            seen,
            vec![
                Phase::Dispatching,
                Phase::AwaitingCollaborators,
                Phase::Merging,
                Phase::Done,
                Phase::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_end_to_end_all_sections_present() {
        let index = Arc::new(KnowledgeIndex::empty(HashedEmbedder::new(32)));
        let config = Config::default();
        let coordinator = Coordinator::new(
            Collaborators::standard(&config, index),
            config.collaborator_timeout,
            config.max_past_issues,
        );

        let report = coordinator.investigate(REQUEST, "session-1").await;

        assert_eq!(report.populated_sections(), 3);
        assert_eq!(report.session_id, "session-1");
        let ownership = report.ownership.findings().unwrap();
        assert_eq!(ownership.service_owners, OwnerAnswer::not_found());

        let text = report.to_string();
        assert!(text.contains("No owner information found"));
        assert!(text.contains("1. Log (message/exception) analysis"));
        assert!(text.contains("2. Resource status analysis"));
        assert!(text.contains("3. Ownership and history"));
    }

    #[tokio::test]
    async fn test_collaborators_run_concurrently() {
        let (log, resource, knowledge) = tools();
        let coordinator = Coordinator::new(
            Collaborators::from_tools(slow(log, 300), slow(resource, 300), slow(knowledge, 300)),
            Duration::from_secs(5),
            3,
        );

        let started = Instant::now();
        let report = coordinator.investigate(REQUEST, "s").await;

        assert!(started.elapsed() < Duration::from_millis(800));
        assert_eq!(report.populated_sections(), 3);
    }

    #[tokio::test]
    async fn test_timed_out_collaborator_only_degrades_its_section() {
        let (log, resource, knowledge) = tools();
        let coordinator = Coordinator::new(
            Collaborators::from_tools(log, slow(resource, 2_000), knowledge),
            Duration::from_millis(100),
            3,
        );

        let report = coordinator.investigate(REQUEST, "s").await;

        assert_eq!(report.resource_analysis, Section::unavailable(UNAVAILABLE_TIMED_OUT));
        assert!(report.log_analysis.is_populated());
        assert!(report.ownership.is_populated());
    }

    #[tokio::test]
    async fn test_old_matching_incident_survives_newer_history() {
        let history = [
            ("java.lang.NullPointerException", "2025-03-01 00:00:00"),
            ("java.lang.OutOfMemoryError: Java heap space", "2025-02-01 00:00:00"),
            ("Queue full", "2025-01-01 00:00:00"),
            ("java.io.IOException: Connection reset by peer", "2023-06-01 00:00:00"),
        ];
        let chunks = history.iter().map(|(message, ts)| DocumentChunk {
            content_type: "application/json".into(),
            content_metadata: serde_json::json!({}),
            content_body: serde_json::json!({
                "service": "fsp-pay-gateway",
                "error_message": message,
                "timestamp": ts,
                "resolution": "Recycle idle connections",
                "trace_id": "old"
            })
            .to_string(),
        });
        let index = Arc::new(KnowledgeIndex::build(HashedEmbedder::new(64), chunks));
        let log: Arc<dyn ToolHandler> = Arc::new(LogSearchTool::new());
        let resource: Arc<dyn ToolHandler> =
            Arc::new(ResourceMetricsTool::new(MetricsMode::Seeded(3), 85.0, 85.0));
        let knowledge: Arc<dyn ToolHandler> = Arc::new(KnowledgeLookupTool::new(index, 0.35, 3));
        let coordinator = Coordinator::new(
            Collaborators::from_tools(log, resource, knowledge),
            Duration::from_secs(5),
            3,
        );

        let report = coordinator.investigate(REQUEST, "s").await;

        let incidents = &report.ownership.findings().unwrap().past_incidents;
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].timestamp, "2023-06-01 00:00:00");
    }

    #[tokio::test]
    async fn test_missing_details_never_abort_cycle() {
        let (log, resource, knowledge) = tools();
        let coordinator = Coordinator::new(
            Collaborators::from_tools(log, resource, knowledge),
            Duration::from_secs(1),
            3,
        );

        let report = coordinator.investigate("service: svc", "s").await;

        assert!(!report.log_analysis.is_populated());
        assert!(!report.resource_analysis.is_populated());
        assert!(report.ownership.is_populated());
        assert!(!report.to_string().contains("trace_id"));
    }
}
