//! Turn collaborator outcomes into report sections.
//!
//! Collaborator failures are logged with full detail here and replaced by a
//! fixed placeholder; nothing raw reaches the report.

use crate::agents::{CollaboratorError, RequestContext};
use crate::coordinator::playbook::{self, GENERIC_REMEDIATION};
use crate::coordinator::report::{
    LogFindings, OwnershipFindings, PastIncident, Report, ResourceFindings, Section,
    UNAVAILABLE_FAILED, UNAVAILABLE_REJECTED, UNAVAILABLE_TIMED_OUT,
};
use crate::knowledge::{KnowledgeAnswer, ScoredIssue};
use crate::tools::log_search::{LogEntry, LogSearchResult};
use crate::tools::resource_metrics::ResourceMetrics;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

const MAX_SUMMARY_POINTS: usize = 5;

pub type Outcome = Result<Value, CollaboratorError>;

/// Merge the three outcomes into the fixed report. At most `max_incidents`
/// past incidents survive, counted after matching them against the logs.
pub fn merge(
    session_id: &str,
    context: &RequestContext,
    logs: Outcome,
    resources: Outcome,
    knowledge: Outcome,
    max_incidents: usize,
) -> Report {
    let logs = decode::<LogSearchResult>("logs", logs);
    let resources = decode::<ResourceMetrics>("resources", resources);
    let knowledge = decode::<KnowledgeAnswer>("knowledge", knowledge);

    let retrieved = logs.as_ref().ok();

    Report {
        session_id: session_id.to_string(),
        service: context.get("service").map(String::from),
        env: context.get("env").map(String::from),
        log_analysis: match &logs {
            Ok(result) => log_section(result),
            Err(placeholder) => Section::unavailable(placeholder),
        },
        resource_analysis: match &resources {
            Ok(metrics) => Section::populated(resource_findings(metrics)),
            Err(placeholder) => Section::unavailable(placeholder),
        },
        ownership: match knowledge {
            Ok(answer) => Section::populated(ownership_findings(answer, retrieved, max_incidents)),
            Err(placeholder) => Section::unavailable(placeholder),
        },
    }
}

fn decode<T: DeserializeOwned>(section: &str, outcome: Outcome) -> Result<T, &'static str> {
    let value = outcome.map_err(|e| {
        tracing::warn!(section, error = %e, "Collaborator produced no usable data");
        placeholder_for(&e)
    })?;

    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(section, error = %e, "Collaborator returned an unexpected shape");
        UNAVAILABLE_FAILED
    })
}

fn placeholder_for(error: &CollaboratorError) -> &'static str {
    match error {
        CollaboratorError::Tool(_) => UNAVAILABLE_REJECTED,
        CollaboratorError::TimedOut(_) => UNAVAILABLE_TIMED_OUT,
        CollaboratorError::Task(_) => UNAVAILABLE_FAILED,
    }
}

fn log_section(result: &LogSearchResult) -> Section<LogFindings> {
    if result.logs.is_empty() {
        return Section::not_found();
    }
    Section::populated(log_findings(result))
}

fn log_findings(result: &LogSearchResult) -> LogFindings {
    let meta = &result.search_metadata;
    let mut summary = vec![format!(
        "{} log entries for trace {} in {} ({}) between {} and {}",
        result.logs.len(),
        meta.trace_id,
        meta.service,
        meta.environment,
        meta.from,
        meta.to
    )];

    let mut seen = HashSet::new();
    for entry in &result.logs {
        if seen.insert(entry.message.as_str()) {
            summary.push(describe(entry));
        }
    }
    if let Some(details) = result.logs.iter().find_map(|e| e.error_details.as_deref()) {
        summary.push(details.to_string());
    }
    summary.truncate(MAX_SUMMARY_POINTS);

    // Logs arrive newest first.
    let culprit = result
        .logs
        .iter()
        .find(|e| playbook::exception_signature(&e.message).is_some())
        .unwrap_or(&result.logs[0]);
    let remedy = playbook::remedy_for(&culprit.message);
    let details = result.logs.iter().find_map(|e| e.error_details.as_deref());

    let mut root_cause = vec![culprit.message.clone()];
    match (details, remedy) {
        (Some(d), Some(r)) => root_cause.push(format!("{}; {}", d, r.cause)),
        (Some(d), None) => root_cause.push(d.to_string()),
        (None, Some(r)) => root_cause.push(r.cause.to_string()),
        (None, None) => {}
    }

    let remediation = remedy
        .map(|r| r.actions)
        .unwrap_or(GENERIC_REMEDIATION)
        .iter()
        .map(|a| a.to_string())
        .collect();

    LogFindings {
        summary,
        root_cause,
        remediation,
    }
}

fn describe(entry: &LogEntry) -> String {
    match (entry.status_code, entry.path.as_deref()) {
        (Some(code), Some(path)) => {
            format!("{} {} (HTTP {} at {})", entry.timestamp, entry.message, code, path)
        }
        (Some(code), None) => format!("{} {} (HTTP {})", entry.timestamp, entry.message, code),
        _ => format!("{} {}", entry.timestamp, entry.message),
    }
}

fn resource_findings(metrics: &ResourceMetrics) -> ResourceFindings {
    let analysis = &metrics.analysis;
    let assessment = match (analysis.is_cpu_critical, analysis.is_memory_critical) {
        (true, true) => "CPU and memory usage are critical; resource exhaustion likely contributed",
        (true, false) => "CPU usage is critical; CPU saturation likely contributed",
        (false, true) => "Memory usage is critical; memory pressure likely contributed",
        (false, false) => "CPU and memory usage are within normal range; not a resource issue",
    };

    ResourceFindings {
        cpu_avg_percent: metrics.cpu.avg_usage_percent,
        cpu_peak_percent: metrics.cpu.max_usage_percent,
        memory_avg_percent: metrics.memory.avg_usage_percent,
        memory_peak_percent: metrics.memory.max_usage_percent,
        resource_related: analysis.is_resource_related_issue,
        assessment: assessment.to_string(),
    }
}

fn ownership_findings(
    answer: KnowledgeAnswer,
    logs: Option<&LogSearchResult>,
    max_incidents: usize,
) -> OwnershipFindings {
    let past_incidents = answer
        .past_issues
        .into_iter()
        .filter(|issue| matches_incident(issue, logs))
        .take(max_incidents)
        .map(|scored| PastIncident {
            timestamp: scored.issue.timestamp,
            error_message: scored.issue.error_message,
            resolution: scored.issue.resolution,
        })
        .collect();

    OwnershipFindings {
        service_owners: answer.responsible_parties,
        past_incidents,
    }
}

/// Whether a past issue resembles what the logs show. Without log entries
/// only issues that passed the similarity threshold qualify.
fn matches_incident(issue: &ScoredIssue, logs: Option<&LogSearchResult>) -> bool {
    let Some(logs) = logs.filter(|l| !l.logs.is_empty()) else {
        return issue.score.is_some();
    };

    let signatures: HashSet<&str> = logs
        .logs
        .iter()
        .filter_map(|e| playbook::exception_signature(&e.message))
        .collect();

    match playbook::exception_signature(&issue.issue.error_message) {
        Some(signature) => signatures.contains(signature),
        None => logs
            .logs
            .iter()
            .any(|e| e.message.contains(&issue.issue.error_message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::report::NOT_FOUND;
    use crate::knowledge::{IssueRecord, OwnerAnswer, NO_OWNER_INFO};
    use crate::tools::log_search::SearchMetadata;
    use serde_json::json;
    use std::time::Duration;

    fn logs() -> LogSearchResult {
        let entry = |message: &str, details: Option<&str>| LogEntry {
            timestamp: "2025-03-20 03:38:24.000".into(),
            service: "svc".into(),
            environment: "stg".into(),
            trace_id: "t1".into(),
            message: message.into(),
            stack_trace: Some("at Foo.bar(Foo.java:1)".into()),
            path: Some("/svc/api".into()),
            status_code: Some(500),
            request_id: None,
            error_details: details.map(String::from),
        };
        LogSearchResult {
            logs: vec![
                entry("java.io.IOException: Connection reset by peer", None),
                entry("Request processing failed", Some("Downstream failed")),
            ],
            search_metadata: SearchMetadata {
                trace_id: "t1".into(),
                service: "svc".into(),
                environment: "stg".into(),
                from: "a".into(),
                to: "b".into(),
                log_count: 2,
            },
        }
    }

    fn issue(message: &str, score: Option<f32>) -> ScoredIssue {
        ScoredIssue {
            issue: IssueRecord {
                service: "svc".into(),
                error_message: message.into(),
                timestamp: "2024-01-01 00:00:00".into(),
                resolution: "fixed".into(),
                trace_id: "old".into(),
            },
            score,
        }
    }

    fn knowledge(issues: Vec<ScoredIssue>) -> Value {
        serde_json::to_value(KnowledgeAnswer {
            service: "svc".into(),
            description: None,
            responsible_parties: OwnerAnswer::not_found(),
            past_issues: issues,
        })
        .unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::parse("service: svc\nenv: stg")
    }

    #[test]
    fn test_log_findings_respect_limits() {
        let findings = log_findings(&logs());
        assert!(findings.summary.len() <= 5);
        assert!(findings.root_cause.len() <= 2);
        assert_eq!(findings.remediation.len(), 3);
        assert_eq!(findings.root_cause[0], "java.io.IOException: Connection reset by peer");
        assert!(findings.root_cause[1].starts_with("Downstream failed"));
        assert!(findings.summary.iter().all(|s| !s.contains("Foo.java")));
    }

    #[test]
    fn test_unknown_failure_uses_generic_remediation() {
        let mut result = logs();
        result.logs.remove(0);
        let findings = log_findings(&result);
        assert_eq!(findings.root_cause, vec!["Request processing failed", "Downstream failed"]);
        assert_eq!(findings.remediation[0], GENERIC_REMEDIATION[0]);
    }

    #[test]
    fn test_failures_become_fixed_placeholders() {
        let report = merge(
            "s",
            &ctx(),
            Err(CollaboratorError::TimedOut(Duration::from_millis(10))),
            Err(CollaboratorError::Tool("Error: missing required parameter 'env'".into())),
            Err(CollaboratorError::Task("panicked at src/secret.rs".into())),
            3,
        );

        assert_eq!(report.log_analysis, Section::unavailable(UNAVAILABLE_TIMED_OUT));
        assert_eq!(report.resource_analysis, Section::unavailable(UNAVAILABLE_REJECTED));
        assert_eq!(report.ownership, Section::unavailable(UNAVAILABLE_FAILED));
        assert!(!report.to_string().contains("secret"));
        assert_eq!(report.service.as_deref(), Some("svc"));
    }

    #[test]
    fn test_unexpected_shape_is_unavailable() {
        let report = merge("s", &ctx(), Ok(json!({ "nope": 1 })), Ok(json!([])), Ok(json!("x")), 3);
        assert_eq!(report.populated_sections(), 0);
    }

    #[test]
    fn test_no_logs_is_not_found() {
        let mut result = logs();
        result.logs.clear();
        assert_eq!(log_section(&result), Section::not_found());
        let Section::NotFound { message } = log_section(&result) else {
            unreachable!()
        };
        assert_eq!(message, NOT_FOUND);
    }

    #[test]
    fn test_incidents_matched_by_signature() {
        let report = merge(
            "s",
            &ctx(),
            Ok(serde_json::to_value(logs()).unwrap()),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Ok(knowledge(vec![
                issue("java.io.IOException: Broken pipe", None),
                issue("java.lang.NullPointerException", None),
                issue("Request processing failed", None),
            ])),
            3,
        );

        let findings = report.ownership.findings().unwrap();
        let messages: Vec<&str> = findings
            .past_incidents
            .iter()
            .map(|i| i.error_message.as_str())
            .collect();
        assert_eq!(messages, vec!["java.io.IOException: Broken pipe", "Request processing failed"]);
        assert_eq!(findings.service_owners, OwnerAnswer::NotFound(NO_OWNER_INFO.into()));
    }

    #[test]
    fn test_without_logs_only_scored_incidents_shown() {
        let report = merge(
            "s",
            &ctx(),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Ok(knowledge(vec![
                issue("java.lang.NullPointerException", Some(0.8)),
                issue("java.io.IOException: Broken pipe", None),
            ])),
            3,
        );

        let findings = report.ownership.findings().unwrap();
        assert_eq!(findings.past_incidents.len(), 1);
        assert_eq!(findings.past_incidents[0].error_message, "java.lang.NullPointerException");
    }

    #[test]
    fn test_empty_log_result_keeps_scored_incidents() {
        let mut empty = logs();
        empty.logs.clear();
        let report = merge(
            "s",
            &ctx(),
            Ok(serde_json::to_value(empty).unwrap()),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Ok(knowledge(vec![
                issue("java.lang.NullPointerException", Some(0.8)),
                issue("java.io.IOException: Broken pipe", None),
            ])),
            3,
        );

        assert_eq!(report.log_analysis, Section::not_found());
        let findings = report.ownership.findings().unwrap();
        let messages: Vec<&str> = findings
            .past_incidents
            .iter()
            .map(|i| i.error_message.as_str())
            .collect();
        assert_eq!(messages, vec!["java.lang.NullPointerException"]);
    }

    #[test]
    fn test_incident_limit_applies_after_matching() {
        // Newest first: only the oldest issue shares the logged exception.
        let report = merge(
            "s",
            &ctx(),
            Ok(serde_json::to_value(logs()).unwrap()),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Ok(knowledge(vec![
                issue("java.lang.NullPointerException", None),
                issue("java.lang.OutOfMemoryError: Java heap space", None),
                issue("Queue full", None),
                issue("java.lang.IllegalStateException: closed", None),
                issue("java.io.IOException: Connection reset by peer", None),
            ])),
            3,
        );

        let findings = report.ownership.findings().unwrap();
        assert_eq!(findings.past_incidents.len(), 1);
        assert_eq!(
            findings.past_incidents[0].error_message,
            "java.io.IOException: Connection reset by peer"
        );
    }

    #[test]
    fn test_incident_limit_caps_matches() {
        let report = merge(
            "s",
            &ctx(),
            Ok(serde_json::to_value(logs()).unwrap()),
            Err(CollaboratorError::TimedOut(Duration::from_secs(1))),
            Ok(knowledge(
                (0..4).map(|_| issue("java.io.IOException: Broken pipe", None)).collect(),
            )),
            2,
        );

        assert_eq!(report.ownership.findings().unwrap().past_incidents.len(), 2);
    }
}
