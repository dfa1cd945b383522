//! Log search by trace id.
//!
//! Stands in for a log-platform query. The returned entries are synthetic but
//! deterministic for a given input, and always ordered most recent first.

use crate::tools::params::{self, ParameterError, TimeWindow};
use crate::tools::{Envelope, FunctionSpec, ParameterSpec, ToolHandler, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const ACTION_GROUP: &str = "log_analysis_actions";
pub const SEARCH_LOGS_BY_TRACE: &str = "search_logs_by_trace";

const ENTRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSearchParams {
    pub trace_id: String,
    pub window: TimeWindow,
    pub service: String,
    pub env: String,
}

impl LogSearchParams {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ParameterError> {
        let trace_id = params::required(envelope, "trace_id")?;
        let window = TimeWindow::from_envelope(envelope)?;
        Ok(Self {
            trace_id,
            window,
            service: params::required(envelope, "service")?,
            env: params::required(envelope, "env")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub service: String,
    pub environment: String,
    pub trace_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub trace_id: String,
    pub service: String,
    pub environment: String,
    pub from: String,
    pub to: String,
    pub log_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSearchResult {
    pub logs: Vec<LogEntry>,
    pub search_metadata: SearchMetadata,
}

pub struct LogSearchTool {
    functions: Vec<FunctionSpec>,
}

impl Default for LogSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSearchTool {
    pub fn new() -> Self {
        Self {
            functions: vec![FunctionSpec {
                name: SEARCH_LOGS_BY_TRACE.to_string(),
                description: "Search the log platform for entries of one trace id within a time range."
                    .to_string(),
                parameters: vec![
                    ParameterSpec::string("trace_id", "Trace id to search for", true),
                    ParameterSpec::string("from_ts", "Start of the range (epoch milliseconds)", true),
                    ParameterSpec::string("to_ts", "End of the range (epoch milliseconds)", true),
                    ParameterSpec::string("service", "Service name", true),
                    ParameterSpec::string("env", "Environment, e.g. prd-bo or stg", true),
                ],
            }],
        }
    }

    pub fn search(&self, params: &LogSearchParams) -> LogSearchResult {
        let newest_ms = (params.window.to_ms - 1_000).max(params.window.from_ms);
        let older_ms = (newest_ms - 1_183).max(params.window.from_ms);

        let mut stamped = vec![
            (
                older_ms,
                LogEntry {
                    timestamp: params::format_millis(older_ms, ENTRY_TIMESTAMP_FORMAT),
                    service: params.service.clone(),
                    environment: params.env.clone(),
                    trace_id: params.trace_id.clone(),
                    message: "Request processing failed".to_string(),
                    stack_trace: None,
                    path: None,
                    status_code: None,
                    request_id: None,
                    error_details: Some("Communication with downstream service failed".to_string()),
                },
            ),
            (
                newest_ms,
                LogEntry {
                    timestamp: params::format_millis(newest_ms, ENTRY_TIMESTAMP_FORMAT),
                    service: params.service.clone(),
                    environment: params.env.clone(),
                    trace_id: params.trace_id.clone(),
                    message: "java.io.IOException: Connection reset by peer".to_string(),
                    stack_trace: Some(
                        [
                            "at java.net.SocketInputStream.read(SocketInputStream.java:210)",
                            "at java.net.SocketInputStream.read(SocketInputStream.java:141)",
                            "at java.io.BufferedInputStream.fill(BufferedInputStream.java:246)",
                            "at org.apache.http.impl.io.SessionInputBufferImpl.streamRead(SessionInputBufferImpl.java:139)",
                        ]
                        .join("\n"),
                    ),
                    path: Some(format!("/{}/DSP/API/Communication", params.service)),
                    status_code: Some(500),
                    request_id: Some(request_id_for(&params.trace_id)),
                    error_details: None,
                },
            ),
        ];

        // Most recent first; stable so equal stamps keep emission order.
        stamped.sort_by(|a, b| b.0.cmp(&a.0));
        let logs: Vec<LogEntry> = stamped.into_iter().map(|(_, entry)| entry).collect();

        LogSearchResult {
            search_metadata: SearchMetadata {
                trace_id: params.trace_id.clone(),
                service: params.service.clone(),
                environment: params.env.clone(),
                from: params.window.from_label(),
                to: params.window.to_label(),
                log_count: logs.len(),
            },
            logs,
        }
    }
}

#[async_trait]
impl ToolHandler for LogSearchTool {
    fn action_group(&self) -> &str {
        ACTION_GROUP
    }

    fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    async fn execute(&self, envelope: &Envelope) -> ToolResult {
        match envelope.function.as_str() {
            SEARCH_LOGS_BY_TRACE => {
                ToolResult::from(LogSearchParams::from_envelope(envelope).map(|p| self.search(&p)))
            }
            other => ToolResult::unrecognized(other),
        }
    }
}

/// Stable request id derived from the trace id.
fn request_id_for(trace_id: &str) -> String {
    let digest = Sha256::digest(trace_id.as_bytes());
    let hex: String = digest[..3].iter().map(|b| format!("{:02x}", b)).collect();
    format!("req-{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{invoke, Parameter};

    fn request() -> Envelope {
        Envelope::new(
            ACTION_GROUP,
            SEARCH_LOGS_BY_TRACE,
            vec![
                Parameter::string("trace_id", "67db8cf2000000003f2339dd4b4e1398"),
                Parameter::string("from_ts", "1702441545000"),
                Parameter::string("to_ts", "1742441905000"),
                Parameter::string("service", "fsp-pay-gateway"),
                Parameter::string("env", "prd-bo"),
            ],
        )
    }

    #[tokio::test]
    async fn test_search_returns_entries_newest_first() {
        let result = invoke(&LogSearchTool::new(), &request()).await.into_result();
        let ToolResult::Document(doc) = result else {
            panic!("expected document");
        };
        let parsed: LogSearchResult = serde_json::from_value(doc).unwrap();

        assert_eq!(parsed.logs.len(), 2);
        assert_eq!(parsed.search_metadata.log_count, 2);
        assert!(parsed.logs[0].timestamp > parsed.logs[1].timestamp);
        assert!(parsed.logs[0].stack_trace.is_some());
        assert_eq!(parsed.logs[0].timestamp, "2025-03-20 03:38:24.000");
        assert_eq!(parsed.search_metadata.from, "2023-12-13 04:25:45");
        assert_eq!(parsed.search_metadata.to, "2025-03-20 03:38:25");
        assert!(parsed
            .logs
            .iter()
            .all(|e| e.service == "fsp-pay-gateway" && e.environment == "prd-bo"));
    }

    #[test]
    fn test_search_is_deterministic() {
        let params = LogSearchParams::from_envelope(&request()).unwrap();
        let tool = LogSearchTool::new();
        assert_eq!(tool.search(&params), tool.search(&params));
    }

    #[test]
    fn test_entries_stay_inside_narrow_window() {
        let params = LogSearchParams {
            trace_id: "t".into(),
            window: TimeWindow {
                from_ms: 1_700_000_000_000,
                to_ms: 1_700_000_000_500,
            },
            service: "s".into(),
            env: "e".into(),
        };
        let result = LogSearchTool::new().search(&params);
        assert!(result
            .logs
            .iter()
            .all(|e| e.timestamp.as_str() >= "2023-11-14 22:13:20.000"));
    }

    #[tokio::test]
    async fn test_missing_trace_id_is_error_text() {
        let mut env = request();
        env.parameters.as_mut().unwrap().remove(0);

        match invoke(&LogSearchTool::new(), &env).await.into_result() {
            ToolResult::Error(msg) => assert!(msg.contains("'trace_id'")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_id_shape() {
        let id = request_id_for("abc");
        assert!(id.starts_with("req-"));
        assert_eq!(id.len(), 10);
    }
}
