//! Reference records recovered from indexed chunks.
//!
//! Only chunks that decode into a complete record are usable as answers.
//! Anything else, such as a truncated fragment or an unrelated key/value
//! pair, is classified as a fragment and ignored by searches.

use crate::ingestion::chunker::SERVICE_ID_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Owners of one service, by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibleParties {
    #[serde(alias = "모듈 담당자")]
    pub module_owners: Vec<String>,
    #[serde(alias = "개발 담당자")]
    pub dev_owners: Vec<String>,
}

impl ResponsibleParties {
    pub fn is_empty(&self) -> bool {
        self.module_owners.is_empty() && self.dev_owners.is_empty()
    }
}

/// Service directory entry. Produced by the chunker from a keyed mapping,
/// so the key arrives as `service_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub service_id: String,
    pub description: String,
    pub responsible_parties: ResponsibleParties,
    #[serde(default, alias = "비고")]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub service: String,
    pub error_message: String,
    /// `YYYY-MM-DD HH:MM:SS`, so lexical order is chronological.
    pub timestamp: String,
    pub resolution: String,
    pub trace_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeEntry {
    Service(ServiceRecord),
    Issue(IssueRecord),
    Fragment,
}

impl KnowledgeEntry {
    /// Classify one chunk body.
    pub fn classify(content_body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(content_body) else {
            return Self::Fragment;
        };
        if !value.is_object() {
            return Self::Fragment;
        }

        if value.get(SERVICE_ID_FIELD).is_some() {
            match serde_json::from_value::<ServiceRecord>(value) {
                Ok(record) if !record.service_id.is_empty() => Self::Service(record),
                _ => Self::Fragment,
            }
        } else {
            match serde_json::from_value::<IssueRecord>(value) {
                Ok(record) if !record.service.is_empty() && !record.error_message.is_empty() => {
                    Self::Issue(record)
                }
                _ => Self::Fragment,
            }
        }
    }
}
