//! The fixed three-section investigation report.

use crate::knowledge::OwnerAnswer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown when a section or subsection has nothing to report.
pub const NOT_FOUND: &str = "Not found";
pub const UNAVAILABLE_TIMED_OUT: &str = "unavailable (timed out)";
pub const UNAVAILABLE_REJECTED: &str = "unavailable (request could not be processed)";
pub const UNAVAILABLE_FAILED: &str = "unavailable (collaborator failed)";

/// One report section. Every report carries all three, populated or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Populated { findings: T },
    NotFound { message: String },
    Unavailable { message: String },
}

impl<T> Section<T> {
    pub fn populated(findings: T) -> Self {
        Self::Populated { findings }
    }

    pub fn not_found() -> Self {
        Self::NotFound {
            message: NOT_FOUND.to_string(),
        }
    }

    pub fn unavailable(message: &str) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    pub fn findings(&self) -> Option<&T> {
        match self {
            Self::Populated { findings } => Some(findings),
            _ => None,
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFindings {
    /// At most five points.
    pub summary: Vec<String>,
    /// At most two lines.
    pub root_cause: Vec<String>,
    /// At most three items.
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFindings {
    pub cpu_avg_percent: f64,
    pub cpu_peak_percent: f64,
    pub memory_avg_percent: f64,
    pub memory_peak_percent: f64,
    pub resource_related: bool,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastIncident {
    pub timestamp: String,
    pub error_message: String,
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipFindings {
    pub service_owners: OwnerAnswer,
    pub past_incidents: Vec<PastIncident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    pub log_analysis: Section<LogFindings>,
    pub resource_analysis: Section<ResourceFindings>,
    pub ownership: Section<OwnershipFindings>,
}

impl Report {
    pub fn populated_sections(&self) -> usize {
        [
            self.log_analysis.is_populated(),
            self.resource_analysis.is_populated(),
            self.ownership.is_populated(),
        ]
        .into_iter()
        .filter(|p| *p)
        .count()
    }
}

fn write_placeholder<T>(f: &mut fmt::Formatter<'_>, section: &Section<T>) -> fmt::Result {
    match section {
        Section::NotFound { message } | Section::Unavailable { message } => {
            writeln!(f, "  {}", message)
        }
        Section::Populated { .. } => Ok(()),
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "     {}", NOT_FOUND);
    }
    for item in items {
        writeln!(f, "     - {}", item)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1. Log (message/exception) analysis")?;
        match &self.log_analysis {
            Section::Populated { findings } => {
                writeln!(f, "  1) Summary:")?;
                write_items(f, &findings.summary)?;
                writeln!(f, "  2) Root cause:")?;
                for line in &findings.root_cause {
                    writeln!(f, "     {}", line)?;
                }
                writeln!(f, "  3) Remediation:")?;
                write_items(f, &findings.remediation)?;
            }
            other => write_placeholder(f, other)?,
        }

        writeln!(f)?;
        writeln!(f, "2. Resource status analysis")?;
        match &self.resource_analysis {
            Section::Populated { findings } => {
                writeln!(
                    f,
                    "  1) CPU usage: {:.1}% (peak {:.1}%)",
                    findings.cpu_avg_percent, findings.cpu_peak_percent
                )?;
                writeln!(
                    f,
                    "  2) Memory usage: {:.1}% (peak {:.1}%)",
                    findings.memory_avg_percent, findings.memory_peak_percent
                )?;
                writeln!(f, "  - {}", findings.assessment)?;
            }
            other => write_placeholder(f, other)?,
        }

        writeln!(f)?;
        writeln!(f, "3. Ownership and history")?;
        match &self.ownership {
            Section::Populated { findings } => {
                match &findings.service_owners {
                    OwnerAnswer::Found(parties) => writeln!(
                        f,
                        "  1) Service owners: {} / {}",
                        join_or_none(&parties.module_owners),
                        join_or_none(&parties.dev_owners)
                    )?,
                    OwnerAnswer::NotFound(text) => writeln!(f, "  1) Service owners: {}", text)?,
                }
                writeln!(f, "  2) Past similar incidents:")?;
                if findings.past_incidents.is_empty() {
                    writeln!(f, "     {}", NOT_FOUND)?;
                }
                for incident in &findings.past_incidents {
                    writeln!(
                        f,
                        "     - {} {}: {}",
                        incident.timestamp, incident.error_message, incident.resolution
                    )?;
                }
            }
            other => write_placeholder(f, other)?,
        }

        Ok(())
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
