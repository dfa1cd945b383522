//! Typed extraction of envelope parameters.

use crate::tools::Envelope;
use chrono::DateTime;
use thiserror::Error;

/// Calendar format embedded in tool results.
pub const CALENDAR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("required parameter '{0}' is missing")]
    Missing(String),

    #[error("parameter '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

impl ParameterError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Text value of a required parameter. Blank values count as missing.
pub fn required(envelope: &Envelope, name: &str) -> Result<String, ParameterError> {
    optional(envelope, name).ok_or_else(|| ParameterError::Missing(name.to_string()))
}

pub fn optional(envelope: &Envelope, name: &str) -> Option<String> {
    envelope
        .get_text(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a millisecond epoch timestamp parameter.
pub fn epoch_millis(envelope: &Envelope, name: &str) -> Result<i64, ParameterError> {
    let raw = required(envelope, name)?;
    let millis: i64 = raw
        .parse()
        .map_err(|_| ParameterError::invalid(name, format!("'{}' is not a millisecond timestamp", raw)))?;

    if DateTime::from_timestamp_millis(millis).is_none() {
        return Err(ParameterError::invalid(name, format!("{} is out of range", millis)));
    }
    Ok(millis)
}

/// Render a millisecond epoch timestamp as a UTC calendar string.
pub fn format_millis(millis: i64, format: &str) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Inclusive search window given by `from_ts` / `to_ts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeWindow {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ParameterError> {
        let from_ms = epoch_millis(envelope, "from_ts")?;
        let to_ms = epoch_millis(envelope, "to_ts")?;

        if from_ms > to_ms {
            return Err(ParameterError::invalid(
                "from_ts",
                format!("{} is after to_ts {}", from_ms, to_ms),
            ));
        }
        Ok(Self { from_ms, to_ms })
    }

    pub fn from_label(&self) -> String {
        format_millis(self.from_ms, CALENDAR_FORMAT)
    }

    pub fn to_label(&self) -> String {
        format_millis(self.to_ms, CALENDAR_FORMAT)
    }
}
