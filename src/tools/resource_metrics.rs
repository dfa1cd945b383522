//! CPU and memory usage lookup.
//!
//! Stands in for a metrics-platform query. Usage numbers are sampled, not
//! measured; min and max always bracket the average.

use crate::config::MetricsMode;
use crate::tools::params::{self, ParameterError, TimeWindow};
use crate::tools::{Envelope, FunctionSpec, ParameterSpec, ToolHandler, ToolResult};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::RangeInclusive;

pub const ACTION_GROUP: &str = "resource_analysis_actions";
pub const GET_RESOURCE_METRICS: &str = "get_resource_metrics";

const CPU_AVG_RANGE: RangeInclusive<f64> = 40.0..=50.0;
const MEMORY_AVG_RANGE: RangeInclusive<f64> = 60.0..=80.0;
const JITTER_RANGE: RangeInclusive<f64> = 5.0..=10.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetricsParams {
    pub service: String,
    pub env: String,
    pub window: TimeWindow,
}

impl ResourceMetricsParams {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ParameterError> {
        let service = params::required(envelope, "service")?;
        let env = params::required(envelope, "env")?;
        Ok(Self {
            service,
            env,
            window: TimeWindow::from_envelope(envelope)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub avg_usage_percent: f64,
    pub max_usage_percent: f64,
    pub min_usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAnalysis {
    pub is_cpu_critical: bool,
    pub is_memory_critical: bool,
    pub is_resource_related_issue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub service: String,
    pub environment: String,
    pub time_period: TimePeriod,
    pub cpu: UsageStats,
    pub memory: UsageStats,
    pub analysis: ResourceAnalysis,
}

pub struct ResourceMetricsTool {
    mode: MetricsMode,
    cpu_critical_percent: f64,
    memory_critical_percent: f64,
    functions: Vec<FunctionSpec>,
}

impl ResourceMetricsTool {
    pub fn new(mode: MetricsMode, cpu_critical_percent: f64, memory_critical_percent: f64) -> Self {
        Self {
            mode,
            cpu_critical_percent,
            memory_critical_percent,
            functions: vec![FunctionSpec {
                name: GET_RESOURCE_METRICS.to_string(),
                description: "Look up CPU and memory usage of a service over a time range."
                    .to_string(),
                parameters: vec![
                    ParameterSpec::string("service", "Service name", true),
                    ParameterSpec::string("env", "Environment, e.g. prd-bo or stg", true),
                    ParameterSpec::string("from_ts", "Start of the range (epoch milliseconds)", true),
                    ParameterSpec::string("to_ts", "End of the range (epoch milliseconds)", true),
                ],
            }],
        }
    }

    pub fn metrics(&self, params: &ResourceMetricsParams) -> ResourceMetrics {
        let mut rng = self.rng_for(params);

        let cpu = sample_usage(&mut rng, CPU_AVG_RANGE);
        let memory = sample_usage(&mut rng, MEMORY_AVG_RANGE);

        let is_cpu_critical = cpu.avg_usage_percent >= self.cpu_critical_percent;
        let is_memory_critical = memory.avg_usage_percent >= self.memory_critical_percent;

        ResourceMetrics {
            service: params.service.clone(),
            environment: params.env.clone(),
            time_period: TimePeriod {
                from: params.window.from_label(),
                to: params.window.to_label(),
            },
            cpu,
            memory,
            analysis: ResourceAnalysis {
                is_cpu_critical,
                is_memory_critical,
                is_resource_related_issue: is_cpu_critical || is_memory_critical,
            },
        }
    }

    fn rng_for(&self, params: &ResourceMetricsParams) -> StdRng {
        match self.mode {
            MetricsMode::Random => StdRng::from_entropy(),
            MetricsMode::Seeded(seed) => {
                let mut hasher = Sha256::new();
                hasher.update(params.service.as_bytes());
                hasher.update(b"|");
                hasher.update(params.env.as_bytes());
                hasher.update(params.window.from_ms.to_le_bytes());
                hasher.update(params.window.to_ms.to_le_bytes());
                let digest = hasher.finalize();

                let mut prefix = [0u8; 8];
                prefix.copy_from_slice(&digest[..8]);
                StdRng::seed_from_u64(seed ^ u64::from_le_bytes(prefix))
            }
        }
    }
}

#[async_trait]
impl ToolHandler for ResourceMetricsTool {
    fn action_group(&self) -> &str {
        ACTION_GROUP
    }

    fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    async fn execute(&self, envelope: &Envelope) -> ToolResult {
        match envelope.function.as_str() {
            GET_RESOURCE_METRICS => ToolResult::from(
                ResourceMetricsParams::from_envelope(envelope).map(|p| self.metrics(&p)),
            ),
            other => ToolResult::unrecognized(other),
        }
    }
}

/// Sample an average plus bracketing extremes, rounded to one decimal.
/// Rounding and clamping are applied so `min <= avg <= max` within [0, 100].
fn sample_usage(rng: &mut impl Rng, avg_range: RangeInclusive<f64>) -> UsageStats {
    let avg = round1(rng.gen_range(avg_range)).clamp(0.0, 100.0);
    let max = round1(avg + rng.gen_range(JITTER_RANGE)).clamp(avg, 100.0);
    let min = round1(avg - rng.gen_range(JITTER_RANGE)).clamp(0.0, avg);

    UsageStats {
        avg_usage_percent: avg,
        max_usage_percent: max,
        min_usage_percent: min,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
