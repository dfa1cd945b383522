use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// How the resource-metrics stub samples its numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsMode {
    /// Fresh random values on every call.
    Random,
    /// Values derived from a fixed seed plus the request parameters,
    /// so identical requests observe identical metrics.
    Seeded(u64),
}

impl MetricsMode {
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var("OPSMATE_METRICS_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "seeded" | "deterministic" => {
                let seed = env::var("METRICS_SEED")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?;
                Ok(Self::Seeded(seed))
            }
            _ => Ok(Self::Random),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Directory of reference JSON files chunked and indexed at startup.
    /// `None` starts the service with an empty knowledge index.
    pub knowledge_dir: Option<PathBuf>,
    /// Root directory of the filesystem document store used by chunking jobs.
    pub storage_root: PathBuf,
    /// Upper bound on how long the coordinator waits for one collaborator.
    pub collaborator_timeout: Duration,
    /// Minimum cosine similarity for a past issue to count as similar.
    pub min_similarity: f32,
    /// Cap on ranked knowledge search results and on past incidents per report.
    pub max_past_issues: usize,
    /// Dimension of the hashed bag-of-words embedding.
    pub embedding_dim: usize,
    pub cpu_critical_percent: f64,
    pub memory_critical_percent: f64,
    pub metrics_mode: MetricsMode,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            knowledge_dir: env::var("KNOWLEDGE_DIR").ok().map(PathBuf::from),
            storage_root: env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            collaborator_timeout: Duration::from_millis(
                env::var("COLLABORATOR_TIMEOUT_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()?,
            ),
            min_similarity: env::var("MIN_SIMILARITY")
                .unwrap_or_else(|_| "0.35".to_string())
                .parse()?,
            max_past_issues: env::var("MAX_PAST_ISSUES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            embedding_dim: env::var("EMBEDDING_DIM")
                .unwrap_or_else(|_| "256".to_string())
                .parse()?,
            cpu_critical_percent: env::var("CPU_CRITICAL_PERCENT")
                .unwrap_or_else(|_| "85".to_string())
                .parse()?,
            memory_critical_percent: env::var("MEMORY_CRITICAL_PERCENT")
                .unwrap_or_else(|_| "85".to_string())
                .parse()?,
            metrics_mode: MetricsMode::from_env()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 30,
            knowledge_dir: None,
            storage_root: PathBuf::from("./.opsmate/store"),
            collaborator_timeout: Duration::from_secs(30),
            min_similarity: 0.35,
            max_past_issues: 3,
            embedding_dim: 256,
            cpu_critical_percent: 85.0,
            memory_critical_percent: 85.0,
            metrics_mode: MetricsMode::Random,
        }
    }
}
