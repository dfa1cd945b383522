//! Opsmate - ChatOps incident investigation service
//!
//! A coordinator fans an alert out to three collaborators (log search,
//! resource metrics, knowledge search) and merges their answers into a fixed
//! three-section report. Reference data is ingested through the content
//! chunker.

pub mod agents;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod ingestion;
pub mod knowledge;
pub mod persistence;
pub mod state;
pub mod tools;

// Re-export key types for convenience
pub use config::Config;
pub use coordinator::{Coordinator, Report};
pub use error::{AppError, Result};
pub use handlers::{
    agents_handler, chunk_handler, health_handler, ingest_job_handler, investigate_handler,
    invoke_handler, ready_handler,
};
pub use state::AppState;
