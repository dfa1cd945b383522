pub mod agents;
pub mod health;
pub mod ingest;
pub mod investigate;
pub mod invoke;

pub use agents::agents_handler;
pub use health::{health_handler, ready_handler};
pub use ingest::{chunk_handler, ingest_job_handler};
pub use investigate::investigate_handler;
pub use invoke::invoke_handler;
