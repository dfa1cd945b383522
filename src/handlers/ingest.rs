use crate::error::{AppError, Result};
use crate::ingestion::{self, ChunkedDocument, ChunkingJob, ChunkingJobResult, ContentDocument};
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /chunk - Split one content document into retrieval-sized chunks.
pub async fn chunk_handler(Json(document): Json<ContentDocument>) -> Json<ChunkedDocument> {
    let chunked = ingestion::chunk_document(&document);
    tracing::debug!(chunks = chunked.file_contents.len(), "Document chunked");
    Json(chunked)
}

/// POST /ingest/jobs - Chunk every content batch of a job through the
/// document store. A failing batch is skipped, never the whole job.
pub async fn ingest_job_handler(
    State(state): State<Arc<AppState>>,
    Json(job): Json<ChunkingJob>,
) -> Result<Json<ChunkingJobResult>> {
    let store = Arc::clone(&state.store);

    // Filesystem reads and writes; keep them off the async workers
    let result = tokio::task::spawn_blocking(move || ingestion::run_job(store.as_ref(), &job))
        .await
        .map_err(|e| AppError::ResourceError(format!("Chunking task failed: {}", e)))?;

    tracing::info!(outputs = result.output_files.len(), "Chunking job finished");
    Ok(Json(result))
}
