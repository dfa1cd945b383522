//! Chunking jobs over documents held in a [`DocumentStore`].
//!
//! Each content batch is processed on its own: any storage or decode failure drops
//! that batch from the result and the job carries on with the rest.

use crate::error::StorageError;
use crate::ingestion::chunker::chunk_document;
use crate::ingestion::types::{
    ChunkingJob, ChunkingJobResult, ContentBatch, ContentDocument, OutputFile,
};
use crate::persistence::DocumentStore;

/// Prefix under which chunked documents are written.
pub const OUTPUT_PREFIX: &str = "output/";

pub fn run_job(store: &dyn DocumentStore, job: &ChunkingJob) -> ChunkingJobResult {
    let (Some(input_files), Some(bucket)) = (job.input_files.as_ref(), job.bucket_name.as_deref())
    else {
        tracing::error!("Chunking job is missing inputFiles or bucketName");
        return ChunkingJobResult::default();
    };

    let mut output_files = Vec::with_capacity(input_files.len());
    let mut failed = 0usize;

    for input_file in input_files {
        let mut processed = Vec::with_capacity(input_file.content_batches.len());

        for batch in &input_file.content_batches {
            let Some(key) = batch.key.as_deref() else {
                tracing::error!("Content batch has no key");
                continue;
            };

            match process_batch(store, bucket, key) {
                Ok(output_key) => processed.push(ContentBatch {
                    key: Some(output_key),
                }),
                Err(e) => {
                    failed += 1;
                    tracing::error!(bucket, key, error = %e, "Content batch failed");
                }
            }
        }

        output_files.push(OutputFile {
            original_file_location: input_file.original_file_location.clone(),
            file_metadata: input_file.file_metadata.clone(),
            content_batches: processed,
        });
    }

    tracing::info!(
        bucket,
        files = output_files.len(),
        failed_batches = failed,
        "Chunking job complete"
    );

    ChunkingJobResult { output_files }
}

/// Read, chunk and write back one batch. Returns the output key.
fn process_batch(store: &dyn DocumentStore, bucket: &str, key: &str) -> Result<String, StorageError> {
    let raw = store.read(bucket, key)?;

    let document: ContentDocument =
        serde_json::from_value(raw).map_err(|e| StorageError::Decode {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: e,
        })?;
    let chunked = chunk_document(&document);

    let output_key = format!("{}{}", OUTPUT_PREFIX, key);
    let value = serde_json::to_value(&chunked).map_err(|e| StorageError::Write {
        bucket: bucket.to_string(),
        key: output_key.clone(),
        source: e.into(),
    })?;
    store.write(bucket, &output_key, &value)?;

    Ok(output_key)
}
