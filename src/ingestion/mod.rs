//! Ingestion module for splitting reference documents into indexable chunks.
//!
//! The chunker turns one ingested document into many independently retrievable
//! units; batch jobs apply it to documents held in a document store.

pub mod batch;
pub mod chunker;
pub mod types;

pub use batch::run_job;
pub use chunker::{chunk_content, chunk_document, chunk_value};
pub use types::{
    ChunkedDocument, ChunkingJob, ChunkingJobResult, ContentDocument, DocumentChunk, FileContent,
};
