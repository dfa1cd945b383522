//! Type definitions for the ingestion module.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A missing or null content type reads as empty; other scalars keep their
/// JSON text.
fn lenient_content_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// One content item of an ingested document.
///
/// `content_body` is usually JSON text, but an already-parsed JSON value is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    #[serde(default)]
    pub content_body: Value,
    #[serde(default, deserialize_with = "lenient_content_type")]
    pub content_type: String,
    #[serde(default = "empty_object")]
    pub content_metadata: Value,
}

impl FileContent {
    pub fn text(body: impl Into<String>, content_type: &str, content_metadata: Value) -> Self {
        Self {
            content_body: Value::String(body.into()),
            content_type: content_type.to_string(),
            content_metadata,
        }
    }
}

/// A document handed to the chunker. Fields other than `fileContents` are
/// carried through to the output untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_contents: Option<Vec<FileContent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One independently indexable unit. `content_body` is always JSON text,
/// or the original raw text when the source was not JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub content_type: String,
    pub content_metadata: Value,
    pub content_body: String,
}

/// Output of the chunker: the input shape with `fileContents` expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkedDocument {
    pub file_contents: Vec<DocumentChunk>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Location of one content batch inside the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBatch {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    #[serde(default)]
    pub content_batches: Vec<ContentBatch>,
    #[serde(default = "empty_object")]
    pub file_metadata: Value,
    #[serde(default = "empty_object")]
    pub original_file_location: Value,
}

/// A chunking job over documents held in the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingJob {
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub input_files: Option<Vec<InputFile>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub original_file_location: Value,
    pub file_metadata: Value,
    pub content_batches: Vec<ContentBatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingJobResult {
    pub output_files: Vec<OutputFile>,
}
