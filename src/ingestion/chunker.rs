//! Content chunking for knowledge-base ingestion.
//!
//! Splits heterogeneous JSON documents into units that can be indexed and
//! retrieved on their own. Chunking is fail-soft: a content item that cannot
//! be parsed is passed through unchanged as a single chunk, and no item is
//! ever dropped because another one was malformed.

use crate::ingestion::types::{ChunkedDocument, ContentDocument, DocumentChunk, FileContent};
use serde_json::{Map, Value};

/// Field injected into keyed sub-objects to remember their key.
pub const SERVICE_ID_FIELD: &str = "service_id";

/// Parsed form of a content body.
#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Json(Value),
    /// Body that is not JSON; chunked verbatim.
    Raw(String),
}

/// Chunk every content item of `document`.
///
/// A document without `fileContents` yields an empty `fileContents` list.
pub fn chunk_document(document: &ContentDocument) -> ChunkedDocument {
    let items = document.file_contents.as_deref().unwrap_or_default();

    let mut file_contents = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let chunks = chunk_content(item);
        tracing::debug!(index = idx, chunks = chunks.len(), "Content item chunked");
        file_contents.extend(chunks);
    }

    metrics::counter!("chunks_emitted_total").increment(file_contents.len() as u64);
    tracing::debug!(
        items = items.len(),
        chunks = file_contents.len(),
        "Document chunking complete"
    );

    ChunkedDocument {
        file_contents,
        extra: document.extra.clone(),
    }
}

/// Chunk one content item. Items with an empty body carry no content and
/// yield nothing; any other item yields at least one chunk.
pub fn chunk_content(content: &FileContent) -> Vec<DocumentChunk> {
    if is_empty_body(&content.content_body) {
        return Vec::new();
    }

    let make = |content_body: String| DocumentChunk {
        content_type: content.content_type.clone(),
        content_metadata: content.content_metadata.clone(),
        content_body,
    };

    match parse_body(&content.content_body) {
        Payload::Json(value) => chunk_value(value)
            .into_iter()
            .map(|chunk| make(chunk.to_string()))
            .collect(),
        Payload::Raw(raw) => {
            tracing::warn!(
                content_type = %content.content_type,
                "Content body is not valid JSON, passing through unchanged"
            );
            vec![make(raw)]
        }
    }
}

/// Split a parsed payload.
///
/// - array: one chunk per element
/// - object: one chunk per key; nested objects gain `service_id = key`,
///   other values become `{key: value}`
/// - anything else: the value itself
///
/// An empty array or object is returned as its own single chunk.
pub fn chunk_value(value: Value) -> Vec<Value> {
    let chunks: Vec<Value> = match &value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.iter().map(|(key, v)| keyed_chunk(key, v)).collect(),
        _ => Vec::new(),
    };

    if chunks.is_empty() {
        vec![value]
    } else {
        chunks
    }
}

fn keyed_chunk(key: &str, value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut merged = Map::with_capacity(fields.len() + 1);
            merged.insert(SERVICE_ID_FIELD.to_string(), Value::String(key.to_string()));
            for (k, v) in fields {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        other => {
            let mut single = Map::with_capacity(1);
            single.insert(key.to_string(), other.clone());
            Value::Object(single)
        }
    }
}

fn parse_body(body: &Value) -> Payload {
    match body {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => Payload::Json(parsed),
            Err(_) => Payload::Raw(text.clone()),
        },
        already_parsed => Payload::Json(already_parsed.clone()),
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
