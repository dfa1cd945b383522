//! In-memory knowledge index over chunked reference data.
//!
//! Built once at startup and shared read-only; a request never mutates it.

use crate::error::{AppError, Result};
use crate::ingestion::{chunk_document, ContentDocument, DocumentChunk, FileContent};
use crate::knowledge::embed::{cosine_similarity, Embedder};
use crate::knowledge::records::{IssueRecord, KnowledgeEntry, ServiceRecord};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A past issue with its similarity to the query, if one was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIssue {
    #[serde(flatten)]
    pub issue: IssueRecord,
    #[serde(default)]
    pub score: Option<f32>,
}

pub struct KnowledgeIndex {
    embedder: Box<dyn Embedder>,
    services: HashMap<String, ServiceRecord>,
    /// Newest first.
    issues: Vec<IssueRecord>,
    /// One row per entry of `issues`.
    issue_embeddings: Array2<f32>,
    fragments: usize,
}

impl KnowledgeIndex {
    pub fn empty(embedder: impl Embedder + 'static) -> Self {
        Self::build(embedder, Vec::new())
    }

    /// Classify and index chunks. The first complete record for a service
    /// wins; fragments are counted and dropped.
    pub fn build(
        embedder: impl Embedder + 'static,
        chunks: impl IntoIterator<Item = DocumentChunk>,
    ) -> Self {
        let mut services: HashMap<String, ServiceRecord> = HashMap::new();
        let mut issues = Vec::new();
        let mut fragments = 0usize;

        for chunk in chunks {
            match KnowledgeEntry::classify(&chunk.content_body) {
                KnowledgeEntry::Service(record) => {
                    services.entry(record.service_id.clone()).or_insert(record);
                }
                KnowledgeEntry::Issue(record) => issues.push(record),
                KnowledgeEntry::Fragment => fragments += 1,
            }
        }

        issues.sort_by(|a: &IssueRecord, b: &IssueRecord| b.timestamp.cmp(&a.timestamp));

        let texts: Vec<String> = issues.iter().map(issue_text).collect();
        let issue_embeddings = embedder.embed_batch(&texts);

        tracing::info!(
            services = services.len(),
            issues = issues.len(),
            fragments,
            dim = embedder.dim(),
            "Knowledge index built"
        );

        Self {
            embedder: Box::new(embedder),
            services,
            issues,
            issue_embeddings,
            fragments,
        }
    }

    /// Chunk and index every `*.json` file in `dir`.
    pub fn load_dir(embedder: impl Embedder + 'static, dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            AppError::IndexError(format!("Failed to read {}: {}", dir.display(), e))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut chunks = Vec::new();
        for path in &paths {
            let body = fs::read_to_string(path).map_err(|e| {
                AppError::IndexError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let document = ContentDocument {
                file_contents: Some(vec![FileContent::text(
                    body,
                    "application/json",
                    json!({ "source": path.display().to_string() }),
                )]),
                ..Default::default()
            };
            chunks.extend(chunk_document(&document).file_contents);
        }

        tracing::info!(dir = %dir.display(), files = paths.len(), "Reference files chunked");
        Ok(Self::build(embedder, chunks))
    }

    /// Directory entry for exactly `service`.
    pub fn service(&self, service: &str) -> Option<&ServiceRecord> {
        self.services.get(service)
    }

    /// Past issues of exactly `service`.
    ///
    /// With a query, issues scoring below `min_similarity` are omitted and the
    /// rest are ordered by score. Without one, the most recent issues are
    /// returned unscored.
    pub fn search_issues(
        &self,
        service: &str,
        query: Option<&str>,
        min_similarity: f32,
        limit: usize,
    ) -> Vec<ScoredIssue> {
        let candidates = self
            .issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| issue.service == service);

        let Some(query) = query else {
            return candidates
                .take(limit)
                .map(|(_, issue)| ScoredIssue {
                    issue: issue.clone(),
                    score: None,
                })
                .collect();
        };

        let scores = cosine_similarity(&self.embedder.embed(query), &self.issue_embeddings);
        let mut scored: Vec<ScoredIssue> = candidates
            .map(|(idx, issue)| ScoredIssue {
                issue: issue.clone(),
                score: Some(scores[idx]),
            })
            .filter(|s| s.score.unwrap_or(0.0) >= min_similarity)
            .collect();

        // Ties keep recency order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }
}

fn issue_text(issue: &IssueRecord) -> String {
    issue.error_message.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::HashedEmbedder;
    use ndarray::Array1;
    use serde_json::Value;

    fn chunk(body: Value) -> DocumentChunk {
        DocumentChunk {
            content_type: "application/json".into(),
            content_metadata: json!({}),
            content_body: body.to_string(),
        }
    }

    fn issue(service: &str, message: &str, ts: &str) -> Value {
        json!({
            "service": service,
            "error_message": message,
            "timestamp": ts,
            "resolution": format!("fix for {}", message),
            "trace_id": "t"
        })
    }

    fn index() -> KnowledgeIndex {
        KnowledgeIndex::build(
            HashedEmbedder::new(256),
            vec![
                chunk(json!({
                    "service_id": "fsp-pay-gateway",
                    "description": "payment gateway",
                    "responsible_parties": { "module_owners": ["Kim"], "dev_owners": ["Lee"] },
                    "note": ""
                })),
                chunk(json!({
                    "service_id": "fsp-pay-gateway",
                    "description": "duplicate",
                    "responsible_parties": { "module_owners": ["Other"], "dev_owners": [] }
                })),
                chunk(issue("fsp-pay-gateway", "java.lang.OutOfMemoryError: Java heap space", "2024-01-01 00:00:00")),
                chunk(issue("fsp-pay-gateway", "java.io.IOException: Connection reset by peer", "2023-05-05 00:00:00")),
                chunk(issue("fsp-pay-gateway", "java.lang.NullPointerException", "2025-02-02 00:00:00")),
                chunk(issue("fsp-pay-gateway-v2", "java.io.IOException: Connection reset by peer", "2025-03-03 00:00:00")),
                chunk(json!({ "service_id": "broken" })),
            ],
        )
    }

    #[test]
    fn test_counts_and_first_record_wins() {
        let index = index();
        assert_eq!(index.service_count(), 1);
        assert_eq!(index.issue_count(), 4);
        assert_eq!(index.fragment_count(), 1);
        assert_eq!(index.service("fsp-pay-gateway").unwrap().description, "payment gateway");
    }

    #[test]
    fn test_exact_service_match_only() {
        let index = index();
        assert!(index.service("fsp-pay").is_none());

        let issues = index.search_issues("fsp-pay-gateway", None, 0.0, 10);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|s| s.issue.service == "fsp-pay-gateway"));
    }

    #[test]
    fn test_unscored_search_is_most_recent_first() {
        let issues = index().search_issues("fsp-pay-gateway", None, 0.0, 2);
        let stamps: Vec<&str> = issues.iter().map(|s| s.issue.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["2025-02-02 00:00:00", "2024-01-01 00:00:00"]);
        assert!(issues.iter().all(|s| s.score.is_none()));
    }

    #[test]
    fn test_low_similarity_issues_omitted() {
        let issues = index().search_issues(
            "fsp-pay-gateway",
            Some("java.io.IOException: Connection reset by peer"),
            0.6,
            10,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].issue.error_message.contains("Connection reset"));
    }

    #[test]
    fn test_unrelated_query_yields_nothing() {
        let issues = index().search_issues("fsp-pay-gateway", Some("kafka record too large"), 0.6, 10);
        assert!(issues.is_empty());
    }

    /// Two buckets: `java.io` messages and everything else.
    struct FirstWord;

    impl Embedder for FirstWord {
        fn dim(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Array1<f32> {
            if text.starts_with("java.io") {
                Array1::from(vec![1.0, 0.0])
            } else {
                Array1::from(vec![0.0, 1.0])
            }
        }
    }

    #[test]
    fn test_search_uses_supplied_embedder() {
        let index = KnowledgeIndex::build(
            FirstWord,
            vec![
                chunk(issue("svc", "java.lang.NullPointerException", "2025-01-01 00:00:00")),
                chunk(issue("svc", "java.io.EOFException", "2024-01-01 00:00:00")),
            ],
        );

        let issues = index.search_issues("svc", Some("java.io anything"), 0.9, 10);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue.error_message, "java.io.EOFException");
        assert_eq!(issues[0].score, Some(1.0));
    }

    #[test]
    fn test_load_dir_reads_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("service_owners.json"),
            json!({
                "svc-a": {
                    "description": "a",
                    "responsible_parties": { "모듈 담당자": ["Park"], "개발 담당자": ["Choi"] },
                    "비고": ""
                }
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("past_issues.json"),
            Value::Array(vec![issue("svc-a", "java.lang.NullPointerException", "2024-06-01 12:00:00")]).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let index = KnowledgeIndex::load_dir(HashedEmbedder::new(64), dir.path()).unwrap();
        assert_eq!(index.service_count(), 1);
        assert_eq!(index.issue_count(), 1);
        assert_eq!(index.service("svc-a").unwrap().responsible_parties.dev_owners, vec!["Choi"]);
    }

    #[test]
    fn test_load_dir_missing_is_error() {
        let result = KnowledgeIndex::load_dir(HashedEmbedder::new(8), Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(AppError::IndexError(_))));
    }
}
