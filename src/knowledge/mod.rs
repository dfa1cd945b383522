//! Knowledge base: service ownership and past-issue history.
//!
//! Reference files are chunked by the ingestion module, classified into
//! complete records or fragments, and searched by exact service name plus
//! embedding similarity.

pub mod embed;
pub mod index;
pub mod lookup;
pub mod records;

pub use embed::{cosine_similarity, Embedder, HashedEmbedder};
pub use index::{KnowledgeIndex, ScoredIssue};
pub use lookup::{KnowledgeAnswer, KnowledgeLookupTool, OwnerAnswer, NO_OWNER_INFO};
pub use records::{IssueRecord, KnowledgeEntry, ResponsibleParties, ServiceRecord};
